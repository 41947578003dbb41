pub mod contexts;
pub mod error;
pub mod namespaces;
pub mod pod_detail;
pub mod pods;

use crate::event::CollaboratorError;
use crate::router::Registry;
use crate::screen::{Navigation, Params, Screen, SharedState, params};

pub const CONTEXTS: &str = "contexts";
pub const NAMESPACES: &str = "namespaces";
pub const PODS: &str = "pods";
pub const POD: &str = "pod";
pub const ERROR: &str = "error";

pub fn registry() -> Registry {
    let mut registry = Registry::default();
    registry.register(CONTEXTS, |state: &SharedState, params: &Params| -> Box<dyn Screen> {
        Box::new(contexts::ContextsScreen::new(state, params))
    });
    registry.register(NAMESPACES, |state: &SharedState, params: &Params| -> Box<dyn Screen> {
        Box::new(namespaces::NamespacesScreen::new(state, params))
    });
    registry.register(PODS, |state: &SharedState, params: &Params| -> Box<dyn Screen> {
        Box::new(pods::PodsScreen::new(state, params))
    });
    registry.register(POD, |state: &SharedState, params: &Params| -> Box<dyn Screen> {
        Box::new(pod_detail::PodDetailScreen::new(state, params))
    });
    registry.register(ERROR, |state: &SharedState, params: &Params| -> Box<dyn Screen> {
        Box::new(error::ErrorScreen::new(state, params))
    });
    registry
}

/// Navigation to the error screen for a failed collaborator call.
pub fn show_error(error: &CollaboratorError) -> Navigation {
    let message = error.to_string();
    Navigation::push(ERROR, params([("message", message.as_str())]), true)
}

pub fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{CONTEXTS, ERROR, NAMESPACES, POD, PODS, registry};
    use crate::app::App;
    use crate::event::AppEvent;
    use crate::router::Router;
    use crate::screen::{Effect, Params, params};
    use crate::testing::{FakeBackend, FakeStore, pod, press, state_with};
    use crate::ui::Theme;
    use crossterm::event::KeyCode;
    use std::collections::VecDeque;
    use std::sync::Arc;

    fn app(backend: Arc<FakeBackend>, store: Arc<FakeStore>, root: &str, root_params: Params) -> App {
        let state = state_with(backend, store);
        let router = Router::new(registry(), root, &state, root_params).expect("root registered");
        App::new(router, state, Theme::default())
    }

    /// Runs effects the way the loop does until none are left.
    async fn drive(app: &mut App, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            let event = effect.into_future().await;
            queue.extend(app.handle_event(event));
        }
    }

    fn calls(backend: &FakeBackend) -> Vec<String> {
        backend.calls.lock().expect("lock").clone()
    }

    #[tokio::test]
    async fn pods_are_reloaded_from_the_new_context_after_a_switch() {
        let backend = Arc::new(FakeBackend::with_pods(&["cluster-a-pod"]));
        let store = Arc::new(FakeStore::with_contexts(&["a", "b"], "a"));
        let mut app = app(backend.clone(), store, CONTEXTS, Params::new());
        let effects = app.start();
        drive(&mut app, effects).await;

        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![CONTEXTS, NAMESPACES, PODS]);

        app.handle_event(press(KeyCode::Esc));
        app.handle_event(press(KeyCode::Esc));
        assert_eq!(app.trail(), vec![CONTEXTS]);

        *backend.pods.lock().expect("lock") = vec![pod("cluster-b-pod")];
        app.handle_event(press(KeyCode::Down));
        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![CONTEXTS, NAMESPACES]);
        assert!(calls(&backend).contains(&"use_context b".to_string()));

        let effects = app.handle_event(press(KeyCode::Enter));
        assert_eq!(
            effects.iter().map(|effect| effect.label()).collect::<Vec<_>>(),
            vec!["pods.list"]
        );
        drive(&mut app, effects).await;

        app.handle_event(press(KeyCode::Char('d')));
        app.handle_event(press(KeyCode::Left));
        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;

        let calls = calls(&backend);
        assert!(calls.contains(&"delete_pod default/cluster-b-pod".to_string()));
        assert!(!calls.contains(&"delete_pod default/cluster-a-pod".to_string()));
    }

    #[tokio::test]
    async fn back_from_a_vanished_pod_returns_to_the_pod_list() {
        let backend = Arc::new(FakeBackend::with_pods(&["api-1"]));
        let mut app = app(
            backend.clone(),
            Arc::new(FakeStore::default()),
            PODS,
            params([("namespace", "default")]),
        );
        let effects = app.start();
        drive(&mut app, effects).await;

        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![PODS, POD]);

        backend.pods.lock().expect("lock").clear();
        let effects = app.handle_event(AppEvent::Tick);
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![PODS, POD, ERROR]);

        // Retry reloads the same pod, which still fails.
        app.handle_event(press(KeyCode::Left));
        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![PODS, POD, ERROR]);

        let effects = app.handle_event(press(KeyCode::Enter));
        drive(&mut app, effects).await;
        assert_eq!(app.trail(), vec![PODS]);
        assert_eq!(
            calls(&backend)
                .iter()
                .filter(|call| *call == "list_pods default")
                .count(),
            2
        );
    }
}
