use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::event::{AppEvent, CollaboratorError, GenerationCounter, bounded};
use crate::input::Action;
use crate::model::{Column, PodSummary, Row};
use crate::screen::{
    Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState, params,
};
use crate::screens::{POD, dash_if_empty, show_error};
use crate::ui::render_notice;
use crate::widgets::{Dialog, DialogSignal, ListMode, ListOptions, ListSignal, ListView};

pub struct PodsScreen {
    state: SharedState,
    namespace: String,
    list: ListView,
    pending_delete: Option<(Dialog, String)>,
    loaded: bool,
    loading: bool,
    failure: Option<String>,
    generation: GenerationCounter,
}

impl PodsScreen {
    pub fn new(state: &SharedState, params: &Params) -> Self {
        let namespace = params
            .get("namespace")
            .filter(|namespace| !namespace.is_empty())
            .cloned()
            .unwrap_or_else(|| state.backend.default_namespace());
        let min = state.settings.min_column_width;
        let list = ListView::new(
            vec![
                Column::new("Name", min),
                Column::new("Ready", min),
                Column::new("Status", min),
                Column::new("Restarts", min),
                Column::new("Age", min),
                Column::new("Node", min),
            ],
            Vec::new(),
            state.settings.page_size,
            "",
            true,
            ListOptions {
                singular_item_name: "pod".to_string(),
                start_in_search_mode: false,
            },
            state.keys.clone(),
        );
        Self {
            state: state.clone(),
            namespace,
            list,
            pending_delete: None,
            loaded: false,
            loading: false,
            failure: None,
            generation: GenerationCounter::default(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load(&mut self) -> Effect {
        let generation = self.generation.issue();
        self.loading = true;
        let backend = self.state.backend.clone();
        let namespace = self.namespace.clone();
        let limit = self.state.settings.list_timeout;
        Effect::new("pods.list", async move {
            let result = bounded("list pods", limit, backend.list_pods(&namespace)).await;
            AppEvent::PodsLoaded {
                namespace,
                generation,
                result,
            }
        })
    }

    fn delete(&self, pod: String) -> Effect {
        let backend = self.state.backend.clone();
        let namespace = self.namespace.clone();
        let limit = self.state.settings.list_timeout;
        Effect::new("pods.delete", async move {
            let result = bounded("delete pod", limit, backend.delete_pod(&namespace, &pod)).await;
            AppEvent::PodDeleted {
                namespace,
                pod,
                result,
            }
        })
    }

    fn rows(pods: &[PodSummary]) -> Vec<Row> {
        pods.iter()
            .map(|pod| {
                Row::new(
                    pod.name.clone(),
                    vec![
                        pod.name.clone(),
                        pod.ready.clone(),
                        pod.status.clone(),
                        pod.restarts.to_string(),
                        pod.age.clone(),
                        dash_if_empty(&pod.node),
                    ],
                )
            })
            .collect()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        if let Some((dialog, _)) = self.pending_delete.as_mut() {
            let signal = dialog.update(&key);
            return self.on_dialog_signal(signal);
        }

        if self.list.mode() == ListMode::Select {
            match self.state.keys.action_for(&key) {
                Some(Action::Back) => {
                    return Outcome::navigate(Navigation::Pop {
                        reinitialize: false,
                    });
                }
                Some(Action::Refresh) => return Outcome::effect(self.load()),
                _ => {}
            }
        }

        match self.list.update(&key) {
            Some(ListSignal::Selection { id }) => {
                self.list.update_highlighted(id.clone());
                Outcome::navigate(Navigation::push(
                    POD,
                    params([("namespace", self.namespace.as_str()), ("pod", id.as_str())]),
                    true,
                ))
            }
            Some(ListSignal::Deletion { id }) => {
                let mut dialog = Dialog::yes_no(
                    format!("Delete pod {}/{id}?", self.namespace),
                    self.state.keys.clone(),
                );
                dialog.focus("no");
                self.pending_delete = Some((dialog, id));
                Outcome::none()
            }
            None => Outcome::none(),
        }
    }

    fn on_dialog_signal(&mut self, signal: Option<DialogSignal>) -> Outcome {
        let Some(signal) = signal else {
            return Outcome::none();
        };
        let Some((_, pod)) = self.pending_delete.take() else {
            return Outcome::none();
        };
        match signal {
            DialogSignal::ButtonPress { id } if id == "yes" => Outcome::effect(self.delete(pod)),
            _ => Outcome::none(),
        }
    }

    fn on_failure(&mut self, error: CollaboratorError) -> Outcome {
        warn!(namespace = %self.namespace, "{error}");
        self.failure = Some(error.to_string());
        Outcome::navigate(show_error(&error))
    }
}

impl Screen for PodsScreen {
    fn title(&self) -> String {
        format!("Pods · {}", self.namespace)
    }

    fn init(&mut self) -> Option<Effect> {
        Some(self.load())
    }

    fn update(&mut self, event: AppEvent) -> Outcome {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick if self.pending_delete.is_none() => Outcome::effect(self.load()),
            AppEvent::PodsLoaded {
                namespace,
                generation,
                result,
            } => {
                if namespace != self.namespace || !self.generation.is_current(generation) {
                    warn!(%namespace, ?generation, "dropping stale pod list");
                    return Outcome::none();
                }
                self.loading = false;
                match result {
                    Ok(pods) => {
                        self.loaded = true;
                        self.failure = None;
                        self.list.update_rows(Self::rows(&pods), None);
                        Outcome::none()
                    }
                    Err(error) => self.on_failure(error),
                }
            }
            AppEvent::PodDeleted {
                namespace,
                pod,
                result,
            } => match result {
                Ok(deleted) => {
                    info!(%namespace, pod = %deleted, "pod deleted");
                    Outcome::effect(self.load())
                }
                Err(error) => {
                    warn!(%namespace, %pod, "delete failed");
                    self.on_failure(error)
                }
            },
            _ => Outcome::none(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
        let theme = ctx.theme;
        let title = format!("Pods · {}", self.namespace);
        if !self.loaded {
            if let Some(failure) = &self.failure {
                let message = format!("{failure}\n\npress {} to retry", ctx.keys.refresh.hint());
                render_notice(frame, area, &title, &message, theme.error, theme);
                return;
            }
            if self.loading {
                render_notice(frame, area, &title, "Loading pods…", theme.muted, theme);
                return;
            }
        }

        self.list
            .set_page_size(self.state.page_size_for(ListView::rows_fitting(area)));
        self.list.render(frame, area, &title, theme);
        if let Some((dialog, _)) = &self.pending_delete {
            dialog.render(frame, area, theme);
        }
    }

    fn help(&self) -> Vec<(String, String)> {
        let mut lines = self.list.help();
        lines.push((
            self.state.keys.refresh.hint().to_string(),
            "refresh".to_string(),
        ));
        lines
    }

    fn captures_input(&self) -> bool {
        self.list.mode() == ListMode::Search
    }
}
