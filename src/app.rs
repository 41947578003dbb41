use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::{debug, error};

use crate::event::AppEvent;
use crate::input::{Action, KeyBindings};
use crate::router::Router;
use crate::screen::{Effect, Navigation, RenderContext, SharedState};
use crate::ui::Theme;

/// Top-level state: the router, the collaborators shared with screens, and the
/// global key handling that sits in front of the active screen.
pub struct App {
    router: Router,
    state: SharedState,
    theme: Theme,
    show_help: bool,
    running: bool,
    status: Option<String>,
    cleanup: Vec<Effect>,
}

impl App {
    pub fn new(router: Router, state: SharedState, theme: Theme) -> Self {
        Self {
            router,
            state,
            theme,
            show_help: false,
            running: true,
            status: None,
            cleanup: Vec::new(),
        }
    }

    /// Runs `init` on the initial screen.
    pub fn start(&mut self) -> Vec<Effect> {
        self.router.current_mut().init().into_iter().collect()
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Cleanup effects of the screen that was active at quit.
    pub fn take_cleanup(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.cleanup)
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keys(&self) -> &KeyBindings {
        &self.state.keys
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn context_name(&self) -> String {
        self.state.backend.context()
    }

    pub fn trail(&self) -> Vec<&str> {
        self.router.trail()
    }

    pub fn current_title(&self) -> String {
        self.router.current().title()
    }

    pub fn current_help(&self) -> Vec<(String, String)> {
        self.router.current().help()
    }

    pub fn render_current(&mut self, frame: &mut Frame, area: Rect) {
        let ctx = RenderContext {
            theme: &self.theme,
            keys: &self.state.keys,
        };
        self.router.current_mut().render(frame, area, &ctx);
    }

    /// Handles one event and returns the effects to schedule.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Effect> {
        if let AppEvent::Key(key) = &event {
            if self.state.keys.is_force_quit(key) {
                self.quit();
                return Vec::new();
            }

            if self.show_help {
                self.show_help = false;
                return Vec::new();
            }

            if !self.router.current().captures_input() {
                match self.state.keys.action_for(key) {
                    Some(Action::Quit) => {
                        self.quit();
                        return Vec::new();
                    }
                    Some(Action::ToggleHelp) => {
                        self.show_help = true;
                        return Vec::new();
                    }
                    _ => {}
                }
            }
            self.status = None;
        }

        let switched = matches!(&event, AppEvent::ContextSwitched { result: Ok(()), .. });
        let outcome = self.router.current_mut().update(event);
        if switched {
            self.router.invalidate();
        }
        let mut effects = outcome.effect.into_iter().collect::<Vec<_>>();
        if let Some(navigation) = outcome.navigation {
            effects.extend(self.apply_navigation(navigation));
        }
        effects
    }

    fn apply_navigation(&mut self, navigation: Navigation) -> Vec<Effect> {
        debug!(?navigation, "navigation requested");
        let result = match navigation {
            Navigation::Push {
                target,
                params,
                reinitialize,
            } => self
                .router
                .push(&target, &self.state, params, reinitialize)
                .map(|effect| effect.into_iter().collect()),
            Navigation::Pop { reinitialize } => self.router.pop(&self.state, reinitialize),
            Navigation::Unwind {
                levels,
                reinitialize,
            } => self.router.unwind(&self.state, levels, reinitialize),
            Navigation::Quit => {
                self.quit();
                Ok(Vec::new())
            }
        };

        match result {
            Ok(effects) => effects,
            Err(route_error) => {
                error!("{route_error}");
                self.status = Some(route_error.to_string());
                Vec::new()
            }
        }
    }

    fn quit(&mut self) {
        if self.running {
            self.cleanup.extend(self.router.current_mut().destroy());
        }
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::event::AppEvent;
    use crate::input::{ctrl, key};
    use crate::router::{Registry, Router};
    use crate::screen::{Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState};
    use crate::testing::shared_state;
    use crate::ui::Theme;
    use crossterm::event::KeyCode;
    use ratatui::Frame;
    use ratatui::layout::Rect;

    /// Screen that navigates according to the character typed.
    struct Scripted {
        name: &'static str,
        typing: bool,
        seen: Vec<char>,
    }

    impl Screen for Scripted {
        fn title(&self) -> String {
            format!("{} {:?}", self.name, self.seen)
        }

        fn init(&mut self) -> Option<Effect> {
            Some(Effect::new(format!("init {}", self.name), async {
                AppEvent::Tick
            }))
        }

        fn update(&mut self, event: AppEvent) -> Outcome {
            let AppEvent::Key(key) = event else {
                return Outcome::none();
            };
            let KeyCode::Char(c) = key.code else {
                return Outcome::none();
            };
            self.seen.push(c);
            match c {
                'p' => Outcome::navigate(Navigation::push("second", Params::new(), true)),
                'b' => Outcome::navigate(Navigation::Pop {
                    reinitialize: false,
                }),
                'x' => Outcome::navigate(Navigation::push("missing", Params::new(), true)),
                's' => {
                    self.typing = true;
                    Outcome::none()
                }
                'e' => Outcome::navigate(Navigation::Quit),
                _ => Outcome::none(),
            }
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect, _ctx: &RenderContext<'_>) {}

        fn destroy(&mut self) -> Option<Effect> {
            Some(Effect::new(format!("cleanup {}", self.name), async {
                AppEvent::Tick
            }))
        }

        fn help(&self) -> Vec<(String, String)> {
            vec![("p".to_string(), "push".to_string())]
        }

        fn captures_input(&self) -> bool {
            self.typing
        }
    }

    fn app() -> App {
        let mut registry = Registry::default();
        for name in ["first", "second"] {
            registry.register(name, move |_state: &SharedState, _params: &Params| -> Box<dyn Screen> {
                Box::new(Scripted {
                    name,
                    typing: false,
                    seen: Vec::new(),
                })
            });
        }
        let state = shared_state();
        let router = Router::new(registry, "first", &state, Params::new()).expect("first registered");
        App::new(router, state, Theme::default())
    }

    #[test]
    fn start_runs_initial_screen_init() {
        let mut app = app();
        let effects = app.start();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].label(), "init first");
    }

    #[test]
    fn quit_key_stops_the_loop_and_keeps_cleanup() {
        let mut app = app();
        app.handle_event(AppEvent::Key(key(KeyCode::Char('q'))));
        assert!(!app.running());

        let cleanup = app.take_cleanup();
        assert_eq!(cleanup.len(), 1);
        assert_eq!(cleanup[0].label(), "cleanup first");
        assert!(app.take_cleanup().is_empty());

        app.handle_event(AppEvent::Key(ctrl('c')));
        assert!(app.take_cleanup().is_empty());
    }

    #[test]
    fn help_toggles_and_next_key_closes_it() {
        let mut app = app();
        app.handle_event(AppEvent::Key(key(KeyCode::Char('?'))));
        assert!(app.show_help());

        app.handle_event(AppEvent::Key(key(KeyCode::Char('a'))));
        assert!(!app.show_help());
        assert_eq!(app.current_title(), "first []");
    }

    #[test]
    fn capturing_screen_receives_global_keys_but_ctrl_c_still_quits() {
        let mut app = app();
        app.handle_event(AppEvent::Key(key(KeyCode::Char('s'))));
        app.handle_event(AppEvent::Key(key(KeyCode::Char('q'))));
        assert!(app.running());
        assert_eq!(app.current_title(), "first ['s', 'q']");

        app.handle_event(AppEvent::Key(ctrl('c')));
        assert!(!app.running());
    }

    #[test]
    fn push_and_pop_signals_drive_the_router() {
        let mut app = app();
        let effects = app.handle_event(AppEvent::Key(key(KeyCode::Char('p'))));
        assert_eq!(effects.len(), 1);
        assert_eq!(app.trail(), vec!["first", "second"]);

        app.handle_event(AppEvent::Key(key(KeyCode::Char('b'))));
        assert_eq!(app.trail(), vec!["first"]);
        assert_eq!(app.current_title(), "first ['p']");
    }

    #[test]
    fn unknown_route_sets_status_and_stays() {
        let mut app = app();
        app.handle_event(AppEvent::Key(key(KeyCode::Char('x'))));
        assert_eq!(app.trail(), vec!["first"]);
        assert_eq!(app.status(), Some("no screen registered under 'missing'"));

        app.handle_event(AppEvent::Key(key(KeyCode::Char('a'))));
        assert_eq!(app.status(), None);
    }

    #[test]
    fn screen_can_request_exit() {
        let mut app = app();
        app.handle_event(AppEvent::Key(key(KeyCode::Char('e'))));
        assert!(!app.running());
    }

    #[test]
    fn non_key_events_reach_the_screen() {
        let mut app = app();
        let effects = app.handle_event(AppEvent::Resize(80, 24));
        assert!(effects.is_empty());
        assert!(app.running());
    }
}
