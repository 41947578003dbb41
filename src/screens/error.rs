use ratatui::Frame;
use ratatui::layout::Rect;

use crate::event::AppEvent;
use crate::input::KeyBindings;
use crate::screen::{Effect, Navigation, Outcome, Params, RenderContext, Screen, SharedState};
use crate::ui::render_notice;
use crate::widgets::{Dialog, DialogButton, DialogSignal};

const RETRY: &str = "retry";
const BACK: &str = "back";
const QUIT: &str = "quit";

/// Shows a failed call. Retry rebuilds the screen that failed, Back leaves it
/// for the screen that opened it, Quit exits.
pub struct ErrorScreen {
    message: String,
    dialog: Dialog,
    keys: KeyBindings,
}

impl ErrorScreen {
    pub fn new(state: &SharedState, params: &Params) -> Self {
        let message = params
            .get("message")
            .cloned()
            .unwrap_or_else(|| "unknown error".to_string());
        let mut dialog = Dialog::new(
            "Something went wrong",
            vec![
                DialogButton::new("Retry", RETRY),
                DialogButton::new("Back", BACK),
                DialogButton::new("Quit", QUIT),
            ],
            state.keys.clone(),
        );
        dialog.focus(BACK);
        Self {
            message,
            dialog,
            keys: state.keys.clone(),
        }
    }
}

impl Screen for ErrorScreen {
    fn title(&self) -> String {
        "Error".to_string()
    }

    fn init(&mut self) -> Option<Effect> {
        None
    }

    fn update(&mut self, event: AppEvent) -> Outcome {
        let AppEvent::Key(key) = event else {
            return Outcome::none();
        };
        match self.dialog.update(&key) {
            Some(DialogSignal::ButtonPress { id }) if id == QUIT => {
                Outcome::navigate(Navigation::Quit)
            }
            Some(DialogSignal::ButtonPress { id }) if id == RETRY => {
                Outcome::navigate(Navigation::Pop { reinitialize: true })
            }
            Some(_) => Outcome::navigate(Navigation::Unwind {
                levels: 2,
                reinitialize: true,
            }),
            None => Outcome::none(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
        let theme = ctx.theme;
        render_notice(frame, area, "Error", &self.message, theme.error, theme);
        self.dialog.render(frame, area, theme);
    }

    fn help(&self) -> Vec<(String, String)> {
        vec![
            (
                format!("{} {}", self.keys.left.hint(), self.keys.right.hint()),
                "choose".to_string(),
            ),
            (self.keys.confirm.hint().to_string(), "confirm".to_string()),
        ]
    }
}
