use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::input::{Action, KeyBindings};
use crate::ui::{Theme, centered_rect};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DialogButton {
    pub label: String,
    pub id: String,
}

impl DialogButton {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DialogSignal {
    ButtonPress { id: String },
    Cancelled,
}

/// Modal button row. Pressing confirm reports the focused button but leaves the
/// dialog open; the owner decides when to drop it.
#[derive(Debug, Clone)]
pub struct Dialog {
    prompt: String,
    buttons: Vec<DialogButton>,
    cursor: usize,
    keys: KeyBindings,
}

impl Dialog {
    pub fn new(prompt: impl Into<String>, buttons: Vec<DialogButton>, keys: KeyBindings) -> Self {
        Self {
            prompt: prompt.into(),
            buttons,
            cursor: 0,
            keys,
        }
    }

    pub fn yes_no(prompt: impl Into<String>, keys: KeyBindings) -> Self {
        Self::new(
            prompt,
            vec![DialogButton::new("Yes", "yes"), DialogButton::new("No", "no")],
            keys,
        )
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn buttons(&self) -> &[DialogButton] {
        &self.buttons
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focus(&mut self, id: &str) {
        if let Some(index) = self.buttons.iter().position(|button| button.id == id) {
            self.cursor = index;
        }
    }

    pub fn update(&mut self, key: &KeyEvent) -> Option<DialogSignal> {
        match self.keys.action_for(key)? {
            Action::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            Action::Right => {
                if self.cursor + 1 < self.buttons.len() {
                    self.cursor += 1;
                }
                None
            }
            Action::Confirm => self.buttons.get(self.cursor).map(|button| {
                DialogSignal::ButtonPress {
                    id: button.id.clone(),
                }
            }),
            Action::Back => Some(DialogSignal::Cancelled),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let area = centered_rect(60, 30, area);
        frame.render_widget(Clear, area);

        let mut buttons = Vec::new();
        for (index, button) in self.buttons.iter().enumerate() {
            if index > 0 {
                buttons.push(Span::raw("   "));
            }
            let style = if index == self.cursor {
                Style::default()
                    .fg(theme.bg)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            buttons.push(Span::styled(format!(" {} ", button.label), style));
        }

        let lines = vec![
            Line::from(self.prompt.clone()),
            Line::from(""),
            Line::from(buttons).alignment(Alignment::Center),
        ];
        let modal = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.warn))
                    .style(Style::default().bg(theme.panel)),
            )
            .style(Style::default().fg(theme.text));
        frame.render_widget(modal, area);
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialog, DialogButton, DialogSignal};
    use crate::input::{KeyBindings, key};
    use crossterm::event::KeyCode;

    fn yes_no() -> Dialog {
        Dialog::yes_no("Delete pod default/api?", KeyBindings::default())
    }

    #[test]
    fn left_at_first_button_is_a_no_op() {
        let mut dialog = yes_no();
        assert_eq!(dialog.update(&key(KeyCode::Left)), None);
        assert_eq!(dialog.cursor(), 0);
    }

    #[test]
    fn right_at_last_button_is_a_no_op() {
        let mut dialog = yes_no();
        dialog.update(&key(KeyCode::Right));
        assert_eq!(dialog.cursor(), 1);
        dialog.update(&key(KeyCode::Right));
        assert_eq!(dialog.cursor(), 1);
    }

    #[test]
    fn confirm_emits_focused_button_and_stays_open() {
        let mut dialog = yes_no();
        assert_eq!(
            dialog.update(&key(KeyCode::Enter)),
            Some(DialogSignal::ButtonPress {
                id: "yes".to_string()
            })
        );
        dialog.update(&key(KeyCode::Right));
        assert_eq!(
            dialog.update(&key(KeyCode::Enter)),
            Some(DialogSignal::ButtonPress {
                id: "no".to_string()
            })
        );
        assert_eq!(dialog.cursor(), 1);
    }

    #[test]
    fn escape_cancels() {
        let mut dialog = yes_no();
        assert_eq!(dialog.update(&key(KeyCode::Esc)), Some(DialogSignal::Cancelled));
    }

    #[test]
    fn three_button_dialog_walks_all_buttons() {
        let mut dialog = Dialog::new(
            "Delete context?",
            vec![
                DialogButton::new("Context only", "context"),
                DialogButton::new("Context+user+cluster", "all"),
                DialogButton::new("Cancel", "cancel"),
            ],
            KeyBindings::default(),
        );
        dialog.focus("cancel");
        assert_eq!(dialog.cursor(), 2);
        dialog.update(&key(KeyCode::Left));
        assert_eq!(
            dialog.update(&key(KeyCode::Enter)),
            Some(DialogSignal::ButtonPress {
                id: "all".to_string()
            })
        );
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let mut dialog = yes_no();
        assert_eq!(dialog.update(&key(KeyCode::Char('z'))), None);
        assert_eq!(dialog.update(&key(KeyCode::Down)), None);
        assert_eq!(dialog.cursor(), 0);
    }
}
