use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    Up,
    Down,
    Left,
    Right,
    Search,
    Confirm,
    Delete,
    Back,
    Refresh,
    NextSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    keys: Vec<(KeyCode, KeyModifiers)>,
    hint: &'static str,
    description: &'static str,
}

impl KeyBinding {
    fn new(keys: &[KeyCode], hint: &'static str, description: &'static str) -> Self {
        Self {
            keys: keys.iter().map(|code| (*code, KeyModifiers::NONE)).collect(),
            hint,
            description,
        }
    }

    fn with_ctrl(mut self, code: KeyCode) -> Self {
        self.keys.push((code, KeyModifiers::CONTROL));
        self
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.keys.iter().any(|(code, modifiers)| {
            if *code != key.code {
                return false;
            }
            if modifiers.contains(KeyModifiers::CONTROL) {
                return key.modifiers.contains(KeyModifiers::CONTROL);
            }
            // Shifted characters arrive with SHIFT set; only CONTROL/ALT disqualify.
            !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        })
    }

    pub fn hint(&self) -> &'static str {
        self.hint
    }

    pub fn description(&self) -> &'static str {
        self.description
    }
}

/// Key bindings shared by every screen. Screens and widgets receive a clone of
/// this value instead of hardcoding keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub quit: KeyBinding,
    pub help: KeyBinding,
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub left: KeyBinding,
    pub right: KeyBinding,
    pub search: KeyBinding,
    pub confirm: KeyBinding,
    pub delete: KeyBinding,
    pub back: KeyBinding,
    pub refresh: KeyBinding,
    pub next_section: KeyBinding,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(&[KeyCode::Char('q')], "q", "quit").with_ctrl(KeyCode::Char('c')),
            help: KeyBinding::new(&[KeyCode::Char('?')], "?", "toggle help"),
            up: KeyBinding::new(&[KeyCode::Up, KeyCode::Char('k')], "↑/k", "move up"),
            down: KeyBinding::new(&[KeyCode::Down, KeyCode::Char('j')], "↓/j", "move down"),
            left: KeyBinding::new(&[KeyCode::Left, KeyCode::Char('h')], "←/h", "previous page"),
            right: KeyBinding::new(&[KeyCode::Right, KeyCode::Char('l')], "→/l", "next page"),
            search: KeyBinding::new(&[KeyCode::Char('/')], "/", "search"),
            confirm: KeyBinding::new(&[KeyCode::Enter], "enter", "select"),
            delete: KeyBinding::new(&[KeyCode::Char('d'), KeyCode::Delete], "d", "delete"),
            back: KeyBinding::new(&[KeyCode::Esc, KeyCode::Backspace], "esc", "back"),
            refresh: KeyBinding::new(&[KeyCode::Char('r'), KeyCode::F(5)], "r", "refresh"),
            next_section: KeyBinding::new(&[KeyCode::Tab], "tab", "next section"),
        }
    }
}

impl KeyBindings {
    /// Maps a key to an action. Order matters: earlier bindings win on overlap.
    pub fn action_for(&self, key: &KeyEvent) -> Option<Action> {
        let table = [
            (&self.quit, Action::Quit),
            (&self.help, Action::ToggleHelp),
            (&self.up, Action::Up),
            (&self.down, Action::Down),
            (&self.left, Action::Left),
            (&self.right, Action::Right),
            (&self.search, Action::Search),
            (&self.confirm, Action::Confirm),
            (&self.delete, Action::Delete),
            (&self.back, Action::Back),
            (&self.refresh, Action::Refresh),
            (&self.next_section, Action::NextSection),
        ];

        table
            .into_iter()
            .find(|(binding, _)| binding.matches(key))
            .map(|(_, action)| action)
    }

    pub fn is_force_quit(&self, key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    }
}

#[cfg(test)]
pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[cfg(test)]
pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::{Action, KeyBindings, ctrl, key};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn default_bindings_map_navigation_keys() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(&key(KeyCode::Char('j'))), Some(Action::Down));
        assert_eq!(keys.action_for(&key(KeyCode::Up)), Some(Action::Up));
        assert_eq!(keys.action_for(&key(KeyCode::Right)), Some(Action::Right));
        assert_eq!(keys.action_for(&key(KeyCode::Char('/'))), Some(Action::Search));
        assert_eq!(keys.action_for(&key(KeyCode::Enter)), Some(Action::Confirm));
        assert_eq!(keys.action_for(&key(KeyCode::Esc)), Some(Action::Back));
    }

    #[test]
    fn question_mark_with_shift_still_toggles_help() {
        let keys = KeyBindings::default();
        let shifted = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(keys.action_for(&shifted), Some(Action::ToggleHelp));
    }

    #[test]
    fn control_chords_do_not_trigger_plain_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(&ctrl('d')), None);
        assert_eq!(keys.action_for(&ctrl('c')), Some(Action::Quit));
        assert!(keys.is_force_quit(&ctrl('c')));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(&key(KeyCode::Char('z'))), None);
        assert_eq!(keys.action_for(&key(KeyCode::F(12))), None);
    }
}
