use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-line editable buffer with a caret measured in chars.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TextInput {
    value: String,
    caret: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Applies an editing key. Returns true when the value changed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return match key.code {
                KeyCode::Char('u') => self.clear_to_start(),
                KeyCode::Char('a') => {
                    self.caret = 0;
                    false
                }
                KeyCode::Char('e') => {
                    self.caret = self.len();
                    false
                }
                _ => false,
            };
        }

        match key.code {
            KeyCode::Char(c) => {
                self.insert(c);
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.caret = self.caret.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.caret = (self.caret + 1).min(self.len());
                false
            }
            KeyCode::Home => {
                self.caret = 0;
                false
            }
            KeyCode::End => {
                self.caret = self.len();
                false
            }
            _ => false,
        }
    }

    pub fn insert(&mut self, c: char) {
        let offset = self.byte_offset(self.caret);
        self.value.insert(offset, c);
        self.caret += 1;
    }

    pub fn backspace(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        let offset = self.byte_offset(self.caret - 1);
        self.value.remove(offset);
        self.caret -= 1;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.caret >= self.len() {
            return false;
        }
        let offset = self.byte_offset(self.caret);
        self.value.remove(offset);
        true
    }

    fn clear_to_start(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        let offset = self.byte_offset(self.caret);
        self.value.replace_range(..offset, "");
        self.caret = 0;
        true
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }
}

#[cfg(test)]
mod tests {
    use super::TextInput;
    use crate::input::{ctrl, key};
    use crossterm::event::KeyCode;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::default();
        for c in text.chars() {
            input.handle_key(&key(KeyCode::Char(c)));
        }
        input
    }

    #[test]
    fn typing_appends_at_caret() {
        let input = typed("nginx");
        assert_eq!(input.value(), "nginx");
        assert_eq!(input.caret(), 5);
    }

    #[test]
    fn insert_in_the_middle_after_moving_left() {
        let mut input = typed("ngnx");
        input.handle_key(&key(KeyCode::Left));
        input.handle_key(&key(KeyCode::Left));
        assert!(input.handle_key(&key(KeyCode::Char('i'))));
        assert_eq!(input.value(), "nginx");
        assert_eq!(input.caret(), 3);
    }

    #[test]
    fn backspace_and_delete_respect_bounds() {
        let mut input = typed("ab");
        input.handle_key(&key(KeyCode::Home));
        assert!(!input.handle_key(&key(KeyCode::Backspace)));
        assert!(input.handle_key(&key(KeyCode::Delete)));
        assert_eq!(input.value(), "b");
        input.handle_key(&key(KeyCode::End));
        assert!(!input.handle_key(&key(KeyCode::Delete)));
        assert!(input.handle_key(&key(KeyCode::Backspace)));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn multibyte_characters_are_edited_by_char() {
        let mut input = typed("żółw");
        input.handle_key(&key(KeyCode::Left));
        input.handle_key(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "żów");
    }

    #[test]
    fn ctrl_u_clears_before_caret() {
        let mut input = typed("kube-system");
        assert!(input.handle_key(&ctrl('u')));
        assert_eq!(input.value(), "");
        assert!(!input.handle_key(&ctrl('x')));
    }

    #[test]
    fn caret_movement_does_not_report_change() {
        let mut input = typed("abc");
        assert!(!input.handle_key(&key(KeyCode::Left)));
        assert!(!input.handle_key(&key(KeyCode::Right)));
        assert!(!input.handle_key(&key(KeyCode::Right)));
        assert_eq!(input.caret(), 3);
    }
}
