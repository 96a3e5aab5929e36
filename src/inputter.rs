use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Single line editor used for typing the continent filter.
#[derive(Default)]
pub struct FilterInput {
    buffer: String,
    cursor_pos: usize,
}

/// Snapshot of the editor handed to the model and the UI after each key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub cursor_pos: usize,
    pub finished: bool,
    pub canceled: bool,
}

impl FilterInput {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.finish(false),
            (KeyCode::Esc, KeyModifiers::NONE) => self.finish(true),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (code, _) => self.insert(code),
        }
    }

    /// Seeds the editor, e.g. with the currently active filter.
    pub fn start(&mut self, initial: &str) {
        self.buffer = initial.to_string();
        self.cursor_pos = self.buffer.chars().count();
    }

    pub fn snapshot(&self) -> InputResult {
        InputResult {
            input: self.buffer.clone(),
            cursor_pos: self.cursor_pos,
            finished: false,
            canceled: false,
        }
    }

    fn finish(&mut self, canceled: bool) -> InputResult {
        let mut result = self.snapshot();
        result.finished = true;
        result.canceled = canceled;
        self.buffer.clear();
        self.cursor_pos = 0;
        result
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let byte_pos = self.byte_pos();
            self.buffer.remove(byte_pos);
        }
        self.snapshot()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.snapshot()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.buffer.chars().count() {
            self.cursor_pos += 1;
        }
        self.snapshot()
    }

    fn insert(&mut self, code: KeyCode) -> InputResult {
        if let Some(chr) = code.as_char() {
            let byte_pos = self.byte_pos();
            self.buffer.insert(byte_pos, chr);
            self.cursor_pos += 1;
        }
        self.snapshot()
    }

    fn byte_pos(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(input: &mut FilterInput, code: KeyCode) -> InputResult {
        input.read(KeyEvent::from(code))
    }

    #[test]
    fn typing_builds_the_filter() {
        let mut input = FilterInput::default();
        press(&mut input, KeyCode::Char('e'));
        let result = press(&mut input, KeyCode::Char('u'));
        assert_eq!(result.input, "eu");
        assert!(!result.finished);
    }

    #[test]
    fn enter_finishes_and_escape_cancels() {
        let mut input = FilterInput::default();
        press(&mut input, KeyCode::Char('a'));
        let result = press(&mut input, KeyCode::Enter);
        assert!(result.finished);
        assert!(!result.canceled);
        assert_eq!(result.input, "a");

        input.start("asia");
        let result = press(&mut input, KeyCode::Esc);
        assert!(result.finished);
        assert!(result.canceled);
    }

    #[test]
    fn backspace_removes_before_the_cursor() {
        let mut input = FilterInput::default();
        input.start("abc");
        press(&mut input, KeyCode::Left);
        let result = press(&mut input, KeyCode::Backspace);
        assert_eq!(result.input, "ac");
        assert_eq!(result.cursor_pos, 1);
    }
}
