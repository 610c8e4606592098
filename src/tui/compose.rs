//! Compose box: single-line text input for the open conversation.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// State for the compose box.
#[derive(Default)]
pub struct ComposeState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl ComposeState {
    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    /// Move cursor left by one character.
    pub fn move_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
        }
    }

    /// Move cursor right by one character.
    pub fn move_right(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    /// Move cursor to the beginning of the input.
    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    /// Move cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// "Send" the message: return the current text and clear the box.
    /// Returns None if the input is empty or whitespace-only.
    pub fn send(&mut self) -> Option<String> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.input.clear();
        self.cursor_pos = 0;
        Some(text)
    }

    /// Convert a char-based cursor position to a byte offset.
    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the compose box: 1 border + 1 input + 1 border = 3 lines.
pub const COMPOSE_HEIGHT: u16 = 3;

/// Render the compose box into the given area.
///
/// Uses `Frame` directly so we can both write to the buffer and set cursor.
pub fn render(
    area: Rect,
    frame: &mut Frame,
    state: &ComposeState,
    counterpart_name: &str,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let border_type = if focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };

    let title = if counterpart_name.is_empty() {
        " Message ".to_string()
    } else {
        format!(" Message {} ", counterpart_name)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let input_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let cursor = compute_cursor_position(input_area, state, focused);
    render_input(input_area, frame.buffer_mut(), state, focused);

    if let Some((cx, cy)) = cursor {
        frame.set_cursor_position((cx, cy));
    }
}

/// Compute the cursor position if the compose box is focused.
fn compute_cursor_position(
    input_area: Rect,
    state: &ComposeState,
    focused: bool,
) -> Option<(u16, u16)> {
    if !focused {
        return None;
    }

    let byte_pos = state
        .input
        .char_indices()
        .nth(state.cursor_pos)
        .map(|(i, _)| i)
        .unwrap_or(state.input.len());
    let before = &state.input[..byte_pos];
    let offset = UnicodeWidthStr::width(before).min(input_area.width.saturating_sub(2) as usize);
    Some((input_area.x + 1 + offset as u16, input_area.y))
}

fn render_input(area: Rect, buf: &mut Buffer, state: &ComposeState, focused: bool) {
    let line = if state.input.is_empty() {
        let style = Style::default().fg(Color::DarkGray);
        let hint = if focused {
            " Type a message, Enter to send"
        } else {
            " Tab to compose"
        };
        Line::from(Span::styled(hint, style))
    } else {
        Line::from(vec![Span::raw(" "), Span::raw(state.input.clone())])
    };

    Paragraph::new(line).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_send() {
        let mut state = ComposeState::default();
        for c in "hi there".chars() {
            state.insert_char(c);
        }
        assert_eq!(state.send().as_deref(), Some("hi there"));
        assert!(state.input.is_empty());
        assert_eq!(state.cursor_pos, 0);
    }

    #[test]
    fn test_send_whitespace_only_is_none() {
        let mut state = ComposeState::default();
        state.insert_char(' ');
        state.insert_char(' ');
        assert_eq!(state.send(), None);
    }

    #[test]
    fn test_cursor_math_with_multibyte_chars() {
        let mut state = ComposeState::default();
        for c in "pâté".chars() {
            state.insert_char(c);
        }
        assert_eq!(state.cursor_pos, 4);

        state.move_left();
        state.backspace(); // removes the 't'
        assert_eq!(state.input, "pâé");

        state.move_home();
        state.delete(); // removes the 'p'
        assert_eq!(state.input, "âé");

        state.move_end();
        assert_eq!(state.cursor_pos, 2);
    }
}
