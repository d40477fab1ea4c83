//! Minimal multi-line input buffer
//!
//! The session core treats this as an external collaborator: it only reads
//! the plain-text value and writes replacement text. Cursor movement is by
//! character; display columns account for wide characters.

use unicode_width::UnicodeWidthChar;

#[derive(Debug)]
pub struct EditorBuffer {
    lines: Vec<String>,
    /// Cursor line index.
    row: usize,
    /// Cursor position within the line, in characters.
    col: usize,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer's plain-text value.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[allow(dead_code)] // State query utility
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Replace the content wholesale, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.row = self.lines.len() - 1;
        self.col = self.lines[self.row].chars().count();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte = self.byte_at_cursor();
        self.lines[self.row].insert(byte, c);
        self.col += 1;
    }

    pub fn insert_newline(&mut self) {
        let byte = self.byte_at_cursor();
        let rest = self.lines[self.row].split_off(byte);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let byte = self.byte_at_cursor();
            self.lines[self.row].remove(byte);
        } else if self.row > 0 {
            let tail = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.lines[self.row].chars().count();
            self.lines[self.row].push_str(&tail);
        }
    }

    /// Delete the character under the cursor, joining lines at end of line.
    pub fn delete(&mut self) {
        if self.col < self.lines[self.row].chars().count() {
            let byte = self.byte_at_cursor();
            self.lines[self.row].remove(byte);
        } else if self.row + 1 < self.lines.len() {
            let tail = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&tail);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.lines[self.row].chars().count();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.lines[self.row].chars().count() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.lines[self.row].chars().count();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor position as (row, display column), wide characters counted at
    /// their rendered width.
    pub fn cursor(&self) -> (usize, usize) {
        let width = self.lines[self.row]
            .chars()
            .take(self.col)
            .map(|c| c.width().unwrap_or(0))
            .sum();
        (self.row, width)
    }

    fn byte_at_cursor(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map_or(line.len(), |(byte, _)| byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> EditorBuffer {
        let mut editor = EditorBuffer::new();
        for c in text.chars() {
            if c == '\n' {
                editor.insert_newline();
            } else {
                editor.insert_char(c);
            }
        }
        editor
    }

    #[test]
    fn test_insert_and_read_back() {
        let editor = typed("hello\nworld");
        assert_eq!(editor.text(), "hello\nworld");
        assert!(!editor.is_empty());
    }

    #[test]
    fn test_set_text_replaces_wholesale() {
        let mut editor = typed("draft");
        editor.set_text("Bonjour le monde");
        assert_eq!(editor.text(), "Bonjour le monde");
        assert_eq!(editor.cursor(), (0, 16));
    }

    #[test]
    fn test_clear() {
        let mut editor = typed("anything");
        editor.clear();
        assert!(editor.is_empty());
        assert_eq!(editor.cursor(), (0, 0));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut editor = typed("ab\ncd");
        editor.move_home();
        editor.backspace();
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn test_delete_joins_lines_at_end() {
        let mut editor = typed("ab\ncd");
        editor.move_left();
        editor.move_left();
        editor.delete();
        assert_eq!(editor.text(), "ab\nd");

        let mut editor = typed("ab\ncd");
        // Cursor to end of first line, delete pulls the next line up.
        editor.move_home();
        editor.move_left();
        editor.delete();
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn test_insert_mid_line_with_multibyte() {
        let mut editor = typed("héllo");
        editor.move_left();
        editor.insert_char('!');
        assert_eq!(editor.text(), "héll!o");
    }

    #[test]
    fn test_cursor_width_counts_wide_chars() {
        let editor = typed("日本");
        assert_eq!(editor.cursor(), (0, 4));
    }

    #[test]
    fn test_move_left_across_line_boundary() {
        let mut editor = typed("ab\nc");
        editor.move_home();
        editor.move_left();
        assert_eq!(editor.cursor(), (0, 2));
        editor.move_right();
        assert_eq!(editor.cursor(), (1, 0));
    }
}
