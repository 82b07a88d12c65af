use ropey::Rope;

use super::input::EditInput;

/// Cursor position in an editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    /// Remembered column for vertical movement.
    col_memory: usize,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self::at(0, 0)
    }

    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A rope-backed text buffer with a single cursor.
///
/// Both the built-in engine and the fallback surface edit through this type.
/// `revision` increases on every content mutation so callers can tell whether
/// an input actually changed the text.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
            revision: 0,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in bytes (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Whitespace-separated word count.
    pub fn word_count(&self) -> usize {
        self.rope
            .lines()
            .map(|line| line.to_string().split_whitespace().count())
            .sum()
    }

    /// Replace the whole text and move the cursor to the start.
    pub fn replace_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = Cursor::new();
        self.revision += 1;
    }

    /// Replace the whole text, keeping the cursor where it was when the new
    /// text still has that position.
    pub fn set_text_clamped(&mut self, text: &str) {
        let Cursor { line, col, .. } = self.cursor;
        self.rope = Rope::from_str(text);
        self.revision += 1;
        self.move_to(line, col);
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.split_line();
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
        self.revision += 1;
    }

    /// Insert a string at the cursor position, leaving the cursor after it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);

        let mut segments = s.split('\n');
        let first = segments.next().unwrap_or_default();
        match segments.next_back() {
            Some(last) => {
                self.cursor.line += s.matches('\n').count();
                self.cursor.set_col(last.len());
            }
            None => self.cursor.set_col(self.cursor.col + first.len()),
        }
        self.revision += 1;
    }

    /// Split the current line at the cursor.
    pub fn split_line(&mut self) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, '\n');
        self.cursor.line += 1;
        self.cursor.set_col(0);
        self.revision += 1;
    }

    /// Delete the character before the cursor.
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.line == 0 && self.cursor.col == 0 {
            return false;
        }
        let idx = self.cursor_char_idx();
        if self.cursor.col == 0 {
            let prev_len = self.line_len(self.cursor.line - 1);
            self.rope.remove(idx - 1..idx);
            self.cursor.line -= 1;
            self.cursor.set_col(prev_len);
        } else {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let width = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.rope.remove(idx - 1..idx);
            self.cursor.set_col(self.cursor.col - width);
        }
        self.revision += 1;
        true
    }

    /// Delete the character at the cursor.
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(idx..=idx);
        self.revision += 1;
        true
    }

    /// Move the cursor in the given direction.
    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.set_col(self.line_len(self.cursor.line));
    }

    /// Move to the start of the previous word, crossing line breaks.
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.move_end();
            }
            return;
        }
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let head = line[..self.cursor.col].trim_end();
        let start = head
            .rfind(|c: char| !is_word_char(c))
            .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8));
        self.cursor.set_col(start);
    }

    /// Move past the current word and the separators after it.
    pub fn move_word_right(&mut self) {
        let len = self.line_len(self.cursor.line);
        if self.cursor.col >= len {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let tail = &line[self.cursor.col..];
        let word_end = tail.find(|c: char| !is_word_char(c)).unwrap_or(tail.len());
        let gap = tail[word_end..]
            .find(is_word_char)
            .unwrap_or(tail.len() - word_end);
        self.cursor.set_col(self.cursor.col + word_end + gap);
    }

    /// Move the cursor to a position, clamped to the buffer and to a char
    /// boundary.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        let mut col = col.min(text.len());
        while !text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    /// Apply a plain-text editing input.
    ///
    /// Returns `true` if the text changed. Inputs that need an engine
    /// (undo, toolbar actions) are ignored here.
    pub fn apply(&mut self, input: &EditInput) -> bool {
        let before = self.revision;
        match input {
            EditInput::Insert(ch) => self.insert_char(*ch),
            EditInput::InsertText(text) => self.insert_str(text),
            EditInput::Newline => self.split_line(),
            EditInput::Backspace => {
                self.delete_back();
            }
            EditInput::Delete => {
                self.delete_forward();
            }
            EditInput::Move(direction) => self.move_cursor(*direction),
            EditInput::Home => self.move_home(),
            EditInput::End => self.move_end(),
            EditInput::WordLeft => self.move_word_left(),
            EditInput::WordRight => self.move_word_right(),
            EditInput::Undo | EditInput::Toolbar(_) => {}
        }
        self.revision != before
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.cursor.col.min(line.len());
        line_start + line[..col].chars().count()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let width = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor.set_col(self.cursor.col - width);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.move_end();
        }
    }

    fn move_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if let Some(ch) = line[self.cursor.col.min(line.len())..].chars().next() {
            self.cursor.set_col(self.cursor.col + ch.len_utf8());
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let Some(target) = self.cursor.line.checked_add_signed(delta) else {
            return;
        };
        if target >= self.line_count() {
            return;
        }
        let memory = self.cursor.col_memory;
        self.move_to(target, memory);
        self.cursor.col_memory = memory;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("rope", &format_args!("Rope({} lines)", self.rope.len_lines()))
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_insert_char_advances_cursor_and_revision() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.move_end();
        buf.insert_char('!');
        assert_eq!(buf.text(), "hello!");
        assert_eq!(buf.cursor().col, 6);
        assert_eq!(buf.revision(), 1);
    }

    #[test]
    fn test_insert_multiline_str_moves_cursor_to_last_segment() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_to(0, 1);
        buf.insert_str("x\nyz\nq");
        assert_eq!(buf.text(), "ax\nyz\nqb");
        assert_eq!(buf.cursor(), Cursor::at(2, 1));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = EditorBuffer::from_text("one\ntwo");
        buf.move_to(1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "onetwo");
        assert_eq!(buf.cursor(), Cursor::at(0, 3));
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut buf = EditorBuffer::from_text("x");
        assert!(!buf.delete_back());
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_delete_forward_at_end_is_noop() {
        let mut buf = EditorBuffer::from_text("x");
        buf.move_end();
        assert!(!buf.delete_forward());
    }

    #[test]
    fn test_multibyte_backspace_removes_whole_char() {
        let mut buf = EditorBuffer::from_text("héllo");
        buf.move_to(0, 3);
        buf.delete_back();
        assert_eq!(buf.text(), "hllo");
        assert_eq!(buf.cursor().col, 1);
    }

    #[test]
    fn test_vertical_movement_remembers_column() {
        let mut buf = EditorBuffer::from_text("long line\nab\nanother line");
        buf.move_to(0, 7);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 7);
    }

    #[test]
    fn test_word_movement() {
        let mut buf = EditorBuffer::from_text("hello big world");
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 6);
        buf.move_end();
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 10);
    }

    #[test]
    fn test_replace_text_resets_cursor() {
        let mut buf = EditorBuffer::from_text("abc");
        buf.move_end();
        buf.replace_text("xyz");
        assert_eq!(buf.cursor(), Cursor::new());
    }

    #[test]
    fn test_set_text_clamped_keeps_cursor_when_possible() {
        let mut buf = EditorBuffer::from_text("hello world");
        buf.move_to(0, 5);
        buf.set_text_clamped("hello there");
        assert_eq!(buf.cursor().col, 5);
        buf.set_text_clamped("hi");
        assert_eq!(buf.cursor().col, 2);
    }

    #[test]
    fn test_apply_reports_content_changes_only() {
        let mut buf = EditorBuffer::from_text("ab");
        assert!(!buf.apply(&EditInput::Move(Direction::Right)));
        assert!(buf.apply(&EditInput::Insert('z')));
        assert!(!buf.apply(&EditInput::Undo));
        assert_eq!(buf.text(), "azb");
    }

    #[test]
    fn test_word_count() {
        let buf = EditorBuffer::from_text("one two\nthree  four\n");
        assert_eq!(buf.word_count(), 4);
    }

    proptest! {
        #[test]
        fn prop_cursor_stays_on_char_boundary(
            text in "[a-zé😀 \n]{0,40}",
            moves in proptest::collection::vec(0u8..6, 0..40),
        ) {
            let mut buf = EditorBuffer::from_text(&text);
            for m in moves {
                match m {
                    0 => buf.move_cursor(Direction::Left),
                    1 => buf.move_cursor(Direction::Right),
                    2 => buf.move_cursor(Direction::Up),
                    3 => buf.move_cursor(Direction::Down),
                    4 => { buf.delete_back(); }
                    _ => buf.insert_char('x'),
                }
                let c = buf.cursor();
                let line = buf.line_at(c.line).unwrap_or_default();
                prop_assert!(c.col <= line.len());
                prop_assert!(line.is_char_boundary(c.col));
            }
        }
    }
}
