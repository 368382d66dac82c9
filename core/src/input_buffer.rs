//! Input buffer with a codepoint-granular cursor.
//!
//! Pinyin contexts run the buffer in ASCII-only mode (the keyboard can only
//! produce Latin letters and `'`); table contexts accept arbitrary UTF-8 and
//! keep a per-codepoint byte-length index alongside the string so cursor
//! arithmetic stays O(cursor) instead of rescanning the whole buffer.

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    ascii_only: bool,
    text: String,
    /// Cursor position in codepoints.
    cursor: usize,
    /// Byte length of each codepoint; empty in ASCII-only mode.
    idx: Vec<usize>,
}

impl InputBuffer {
    pub fn new(ascii_only: bool) -> Self {
        Self {
            ascii_only,
            ..Default::default()
        }
    }

    pub fn is_ascii_only(&self) -> bool {
        self.ascii_only
    }

    pub fn user_input(&self) -> &str {
        &self.text
    }

    /// Length in codepoints.
    pub fn size(&self) -> usize {
        if self.ascii_only {
            self.text.len()
        } else {
            self.idx.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cursor position as a byte offset.
    pub fn cursor_by_char(&self) -> usize {
        if self.ascii_only {
            self.cursor
        } else {
            self.idx[..self.cursor].iter().sum()
        }
    }

    /// Insert at the cursor. ASCII-only buffers reject non-ASCII input;
    /// non-ASCII buffers normalize to NFC first.
    pub fn type_str(&mut self, s: &str) -> Result<()> {
        if self.ascii_only {
            if !s.is_ascii() {
                return Err(Error::invalid_argument(
                    "ascii only buffer only accepts ascii input",
                ));
            }
            let at = self.cursor;
            self.text.insert_str(at, s);
            self.cursor += s.len();
            return Ok(());
        }
        let normalized: String = s.nfc().collect();
        let at = self.cursor_by_char();
        let lens: Vec<usize> = normalized.chars().map(|c| c.len_utf8()).collect();
        self.text.insert_str(at, &normalized);
        self.idx.splice(self.cursor..self.cursor, lens.iter().copied());
        self.cursor += lens.len();
        Ok(())
    }

    pub fn set_cursor(&mut self, cursor: usize) -> Result<()> {
        if cursor > self.size() {
            return Err(Error::out_of_range(format!(
                "cursor {cursor} past end {}",
                self.size()
            )));
        }
        self.cursor = cursor;
        Ok(())
    }

    /// Remove the codepoint range `[from, to)`.
    pub fn erase(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= to || to > self.size() {
            return Err(Error::out_of_range(format!(
                "erase range {from}..{to} out of bounds (size {})",
                self.size()
            )));
        }
        let (from_byte, len_bytes) = if self.ascii_only {
            (from, to - from)
        } else {
            let from_byte: usize = self.idx[..from].iter().sum();
            let len_bytes: usize = self.idx[from..to].iter().sum();
            self.idx.drain(from..to);
            (from_byte, len_bytes)
        };
        self.text.drain(from_byte..from_byte + len_bytes);
        if self.cursor > from {
            if self.cursor <= to {
                self.cursor = from;
            } else {
                self.cursor -= to - from;
            }
        }
        Ok(())
    }

    /// Remove the codepoint before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.cursor;
        self.erase(at - 1, at).is_ok()
    }

    /// The codepoint at position `i`.
    pub fn at(&self, i: usize) -> Result<&str> {
        if i >= self.size() {
            return Err(Error::out_of_range(format!(
                "index {i} past end {}",
                self.size()
            )));
        }
        if self.ascii_only {
            Ok(&self.text[i..i + 1])
        } else {
            let from: usize = self.idx[..i].iter().sum();
            Ok(&self.text[from..from + self.idx[i]])
        }
    }

    /// Byte length of the codepoint at position `i`.
    pub fn size_at(&self, i: usize) -> Result<usize> {
        if i >= self.size() {
            return Err(Error::out_of_range(format!(
                "index {i} past end {}",
                self.size()
            )));
        }
        Ok(if self.ascii_only { 1 } else { self.idx[i] })
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.idx.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_only_rejects_wide_input() {
        let mut buf = InputBuffer::new(true);
        buf.type_str("nihao").unwrap();
        assert!(matches!(
            buf.type_str("你"),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(buf.user_input(), "nihao");
        assert_eq!(buf.cursor(), 5);
    }

    #[test]
    fn test_insert_at_cursor() {
        let mut buf = InputBuffer::new(true);
        buf.type_str("nho").unwrap();
        buf.set_cursor(1).unwrap();
        buf.type_str("i").unwrap();
        assert_eq!(buf.user_input(), "niho");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_wide_buffer_indexing() {
        let mut buf = InputBuffer::new(false);
        buf.type_str("a你b好").unwrap();
        assert_eq!(buf.size(), 4);
        assert_eq!(buf.at(1).unwrap(), "你");
        assert_eq!(buf.size_at(1).unwrap(), 3);
        assert_eq!(buf.size_at(0).unwrap(), 1);
        assert_eq!(buf.cursor_by_char(), 8);
    }

    #[test]
    fn test_erase_adjusts_cursor() {
        let mut buf = InputBuffer::new(false);
        buf.type_str("你好世界").unwrap();
        buf.erase(1, 3).unwrap();
        assert_eq!(buf.user_input(), "你界");
        assert_eq!(buf.cursor(), 2);

        buf.set_cursor(1).unwrap();
        assert!(buf.backspace());
        assert_eq!(buf.user_input(), "界");
        assert_eq!(buf.cursor(), 0);
        assert!(!buf.backspace());
    }

    #[test]
    fn test_cursor_out_of_range() {
        let mut buf = InputBuffer::new(true);
        buf.type_str("ab").unwrap();
        assert!(matches!(buf.set_cursor(3), Err(Error::OutOfRange(_))));
        assert!(matches!(buf.at(2), Err(Error::OutOfRange(_))));
    }
}
