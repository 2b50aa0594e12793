//! Rope-backed line buffer with per-line revisions.
//!
//! A reference [`LineSource`] for hosts without their own storage. Every mutation returns the
//! [`LineEdit`] to hand to [`Highlighter::on_edit`](crate::Highlighter::on_edit), with line
//! renumbering already applied.

use crate::source::{LineEdit, LineSource};
use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;

/// Rope text plus one revision stamp per line.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    rope: Rope,
    revisions: Vec<u64>,
    next_revision: u64,
}

impl LineBuffer {
    /// Create an empty buffer (one empty line).
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Build a buffer from text.
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let line_count = rope.len_lines();
        Self {
            rope,
            revisions: (1..=line_count as u64).collect(),
            next_revision: line_count as u64 + 1,
        }
    }

    /// Get total line count
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Get complete text
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Get text of the specified line (excluding the line terminator)
    pub fn line(&self, line_number: usize) -> Option<String> {
        if line_number >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line_number).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Get character offset from line number and column number
    pub fn position_to_char_offset(&self, line: usize, column: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }

        let line_start_char = self.rope.line_to_char(line);
        let line_len = self.line(line).map_or(0, |t| t.chars().count());
        line_start_char + column.min(line_len)
    }

    /// Replace `len_chars` characters at `start_char` with `text`.
    ///
    /// Offsets are clamped to the document. Every line touched by the edit gets a new revision.
    pub fn replace(&mut self, start_char: usize, len_chars: usize, text: &str) -> LineEdit {
        let start_char = start_char.min(self.rope.len_chars());
        let end_char = start_char
            .saturating_add(len_chars)
            .min(self.rope.len_chars());

        let start_line = self.rope.char_to_line(start_char);
        let old_end_line = self.rope.char_to_line(end_char) + 1;

        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
        self.rope.insert(start_char, text);

        let inserted_end = start_char + text.chars().count();
        let new_end_line = self.rope.char_to_line(inserted_end) + 1;

        let fresh: Vec<u64> = (start_line..new_end_line)
            .map(|_| self.bump_revision())
            .collect();
        self.revisions.splice(start_line..old_end_line, fresh);
        debug_assert_eq!(self.revisions.len(), self.rope.len_lines());

        LineEdit::new(start_line, old_end_line, new_end_line)
    }

    /// Insert text (at specified character offset)
    pub fn insert(&mut self, char_offset: usize, text: &str) -> LineEdit {
        self.replace(char_offset, 0, text)
    }

    /// Delete text range (character offset)
    pub fn delete(&mut self, start_char: usize, len_chars: usize) -> LineEdit {
        self.replace(start_char, len_chars, "")
    }

    /// Replace the text of one line, keeping its terminator.
    pub fn set_line(&mut self, line: usize, text: &str) -> LineEdit {
        let line = line.min(self.line_count() - 1);
        let start = self.rope.line_to_char(line);
        let len = self.line(line).map_or(0, |t| t.chars().count());
        self.replace(start, len, text)
    }

    /// Insert whole lines before line `at` (`at >= line_count()` appends).
    ///
    /// Existing lines keep their revisions.
    pub fn insert_lines(&mut self, at: usize, lines: &[&str]) -> LineEdit {
        let line_count = self.line_count();
        let at = at.min(line_count);
        if lines.is_empty() {
            return LineEdit::changed(at..at);
        }

        let joined = lines.join("\n");
        if at == line_count {
            let end = self.rope.len_chars();
            self.rope.insert(end, &format!("\n{joined}"));
        } else {
            let start = self.rope.line_to_char(at);
            self.rope.insert(start, &format!("{joined}\n"));
        }

        let fresh: Vec<u64> = lines.iter().map(|_| self.bump_revision()).collect();
        self.revisions.splice(at..at, fresh);
        LineEdit::inserted(at, lines.len())
    }

    /// Remove whole lines in `range`.
    ///
    /// Removing every line leaves one empty line.
    pub fn remove_lines(&mut self, range: Range<usize>) -> LineEdit {
        let line_count = self.line_count();
        let start = range.start.min(line_count);
        let end = range.end.min(line_count);
        if start >= end {
            return LineEdit::changed(start..start);
        }

        if start == 0 && end == line_count {
            self.rope = Rope::new();
            self.revisions = vec![self.bump_revision()];
            return LineEdit::new(0, line_count, 1);
        }

        if end < line_count {
            let from = self.rope.line_to_char(start);
            let to = self.rope.line_to_char(end);
            self.rope.remove(from..to);
        } else {
            // Removing a tail also drops the terminator of the line before it.
            let from = self.rope.line_to_char(start) - 1;
            let to = self.rope.len_chars();
            self.rope.remove(from..to);
        }
        self.revisions.drain(start..end);
        LineEdit::removed(start..end)
    }

    fn bump_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for LineBuffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line: usize) -> Option<Cow<'_, str>> {
        self.line(line).map(Cow::Owned)
    }

    fn revision(&self, line: usize) -> u64 {
        self.revisions.get(line).copied().unwrap_or(0)
    }
}
