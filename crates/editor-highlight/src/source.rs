//! The host-buffer side of the highlighter.
//!
//! The highlighter never owns document text. It reads lines through [`LineSource`] and learns
//! about changes through [`LineEdit`] values handed to
//! [`Highlighter::on_edit`](crate::Highlighter::on_edit).

use std::borrow::Cow;
use std::ops::Range;

/// Read access to a line-oriented document.
pub trait LineSource {
    /// Number of lines (an empty document has one empty line).
    fn line_count(&self) -> usize;

    /// Text of `line` without its line terminator, or `None` past the end.
    fn line_text(&self, line: usize) -> Option<Cow<'_, str>>;

    /// Revision stamp of `line`.
    ///
    /// Must change whenever the line's text changes. The highlighter never compares text,
    /// only revisions.
    fn revision(&self, line: usize) -> u64;
}

impl<T: LineSource + ?Sized> LineSource for &T {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn line_text(&self, line: usize) -> Option<Cow<'_, str>> {
        (**self).line_text(line)
    }

    fn revision(&self, line: usize) -> u64 {
        (**self).revision(line)
    }
}

/// An edit notification in line coordinates.
///
/// Semantics:
/// - lines `[start, old_end)` of the document **before** the edit were replaced by lines
///   `[start, new_end)` of the document **after** the edit;
/// - lines at and after `old_end` keep their content and are renumbered by
///   [`LineEdit::line_delta`].
///
/// A text change that does not add or remove lines has `old_end == new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineEdit {
    /// First affected line.
    pub start: usize,
    /// Exclusive end of the affected lines, pre-edit numbering.
    pub old_end: usize,
    /// Exclusive end of the affected lines, post-edit numbering.
    pub new_end: usize,
}

impl LineEdit {
    /// Create an edit from its three line indices.
    pub fn new(start: usize, old_end: usize, new_end: usize) -> Self {
        Self {
            start,
            old_end: old_end.max(start),
            new_end: new_end.max(start),
        }
    }

    /// Lines in `range` changed text; no lines were added or removed.
    pub fn changed(range: Range<usize>) -> Self {
        Self::new(range.start, range.end, range.end)
    }

    /// `count` new lines were inserted before line `at`.
    pub fn inserted(at: usize, count: usize) -> Self {
        Self::new(at, at, at + count)
    }

    /// Lines in `range` were removed.
    pub fn removed(range: Range<usize>) -> Self {
        Self::new(range.start, range.end, range.start)
    }

    /// Lines whose text must be re-read, post-edit numbering.
    pub fn changed_range(&self) -> Range<usize> {
        self.start..self.new_end
    }

    /// Change in line count caused by this edit.
    pub fn line_delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    /// Clamp to the pre-edit (`old_len`) and post-edit (`new_len`) line counts.
    ///
    /// Returns the clamped edit and whether anything had to be adjusted.
    pub fn clamp(self, old_len: usize, new_len: usize) -> (Self, bool) {
        let start = self.start.min(old_len).min(new_len);
        let clamped = Self::new(start, self.old_end.min(old_len), self.new_end.min(new_len));
        (clamped, clamped != self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(LineEdit::changed(3..5), LineEdit::new(3, 5, 5));
        assert_eq!(LineEdit::inserted(2, 4).changed_range(), 2..6);
        assert_eq!(LineEdit::inserted(2, 4).line_delta(), 4);
        assert_eq!(LineEdit::removed(2..5).line_delta(), -3);
        assert!(LineEdit::removed(2..5).changed_range().is_empty());
    }

    #[test]
    fn test_clamp() {
        let (edit, adjusted) = LineEdit::changed(8..12).clamp(10, 10);
        assert!(adjusted);
        assert_eq!(edit, LineEdit::new(8, 10, 10));

        let (edit, adjusted) = LineEdit::changed(20..25).clamp(10, 10);
        assert!(adjusted);
        assert_eq!(edit, LineEdit::new(10, 10, 10));

        let (_, adjusted) = LineEdit::inserted(3, 2).clamp(10, 12);
        assert!(!adjusted);
    }
}
