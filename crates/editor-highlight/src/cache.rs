//! Per-line highlight cache.

use crate::lexer::{LexState, StyledSpan};
use crate::source::LineEdit;
use std::ops::Range;

/// Cached lexing result of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Revision of the line text the spans were computed from.
    pub revision: u64,
    /// Block state at the first character.
    pub entry_state: LexState,
    /// Block state after the last character.
    pub exit_state: LexState,
    /// Spans in paint order.
    pub spans: Vec<StyledSpan>,
}

/// Line-indexed cache of [`CacheEntry`] values.
///
/// Entries are created lazily; `None` means the line has not been highlighted since it was
/// created or invalidated.
#[derive(Debug, Clone, Default)]
pub struct HighlightCache {
    entries: Vec<Option<CacheEntry>>,
}

impl HighlightCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of line slots (highlighted or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache tracks no lines.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `line`, if it has been highlighted.
    pub fn get(&self, line: usize) -> Option<&CacheEntry> {
        self.entries.get(line).and_then(Option::as_ref)
    }

    /// Store the entry for `line`, growing the cache if needed.
    pub fn put(&mut self, line: usize, entry: CacheEntry) {
        if line >= self.entries.len() {
            self.entries.resize(line + 1, None);
        }
        self.entries[line] = Some(entry);
    }

    /// Drop the entries in `range` (clamped), keeping their slots.
    pub fn invalidate(&mut self, range: Range<usize>) {
        let end = range.end.min(self.entries.len());
        let start = range.start.min(end);
        for slot in &mut self.entries[start..end] {
            *slot = None;
        }
    }

    /// Renumber slots for a line insertion/deletion.
    ///
    /// Slots at the tail of the edited region are destroyed (lines removed) or empty slots are
    /// added there (lines inserted); later slots shift by the edit's line delta. Slots that
    /// survive inside the region keep their entries, which revision checks will mark stale.
    pub fn splice(&mut self, edit: LineEdit) {
        let old_end = edit.old_end.min(self.entries.len());
        let start = edit.start.min(old_end);
        let old_count = old_end - start;
        let new_count = edit.new_end.saturating_sub(edit.start);

        if new_count > old_count {
            self.entries.splice(
                old_end..old_end,
                std::iter::repeat_n(None, new_count - old_count),
            );
        } else {
            self.entries.drain(start + new_count..old_end);
        }
    }

    /// Set the number of line slots, dropping or adding empty slots at the end.
    pub fn resize(&mut self, line_count: usize) {
        self.entries.resize(line_count, None);
    }

    /// First line before `end` that has no entry.
    pub fn first_missing(&self, end: usize) -> Option<usize> {
        let end = end.min(self.entries.len());
        self.entries[..end].iter().position(Option::is_none)
    }

    /// Drop every entry (document closed or rule table replaced).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
