//! Block-state propagation.
//!
//! [`Highlighter`] owns the [`HighlightCache`] and is the only thing that writes to it. After an
//! edit it re-lexes lines forward from the first changed line until a line's entry state and
//! revision both match the cache again (the fixed point), so a keystroke costs the edited lines
//! plus the run of lines whose block state actually flipped.

use crate::cache::{CacheEntry, HighlightCache};
use crate::lexer::{LexState, StyledSpan, highlight_line};
use crate::rules::RuleTable;
use crate::source::{LineEdit, LineSource};
use std::ops::Range;
use std::sync::Arc;

/// Lines re-lexed by one propagation pass, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepaintSet {
    lines: Vec<usize>,
}

impl RepaintSet {
    /// Re-lexed line indices, ascending.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Number of re-lexed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Check if `line` was re-lexed.
    pub fn contains(&self, line: usize) -> bool {
        self.lines.binary_search(&line).is_ok()
    }

    /// Smallest line range covering every re-lexed line.
    pub fn bounds(&self) -> Option<Range<usize>> {
        let first = *self.lines.first()?;
        let last = *self.lines.last()?;
        Some(first..last + 1)
    }

    fn push(&mut self, line: usize) {
        debug_assert!(self.lines.last().is_none_or(|&l| l < line));
        self.lines.push(line);
    }
}

/// Why a propagation pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    FixedPoint,
    LazyFrontier,
    EndOfDocument,
}

/// Incremental highlighter for one document.
#[derive(Debug, Clone)]
pub struct Highlighter {
    table: Arc<RuleTable>,
    cache: HighlightCache,
}

impl Highlighter {
    /// Create a highlighter with an empty cache.
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self {
            table,
            cache: HighlightCache::new(),
        }
    }

    /// The rule table in use.
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Read-only view of the cache.
    pub fn cache(&self) -> &HighlightCache {
        &self.cache
    }

    /// Swap the rule table. Every cached entry is dropped.
    pub fn set_table(&mut self, table: Arc<RuleTable>) {
        self.table = table;
        self.cache.clear();
    }

    /// Forget the document (e.g. on close or reload).
    pub fn close(&mut self) {
        self.cache.clear();
    }

    /// Cached entry for `line`.
    pub fn entry(&self, line: usize) -> Option<&CacheEntry> {
        self.cache.get(line)
    }

    /// Spans for `line`, in paint order. Empty if the line has not been highlighted yet.
    pub fn spans_for(&self, line: usize) -> &[StyledSpan] {
        self.cache.get(line).map_or(&[], |e| e.spans.as_slice())
    }

    /// Apply an edit notification and re-lex what it invalidated.
    ///
    /// `source` must already reflect the edit. Out-of-range indices are clamped to the
    /// document. Lines after the changed range are only visited while their entry state keeps
    /// changing; lines that were never highlighted are left for
    /// [`Highlighter::ensure_highlighted`]. Before the first highlight pass an edit only sizes
    /// the cache to the document.
    pub fn on_edit<S: LineSource + ?Sized>(&mut self, source: &S, edit: LineEdit) -> RepaintSet {
        let line_count = source.line_count();
        if self.cache.is_empty() {
            self.cache.resize(line_count);
            return RepaintSet::default();
        }
        let (mut edit, clamped) = edit.clamp(self.cache.len(), line_count);
        if clamped {
            tracing::debug!(?edit, line_count, "edit notification clamped to document");
        }

        if edit.line_delta() != 0 && self.cache.len() == line_count {
            // The cache already uses post-edit numbering (repeated or late notification).
            tracing::debug!(
                ?edit,
                line_count,
                "cache already renumbered; treating edit as a text change"
            );
            edit = LineEdit::changed(edit.changed_range());
        } else {
            self.cache.splice(edit);
        }
        if self.cache.len() != line_count {
            tracing::debug!(
                cache_len = self.cache.len(),
                line_count,
                "line count disagrees with edit notification; resizing cache"
            );
            self.cache.resize(line_count);
        }

        let start = edit.start;
        if start > 0 && self.cache.get(start - 1).is_none() {
            // Nothing at or after `start` has been shown yet.
            return RepaintSet::default();
        }
        self.propagate(source, start, edit.new_end)
    }

    /// Make sure every line before `lines.end` has a cache entry.
    ///
    /// Highlighting proceeds from the first line without an entry, since its entry state
    /// depends on every line above it. Call this for the viewport before painting.
    pub fn ensure_highlighted<S: LineSource + ?Sized>(
        &mut self,
        source: &S,
        lines: Range<usize>,
    ) -> RepaintSet {
        let line_count = source.line_count();
        if self.cache.len() != line_count {
            self.cache.resize(line_count);
        }
        let end = lines.end.min(line_count);
        match self.cache.first_missing(end) {
            Some(start) => self.propagate(source, start, end),
            None => RepaintSet::default(),
        }
    }

    /// Re-lex forward from `start`.
    ///
    /// Lines before `changed_end` are re-lexed whenever their revision or entry state is stale.
    /// Past it, the pass stops at the first line that is already up to date (fixed point) or
    /// was never highlighted (lazy frontier).
    fn propagate<S: LineSource + ?Sized>(
        &mut self,
        source: &S,
        start: usize,
        changed_end: usize,
    ) -> RepaintSet {
        let line_count = source.line_count();
        let mut repaint = RepaintSet::default();
        let mut entry_state = match start.checked_sub(1) {
            None => LexState::Outside,
            Some(prev) => self
                .cache
                .get(prev)
                .map_or(LexState::Outside, |e| e.exit_state),
        };

        let mut line = start;
        let reason = loop {
            if line >= line_count {
                break StopReason::EndOfDocument;
            }

            let revision = source.revision(line);
            match self.cache.get(line) {
                Some(cached) if cached.revision == revision && cached.entry_state == entry_state => {
                    if line >= changed_end {
                        break StopReason::FixedPoint;
                    }
                    entry_state = cached.exit_state;
                    line += 1;
                    continue;
                }
                None if line >= changed_end => break StopReason::LazyFrontier,
                _ => {}
            }

            let text = source.line_text(line).unwrap_or_default();
            let lexed = highlight_line(&self.table, &text, entry_state);
            tracing::trace!(line, ?entry_state, exit_state = ?lexed.exit_state, "re-lexed line");

            self.cache.put(
                line,
                CacheEntry {
                    revision,
                    entry_state,
                    exit_state: lexed.exit_state,
                    spans: lexed.spans,
                },
            );
            repaint.push(line);
            entry_state = lexed.exit_state;
            line += 1;
        };

        tracing::debug!(
            start,
            changed_end,
            stopped_at = line,
            ?reason,
            relexed = repaint.len(),
            "highlight pass complete"
        );
        repaint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;
    use crate::rules::BlockRule;
    use crate::style::{StyleTag, Theme};

    fn highlighter() -> Highlighter {
        let table = RuleTable::from_patterns(
            &[(r"\bif\b", StyleTag::Keyword, None)],
            BlockRule::literal("'''").unwrap(),
            Theme::default(),
        )
        .unwrap();
        Highlighter::new(Arc::new(table))
    }

    fn states(h: &Highlighter, lines: usize) -> Vec<(LexState, LexState)> {
        (0..lines)
            .map(|l| {
                let e = h.entry(l).expect("highlighted");
                (e.entry_state, e.exit_state)
            })
            .collect()
    }

    #[test]
    fn test_initial_pass_highlights_everything_requested() {
        let buffer = LineBuffer::from_text("a\n'''\nb\n'''\nc");
        let mut h = highlighter();
        let repaint = h.ensure_highlighted(&buffer, 0..5);
        assert_eq!(repaint.lines(), &[0, 1, 2, 3, 4]);

        use LexState::*;
        assert_eq!(
            states(&h, 5),
            vec![
                (Outside, Outside),
                (Outside, InsideBlock),
                (InsideBlock, InsideBlock),
                (InsideBlock, Outside),
                (Outside, Outside),
            ]
        );
    }

    #[test]
    fn test_ensure_is_lazy_and_incremental() {
        let buffer = LineBuffer::from_text("a\nb\nc\nd\ne\nf");
        let mut h = highlighter();
        assert_eq!(h.ensure_highlighted(&buffer, 0..2).lines(), &[0, 1]);
        assert!(h.entry(2).is_none());
        assert_eq!(h.ensure_highlighted(&buffer, 4..5).lines(), &[2, 3, 4]);
        assert!(h.ensure_highlighted(&buffer, 0..5).is_empty());
    }

    #[test]
    fn test_inserted_closed_block_stops_at_fixed_point() {
        let mut buffer = LineBuffer::from_text("a\nb\nc\nd\ne");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..5);

        let edit = buffer.insert_lines(1, &["'''", "x", "'''"]);
        let repaint = h.on_edit(&buffer, edit);
        assert_eq!(repaint.lines(), &[1, 2, 3]);
        assert_eq!(h.entry(2).map(|e| e.entry_state), Some(LexState::InsideBlock));
        assert_eq!(h.entry(4).map(|e| e.entry_state), Some(LexState::Outside));
    }

    #[test]
    fn test_unbalanced_opener_flips_to_end_of_document() {
        let mut buffer = LineBuffer::from_text("a\nb\nc\nd");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..4);

        let edit = buffer.set_line(1, "b '''");
        assert_eq!(h.on_edit(&buffer, edit).lines(), &[1, 2, 3]);
        assert!(
            (2..4).all(|l| h.entry(l).map(|e| e.entry_state) == Some(LexState::InsideBlock))
        );

        // Removing the opener flips everything back.
        let edit = buffer.set_line(1, "b");
        assert_eq!(h.on_edit(&buffer, edit).lines(), &[1, 2, 3]);
        assert_eq!(h.entry(3).map(|e| e.exit_state), Some(LexState::Outside));
    }

    #[test]
    fn test_edit_beyond_frontier_only_renumbers() {
        let mut buffer = LineBuffer::from_text("a\nb\nc\nd\ne");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..2);

        let edit = buffer.set_line(4, "if");
        assert!(h.on_edit(&buffer, edit).is_empty());
        assert!(h.entry(4).is_none());
    }

    #[test]
    fn test_out_of_range_edit_is_clamped() {
        let buffer = LineBuffer::from_text("a\nb");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..2);
        let repaint = h.on_edit(&buffer, LineEdit::changed(1..50));
        assert!(repaint.is_empty());
        assert_eq!(h.cache().len(), 2);
    }

    #[test]
    fn test_edit_before_first_pass_only_sizes_cache() {
        let mut buffer = LineBuffer::from_text("a\nb");
        let mut h = highlighter();

        let edit = buffer.insert_lines(0, &["'''", "if", "'''"]);
        assert!(h.on_edit(&buffer, edit).is_empty());
        assert_eq!(h.cache().len(), 5);
        assert!((0..5).all(|l| h.entry(l).is_none()));

        assert_eq!(h.ensure_highlighted(&buffer, 0..5).lines(), &[0, 1, 2, 3, 4]);
        assert_eq!(h.entry(1).map(|e| e.entry_state), Some(LexState::InsideBlock));
    }

    #[test]
    fn test_repeated_line_insert_notification_is_a_no_op() {
        let mut buffer = LineBuffer::from_text("a\nb\nc");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..3);

        let edit = buffer.insert_lines(1, &["if"]);
        assert_eq!(h.on_edit(&buffer, edit).lines(), &[1]);
        assert!(h.on_edit(&buffer, edit).is_empty());
        assert_eq!(h.cache().len(), 4);
        assert_eq!(h.spans_for(1).len(), 1);
    }

    #[test]
    fn test_set_table_drops_cache() {
        let buffer = LineBuffer::from_text("if");
        let mut h = highlighter();
        h.ensure_highlighted(&buffer, 0..1);
        assert_eq!(h.spans_for(0).len(), 1);

        let table = h.table().clone();
        h.set_table(Arc::new(table));
        assert!(h.spans_for(0).is_empty());
        assert_eq!(h.ensure_highlighted(&buffer, 0..1).lines(), &[0]);
    }

    #[test]
    fn test_repaint_set_bounds() {
        let mut set = RepaintSet::default();
        assert_eq!(set.bounds(), None);
        set.push(3);
        set.push(7);
        assert_eq!(set.bounds(), Some(3..8));
        assert!(set.contains(7) && !set.contains(5));
    }
}
