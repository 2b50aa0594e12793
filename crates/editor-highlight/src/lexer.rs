//! Per-line lexing.
//!
//! [`highlight_line`] is a pure function of a line's text and the block state in effect at its
//! first character. Offsets in the returned spans are **char offsets** within the line.

use crate::rules::{RuleTable, next_char_boundary};
use crate::style::StyleTag;

/// Lexical mode carried across line boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexState {
    /// Ordinary code.
    #[default]
    Outside,
    /// Inside an unterminated multi-line block.
    InsideBlock,
}

/// A styled, half-open character range `[start, start + len)` within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyledSpan {
    /// Start char offset.
    pub start: usize,
    /// Length in chars (always > 0).
    pub len: usize,
    /// Style category.
    pub tag: StyleTag,
}

impl StyledSpan {
    /// Create a span.
    pub fn new(start: usize, len: usize, tag: StyleTag) -> Self {
        Self { start, len, tag }
    }

    /// Exclusive end char offset.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Check if the span covers char offset `col`.
    pub fn contains(&self, col: usize) -> bool {
        self.start <= col && col < self.end()
    }
}

/// Output of [`highlight_line`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineHighlight {
    /// Spans in paint order: later spans win where they overlap earlier ones.
    pub spans: Vec<StyledSpan>,
    /// Block state after the last character.
    pub exit_state: LexState,
}

impl LineHighlight {
    /// Resolve overlaps into sorted, non-overlapping spans.
    ///
    /// Each character takes the tag of the last span (in paint order) that covers it; adjacent
    /// characters with the same tag are merged.
    pub fn flattened(&self) -> Vec<StyledSpan> {
        flatten_spans(&self.spans)
    }
}

/// Resolve overlapping spans (last wins) into sorted, non-overlapping spans.
pub fn flatten_spans(spans: &[StyledSpan]) -> Vec<StyledSpan> {
    let width = spans.iter().map(StyledSpan::end).max().unwrap_or(0);
    let mut cells: Vec<Option<StyleTag>> = vec![None; width];
    for span in spans {
        for cell in &mut cells[span.start..span.end()] {
            *cell = Some(span.tag);
        }
    }

    let mut out: Vec<StyledSpan> = Vec::new();
    for (col, cell) in cells.into_iter().enumerate() {
        let Some(tag) = cell else {
            continue;
        };
        if let Some(last) = out.last_mut()
            && last.tag == tag
            && last.end() == col
        {
            last.len += 1;
            continue;
        }
        out.push(StyledSpan::new(col, 1, tag));
    }
    out
}

/// Span in byte offsets, used while matching.
#[derive(Debug, Clone, Copy)]
struct ByteSpan {
    start: usize,
    end: usize,
    tag: StyleTag,
}

/// Lex one line.
///
/// 1. Inside a block, the line is block content up to (and including) the first closer; with
///    no closer the whole line is block content and the state stays `InsideBlock`.
/// 2. Every single-line rule runs over the rest of the line, in table order.
/// 3. Block openers not lying strictly inside a step-2 span start block spans, closed on the
///    same line when possible; an unclosed opener runs to end of line and the line exits
///    `InsideBlock`.
///
/// Cost is linear in the line length for each rule in the table.
pub fn highlight_line(table: &RuleTable, text: &str, entry_state: LexState) -> LineHighlight {
    let block = table.block();
    let mut block_spans: Vec<ByteSpan> = Vec::new();
    let mut cursor = 0usize;

    if entry_state == LexState::InsideBlock {
        match block.find_close(text, 0) {
            Some((_, end)) => {
                block_spans.push(ByteSpan {
                    start: 0,
                    end,
                    tag: StyleTag::Block,
                });
                cursor = end;
            }
            None => {
                let columns = CharColumns::new(text);
                let spans = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![columns.span(0, text.len(), StyleTag::Block)]
                };
                return LineHighlight {
                    spans,
                    exit_state: LexState::InsideBlock,
                };
            }
        }
    }

    let mut rule_spans = RuleSpans::apply(table, text, cursor);

    let mut exit_state = LexState::Outside;
    let mut pos = cursor;
    let mut masks = rule_spans.strict_cover();
    while let Some((open_start, open_end)) = block.find_open(text, pos) {
        if masks.covers(open_start) {
            pos = next_char_boundary(text, open_start);
            if pos > text.len() {
                break;
            }
            continue;
        }
        match block.find_close(text, open_end) {
            Some((_, close_end)) => {
                block_spans.push(ByteSpan {
                    start: open_start,
                    end: close_end,
                    tag: StyleTag::Block,
                });
                pos = close_end;
            }
            None => {
                block_spans.push(ByteSpan {
                    start: open_start,
                    end: text.len(),
                    tag: StyleTag::Block,
                });
                exit_state = LexState::InsideBlock;
                break;
            }
        }
    }

    // Block spans are ascending and disjoint.
    rule_spans.drop_covered(&block_spans);

    let columns = CharColumns::new(text);
    let mut spans = Vec::with_capacity(rule_spans.spans.len() + block_spans.len());
    spans.extend(
        rule_spans
            .painted()
            .map(|s| columns.span(s.start, s.end, s.tag)),
    );
    // Block spans go last so they paint over any partially overlapping rule span.
    spans.extend(
        block_spans
            .iter()
            .map(|b| columns.span(b.start, b.end, b.tag)),
    );

    LineHighlight { spans, exit_state }
}

/// Rule matches of one line, in paint order, with a second ordering by start offset.
///
/// A later span removes every earlier span it fully covers. Matches of a single rule are
/// ascending and disjoint, so an earlier span can only be covered by the last match starting at
/// or before it; each rule costs one merge walk over the spans still alive.
struct RuleSpans {
    /// Every span ever added, in paint order.
    spans: Vec<ByteSpan>,
    /// Parallel to `spans`: false once the span is covered.
    alive: Vec<bool>,
    /// Indices of alive spans, sorted by start offset.
    by_start: Vec<usize>,
}

impl RuleSpans {
    fn apply(table: &RuleTable, text: &str, cursor: usize) -> Self {
        let mut out = Self {
            spans: Vec::new(),
            alive: Vec::new(),
            by_start: Vec::new(),
        };
        let mut matches: Vec<ByteSpan> = Vec::new();
        for rule in table.rules() {
            matches.clear();
            let mut pos = cursor;
            while pos <= text.len() {
                let Some((match_end, styled)) = rule.find_at(text, pos) else {
                    break;
                };
                if let Some((start, end)) = styled
                    && end > start
                {
                    matches.push(ByteSpan {
                        start,
                        end,
                        tag: rule.tag(),
                    });
                }
                pos = if match_end > pos {
                    match_end
                } else {
                    next_char_boundary(text, pos)
                };
            }
            if !matches.is_empty() {
                out.drop_covered(&matches);
                out.push_sorted(&matches);
            }
        }
        out
    }

    /// Mark dead every alive span fully inside one of `cover` (ascending, disjoint).
    fn drop_covered(&mut self, cover: &[ByteSpan]) {
        if cover.is_empty() {
            return;
        }
        let mut c = 0;
        for &idx in &self.by_start {
            let s = self.spans[idx];
            while c + 1 < cover.len() && cover[c + 1].start <= s.start {
                c += 1;
            }
            if cover[c].start <= s.start && s.end <= cover[c].end {
                self.alive[idx] = false;
            }
        }
        let alive = &self.alive;
        self.by_start.retain(|&idx| alive[idx]);
    }

    /// Append `added` (ascending by start) and merge it into `by_start`.
    fn push_sorted(&mut self, added: &[ByteSpan]) {
        let first = self.spans.len();
        self.spans.extend_from_slice(added);
        self.alive.resize(self.spans.len(), true);

        let spans = &self.spans;
        let mut merged = Vec::with_capacity(self.by_start.len() + added.len());
        let mut old = self.by_start.iter().copied().peekable();
        let mut new = (first..spans.len()).peekable();
        loop {
            let next = match (old.peek(), new.peek()) {
                (Some(&a), Some(&b)) if spans[a].start <= spans[b].start => old.next(),
                (_, Some(_)) => new.next(),
                (Some(_), None) => old.next(),
                (None, None) => break,
            };
            merged.extend(next);
        }
        self.by_start = merged;
    }

    fn strict_cover(&self) -> StrictCover<'_> {
        StrictCover {
            spans: &self.spans,
            by_start: &self.by_start,
            next: 0,
            reach: 0,
        }
    }

    /// Alive spans in paint order.
    fn painted(&self) -> impl Iterator<Item = &ByteSpan> {
        self.spans
            .iter()
            .zip(&self.alive)
            .filter_map(|(s, &alive)| alive.then_some(s))
    }
}

/// Answers "does some span contain this offset strictly inside it" for ascending offsets.
struct StrictCover<'a> {
    spans: &'a [ByteSpan],
    by_start: &'a [usize],
    next: usize,
    /// Furthest end among spans starting before the last queried offset.
    reach: usize,
}

impl StrictCover<'_> {
    fn covers(&mut self, offset: usize) -> bool {
        while let Some(&idx) = self.by_start.get(self.next) {
            let s = self.spans[idx];
            if s.start >= offset {
                break;
            }
            self.reach = self.reach.max(s.end);
            self.next += 1;
        }
        self.reach > offset
    }
}

/// Byte-to-char offset conversion for a single line.
struct CharColumns {
    /// Byte offset of every char boundary; empty for ASCII lines (identity mapping).
    boundaries: Vec<usize>,
}

impl CharColumns {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                boundaries: Vec::new(),
            };
        }
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    fn column(&self, byte: usize) -> usize {
        if self.boundaries.is_empty() {
            return byte;
        }
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }

    fn span(&self, start: usize, end: usize, tag: StyleTag) -> StyledSpan {
        let start_col = self.column(start);
        StyledSpan::new(start_col, self.column(end) - start_col, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::BlockRule;
    use crate::style::Theme;

    fn table() -> RuleTable {
        RuleTable::from_patterns(
            &[
                (r"\b(?:if|else|def)\b", StyleTag::Keyword, None),
                (r"\b[0-9]+\b", StyleTag::Number, None),
                (r#""[^"\\]*(\\.[^"\\]*)*""#, StyleTag::String, None),
                (r"#.*", StyleTag::Comment, None),
            ],
            BlockRule::literal("\"\"\"").unwrap(),
            Theme::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_plain_line_exits_outside() {
        let out = highlight_line(&table(), "if x1 else 2", LexState::Outside);
        assert_eq!(out.exit_state, LexState::Outside);
        assert_eq!(
            out.spans,
            vec![
                StyledSpan::new(0, 2, StyleTag::Keyword),
                StyledSpan::new(6, 4, StyleTag::Keyword),
                StyledSpan::new(11, 1, StyleTag::Number),
            ]
        );
    }

    #[test]
    fn test_unterminated_opener_enters_block() {
        let out = highlight_line(&table(), "x = \"\"\"doc", LexState::Outside);
        assert_eq!(out.exit_state, LexState::InsideBlock);
        assert_eq!(out.spans, vec![StyledSpan::new(4, 6, StyleTag::Block)]);
    }

    #[test]
    fn test_block_closed_on_same_line() {
        let out = highlight_line(&table(), "\"\"\"a\"\"\" 7", LexState::Outside);
        assert_eq!(out.exit_state, LexState::Outside);
        assert_eq!(
            out.spans,
            vec![
                StyledSpan::new(8, 1, StyleTag::Number),
                StyledSpan::new(0, 7, StyleTag::Block),
            ]
        );
    }

    #[test]
    fn test_inside_block_without_closer_covers_line() {
        let out = highlight_line(&table(), "if 1 # nope", LexState::InsideBlock);
        assert_eq!(out.exit_state, LexState::InsideBlock);
        assert_eq!(out.spans, vec![StyledSpan::new(0, 11, StyleTag::Block)]);
    }

    #[test]
    fn test_empty_line_keeps_state() {
        let t = table();
        let inside = highlight_line(&t, "", LexState::InsideBlock);
        assert_eq!(
            inside,
            LineHighlight {
                spans: Vec::new(),
                exit_state: LexState::InsideBlock,
            }
        );
        let outside = highlight_line(&t, "", LexState::Outside);
        assert_eq!(outside, LineHighlight::default());
    }

    #[test]
    fn test_opener_inside_comment_is_ignored() {
        let out = highlight_line(&table(), "x # \"\"\" not a block", LexState::Outside);
        assert_eq!(out.exit_state, LexState::Outside);
        assert_eq!(out.spans, vec![StyledSpan::new(2, 17, StyleTag::Comment)]);
    }

    #[test]
    fn test_later_rule_wins_on_identical_position() {
        let t = RuleTable::from_patterns(
            &[
                (r"\bdef\b", StyleTag::Keyword, None),
                (r"\bdef\b", StyleTag::Builtin, None),
            ],
            BlockRule::literal("\"\"\"").unwrap(),
            Theme::default(),
        )
        .unwrap();
        let out = highlight_line(&t, "def", LexState::Outside);
        assert_eq!(out.spans, vec![StyledSpan::new(0, 3, StyleTag::Builtin)]);
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let out = highlight_line(&table(), "é = 12 # ü", LexState::Outside);
        assert_eq!(
            out.spans,
            vec![
                StyledSpan::new(4, 2, StyleTag::Number),
                StyledSpan::new(7, 3, StyleTag::Comment),
            ]
        );
    }

    #[test]
    fn test_flattened_last_span_wins() {
        let line = LineHighlight {
            spans: vec![
                StyledSpan::new(0, 6, StyleTag::String),
                StyledSpan::new(3, 5, StyleTag::Comment),
            ],
            exit_state: LexState::Outside,
        };
        assert_eq!(
            line.flattened(),
            vec![
                StyledSpan::new(0, 3, StyleTag::String),
                StyledSpan::new(3, 5, StyleTag::Comment),
            ]
        );
    }

    /// Per-match retain and per-opener scans: the direct reading of the lexing rules.
    fn direct_highlight(table: &RuleTable, text: &str, entry_state: LexState) -> LineHighlight {
        let block = table.block();
        let mut block_spans: Vec<ByteSpan> = Vec::new();
        let mut cursor = 0;
        if entry_state == LexState::InsideBlock {
            match block.find_close(text, 0) {
                Some((_, end)) => {
                    block_spans.push(ByteSpan { start: 0, end, tag: StyleTag::Block });
                    cursor = end;
                }
                None => return highlight_line(table, text, entry_state),
            }
        }
        let mut rule_spans: Vec<ByteSpan> = Vec::new();
        for rule in table.rules() {
            let mut pos = cursor;
            while pos <= text.len() {
                let Some((match_end, styled)) = rule.find_at(text, pos) else {
                    break;
                };
                if let Some((start, end)) = styled
                    && end > start
                {
                    rule_spans.retain(|s| !(start <= s.start && s.end <= end));
                    rule_spans.push(ByteSpan { start, end, tag: rule.tag() });
                }
                pos = if match_end > pos { match_end } else { next_char_boundary(text, pos) };
            }
        }
        let mut exit_state = LexState::Outside;
        let mut pos = cursor;
        while let Some((open_start, open_end)) = block.find_open(text, pos) {
            if rule_spans.iter().any(|s| s.start < open_start && open_start < s.end) {
                pos = next_char_boundary(text, open_start);
                if pos > text.len() {
                    break;
                }
                continue;
            }
            let close = block.find_close(text, open_end);
            let end = close.map_or(text.len(), |(_, close_end)| close_end);
            block_spans.push(ByteSpan { start: open_start, end, tag: StyleTag::Block });
            if close.is_none() {
                exit_state = LexState::InsideBlock;
                break;
            }
            pos = end;
        }
        let columns = CharColumns::new(text);
        let mut spans: Vec<StyledSpan> = rule_spans
            .iter()
            .filter(|s| !block_spans.iter().any(|b| b.start <= s.start && s.end <= b.end))
            .map(|s| columns.span(s.start, s.end, s.tag))
            .collect();
        spans.extend(block_spans.iter().map(|b| columns.span(b.start, b.end, b.tag)));
        LineHighlight { spans, exit_state }
    }

    #[test]
    fn test_matches_direct_lexing_on_random_lines() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let t = RuleTable::from_patterns(
            &[
                (r"\b(?:if|else)\b", StyleTag::Keyword, None),
                (r"\b[0-9]+\b", StyleTag::Number, None),
                (r"[+=]", StyleTag::Operator, None),
                (r"(\w+)\(", StyleTag::Definition, Some(1)),
                (r#""[^"\\]*(\\.[^"\\]*)*""#, StyleTag::String, None),
                (r"if \w+", StyleTag::Builtin, None),
                (r"#.*", StyleTag::Comment, None),
            ],
            BlockRule::literal("\"\"\"").unwrap(),
            Theme::default(),
        )
        .unwrap();
        let tokens = [
            "if", "else", " ", "x", "12", "+", "=", "\"", "\"\"\"", "#", "é", "\\", "f(",
        ];
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2000 {
            let len = rng.gen_range(0..24);
            let text: String = (0..len)
                .map(|_| tokens[rng.gen_range(0..tokens.len())])
                .collect();
            for state in [LexState::Outside, LexState::InsideBlock] {
                assert_eq!(
                    highlight_line(&t, &text, state),
                    direct_highlight(&t, &text, state),
                    "{text:?} from {state:?}"
                );
            }
        }
    }

    #[test]
    fn test_long_line_span_counts() {
        let t = table();
        let numbers = "1 ".repeat(5000);
        assert_eq!(highlight_line(&t, &numbers, LexState::Outside).spans.len(), 5000);

        let blocks = "\"\"\"x\"\"\" ".repeat(5000);
        let out = highlight_line(&t, &blocks, LexState::Outside);
        assert_eq!(out.exit_state, LexState::Outside);
        assert_eq!(out.spans.len(), 5000);
        assert!(out.spans.iter().all(|s| s.tag == StyleTag::Block && s.len == 7));
    }

    #[test]
    fn test_deterministic() {
        let t = table();
        for text in ["", "if \"\"\" x", "\"\"\"", "end \"\"\" 3 # c", "é\"\"\"ü\"\"\""] {
            for state in [LexState::Outside, LexState::InsideBlock] {
                assert_eq!(highlight_line(&t, text, state), highlight_line(&t, text, state));
            }
        }
    }
}
