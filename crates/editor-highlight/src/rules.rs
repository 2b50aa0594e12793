//! The rule table: ordered single-line rules plus one block delimiter pair.
//!
//! Every matcher is compiled and validated when the table is built. The `regex` crate matches
//! in time linear in the haystack, so per-line matching can neither fail nor backtrack.

use crate::error::RuleTableError;
use crate::style::{StyleTag, Theme};
use regex::Regex;
use std::sync::Arc;

/// A single-line highlighting rule.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    tag: StyleTag,
    capture_group: Option<usize>,
}

impl Rule {
    /// Compile a rule that styles each whole match with `tag`.
    ///
    /// An empty pattern is rejected with [`RuleTableError::EmptyRulePattern`].
    pub fn new(pattern: &str, tag: StyleTag) -> Result<Self, RuleTableError> {
        if pattern.is_empty() {
            return Err(RuleTableError::EmptyRulePattern);
        }
        Ok(Self {
            regex: compile(pattern)?,
            tag,
            capture_group: None,
        })
    }

    /// Style only a capture group of each match.
    ///
    /// Example (declaration name):
    /// - pattern: `\bdef\s+(\w+)`
    /// - capture_group: `1` (the name)
    pub fn with_capture_group(mut self, group: usize) -> Result<Self, RuleTableError> {
        let available = self.regex.captures_len();
        if group >= available {
            return Err(RuleTableError::CaptureGroupOutOfRange {
                pattern: self.regex.as_str().to_string(),
                group,
                available,
            });
        }
        self.capture_group = Some(group);
        Ok(self)
    }

    /// Style tag applied to matches.
    pub fn tag(&self) -> StyleTag {
        self.tag
    }

    /// Pattern source.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Capture group styled by this rule, if not the whole match.
    pub fn capture_group(&self) -> Option<usize> {
        self.capture_group
    }

    /// Find the next match at or after byte `from`.
    ///
    /// Returns `(match_end, styled_range)`. `match_end` is where scanning resumes; the styled
    /// range is `None` when the configured group did not participate in the match.
    pub(crate) fn find_at(
        &self,
        text: &str,
        from: usize,
    ) -> Option<(usize, Option<(usize, usize)>)> {
        match self.capture_group {
            None => self
                .regex
                .find_at(text, from)
                .map(|m| (m.end(), Some((m.start(), m.end())))),
            Some(group) => {
                let caps = self.regex.captures_at(text, from)?;
                let whole = caps.get(0)?;
                Some((whole.end(), caps.get(group).map(|m| (m.start(), m.end()))))
            }
        }
    }
}

/// The multi-line block delimiter pair (for example a triple quote).
#[derive(Debug, Clone)]
pub struct BlockRule {
    open: Regex,
    close: Regex,
}

impl BlockRule {
    /// Compile an opener/closer pair. Neither may match the empty string.
    pub fn new(open: &str, close: &str) -> Result<Self, RuleTableError> {
        Ok(Self {
            open: compile_delimiter(open)?,
            close: compile_delimiter(close)?,
        })
    }

    /// A block that opens and closes with the same literal token.
    pub fn literal(token: &str) -> Result<Self, RuleTableError> {
        let pattern = regex::escape(token);
        Self::new(&pattern, &pattern)
    }

    /// A block with distinct literal opener and closer tokens.
    pub fn literal_pair(open: &str, close: &str) -> Result<Self, RuleTableError> {
        Self::new(&regex::escape(open), &regex::escape(close))
    }

    /// Opener pattern source.
    pub fn open_pattern(&self) -> &str {
        self.open.as_str()
    }

    /// Closer pattern source.
    pub fn close_pattern(&self) -> &str {
        self.close.as_str()
    }

    pub(crate) fn find_open(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        find_nonempty(&self.open, text, from)
    }

    pub(crate) fn find_close(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        find_nonempty(&self.close, text, from)
    }
}

/// An ordered, immutable set of rules, validated once at construction.
///
/// Rule order is precedence order: when spans overlap, the later rule wins. Block spans win
/// over every single-line rule.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    block: BlockRule,
    theme: Arc<Theme>,
}

impl RuleTable {
    /// Build a table from compiled rules.
    pub fn new(rules: Vec<Rule>, block: BlockRule, theme: Theme) -> Self {
        Self {
            rules,
            block,
            theme: Arc::new(theme),
        }
    }

    /// Build a table from `(pattern, tag, capture_group)` triples.
    ///
    /// The first malformed entry aborts construction.
    pub fn from_patterns(
        patterns: &[(&str, StyleTag, Option<usize>)],
        block: BlockRule,
        theme: Theme,
    ) -> Result<Self, RuleTableError> {
        let mut rules = Vec::with_capacity(patterns.len());
        for (index, (pattern, tag, group)) in patterns.iter().enumerate() {
            if pattern.is_empty() {
                return Err(RuleTableError::EmptyPattern { index });
            }
            let rule = Rule::new(pattern, *tag)?;
            rules.push(match group {
                Some(group) => rule.with_capture_group(*group)?,
                None => rule,
            });
        }
        Ok(Self::new(rules, block, theme))
    }

    /// Single-line rules, in precedence order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The block delimiter pair.
    pub fn block(&self) -> &BlockRule {
        &self.block
    }

    /// The theme this table was built with.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

fn compile(pattern: &str) -> Result<Regex, RuleTableError> {
    Regex::new(pattern).map_err(|source| RuleTableError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_delimiter(pattern: &str) -> Result<Regex, RuleTableError> {
    let regex = compile(pattern)?;
    if pattern.is_empty() || regex.is_match("") {
        return Err(RuleTableError::EmptyDelimiter(pattern.to_string()));
    }
    Ok(regex)
}

/// First non-empty match at or after byte `from`.
fn find_nonempty(regex: &Regex, text: &str, mut from: usize) -> Option<(usize, usize)> {
    while from <= text.len() {
        let m = regex.find_at(text, from)?;
        if m.end() > m.start() {
            return Some((m.start(), m.end()));
        }
        from = next_char_boundary(text, m.end());
    }
    None
}

/// The byte offset of the char after the one starting at `pos` (or past the end).
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_pattern_rejected_at_construction() {
        let err = RuleTable::from_patterns(
            &[
                (r"\bif\b", StyleTag::Keyword, None),
                (r"(unclosed", StyleTag::Brace, None),
            ],
            BlockRule::literal("\"\"\"").unwrap(),
            Theme::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RuleTableError::Regex { .. }));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = RuleTable::from_patterns(
            &[("", StyleTag::Keyword, None)],
            BlockRule::literal("\"\"\"").unwrap(),
            Theme::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RuleTableError::EmptyPattern { index: 0 }));
    }

    #[test]
    fn test_empty_pattern_rejected_by_rule_new() {
        let err = Rule::new("", StyleTag::Keyword).unwrap_err();
        assert!(matches!(err, RuleTableError::EmptyRulePattern));
        assert!(Rule::new("x*", StyleTag::Keyword).is_ok());
    }

    #[test]
    fn test_capture_group_out_of_range_rejected() {
        let err = Rule::new(r"\bdef\s+(\w+)", StyleTag::Definition)
            .unwrap()
            .with_capture_group(2)
            .unwrap_err();
        assert!(matches!(
            err,
            RuleTableError::CaptureGroupOutOfRange {
                group: 2,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        assert!(matches!(
            BlockRule::new("x*", "y").unwrap_err(),
            RuleTableError::EmptyDelimiter(_)
        ));
        assert!(BlockRule::literal("").is_err());
    }

    #[test]
    fn test_literal_block_escapes_token() {
        let block = BlockRule::literal_pair("/*", "*/").unwrap();
        assert_eq!(block.find_open("a /* b", 0), Some((2, 4)));
        assert_eq!(block.find_close("a */", 0), Some((2, 4)));
    }

    #[test]
    fn test_capture_group_find_at() {
        let rule = Rule::new(r"\bclass\s+(\w+)", StyleTag::Definition)
            .unwrap()
            .with_capture_group(1)
            .unwrap();
        assert_eq!(rule.find_at("class Foo:", 0), Some((9, Some((6, 9)))));
        assert_eq!(rule.find_at("class Foo:", 1), None);
    }

    #[test]
    fn test_next_char_boundary_multibyte() {
        let text = "é!";
        assert_eq!(next_char_boundary(text, 0), 2);
        assert_eq!(next_char_boundary(text, 2), 3);
        assert_eq!(next_char_boundary(text, 3), 4);
    }
}
