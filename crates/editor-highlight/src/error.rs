//! Error types.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while building a [`RuleTable`](crate::RuleTable) or loading a
/// [`Theme`](crate::Theme).
///
/// Every variant is raised at construction time. Once a table exists, highlighting a line
/// cannot fail.
pub enum RuleTableError {
    #[error("regex compile error for pattern '{pattern}': {source}")]
    /// A matcher failed to compile.
    Regex {
        /// The pattern source.
        pattern: String,
        /// The underlying compiler error.
        #[source]
        source: regex::Error,
    },

    #[error("rule #{index} has an empty pattern")]
    /// A single-line rule was given an empty pattern.
    EmptyPattern {
        /// Position of the rule in table order.
        index: usize,
    },

    #[error("rule pattern is empty")]
    /// [`Rule::new`](crate::Rule::new) was given an empty pattern outside of a table.
    EmptyRulePattern,

    #[error("pattern '{pattern}' has no capture group {group} (it has {available})")]
    /// A rule asked to style a capture group its pattern does not define.
    CaptureGroupOutOfRange {
        /// The pattern source.
        pattern: String,
        /// The requested group.
        group: usize,
        /// Number of groups in the pattern, including group 0.
        available: usize,
    },

    #[error("block delimiter '{0}' matches the empty string")]
    /// A block open/close matcher can match zero characters.
    EmptyDelimiter(String),

    #[error("invalid color '{0}' (expected #rrggbb)")]
    /// A theme color was not a `#rrggbb` hex string.
    InvalidColor(String),

    #[error("YAML parse error: {0}")]
    /// A rule-table or theme document could not be parsed.
    Yaml(#[from] serde_yaml::Error),
}
