//! `editor-highlight-python` - The Python rule table for `editor-highlight`.
//!
//! Rules are listed in precedence order: strings are applied after keywords and numbers so a
//! keyword inside a string literal is overwritten, and comments come last. Triple-quoted strings
//! are the multi-line block.

use editor_highlight::{BlockRule, Highlighter, Rule, RuleTable, RuleTableError, StyleTag, Theme};
use std::cmp::Reverse;
use std::sync::Arc;

/// Reserved words styled as [`StyleTag::Keyword`].
pub const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Names styled as [`StyleTag::Builtin`].
pub const BUILTINS: &[&str] = &["self", "cls", "True", "False", "None"];

/// Operator symbols styled as [`StyleTag::Operator`].
pub const OPERATORS: &[&str] = &[
    "=", "==", "!=", "<", "<=", ">", ">=", "+", "-", "*", "/", "//", "%", "**", "+=", "-=", "*=",
    "/=", "//=", "%=", "**=", "&", "|", "^", "~", "<<", ">>", "&=", "|=", "^=", "<<=", ">>=", "->",
    ":=",
];

/// The multi-line string delimiter.
pub const TRIPLE_QUOTE: &str = "\"\"\"";

const BRACES: &str = r"[()\[\]{}]";
const DECORATOR: &str = r"^\s*(@[\w.]+)";
const NUMBER: &str = r"\b(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|[0-9][0-9_]*(?:\.[0-9_]+)?(?:[eE][+-]?[0-9]+)?j?)\b";
const DEFINITION: &str = r"\b(?:def|class)\s+(\w+)";
const DOUBLE_QUOTED: &str = r#""[^"\\]*(\\.[^"\\]*)*""#;
const SINGLE_QUOTED: &str = r"'[^'\\]*(\\.[^'\\]*)*'";
const COMMENT: &str = r"#.*";

/// `\b(?:word|word|...)\b`
fn word_alternation(words: &[&str]) -> String {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!(r"\b(?:{})\b", escaped.join("|"))
}

/// Alternation of literal symbols, longest first so `**=` is never split into `**` and `=`.
fn symbol_alternation(symbols: &[&str]) -> String {
    let mut sorted = symbols.to_vec();
    sorted.sort_by_key(|s| Reverse(s.len()));
    let escaped: Vec<String> = sorted.iter().map(|s| regex::escape(s)).collect();
    escaped.join("|")
}

/// Build the Python rule table with `theme`.
pub fn python_rule_table(theme: Theme) -> Result<RuleTable, RuleTableError> {
    let rules = vec![
        Rule::new(&word_alternation(KEYWORDS), StyleTag::Keyword)?,
        Rule::new(&word_alternation(BUILTINS), StyleTag::Builtin)?,
        Rule::new(&symbol_alternation(OPERATORS), StyleTag::Operator)?,
        Rule::new(BRACES, StyleTag::Brace)?,
        Rule::new(DECORATOR, StyleTag::Decorator)?.with_capture_group(1)?,
        Rule::new(NUMBER, StyleTag::Number)?,
        Rule::new(DEFINITION, StyleTag::Definition)?.with_capture_group(1)?,
        Rule::new(DOUBLE_QUOTED, StyleTag::String)?,
        Rule::new(SINGLE_QUOTED, StyleTag::String)?,
        Rule::new(COMMENT, StyleTag::Comment)?,
    ];
    Ok(RuleTable::new(rules, BlockRule::literal(TRIPLE_QUOTE)?, theme))
}

/// A ready [`Highlighter`] over the Python rule table.
pub fn python_highlighter(theme: Theme) -> Result<Highlighter, RuleTableError> {
    Ok(Highlighter::new(Arc::new(python_rule_table(theme)?)))
}
