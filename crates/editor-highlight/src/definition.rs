//! YAML rule-table definitions.
//!
//! ```yaml
//! name: toy
//! rules:
//!   - match: '\b(?:let|fn)\b'
//!     style: keyword
//!   - match: '\bfn\s+(\w+)'
//!     style: definition
//!     capture: 1
//! block:
//!   open: '/*'
//!   close: '*/'
//!   literal: true
//! ```

use crate::error::RuleTableError;
use crate::rules::{BlockRule, Rule, RuleTable};
use crate::style::{StyleTag, Theme};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
/// Raw YAML rule-table document.
pub struct RuleTableDefinition {
    #[serde(default)]
    /// Optional human-readable name.
    pub name: Option<String>,

    #[serde(default)]
    /// Single-line rules, in precedence order.
    pub rules: Vec<RuleDefinition>,

    /// The block delimiter pair.
    pub block: BlockDefinition,
}

#[derive(Debug, Clone, Deserialize)]
/// One single-line rule.
pub struct RuleDefinition {
    #[serde(rename = "match")]
    /// Regex source.
    pub pattern: String,

    /// Style applied to matches.
    pub style: StyleTag,

    #[serde(default)]
    /// Capture group to style instead of the whole match.
    pub capture: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
/// Block delimiter definition.
pub struct BlockDefinition {
    /// Opener (regex, or literal token when `literal` is set).
    pub open: String,

    #[serde(default)]
    /// Closer; defaults to the opener.
    pub close: Option<String>,

    #[serde(default)]
    /// Treat `open`/`close` as literal tokens rather than regexes.
    pub literal: bool,
}

impl RuleTableDefinition {
    /// Parse a definition without compiling it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleTableError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Compile and validate every matcher.
    pub fn compile(&self, theme: Theme) -> Result<RuleTable, RuleTableError> {
        let mut rules = Vec::with_capacity(self.rules.len());
        for (index, def) in self.rules.iter().enumerate() {
            if def.pattern.is_empty() {
                return Err(RuleTableError::EmptyPattern { index });
            }
            let rule = Rule::new(&def.pattern, def.style)?;
            rules.push(match def.capture {
                Some(group) => rule.with_capture_group(group)?,
                None => rule,
            });
        }

        let close = self.block.close.as_deref().unwrap_or(&self.block.open);
        let block = if self.block.literal {
            BlockRule::literal_pair(&self.block.open, close)?
        } else {
            BlockRule::new(&self.block.open, close)?
        };

        Ok(RuleTable::new(rules, block, theme))
    }
}

impl RuleTable {
    /// Parse and compile a YAML rule-table definition.
    pub fn from_yaml_str(yaml: &str, theme: Theme) -> Result<Self, RuleTableError> {
        RuleTableDefinition::from_yaml_str(yaml)?.compile(theme)
    }
}
