//! Style tags and themes.
//!
//! Spans only carry a [`StyleTag`]. Mapping a tag to an appearance is done through a
//! [`Theme`], an immutable value handed to the rule table when it is built.

use crate::error::RuleTableError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lexical category of a styled span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    /// Reserved word (`if`, `def`, `return`, ...).
    Keyword,
    /// Built-in name or receiver (`self`, `True`, `None`, ...).
    Builtin,
    /// Operator symbol.
    Operator,
    /// Bracket or brace.
    Brace,
    /// Decorator / annotation.
    Decorator,
    /// Name introduced by a declaration (`def name`, `class Name`).
    Definition,
    /// Numeric literal.
    Number,
    /// Single-line string literal.
    String,
    /// Comment to end of line.
    Comment,
    /// Content of a multi-line block (including its delimiters).
    Block,
}

impl StyleTag {
    /// All tags, in declaration order.
    pub const ALL: [StyleTag; 10] = [
        StyleTag::Keyword,
        StyleTag::Builtin,
        StyleTag::Operator,
        StyleTag::Brace,
        StyleTag::Decorator,
        StyleTag::Definition,
        StyleTag::Number,
        StyleTag::String,
        StyleTag::Comment,
        StyleTag::Block,
    ];

    /// Stable lowercase name (matches the YAML spelling).
    pub fn name(self) -> &'static str {
        match self {
            StyleTag::Keyword => "keyword",
            StyleTag::Builtin => "builtin",
            StyleTag::Operator => "operator",
            StyleTag::Brace => "brace",
            StyleTag::Decorator => "decorator",
            StyleTag::Definition => "definition",
            StyleTag::Number => "number",
            StyleTag::String => "string",
            StyleTag::Comment => "comment",
            StyleTag::Block => "block",
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An sRGB color, written as `#rrggbb` in theme files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = RuleTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuleTableError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = RuleTableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Appearance of one style tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TextStyle {
    /// Text color.
    pub foreground: Rgb,
    #[serde(default)]
    /// Bold weight.
    pub bold: bool,
    #[serde(default)]
    /// Italic slant.
    pub italic: bool,
}

impl TextStyle {
    /// A plain (non-bold, non-italic) style.
    pub const fn plain(foreground: Rgb) -> Self {
        Self {
            foreground,
            bold: false,
            italic: false,
        }
    }

    /// Return a bold copy of this style.
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Return an italic copy of this style.
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// Immutable color scheme for the text area and the gutter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Theme {
    /// Human-readable name.
    pub name: String,
    /// Text area background.
    pub background: Rgb,
    /// Default text color (used for untagged text and unmapped tags).
    pub foreground: Rgb,
    /// Gutter background.
    pub gutter_background: Rgb,
    /// Gutter label color.
    pub gutter_foreground: Rgb,
    #[serde(default)]
    styles: BTreeMap<StyleTag, TextStyle>,
}

impl Theme {
    /// Create a theme with no per-tag styles.
    pub fn new(
        name: impl Into<String>,
        background: Rgb,
        foreground: Rgb,
        gutter_background: Rgb,
        gutter_foreground: Rgb,
    ) -> Self {
        Self {
            name: name.into(),
            background,
            foreground,
            gutter_background,
            gutter_foreground,
            styles: BTreeMap::new(),
        }
    }

    /// Builder-style per-tag override.
    pub fn with_style(mut self, tag: StyleTag, style: TextStyle) -> Self {
        self.styles.insert(tag, style);
        self
    }

    /// Load a theme from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleTableError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The appearance of `tag`, falling back to the theme foreground.
    pub fn style_for(&self, tag: StyleTag) -> TextStyle {
        self.styles
            .get(&tag)
            .copied()
            .unwrap_or(TextStyle::plain(self.foreground))
    }

    /// The dark default theme.
    pub fn one_dark() -> Self {
        let bg = Rgb::new(0x28, 0x2c, 0x34);
        Self::new(
            "one-dark",
            bg,
            Rgb::new(0xab, 0xb2, 0xbf),
            bg,
            Rgb::new(0x5c, 0x63, 0x70),
        )
        .with_style(StyleTag::Keyword, TextStyle::plain(Rgb::new(0xc6, 0x78, 0xdd)).bold())
        .with_style(StyleTag::Builtin, TextStyle::plain(Rgb::new(0xe5, 0xc0, 0x7b)).italic())
        .with_style(StyleTag::Operator, TextStyle::plain(Rgb::new(0x56, 0xb6, 0xc2)))
        .with_style(StyleTag::Brace, TextStyle::plain(Rgb::new(0xab, 0xb2, 0xbf)))
        .with_style(StyleTag::Decorator, TextStyle::plain(Rgb::new(0xd1, 0x9a, 0x66)))
        .with_style(StyleTag::Definition, TextStyle::plain(Rgb::new(0x61, 0xaf, 0xef)).bold())
        .with_style(StyleTag::Number, TextStyle::plain(Rgb::new(0xd1, 0x9a, 0x66)))
        .with_style(StyleTag::String, TextStyle::plain(Rgb::new(0x98, 0xc3, 0x79)))
        .with_style(StyleTag::Comment, TextStyle::plain(Rgb::new(0x5c, 0x63, 0x70)).italic())
        .with_style(StyleTag::Block, TextStyle::plain(Rgb::new(0x98, 0xc3, 0x79)))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::one_dark()
    }
}
