#![warn(missing_docs)]
//! Editor Highlight - Incremental Line-State Syntax Highlighting for Editor Hosts
//!
//! # Overview
//!
//! `editor-highlight` decides which spans of a document get which style as the document is edited
//! and scrolled, and keeps a line-number gutter in step with the viewport. It owns no text and
//! paints nothing: the host supplies lines and edit notifications, and reads back styled spans and
//! gutter labels.
//!
//! # Core Features
//!
//! - **Rule Table**: ordered regex rules plus one multi-line block delimiter, validated once
//! - **Line Lexer**: a pure function of a line's text and its entry block state
//! - **Fixed-Point Propagation**: an edit re-lexes the changed lines plus only the lines whose
//!   block state actually flips
//! - **Lazy Highlighting**: lines are highlighted when first shown, never ahead of the viewport
//! - **Virtualized Gutter**: width changes only at powers of ten; labels cost O(visible lines)
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Highlighter (propagator) + GutterSync      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Highlight Cache                            │  ← Per-line state
//! ├─────────────────────────────────────────────┤
//! │  Line Lexer                                 │  ← Pure per-line lexing
//! ├─────────────────────────────────────────────┤
//! │  Rule Table + Theme                         │  ← Configuration
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_highlight::{
//!     BlockRule, Highlighter, LexState, LineBuffer, RuleTable, StyleTag, Theme,
//! };
//! use std::sync::Arc;
//!
//! let table = RuleTable::from_patterns(
//!     &[(r"\bif\b", StyleTag::Keyword, None), (r"#.*", StyleTag::Comment, None)],
//!     BlockRule::literal("\"\"\"").unwrap(),
//!     Theme::one_dark(),
//! )
//! .unwrap();
//! let mut highlighter = Highlighter::new(Arc::new(table));
//!
//! let mut buffer = LineBuffer::from_text("x = 1\nif x:\n    pass");
//! highlighter.ensure_highlighted(&buffer, 0..3);
//!
//! // Open a block on line 0: every following line flips to block content.
//! let edit = buffer.set_line(0, "x = \"\"\"");
//! let repaint = highlighter.on_edit(&buffer, edit);
//! assert_eq!(repaint.lines(), &[0, 1, 2]);
//! assert_eq!(highlighter.entry(2).unwrap().entry_state, LexState::InsideBlock);
//! ```
//!
//! # Module Description
//!
//! - [`style`] - Style tags and the theme
//! - [`rules`] - Rule table construction and validation
//! - [`definition`] - Rule tables loaded from YAML
//! - [`lexer`] - Per-line lexing
//! - [`cache`] - Per-line highlight cache
//! - [`propagator`] - Block-state propagation after edits
//! - [`source`] - The host-buffer interface and edit notifications
//! - [`buffer`] - Rope-backed reference buffer
//! - [`gutter`] - Line-number gutter width and labels
//! - [`error`] - Construction errors

pub mod buffer;
pub mod cache;
pub mod definition;
pub mod error;
pub mod gutter;
pub mod lexer;
pub mod propagator;
pub mod rules;
pub mod source;
pub mod style;

pub use buffer::LineBuffer;
pub use cache::{CacheEntry, HighlightCache};
pub use definition::{BlockDefinition, RuleDefinition, RuleTableDefinition};
pub use error::RuleTableError;
pub use gutter::{
    GutterConfig, GutterLabel, GutterSync, GutterUpdate, LineGeometry, UniformLineHeight,
    Viewport, digit_count, visible_label_width,
};
pub use lexer::{LexState, LineHighlight, StyledSpan, flatten_spans, highlight_line};
pub use propagator::{Highlighter, RepaintSet};
pub use rules::{BlockRule, Rule, RuleTable};
pub use source::{LineEdit, LineSource};
pub use style::{Rgb, StyleTag, TextStyle, Theme};
