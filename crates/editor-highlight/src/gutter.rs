//! Line-number gutter.
//!
//! The gutter width depends only on the number of digits in the line count, so it changes only
//! when the line count crosses a power of ten. Labels are produced for the viewport alone: the
//! cost of [`GutterSync::labels`] is proportional to the number of visible lines, never to the
//! document length.

/// Number of decimal digits needed to print `max(1, n)`.
pub fn digit_count(n: usize) -> usize {
    let mut value = n.max(1);
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// Gutter metrics, in host units (cells for text grids, pixels for GUI hosts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterConfig {
    /// Advance width of one digit.
    pub digit_width: u32,
    /// Space before the widest label.
    pub leading_padding: u32,
    /// Space after the widest label.
    pub trailing_padding: u32,
    /// Distance from the gutter's right edge to the right edge of each label.
    pub label_inset: u32,
    /// Minimum digit count reserved, however short the document.
    pub min_digits: usize,
}

impl GutterConfig {
    /// Metrics for a text grid: one cell per digit, one cell of padding either side.
    pub fn cells() -> Self {
        Self {
            digit_width: 1,
            leading_padding: 1,
            trailing_padding: 1,
            label_inset: 1,
            min_digits: 1,
        }
    }

    /// Pixel metrics for a GUI host whose digit glyph advance is `advance` pixels.
    pub fn pixels(advance: u32) -> Self {
        Self {
            digit_width: advance,
            leading_padding: 3,
            trailing_padding: 8,
            label_inset: 5,
            min_digits: 1,
        }
    }

    /// Digits reserved for a document of `line_count` lines.
    pub fn digits_for(&self, line_count: usize) -> usize {
        digit_count(line_count).max(self.min_digits)
    }

    fn width_for_digits(&self, digits: usize) -> u32 {
        let digits = u32::try_from(digits).unwrap_or(u32::MAX);
        self.leading_padding
            .saturating_add(self.digit_width.saturating_mul(digits))
            .saturating_add(self.trailing_padding)
    }
}

impl Default for GutterConfig {
    fn default() -> Self {
        Self::cells()
    }
}

/// Width of a gutter able to print every line number of a `line_count`-line document.
pub fn visible_label_width(config: &GutterConfig, line_count: usize) -> u32 {
    config.width_for_digits(config.digits_for(line_count))
}

/// The visible part of the document, in the host's vertical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First line at least partially visible.
    pub first_line: usize,
    /// Top of `first_line` relative to the viewport top (`<= 0` when partially scrolled out).
    pub first_line_top: i32,
    /// Viewport height.
    pub height: u32,
}

/// Per-line vertical extent, supplied by the host's layout.
pub trait LineGeometry {
    /// Height of `line`. Zero means the line is hidden (e.g. folded) and gets no label.
    fn line_height(&self, line: usize) -> u32;

    /// First line at or after `line` that may be visible.
    ///
    /// Called after a hidden line. The default steps one line at a time, so a hidden run costs
    /// one height query per line; hosts with folds override this to jump past the whole run.
    fn next_visible_line(&self, line: usize) -> usize {
        line
    }
}

/// Every line has the same height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLineHeight(pub u32);

impl LineGeometry for UniformLineHeight {
    fn line_height(&self, _line: usize) -> u32 {
        self.0
    }
}

impl<F: Fn(usize) -> u32> LineGeometry for F {
    fn line_height(&self, line: usize) -> u32 {
        self(line)
    }
}

/// One line-number label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterLabel {
    /// 0-based line index.
    pub line: usize,
    /// 1-based line number.
    pub number: usize,
    /// The number, right-aligned to the gutter's digit count.
    pub text: String,
    /// Top offset relative to the viewport top.
    pub top: i32,
    /// Line height.
    pub height: u32,
}

/// What the host has to do to the gutter after a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GutterUpdate {
    /// Nothing (horizontal scroll).
    None,
    /// Shift the painted gutter by `dy` and request labels for the new viewport. The width is
    /// unchanged.
    Scroll(i32),
}

/// Keeps the gutter width and labels in step with the document and viewport.
#[derive(Debug, Clone)]
pub struct GutterSync {
    config: GutterConfig,
    line_count: usize,
    digits: usize,
    width: u32,
}

impl GutterSync {
    /// Create a gutter for a `line_count`-line document.
    pub fn new(config: GutterConfig, line_count: usize) -> Self {
        let digits = config.digits_for(line_count);
        Self {
            config,
            line_count,
            digits,
            width: config.width_for_digits(digits),
        }
    }

    /// The metrics in use.
    pub fn config(&self) -> &GutterConfig {
        &self.config
    }

    /// Current gutter width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Digits reserved for labels.
    pub fn digits(&self) -> usize {
        self.digits
    }

    /// Line count the gutter was last told about.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Right edge of the label area, relative to the gutter's left edge.
    pub fn label_right(&self) -> u32 {
        self.width.saturating_sub(self.config.label_inset)
    }

    /// Record a new line count.
    ///
    /// Returns `true` only if the width changed, i.e. the count crossed a power of ten; the
    /// host re-lays out the text area only then.
    pub fn set_line_count(&mut self, line_count: usize) -> bool {
        self.line_count = line_count;
        let digits = self.config.digits_for(line_count);
        if digits == self.digits {
            return false;
        }

        let width = self.config.width_for_digits(digits);
        tracing::debug!(
            line_count,
            old_width = self.width,
            new_width = width,
            "gutter width changed"
        );
        self.digits = digits;
        self.width = width;
        true
    }

    /// React to a scroll of the text area.
    pub fn on_scroll(&self, _dx: i32, dy: i32) -> GutterUpdate {
        if dy == 0 {
            GutterUpdate::None
        } else {
            GutterUpdate::Scroll(dy)
        }
    }

    /// Labels for every line whose vertical extent intersects `viewport`, in ascending order.
    ///
    /// Only lines from `viewport.first_line` down to the viewport bottom are asked for their
    /// height. After a hidden line, [`LineGeometry::next_visible_line`] picks where to resume.
    pub fn labels<G: LineGeometry + ?Sized>(
        &self,
        viewport: Viewport,
        geometry: &G,
    ) -> Vec<GutterLabel> {
        let bottom = i64::from(viewport.height);
        let mut top = i64::from(viewport.first_line_top);
        let mut labels = Vec::new();

        if viewport.first_line >= self.line_count && self.line_count > 0 {
            tracing::debug!(
                first_line = viewport.first_line,
                line_count = self.line_count,
                "viewport starts past the end of the document"
            );
            return labels;
        }

        let mut line = viewport.first_line;
        while line < self.line_count && top < bottom {
            let height = geometry.line_height(line);
            if height == 0 {
                line = geometry.next_visible_line(line + 1).max(line + 1);
                continue;
            }
            let line_bottom = top + i64::from(height);
            if line_bottom > 0 {
                let number = line + 1;
                labels.push(GutterLabel {
                    line,
                    number,
                    text: format!("{number:>width$}", width = self.digits),
                    top: i32::try_from(top).unwrap_or(i32::MAX),
                    height,
                });
            }
            top = line_bottom;
            line += 1;
        }
        labels
    }
}
