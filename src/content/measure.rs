//! Fixed-advance text measurement.
//!
//! Every grapheme advances by its display width (1 for most scripts, 2 for
//! wide CJK and emoji, 0 for combining marks) times the style's height and
//! width factor. Lines break at whitespace only; a word wider than the wrap
//! width stays on its own line and overhangs it.
use crate::content::ContentMeasurer;
use crate::content::TextBlock;
use crate::content::TextMetrics;
use crate::options::TableOptions;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Slack allowed when deciding whether a word still fits on the line.
const FIT_EPSILON: f64 = 1e-9;

/// Measures text as if every glyph had a fixed advance.
///
/// The descender ratio must match the table's
/// [`TableOptions::descender_ratio`], otherwise a one-line cell no longer
/// fits the default row height. Build it with [`MonospaceMeasurer::from`]
/// to take the ratio from the options.
#[derive(Copy, Clone, Debug)]
pub struct MonospaceMeasurer {
    descender_ratio: f64,
}

impl MonospaceMeasurer {
    pub fn new(descender_ratio: f64) -> Self {
        Self { descender_ratio }
    }

    /// Returns the width of every laid-out line at the given wrap width.
    pub fn line_widths(&self, block: &TextBlock, wrap_width: f64) -> Vec<f64> {
        let style = block.style();
        let unit = style.height * style.width_factor;
        let mut lines = Vec::new();

        for raw_line in block.text().split('\n') {
            let mut layout = LineLayout::new(wrap_width);
            for grapheme in raw_line.graphemes(true) {
                let advance = UnicodeWidthStr::width(grapheme) as f64 * unit;
                if grapheme.chars().all(char::is_whitespace) {
                    layout.push_space(advance);
                } else {
                    layout.push_glyph(advance);
                }
            }
            layout.finish(&mut lines);
        }

        lines
    }
}

impl From<&TableOptions> for MonospaceMeasurer {
    fn from(options: &TableOptions) -> Self {
        Self::new(options.descender_ratio)
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::from(&TableOptions::default())
    }
}

impl ContentMeasurer for MonospaceMeasurer {
    fn measure(&self, block: &TextBlock, wrap_width: f64) -> TextMetrics {
        let style = block.style();
        let lines = self.line_widths(block, wrap_width);
        let count = lines.len().max(1) as f64;
        let width = lines.iter().copied().fold(0.0, f64::max);
        let height = count * style.height + (count - 1.0) * style.height * style.line_spacing_factor;
        TextMetrics {
            width,
            height,
            last_line_descender: self.descender_ratio * style.height,
        }
    }
}

/// Greedy word placement for a single hard line.
struct LineLayout {
    wrap_width: f64,
    lines: Vec<f64>,
    current: f64,
    pending_space: f64,
    word: f64,
    word_started: bool,
    has_content: bool,
}

impl LineLayout {
    fn new(wrap_width: f64) -> Self {
        Self {
            wrap_width,
            lines: Vec::new(),
            current: 0.0,
            pending_space: 0.0,
            word: 0.0,
            word_started: false,
            has_content: false,
        }
    }

    fn push_glyph(&mut self, advance: f64) {
        self.word += advance;
        self.word_started = true;
    }

    fn push_space(&mut self, advance: f64) {
        self.place_word();
        if self.has_content {
            self.pending_space += advance;
        }
    }

    fn place_word(&mut self) {
        if !self.word_started {
            return;
        }
        let wraps = self.wrap_width > 0.0
            && self.has_content
            && self.current + self.pending_space + self.word > self.wrap_width + FIT_EPSILON;
        if wraps {
            self.lines.push(self.current);
            self.current = self.word;
        } else {
            self.current += self.pending_space + self.word;
        }
        self.pending_space = 0.0;
        self.word = 0.0;
        self.word_started = false;
        self.has_content = true;
    }

    fn finish(mut self, lines: &mut Vec<f64>) {
        self.place_word();
        self.lines.push(self.current);
        lines.extend(self.lines);
    }
}
