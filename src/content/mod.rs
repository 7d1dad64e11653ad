//! # Cell Content
//!
//! A cell owns exactly one content holder. The holder is a closed variant so
//! future content kinds are added as new arms and matched explicitly.
//!
//! Content never measures itself: measuring is delegated to a
//! [`ContentMeasurer`], the external text layout engine. The holder only
//! decides which wrap width to measure with and how the result maps onto the
//! table axes for the owning cell's orientation.
use crate::helpers::bytes::BytesError;
use crate::table::cell::CellOrientation;
use crate::table::cell::CellSize;
use std::cell::OnceCell;
use thiserror::Error;
use tracing::warn;

pub mod measure;
pub mod text_block;

pub use measure::MonospaceMeasurer;
pub use text_block::TextBlock;

/// Wrap width used to lay text out as tightly as possible.
pub const COMPRESSED_WRAP_WIDTH: f64 = 1e-6;

/// Errors raised while decoding persisted content.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Invalid text block data: {0}")]
    InvalidData(#[from] BytesError),

    #[error("Unsupported text block version {0}")]
    UnsupportedVersion(u32),

    #[error("Unexpected trailing bytes after text block")]
    TrailingData,
}

/// Result of laying out a text block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextMetrics {
    /// Widest line
    pub width: f64,
    /// Ascender of the first line to baseline of the last line
    pub height: f64,
    /// How far the last line's glyphs reach below its baseline
    pub last_line_descender: f64,
}

/// The text layout engine consumed by the table.
pub trait ContentMeasurer {
    /// Lays out `block` at `wrap_width` (zero meaning unbounded) and measures it.
    fn measure(&self, block: &TextBlock, wrap_width: f64) -> TextMetrics;
}

/// Which layout of the content a size query refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutMode {
    /// The layout at the current wrap width
    Current,
    /// Wrapped as tightly as possible
    FullyCompressed,
    /// Not wrapped at all
    FullyExpanded,
}

/// The content holder variants a cell may own.
#[derive(Clone, Debug)]
pub enum CellContent {
    Text(TextContent),
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        match self {
            CellContent::Text(text) => text.is_empty(),
        }
    }

    /// Whether the store has anything to keep for this content.
    pub fn is_persistable(&self) -> bool {
        match self {
            CellContent::Text(text) => !text.is_empty() || text.is_undecodable(),
        }
    }

    pub fn text(&self) -> &TextContent {
        match self {
            CellContent::Text(text) => text,
        }
    }

    pub fn text_mut(&mut self) -> &mut TextContent {
        match self {
            CellContent::Text(text) => text,
        }
    }
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Text(TextContent::default())
    }
}

/// Holder for an optional text block.
///
/// Content read back from a store arrives as an owned blob; it is decoded on
/// first access and the decoded block is cached. That cache is the only
/// side effect of the read-only queries. A blob that fails to decode is
/// kept as is, so saving the table writes the original bytes back.
#[derive(Clone, Debug, Default)]
pub struct TextContent {
    block: OnceCell<Option<TextBlock>>,
    blob: Option<Vec<u8>>,
}

impl TextContent {
    pub fn from_block(block: TextBlock) -> Self {
        Self {
            block: OnceCell::from(Some(block)),
            blob: None,
        }
    }

    pub fn from_persisted(blob: Vec<u8>) -> Self {
        Self {
            block: OnceCell::new(),
            blob: Some(blob),
        }
    }

    /// Returns the text block, decoding the persisted blob on first use.
    pub fn block(&self) -> Option<&TextBlock> {
        self.block
            .get_or_init(|| {
                let blob = self.blob.as_deref()?;
                match TextBlock::from_bytes(blob) {
                    Ok(block) => Some(block),
                    Err(error) => {
                        warn!(%error, "keeping undecodable cell text as raw bytes");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub(crate) fn block_mut(&mut self) -> Option<&mut TextBlock> {
        if self.block().is_some() {
            self.blob = None;
        }
        self.block.get_mut().and_then(Option::as_mut)
    }

    /// A persisted blob exists but could not be decoded.
    pub fn is_undecodable(&self) -> bool {
        self.block().is_none() && self.blob.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.block().map(TextBlock::is_empty).unwrap_or(true)
    }

    /// Serialized form for the store, `None` when there is no block.
    ///
    /// Undecodable content is returned byte for byte as it was loaded.
    pub fn to_blob(&self) -> Option<Vec<u8>> {
        match self.block() {
            Some(block) => Some(block.to_bytes()),
            None => self.blob.clone(),
        }
    }

    /// Measures the block for `mode` and maps the result onto table axes.
    ///
    /// `descender_allowance` is the space below the text (the bottom margin)
    /// that already absorbs the last line's descender.
    pub fn size(
        &self,
        measurer: &dyn ContentMeasurer,
        mode: LayoutMode,
        orientation: CellOrientation,
        descender_allowance: f64,
    ) -> Option<CellSize> {
        let block = self.block().filter(|block| !block.is_empty())?;
        let current = Self::oriented(
            measurer.measure(block, block.wrap_width()),
            orientation,
            descender_allowance,
        );
        let size = match mode {
            LayoutMode::Current => current,
            LayoutMode::FullyExpanded => Self::oriented(
                measurer.measure(block, 0.0),
                orientation,
                descender_allowance,
            ),
            LayoutMode::FullyCompressed => {
                let tight = measurer.measure(block, COMPRESSED_WRAP_WIDTH);
                // Only the text-flow axis compresses; the cross axis keeps the current layout.
                match orientation {
                    CellOrientation::Horizontal => CellSize::new(tight.width, current.height),
                    CellOrientation::Rotate90 | CellOrientation::Rotate270 => {
                        CellSize::new(current.width, tight.width)
                    }
                }
            }
        };
        Some(size)
    }

    fn oriented(metrics: TextMetrics, orientation: CellOrientation, descender_allowance: f64) -> CellSize {
        let overhang = (metrics.last_line_descender - descender_allowance).max(0.0);
        let size = CellSize::new(metrics.width, metrics.height + overhang);
        match orientation {
            CellOrientation::Horizontal => size,
            CellOrientation::Rotate90 | CellOrientation::Rotate270 => size.transposed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    fn content(text: &str) -> TextContent {
        TextContent::from_block(TextBlock::new(text, TextStyle::new(1.0, 1.0)))
    }

    #[test]
    fn empty_holder_has_no_size() {
        let measurer = MonospaceMeasurer::default();
        let empty = TextContent::default();
        assert!(empty.is_empty());
        assert_eq!(empty.size(&measurer, LayoutMode::Current, CellOrientation::Horizontal, 0.3), None);
    }

    #[test]
    fn compressed_keeps_cross_axis_of_current_layout() {
        let measurer = MonospaceMeasurer::default();
        let holder = content("ab cd");

        let current = holder
            .size(&measurer, LayoutMode::Current, CellOrientation::Horizontal, 0.3)
            .expect("text");
        let compressed = holder
            .size(&measurer, LayoutMode::FullyCompressed, CellOrientation::Horizontal, 0.3)
            .expect("text");
        assert_eq!(current, CellSize::new(5.0, 1.0));
        assert_eq!(compressed, CellSize::new(2.0, 1.0));
    }

    #[test]
    fn rotated_content_swaps_axes() {
        let measurer = MonospaceMeasurer::default();
        let holder = content("abc");

        let expanded = holder
            .size(&measurer, LayoutMode::FullyExpanded, CellOrientation::Rotate90, 0.3)
            .expect("text");
        assert_eq!(expanded, CellSize::new(1.0, 3.0));
    }

    #[test]
    fn descender_below_the_margin_adds_height() {
        let measurer = MonospaceMeasurer::default();
        let holder = content("g");

        let size = holder
            .size(&measurer, LayoutMode::Current, CellOrientation::Horizontal, 0.1)
            .expect("text");
        assert!((size.height - 1.2).abs() < 1e-12);
    }

    #[test]
    fn persisted_blob_is_decoded_lazily() {
        let block = TextBlock::new("lazy", TextStyle::new(1.0, 1.0));
        let holder = TextContent::from_persisted(block.to_bytes());
        assert_eq!(holder.block(), Some(&block));
    }

    #[test]
    fn corrupt_blob_reads_as_empty_but_keeps_its_bytes() {
        let mut holder = TextContent::from_persisted(vec![1, 2, 3]);
        assert!(holder.is_empty());
        assert!(holder.is_undecodable());
        assert!(holder.block_mut().is_none());
        assert_eq!(holder.to_blob(), Some(vec![1, 2, 3]));
        assert!(CellContent::Text(holder).is_persistable());
    }

    #[test]
    fn whitespace_block_is_not_persistable() {
        assert!(!CellContent::Text(content("  ")).is_persistable());
        assert!(!CellContent::default().is_persistable());
    }
}
