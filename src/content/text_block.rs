use crate::content::ContentError;
use crate::helpers::bytes::ByteReader;
use crate::helpers::bytes::ByteWriter;
use crate::style::StyleId;
use crate::style::TextStyle;

/// Rich-text content placed in a cell.
///
/// The block carries the style it was created with and the wrap width of its
/// current layout. A wrap width of zero means "do not wrap".
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    text: String,
    style_id: Option<StyleId>,
    style: TextStyle,
    wrap_width: f64,
}

impl TextBlock {
    /// Layout version written at the head of every blob.
    const BLOB_VERSION: u32 = 1;

    pub fn new(text: &str, style: TextStyle) -> Self {
        Self {
            text: text.to_owned(),
            style_id: None,
            style,
            wrap_width: 0.0,
        }
    }

    pub fn with_style_id(mut self, style_id: StyleId) -> Self {
        self.style_id = Some(style_id);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn style_id(&self) -> Option<StyleId> {
        self.style_id
    }

    pub fn wrap_width(&self) -> f64 {
        self.wrap_width
    }

    pub(crate) fn set_wrap_width(&mut self, wrap_width: f64) {
        self.wrap_width = wrap_width.max(0.0);
    }

    /// True when there is nothing visible to lay out.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Serializes the block into the owned blob stored with the cell aspect.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::default();
        writer.write_u32(Self::BLOB_VERSION);
        writer.write_u64(self.style_id.map(|id| id.0).unwrap_or(0));
        writer.write_f64(self.style.height);
        writer.write_f64(self.style.width_factor);
        writer.write_f64(self.style.line_spacing_factor);
        writer.write_f64(self.wrap_width);
        writer.write_string(&self.text);
        writer.into_bytes()
    }

    /// Rebuilds a block from a blob written by [`TextBlock::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContentError> {
        let mut reader = ByteReader::new(bytes);
        let version = reader.read_u32()?;
        if version != Self::BLOB_VERSION {
            return Err(ContentError::UnsupportedVersion(version));
        }
        let style_id = Some(reader.read_u64()?)
            .filter(|id| *id != 0)
            .map(StyleId);
        let style = TextStyle {
            height: reader.read_f64()?,
            width_factor: reader.read_f64()?,
            line_spacing_factor: reader.read_f64()?,
        };
        let wrap_width = reader.read_f64()?;
        let text = reader.read_string()?;
        if !reader.is_finished() {
            return Err(ContentError::TrailingData);
        }
        Ok(Self {
            text,
            style_id,
            style,
            wrap_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_preserves_layout_state() {
        let mut block = TextBlock::new("Bolt M8 x 40", TextStyle::new(0.25, 0.9)).with_style_id(StyleId(4));
        block.set_wrap_width(1.75);

        let restored = TextBlock::from_bytes(&block.to_bytes()).expect("valid blob");
        assert_eq!(restored, block);
    }

    #[test]
    fn blob_with_unknown_version_is_rejected() {
        let mut bytes = TextBlock::new("x", TextStyle::new(1.0, 1.0)).to_bytes();
        bytes[0] = 9;
        assert!(matches!(
            TextBlock::from_bytes(&bytes),
            Err(ContentError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn whitespace_only_block_is_empty() {
        assert!(TextBlock::new("  \n ", TextStyle::new(1.0, 1.0)).is_empty());
        assert!(!TextBlock::new(" a ", TextStyle::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn negative_wrap_width_means_unwrapped() {
        let mut block = TextBlock::new("x", TextStyle::new(1.0, 1.0));
        block.set_wrap_width(-3.0);
        assert_eq!(block.wrap_width(), 0.0);
    }
}
