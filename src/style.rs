//! Text style references and their resolution.
//!
//! A table stores one [`StyleId`] per structural region. The ids are resolved
//! through a [`StyleResolver`] supplied by the host document model; the
//! in-memory [`StyleCatalog`] is the resolver used when no document store is
//! attached.
use std::collections::HashMap;
use std::fmt::Display;

/// Identifier of a text style owned by the host document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub u64);

impl Display for StyleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "style#{}", self.0)
    }
}

/// The subset of a text style that drives cell sizing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Nominal character height
    pub height: f64,
    /// Character advance relative to the height
    pub width_factor: f64,
    /// Gap between consecutive lines relative to the height
    pub line_spacing_factor: f64,
}

impl TextStyle {
    pub const DEFAULT_LINE_SPACING_FACTOR: f64 = 0.5;

    pub fn new(height: f64, width_factor: f64) -> Self {
        Self {
            height,
            width_factor,
            line_spacing_factor: Self::DEFAULT_LINE_SPACING_FACTOR,
        }
    }

    /// A style is usable for sizing only when it has a positive height.
    pub fn is_usable(&self) -> bool {
        self.height > 0.0
    }
}

/// Resolves style ids to their sizing-relevant properties.
pub trait StyleResolver {
    /// Returns the style, or `None` when the id is unknown to the host.
    fn resolve(&self, id: StyleId) -> Option<TextStyle>;
}

/// A plain in-memory style table.
#[derive(Clone, Debug, Default)]
pub struct StyleCatalog {
    styles: HashMap<StyleId, TextStyle>,
    next_id: u64,
}

impl StyleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a style and returns its freshly allocated id.
    pub fn insert(&mut self, style: TextStyle) -> StyleId {
        self.next_id += 1;
        let id = StyleId(self.next_id);
        self.styles.insert(id, style);
        id
    }
}

impl StyleResolver for StyleCatalog {
    fn resolve(&self, id: StyleId) -> Option<TextStyle> {
        self.styles.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_allocates_distinct_ids() {
        let mut catalog = StyleCatalog::new();
        let first = catalog.insert(TextStyle::new(0.25, 1.0));
        let second = catalog.insert(TextStyle::new(0.5, 0.8));

        assert_ne!(first, second);
        assert_eq!(catalog.resolve(first).map(|s| s.height), Some(0.25));
        assert_eq!(catalog.resolve(second).map(|s| s.width_factor), Some(0.8));
        assert_eq!(catalog.resolve(StyleId(99)), None);
    }

    #[test]
    fn zero_height_style_is_not_usable() {
        assert!(!TextStyle::new(0.0, 1.0).is_usable());
        assert!(TextStyle::new(0.1, 1.0).is_usable());
    }
}
