use crate::content::CellContent;
use crate::content::ContentMeasurer;
use crate::content::LayoutMode;
use crate::content::TextBlock;
use crate::content::TextContent;
use crate::content::COMPRESSED_WRAP_WIDTH;
use crate::persist::AspectState;
use crate::style::TextStyle;
use crate::table::Axis;
use crate::table::ElementId;
use crate::table::SIZE_TOLERANCE;
use std::fmt::Display;

/// Position of a cell: 0-based row and column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Index of the track this cell occupies along `axis`.
    pub const fn along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.col,
        }
    }
}

impl Display for CellIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Width and height in drawing units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub const fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// The height for rows, the width for columns.
    pub const fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.height,
            Axis::Column => self.width,
        }
    }
}

/// Direction text runs in a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CellOrientation {
    #[default]
    Horizontal,
    Rotate90,
    Rotate270,
}

impl CellOrientation {
    /// The track whose size bounds the text's line length.
    pub const fn flow_axis(self) -> Axis {
        match self {
            CellOrientation::Horizontal => Axis::Column,
            CellOrientation::Rotate90 | CellOrientation::Rotate270 => Axis::Row,
        }
    }

    pub const fn ordinal(self) -> i64 {
        match self {
            CellOrientation::Horizontal => 0,
            CellOrientation::Rotate90 => 1,
            CellOrientation::Rotate270 => 2,
        }
    }

    pub const fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(CellOrientation::Horizontal),
            1 => Some(CellOrientation::Rotate90),
            2 => Some(CellOrientation::Rotate270),
            _ => None,
        }
    }
}

/// Placement of content inside the cell box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CellAlignment {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl CellAlignment {
    const ORDERED: [CellAlignment; 9] = [
        CellAlignment::TopLeft,
        CellAlignment::TopCenter,
        CellAlignment::TopRight,
        CellAlignment::MiddleLeft,
        CellAlignment::MiddleCenter,
        CellAlignment::MiddleRight,
        CellAlignment::BottomLeft,
        CellAlignment::BottomCenter,
        CellAlignment::BottomRight,
    ];

    pub fn ordinal(self) -> i64 {
        Self::ORDERED
            .iter()
            .position(|alignment| *alignment == self)
            .unwrap_or(0) as i64
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ORDERED.get(index).copied())
    }
}

/// Resolved space between the cell border and its content.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }

    /// Total margin consumed along `axis`.
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.top + self.bottom,
            Axis::Column => self.left + self.right,
        }
    }
}

/// Per-cell margin overrides; absent sides use the table default.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MarginOverrides {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

impl MarginOverrides {
    pub fn resolve(&self, defaults: &Margins) -> Margins {
        Margins {
            top: self.top.unwrap_or(defaults.top),
            bottom: self.bottom.unwrap_or(defaults.bottom),
            left: self.left.unwrap_or(defaults.left),
            right: self.right.unwrap_or(defaults.right),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// How much space a cell is asked about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SizeMode {
    Current,
    FullyCompressed,
    FullyExpanded,
    /// Ignore the content and report the empty-cell minimum
    EmptyDefault,
}

/// Everything a cell needs from its table to answer size queries.
#[derive(Copy, Clone, Debug)]
pub struct CellContext {
    /// Text style of the cell's region
    pub style: TextStyle,
    pub margins: Margins,
    pub orientation: CellOrientation,
    pub descender_ratio: f64,
}

/// Size of a cell with no content in a region using `style`.
///
/// The descender adjustment approximates real font metrics as a fixed
/// fraction of the font height.
pub fn empty_minimum_size(style: &TextStyle, descender_ratio: f64) -> CellSize {
    let height = style.height + 2.0 * descender_ratio * style.height;
    CellSize::new(height * style.width_factor, height)
}

/// A single table cell.
#[derive(Clone, Debug)]
pub struct Cell {
    pub(crate) id: ElementId,
    pub(crate) index: CellIndex,
    pub(crate) row_span: usize,
    pub(crate) col_span: usize,
    pub(crate) fill_key: Option<u32>,
    pub(crate) alignment: Option<CellAlignment>,
    pub(crate) orientation: Option<CellOrientation>,
    pub(crate) margins: MarginOverrides,
    pub(crate) content: CellContent,
    pub(crate) state: AspectState,
}

impl Cell {
    pub(crate) fn new(id: ElementId, index: CellIndex) -> Self {
        Self {
            id,
            index,
            row_span: 1,
            col_span: 1,
            fill_key: None,
            alignment: None,
            orientation: None,
            margins: MarginOverrides::default(),
            content: CellContent::default(),
            state: AspectState::default(),
        }
    }

    /// A fresh cell that copies formatting (not content) from `seed`.
    pub(crate) fn with_format_of(id: ElementId, index: CellIndex, seed: &Cell) -> Self {
        Self {
            fill_key: seed.fill_key,
            alignment: seed.alignment,
            orientation: seed.orientation,
            margins: seed.margins,
            ..Self::new(id, index)
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    pub fn row_span(&self) -> usize {
        self.row_span
    }

    pub fn column_span(&self) -> usize {
        self.col_span
    }

    pub fn span_along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.row_span,
            Axis::Column => self.col_span,
        }
    }

    pub fn fill_key(&self) -> Option<u32> {
        self.fill_key
    }

    pub fn alignment_override(&self) -> Option<CellAlignment> {
        self.alignment
    }

    pub fn orientation_override(&self) -> Option<CellOrientation> {
        self.orientation
    }

    pub fn margin_overrides(&self) -> &MarginOverrides {
        &self.margins
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        self.content.text().block()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// True when the cell is anchored at track `index` along `axis` and
    /// spans only that track.
    pub fn is_unshared_in(&self, axis: Axis, index: usize) -> bool {
        self.span_along(axis) == 1 && self.index.along(axis) == index
    }

    pub(crate) fn set_text_block(&mut self, block: Option<TextBlock>) {
        self.content = match block {
            Some(block) => CellContent::Text(TextContent::from_block(block)),
            None => CellContent::default(),
        };
        self.state.mark_changed();
    }

    /// Space the cell needs, margins included.
    pub fn content_size(&self, measurer: &dyn ContentMeasurer, context: &CellContext, mode: SizeMode) -> CellSize {
        let layout = match mode {
            SizeMode::Current => LayoutMode::Current,
            SizeMode::FullyCompressed => LayoutMode::FullyCompressed,
            SizeMode::FullyExpanded => LayoutMode::FullyExpanded,
            SizeMode::EmptyDefault => return empty_minimum_size(&context.style, context.descender_ratio),
        };
        match self.content.text().size(measurer, layout, context.orientation, context.margins.bottom) {
            Some(size) => CellSize::new(
                size.width + context.margins.along(Axis::Column),
                size.height + context.margins.along(Axis::Row),
            ),
            None => empty_minimum_size(&context.style, context.descender_ratio),
        }
    }

    /// Re-fits the content after the track along `axis` changed to `available`.
    ///
    /// Only the text-flow axis affects the layout: a locked track wraps the
    /// text to the space inside the margins, an unlocked one removes wrapping.
    /// Returns true when the layout changed.
    pub(crate) fn fit_to_axis(&mut self, axis: Axis, available: f64, locked: bool, context: &CellContext) -> bool {
        if axis != context.orientation.flow_axis() {
            return false;
        }
        let Some(block) = self.content.text_mut().block_mut() else {
            return false;
        };
        let wrap_width = if locked {
            (available - context.margins.along(axis)).max(COMPRESSED_WRAP_WIDTH)
        } else {
            0.0
        };
        if (block.wrap_width() - wrap_width).abs() <= SIZE_TOLERANCE {
            return false;
        }
        block.set_wrap_width(wrap_width);
        self.state.mark_changed();
        true
    }
}
