//! # Annotation Table
//!
//! The table owns its rows, columns and (through the rows) cells, the
//! table-wide defaults, the band counts and one text style reference per
//! region. Rows, columns and cells never point back at the table; everything
//! that needs table context goes through the index-based methods here.
//!
//! Every entity carries an [`ElementId`] that survives index shifts. Row and
//! column insertion or deletion renumbers the positions after the edit and
//! bumps [`Table::generation`], so a holder of an id can detect staleness
//! with [`Table::row_index_of`] / [`Table::column_index_of`] instead of
//! reading reassigned state through an old index.
use crate::content::ContentMeasurer;
use crate::content::TextBlock;
use crate::options::TableOptions;
use crate::persist::AspectState;
use crate::persist::AspectType;
use crate::style::StyleId;
use crate::style::StyleResolver;
use crate::style::TextStyle;
use crate::table::cell::empty_minimum_size;
use crate::table::cell::Cell;
use crate::table::cell::CellAlignment;
use crate::table::cell::CellContext;
use crate::table::cell::CellIndex;
use crate::table::cell::CellOrientation;
use crate::table::cell::CellSize;
use crate::table::cell::Margins;
use crate::table::cell::MarginOverrides;
use crate::table::cell::SizeMode;
use crate::table::column::Column;
use crate::table::region::classify;
use crate::table::region::Band;
use crate::table::region::Region;
use crate::table::row::Row;
use std::cell::RefCell;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

pub mod cell;
pub mod column;
pub mod region;
pub mod row;
pub mod sizing;

pub use sizing::LockAction;

/// Two sizes closer than this are the same size.
pub const SIZE_TOLERANCE: f64 = 1e-8;

/// Compares two sizes within [`SIZE_TOLERANCE`].
pub fn is_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= SIZE_TOLERANCE
}

/// Errors raised by table mutations.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("A table needs at least one row and one column, got {rows}x{columns}")]
    EmptyTable { rows: usize, columns: usize },

    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("Column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("Cell {0} is out of range")]
    CellOutOfRange(CellIndex),

    #[error("Cannot delete the last remaining row")]
    LastRow,

    #[error("Cannot delete the last remaining column")]
    LastColumn,

    #[error("{band} count {count} exceeds the {limit} available")]
    BandTooLarge { band: &'static str, count: usize, limit: usize },

    #[error("Size propagation exceeded {limit} nested updates at {axis} {index}")]
    PropagationLimit { axis: Axis, index: usize, limit: usize },
}

/// Stable identity of a header, row, column or cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing element ids.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub(crate) fn starting_after(last: u64) -> Self {
        Self { last }
    }

    pub(crate) fn next(&mut self) -> ElementId {
        self.last += 1;
        ElementId(self.last)
    }
}

/// The two kinds of track: rows are sized by height, columns by width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub const fn orthogonal(self) -> Axis {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::Row => "row",
            Axis::Column => "column",
        })
    }
}

/// Where a new row or column goes relative to its seed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertDirection {
    Before,
    After,
}

/// The persisted table-wide state.
#[derive(Clone, Debug)]
pub struct TableHeader {
    pub(crate) id: ElementId,
    pub(crate) row_count: usize,
    pub(crate) column_count: usize,
    pub(crate) title_row_count: usize,
    pub(crate) header_row_count: usize,
    pub(crate) footer_row_count: usize,
    pub(crate) header_column_count: usize,
    pub(crate) footer_column_count: usize,
    pub(crate) default_row_height: f64,
    pub(crate) default_column_width: f64,
    pub(crate) default_margins: Margins,
    pub(crate) default_alignment: CellAlignment,
    pub(crate) default_orientation: CellOrientation,
    pub(crate) text_styles: [Option<StyleId>; Region::COUNT],
    pub(crate) state: AspectState,
}

impl TableHeader {
    pub(crate) fn new(id: ElementId, row_count: usize, column_count: usize) -> Self {
        Self {
            id,
            row_count,
            column_count,
            title_row_count: 0,
            header_row_count: 0,
            footer_row_count: 0,
            header_column_count: 0,
            footer_column_count: 0,
            default_row_height: 0.0,
            default_column_width: 0.0,
            default_margins: Margins::uniform(0.0),
            default_alignment: CellAlignment::default(),
            default_orientation: CellOrientation::default(),
            text_styles: [None; Region::COUNT],
            state: AspectState::default(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    pub fn default_margins(&self) -> &Margins {
        &self.default_margins
    }

    pub fn default_alignment(&self) -> CellAlignment {
        self.default_alignment
    }

    pub fn default_orientation(&self) -> CellOrientation {
        self.default_orientation
    }

    /// The default size of a track along `axis`.
    pub fn default_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.default_row_height,
            Axis::Column => self.default_column_width,
        }
    }
}

/// External collaborators and configuration a table works with.
pub struct TableEnvironment {
    pub(crate) styles: Box<dyn StyleResolver>,
    pub(crate) measurer: Box<dyn ContentMeasurer>,
    pub(crate) options: TableOptions,
}

impl TableEnvironment {
    pub fn new(styles: impl StyleResolver + 'static, measurer: impl ContentMeasurer + 'static) -> Self {
        Self {
            styles: Box::new(styles),
            measurer: Box::new(measurer),
            options: TableOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }
}

/// A grid of rows and columns sized by the content of its cells.
pub struct Table {
    pub(crate) header: TableHeader,
    pub(crate) rows: Vec<Row>,
    pub(crate) columns: Vec<Column>,
    pub(crate) env: TableEnvironment,
    style_cache: RefCell<[Option<TextStyle>; Region::COUNT]>,
    pub(crate) ids: IdAllocator,
    /// Persisted entities removed since the last save
    pub(crate) removed: Vec<(AspectType, ElementId)>,
    generation: u64,
    pub(crate) propagation_depth: usize,
}

impl Table {
    /// Creates a new table whose defaults derive from the Body text style.
    pub fn create(row_count: usize, column_count: usize, body_style: StyleId, env: TableEnvironment) -> Result<Self, TableError> {
        if row_count == 0 || column_count == 0 {
            return Err(TableError::EmptyTable {
                rows: row_count,
                columns: column_count,
            });
        }
        let mut ids = IdAllocator::default();
        let mut header = TableHeader::new(ids.next(), row_count, column_count);
        header.text_styles[Region::Body.ordinal()] = Some(body_style);

        let mut table = Self::with_header(header, ids, env);
        table.initialize(true);
        debug!(rows = row_count, columns = column_count, "created table");
        Ok(table)
    }

    pub(crate) fn with_header(header: TableHeader, ids: IdAllocator, env: TableEnvironment) -> Self {
        Self {
            header,
            rows: Vec::new(),
            columns: Vec::new(),
            env,
            style_cache: RefCell::new([None; Region::COUNT]),
            ids,
            removed: Vec::new(),
            generation: 0,
            propagation_depth: 0,
        }
    }

    /// Builds the columns, then the rows and their cells, from the header counts.
    pub(crate) fn initialize(&mut self, is_new_table: bool) {
        let row_count = self.header.row_count;
        let column_count = self.header.column_count;
        self.columns = (0..column_count).map(|index| Column::new(self.ids.next(), index)).collect();
        self.rows = (0..row_count)
            .map(|index| Row::new(&mut self.ids, index, column_count))
            .collect();

        if is_new_table {
            let style = self.region_text_style(Region::Body);
            let descender = self.env.options.descender_ratio * style.height;
            self.header.default_margins = Margins::uniform(descender);
            self.header.default_row_height = empty_minimum_size(&style, self.env.options.descender_ratio).height;
            self.header.default_column_width = self.env.options.column_width_factor * style.height * style.width_factor;
        }
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn options(&self) -> &TableOptions {
        &self.env.options
    }

    pub fn measurer(&self) -> &dyn ContentMeasurer {
        self.env.measurer.as_ref()
    }

    /// Counter bumped by every structural edit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.rows.get(index.row)?.cells.get(index.col)
    }

    /// All cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    pub fn row_by_id(&self, id: ElementId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn column_by_id(&self, id: ElementId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn row_index_of(&self, id: ElementId) -> Option<usize> {
        self.row_by_id(id).map(Row::index)
    }

    pub fn column_index_of(&self, id: ElementId) -> Option<usize> {
        self.column_by_id(id).map(Column::index)
    }

    pub(crate) fn cell_mut(&mut self, index: CellIndex) -> Result<&mut Cell, TableError> {
        self.rows
            .get_mut(index.row)
            .and_then(|row| row.cells.get_mut(index.col))
            .ok_or(TableError::CellOutOfRange(index))
    }

    pub(crate) fn check_track(&self, axis: Axis, index: usize) -> Result<(), TableError> {
        match axis {
            Axis::Row if index >= self.rows.len() => Err(TableError::RowOutOfRange(index)),
            Axis::Column if index >= self.columns.len() => Err(TableError::ColumnOutOfRange(index)),
            _ => Ok(()),
        }
    }

    // Bands and regions

    pub fn title_row_count(&self) -> usize {
        self.header.title_row_count
    }

    pub fn header_row_count(&self) -> usize {
        self.header.header_row_count
    }

    pub fn footer_row_count(&self) -> usize {
        self.header.footer_row_count
    }

    pub fn header_column_count(&self) -> usize {
        self.header.header_column_count
    }

    pub fn footer_column_count(&self) -> usize {
        self.header.footer_column_count
    }

    pub fn set_title_row_count(&mut self, count: usize) -> Result<(), TableError> {
        Self::check_band("title row", count, self.rows.len())?;
        self.header.title_row_count = count;
        self.header.state.mark_changed();
        Ok(())
    }

    pub fn set_header_row_count(&mut self, count: usize) -> Result<(), TableError> {
        Self::check_band("header row", count, self.rows.len())?;
        self.header.header_row_count = count;
        self.header.state.mark_changed();
        Ok(())
    }

    pub fn set_footer_row_count(&mut self, count: usize) -> Result<(), TableError> {
        Self::check_band("footer row", count, self.rows.len())?;
        self.header.footer_row_count = count;
        self.header.state.mark_changed();
        Ok(())
    }

    pub fn set_header_column_count(&mut self, count: usize) -> Result<(), TableError> {
        Self::check_band("header column", count, self.columns.len())?;
        self.header.header_column_count = count;
        self.header.state.mark_changed();
        Ok(())
    }

    pub fn set_footer_column_count(&mut self, count: usize) -> Result<(), TableError> {
        Self::check_band("footer column", count, self.columns.len())?;
        self.header.footer_column_count = count;
        self.header.state.mark_changed();
        Ok(())
    }

    fn check_band(band: &'static str, count: usize, limit: usize) -> Result<(), TableError> {
        if count > limit {
            return Err(TableError::BandTooLarge { band, count, limit });
        }
        Ok(())
    }

    /// Band of track `index` along `axis`; the index is assumed valid.
    pub(crate) fn band_of(&self, axis: Axis, index: usize) -> Band {
        let header = &self.header;
        match axis {
            Axis::Row => classify(
                header.title_row_count,
                header.header_row_count,
                header.footer_row_count,
                self.rows.len(),
                index,
            ),
            Axis::Column => classify(
                0,
                header.header_column_count,
                header.footer_column_count,
                self.columns.len(),
                index,
            ),
        }
    }

    pub fn row_band(&self, index: usize) -> Option<Band> {
        (index < self.rows.len()).then(|| self.band_of(Axis::Row, index))
    }

    pub fn column_band(&self, index: usize) -> Option<Band> {
        (index < self.columns.len()).then(|| self.band_of(Axis::Column, index))
    }

    pub fn cell_region(&self, index: CellIndex) -> Option<Region> {
        let row_band = self.row_band(index.row)?;
        let column_band = self.column_band(index.col)?;
        Some(Region::of_cell(row_band, column_band))
    }

    /// True when at least one track along `axis` falls in `band`.
    pub(crate) fn has_band(&self, axis: Axis, band: Band) -> bool {
        let count = match axis {
            Axis::Row => self.rows.len(),
            Axis::Column => self.columns.len(),
        };
        (0..count).any(|index| self.band_of(axis, index) == band)
    }

    // Text styles

    pub fn text_style_id(&self, region: Region) -> Option<StyleId> {
        self.header.text_styles[region.ordinal()]
    }

    pub fn set_text_style(&mut self, region: Region, style: Option<StyleId>) {
        self.header.text_styles[region.ordinal()] = style;
        self.header.state.mark_changed();
        self.invalidate_text_styles();
    }

    /// Drops cached style resolutions, e.g. after the host edited a style.
    pub fn invalidate_text_styles(&self) {
        *self.style_cache.borrow_mut() = [None; Region::COUNT];
    }

    /// The style used for sizing cells of `region`.
    ///
    /// Falls back to the Body style, then to a style of the configured
    /// backup height, when the region's style is missing or has no height.
    pub fn region_text_style(&self, region: Region) -> TextStyle {
        if let Some(style) = self.style_cache.borrow()[region.ordinal()] {
            return style;
        }
        let resolve = |id: Option<StyleId>| {
            id.and_then(|id| self.env.styles.resolve(id))
                .filter(TextStyle::is_usable)
        };
        let style = resolve(self.text_style_id(region))
            .or_else(|| resolve(self.text_style_id(Region::Body)))
            .unwrap_or_else(|| TextStyle::new(self.env.options.backup_text_height, 1.0));
        self.style_cache.borrow_mut()[region.ordinal()] = Some(style);
        style
    }

    /// A text block styled for `region`.
    pub fn new_text_block(&self, region: Region, text: &str) -> TextBlock {
        let block = TextBlock::new(text, self.region_text_style(region));
        match self.text_style_id(region).or_else(|| self.text_style_id(Region::Body)) {
            Some(id) => block.with_style_id(id),
            None => block,
        }
    }

    /// Size of an empty cell in `region`.
    pub fn empty_region_size(&self, region: Region) -> CellSize {
        empty_minimum_size(&self.region_text_style(region), self.env.options.descender_ratio)
    }

    // Defaults

    pub fn default_row_height(&self) -> f64 {
        self.header.default_row_height
    }

    pub fn default_column_width(&self) -> f64 {
        self.header.default_column_width
    }

    pub fn set_default_row_height(&mut self, height: f64) {
        self.header.default_row_height = height;
        self.header.state.mark_changed();
    }

    pub fn set_default_column_width(&mut self, width: f64) {
        self.header.default_column_width = width;
        self.header.state.mark_changed();
    }

    pub fn set_default_margins(&mut self, margins: Margins) {
        self.header.default_margins = margins;
        self.header.state.mark_changed();
    }

    pub fn set_default_alignment(&mut self, alignment: CellAlignment) {
        self.header.default_alignment = alignment;
        self.header.state.mark_changed();
    }

    pub fn set_default_orientation(&mut self, orientation: CellOrientation) {
        self.header.default_orientation = orientation;
        self.header.state.mark_changed();
    }

    // Cells

    /// Sizing context of a valid cell.
    pub(crate) fn cell_context(&self, index: CellIndex) -> CellContext {
        let cell = &self.rows[index.row].cells[index.col];
        let region = Region::of_cell(self.band_of(Axis::Row, index.row), self.band_of(Axis::Column, index.col));
        CellContext {
            style: self.region_text_style(region),
            margins: cell.margins.resolve(&self.header.default_margins),
            orientation: cell.orientation.unwrap_or(self.header.default_orientation),
            descender_ratio: self.env.options.descender_ratio,
        }
    }

    /// Space the cell at `index` needs in the given mode.
    pub fn cell_content_size(&self, index: CellIndex, mode: SizeMode) -> Option<CellSize> {
        let cell = self.cell(index)?;
        let context = self.cell_context(index);
        Some(cell.content_size(self.measurer(), &context, mode))
    }

    pub fn cell_alignment(&self, index: CellIndex) -> Option<CellAlignment> {
        let cell = self.cell(index)?;
        Some(cell.alignment.unwrap_or(self.header.default_alignment))
    }

    pub fn cell_orientation(&self, index: CellIndex) -> Option<CellOrientation> {
        let cell = self.cell(index)?;
        Some(cell.orientation.unwrap_or(self.header.default_orientation))
    }

    pub fn cell_margins(&self, index: CellIndex) -> Option<Margins> {
        let cell = self.cell(index)?;
        Some(cell.margins.resolve(&self.header.default_margins))
    }

    pub fn text_block(&self, index: CellIndex) -> Option<&TextBlock> {
        self.cell(index)?.text_block()
    }

    /// Places `block` in the cell and resizes the tracks it touches.
    pub fn set_cell_text_block(&mut self, index: CellIndex, block: TextBlock) -> Result<(), TableError> {
        self.cell_mut(index)?.set_text_block(Some(block));
        self.fit_cell(index)
    }

    pub fn clear_cell_text(&mut self, index: CellIndex) -> Result<(), TableError> {
        self.cell_mut(index)?.set_text_block(None);
        self.fit_cell(index)
    }

    pub fn set_cell_margins(&mut self, index: CellIndex, margins: MarginOverrides) -> Result<(), TableError> {
        let cell = self.cell_mut(index)?;
        cell.margins = margins;
        cell.state.mark_changed();
        self.fit_cell(index)
    }

    pub fn set_cell_orientation(&mut self, index: CellIndex, orientation: Option<CellOrientation>) -> Result<(), TableError> {
        let cell = self.cell_mut(index)?;
        let previous = cell.orientation;
        cell.orientation = orientation;
        cell.state.mark_changed();
        if let Some(block) = cell.content.text_mut().block_mut() {
            // The old wrap width belongs to the other axis.
            if previous != orientation {
                block.set_wrap_width(0.0);
            }
        }
        self.fit_cell(index)
    }

    pub fn set_cell_alignment(&mut self, index: CellIndex, alignment: Option<CellAlignment>) -> Result<(), TableError> {
        let cell = self.cell_mut(index)?;
        cell.alignment = alignment;
        cell.state.mark_changed();
        Ok(())
    }

    pub fn set_cell_fill_key(&mut self, index: CellIndex, fill_key: Option<u32>) -> Result<(), TableError> {
        let cell = self.cell_mut(index)?;
        cell.fill_key = fill_key;
        cell.state.mark_changed();
        Ok(())
    }

    // Structure

    /// Inserts a row next to `seed` and returns the new row's index.
    ///
    /// The new row copies the seed's height, lock and cell formatting, and
    /// joins the seed's band.
    pub fn insert_row(&mut self, seed: usize, direction: InsertDirection) -> Result<usize, TableError> {
        self.check_track(Axis::Row, seed)?;
        let index = match direction {
            InsertDirection::Before => seed,
            InsertDirection::After => seed + 1,
        };
        let band = self.band_of(Axis::Row, seed);
        let source = &self.rows[seed];
        let mut row = Row {
            id: self.ids.next(),
            index,
            height: source.height,
            height_lock: source.height_lock,
            cells: Vec::with_capacity(source.cells.len()),
            state: AspectState::default(),
        };
        for seed_cell in &source.cells {
            let position = CellIndex::new(index, seed_cell.index.col);
            row.cells.push(Cell::with_format_of(self.ids.next(), position, seed_cell));
        }
        self.rows.insert(index, row);
        self.renumber(Axis::Row, index);

        match band {
            Band::Title => self.header.title_row_count += 1,
            Band::Header => self.header.header_row_count += 1,
            Band::Footer => self.header.footer_row_count += 1,
            Band::Body => (),
        }
        self.header.row_count = self.rows.len();
        self.structure_changed();
        debug!(row = index, "inserted row");
        Ok(index)
    }

    /// Inserts a column next to `seed` and returns the new column's index.
    pub fn insert_column(&mut self, seed: usize, direction: InsertDirection) -> Result<usize, TableError> {
        self.check_track(Axis::Column, seed)?;
        let index = match direction {
            InsertDirection::Before => seed,
            InsertDirection::After => seed + 1,
        };
        let band = self.band_of(Axis::Column, seed);
        let source = &self.columns[seed];
        let column = Column {
            id: self.ids.next(),
            index,
            width: source.width,
            width_lock: source.width_lock,
            state: AspectState::default(),
        };
        self.columns.insert(index, column);
        for row in self.rows.iter_mut() {
            let position = CellIndex::new(row.index, index);
            let cell = Cell::with_format_of(self.ids.next(), position, &row.cells[seed]);
            row.cells.insert(index, cell);
        }
        self.renumber(Axis::Column, index);

        match band {
            Band::Header => self.header.header_column_count += 1,
            Band::Footer => self.header.footer_column_count += 1,
            Band::Title | Band::Body => (),
        }
        self.header.column_count = self.columns.len();
        self.structure_changed();
        debug!(column = index, "inserted column");
        Ok(index)
    }

    /// Removes row `index`; the last remaining row cannot be removed.
    pub fn delete_row(&mut self, index: usize) -> Result<(), TableError> {
        self.check_track(Axis::Row, index)?;
        if self.rows.len() == 1 {
            return Err(TableError::LastRow);
        }
        let band = self.band_of(Axis::Row, index);
        let row = self.rows.remove(index);
        if row.state.is_persisted() {
            self.removed.push((AspectType::Row, row.id));
        }
        for cell in row.cells.iter().filter(|cell| cell.state.is_persisted()) {
            self.removed.push((AspectType::Cell, cell.id));
        }
        self.renumber(Axis::Row, index);

        let header = &mut self.header;
        match band {
            Band::Title => header.title_row_count -= 1,
            Band::Header => header.header_row_count -= 1,
            Band::Footer => header.footer_row_count -= 1,
            Band::Body => (),
        }
        // Overlapping bands may still exceed the shorter table.
        header.row_count = self.rows.len();
        header.title_row_count = header.title_row_count.min(header.row_count);
        header.header_row_count = header.header_row_count.min(header.row_count);
        header.footer_row_count = header.footer_row_count.min(header.row_count);
        self.structure_changed();
        debug!(row = index, "deleted row");
        Ok(())
    }

    /// Removes column `index`; the last remaining column cannot be removed.
    pub fn delete_column(&mut self, index: usize) -> Result<(), TableError> {
        self.check_track(Axis::Column, index)?;
        if self.columns.len() == 1 {
            return Err(TableError::LastColumn);
        }
        let band = self.band_of(Axis::Column, index);
        let column = self.columns.remove(index);
        if column.state.is_persisted() {
            self.removed.push((AspectType::Column, column.id));
        }
        for row in self.rows.iter_mut() {
            let cell = row.cells.remove(index);
            if cell.state.is_persisted() {
                self.removed.push((AspectType::Cell, cell.id));
            }
        }
        self.renumber(Axis::Column, index);

        let header = &mut self.header;
        match band {
            Band::Header => header.header_column_count -= 1,
            Band::Footer => header.footer_column_count -= 1,
            Band::Title | Band::Body => (),
        }
        header.column_count = self.columns.len();
        header.header_column_count = header.header_column_count.min(header.column_count);
        header.footer_column_count = header.footer_column_count.min(header.column_count);
        self.structure_changed();
        debug!(column = index, "deleted column");
        Ok(())
    }

    /// Reassigns indices of every track from `start` on.
    fn renumber(&mut self, axis: Axis, start: usize) {
        match axis {
            Axis::Row => {
                for (index, row) in self.rows.iter_mut().enumerate().skip(start) {
                    row.reindex(index);
                }
            }
            Axis::Column => {
                for (index, column) in self.columns.iter_mut().enumerate().skip(start) {
                    column.reindex(index);
                }
                for row in self.rows.iter_mut() {
                    let row_index = row.index;
                    for (col, cell) in row.cells.iter_mut().enumerate().skip(start) {
                        if cell.index.col != col {
                            cell.index = CellIndex::new(row_index, col);
                            cell.state.mark_changed();
                        }
                    }
                }
            }
        }
    }

    fn structure_changed(&mut self) {
        self.generation += 1;
        self.header.state.mark_changed();
        self.invalidate_text_styles();
    }
}
