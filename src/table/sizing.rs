//! Row and column sizing.
//!
//! A size change on one track re-fits the cells it crosses. Each re-fitted
//! cell may then need more (or less) room along the orthogonal axis, which
//! grows (or shrinks) the orthogonal track and repeats the same process
//! there. Nesting is bounded by [`TableOptions::max_propagation_depth`].
//!
//! [`TableOptions::max_propagation_depth`]: crate::options::TableOptions
use crate::table::cell::CellIndex;
use crate::table::cell::SizeMode;
use crate::table::region::Band;
use crate::table::region::Region;
use crate::table::Axis;
use crate::table::Table;
use crate::table::TableError;
use crate::table::SIZE_TOLERANCE;
use tracing::debug;
use tracing::trace;
use tracing::warn;

/// What a size setter does to the track's lock flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LockAction {
    TurnOn,
    TurnOff,
    NoChange,
}

impl LockAction {
    fn apply(self, lock: Option<bool>) -> Option<bool> {
        match self {
            LockAction::TurnOn => Some(true),
            LockAction::TurnOff => Some(false),
            LockAction::NoChange => lock,
        }
    }
}

impl Table {
    /// Resolved size of a valid track.
    pub(crate) fn track_size(&self, axis: Axis, index: usize) -> f64 {
        let size = match axis {
            Axis::Row => self.rows[index].height,
            Axis::Column => self.columns[index].width,
        };
        size.unwrap_or_else(|| self.header.default_size(axis))
    }

    pub(crate) fn is_track_locked(&self, axis: Axis, index: usize) -> bool {
        match axis {
            Axis::Row => self.rows[index].is_height_locked(),
            Axis::Column => self.columns[index].is_width_locked(),
        }
    }

    /// Cells crossing track `index` along `axis`.
    fn cells_in_track(&self, axis: Axis, index: usize) -> Vec<CellIndex> {
        match axis {
            Axis::Row => (0..self.columns.len()).map(|col| CellIndex::new(index, col)).collect(),
            Axis::Column => (0..self.rows.len()).map(|row| CellIndex::new(row, index)).collect(),
        }
    }

    /// Space the tracks spanned by the cell give it along `axis`.
    fn cell_extent(&self, position: CellIndex, axis: Axis) -> f64 {
        let cell = &self.rows[position.row].cells[position.col];
        let start = position.along(axis);
        (start..start + cell.span_along(axis))
            .map(|index| self.track_size(axis, index))
            .sum()
    }

    fn cell_need(&self, position: CellIndex, axis: Axis, mode: SizeMode) -> f64 {
        let cell = &self.rows[position.row].cells[position.col];
        let context = self.cell_context(position);
        cell.content_size(self.measurer(), &context, mode).along(axis)
    }

    /// Largest need of the crossing cells, net of what other spanned tracks supply.
    fn track_need(&self, axis: Axis, index: usize, mode: SizeMode) -> f64 {
        let current = self.track_size(axis, index);
        self.cells_in_track(axis, index)
            .into_iter()
            .map(|position| {
                let supplied = self.cell_extent(position, axis) - current;
                self.cell_need(position, axis, mode) - supplied
            })
            .fold(0.0, f64::max)
    }

    /// Smallest size track `index` may take along `axis`.
    pub(crate) fn minimum_size(&self, axis: Axis, index: usize, allow_reflow: bool) -> f64 {
        let mode = if allow_reflow {
            SizeMode::FullyCompressed
        } else {
            SizeMode::Current
        };
        let minimum = self.track_need(axis, index, mode);
        let has_unshared = self
            .cells_in_track(axis, index)
            .into_iter()
            .any(|position| self.rows[position.row].cells[position.col].is_unshared_in(axis, index));
        if has_unshared {
            minimum
        } else {
            minimum.max(self.alternate_minimum_size(axis, index))
        }
    }

    /// Minimum derived from empty cells of the bands the track runs through.
    pub(crate) fn alternate_minimum_size(&self, axis: Axis, index: usize) -> f64 {
        let own_band = self.band_of(axis, index);
        let candidates: Vec<Region> = match axis {
            Axis::Row if own_band == Band::Body => vec![Region::Body],
            Axis::Row => [
                (Band::Header, Region::HeaderColumn),
                (Band::Footer, Region::FooterColumn),
                (Band::Body, Region::Body),
            ]
            .into_iter()
            .filter(|(band, _)| self.has_band(Axis::Column, *band))
            .map(|(_, region)| region)
            .collect(),
            Axis::Column => {
                let mut regions: Vec<Region> = [
                    (Band::Title, Region::TitleRow),
                    (Band::Header, Region::HeaderRow),
                    (Band::Footer, Region::FooterRow),
                ]
                .into_iter()
                .filter(|(band, _)| self.has_band(Axis::Row, *band))
                .map(|(_, region)| region)
                .collect();
                if self.has_band(Axis::Row, Band::Body) {
                    regions.push(Region::for_column_band(own_band));
                }
                regions
            }
        };
        candidates
            .into_iter()
            .map(|region| self.empty_region_size(region).along(axis))
            .fold(0.0, f64::max)
    }

    /// Size track `index` would take with no wrapping anywhere.
    pub(crate) fn expanded_size(&self, axis: Axis, index: usize) -> f64 {
        self.track_need(axis, index, SizeMode::FullyExpanded)
    }

    /// Stores `size` and the lock change, then propagates into the crossing
    /// cells when the size moved by more than [`SIZE_TOLERANCE`].
    pub(crate) fn set_track_size(&mut self, axis: Axis, index: usize, size: f64, lock: LockAction) -> Result<(), TableError> {
        self.check_track(axis, index)?;
        let previous = self.track_size(axis, index);
        match axis {
            Axis::Row => {
                let row = &mut self.rows[index];
                row.height = Some(size);
                row.height_lock = lock.apply(row.height_lock);
                row.state.mark_changed();
            }
            Axis::Column => {
                let column = &mut self.columns[index];
                column.width = Some(size);
                column.width_lock = lock.apply(column.width_lock);
                column.state.mark_changed();
            }
        }
        if (size - previous).abs() <= SIZE_TOLERANCE {
            return Ok(());
        }

        let limit = self.env.options.max_propagation_depth;
        if self.propagation_depth >= limit {
            warn!(%axis, index, limit, "size propagation did not settle");
            return Err(TableError::PropagationLimit { axis, index, limit });
        }
        trace!(%axis, index, previous, size, depth = self.propagation_depth, "track resized");

        self.propagation_depth += 1;
        let result = self
            .cells_in_track(axis, index)
            .into_iter()
            .try_for_each(|position| self.on_cell_dimension_changed(position, axis));
        self.propagation_depth -= 1;
        result
    }

    /// Re-fits one cell after its track along `axis` changed and settles the
    /// orthogonal track against the cell's new need.
    fn on_cell_dimension_changed(&mut self, position: CellIndex, axis: Axis) -> Result<(), TableError> {
        let other = axis.orthogonal();
        let context = self.cell_context(position);
        let available = self.cell_extent(position, axis);
        let locked = self.is_track_locked(axis, position.along(axis));

        let measurer = self.env.measurer.as_ref();
        let cell = &mut self.rows[position.row].cells[position.col];
        let before = cell.content_size(measurer, &context, SizeMode::Current).along(other);
        if !cell.fit_to_axis(axis, available, locked, &context) {
            return Ok(());
        }
        self.accommodate(position, other, Some(before))
    }

    /// Grows the cell's track along `axis` when the cell no longer fits, or
    /// shrinks an unlocked track when the need dropped below `previous_need`.
    fn accommodate(&mut self, position: CellIndex, axis: Axis, previous_need: Option<f64>) -> Result<(), TableError> {
        let track = position.along(axis);
        let need = self.cell_need(position, axis, SizeMode::Current);
        let extent = self.cell_extent(position, axis);

        if need > extent + SIZE_TOLERANCE {
            let grown = self.track_size(axis, track) + (need - extent);
            trace!(%axis, track, grown, cell = %position, "growing track to fit cell");
            self.set_track_size(axis, track, grown, LockAction::NoChange)
        } else if !self.is_track_locked(axis, track)
            && previous_need.map_or(true, |before| need < before - SIZE_TOLERANCE)
        {
            self.shrink_to_contents(axis, track)
        } else {
            Ok(())
        }
    }

    /// Re-fits a cell whose content or formatting changed.
    pub(crate) fn fit_cell(&mut self, position: CellIndex) -> Result<(), TableError> {
        let context = self.cell_context(position);
        let flow = context.orientation.flow_axis();
        let available = self.cell_extent(position, flow);
        let locked = self.is_track_locked(flow, position.along(flow));
        self.rows[position.row].cells[position.col].fit_to_axis(flow, available, locked, &context);

        self.accommodate(position, flow, None)?;
        self.accommodate(position, flow.orthogonal(), None)
    }

    fn shrink_to_contents(&mut self, axis: Axis, index: usize) -> Result<(), TableError> {
        let minimum = self.minimum_size(axis, index, false);
        self.set_track_size(axis, index, minimum, LockAction::NoChange)
    }

    /// User-driven resize: clamps to the minimum and locks the track.
    fn set_track_size_clamped(&mut self, axis: Axis, index: usize, size: f64) -> Result<(), TableError> {
        self.check_track(axis, index)?;
        let minimum = self.minimum_size(axis, index, true);
        let size = size.max(minimum);
        debug!(%axis, index, size, minimum, "resizing track");
        self.set_track_size(axis, index, size, LockAction::TurnOn)
    }

    fn set_track_size_from_contents(&mut self, axis: Axis, index: usize, allow_reflow: bool) -> Result<(), TableError> {
        self.check_track(axis, index)?;
        let expanded = self.expanded_size(axis, index);
        let lock = if allow_reflow {
            LockAction::TurnOff
        } else {
            LockAction::NoChange
        };
        debug!(%axis, index, expanded, "fitting track to contents");
        self.set_track_size(axis, index, expanded, lock)
    }

    // Rows

    pub fn row_height(&self, index: usize) -> Option<f64> {
        (index < self.rows.len()).then(|| self.track_size(Axis::Row, index))
    }

    pub fn is_row_height_locked(&self, index: usize) -> Option<bool> {
        self.rows.get(index).map(|row| row.is_height_locked())
    }

    /// Sets the height, raised to the minimum if needed, and locks it.
    pub fn set_row_height(&mut self, index: usize, height: f64) -> Result<(), TableError> {
        self.set_track_size_clamped(Axis::Row, index, height)
    }

    /// Stores `height` as is and applies `lock`.
    pub fn set_row_height_with_lock(&mut self, index: usize, height: f64, lock: LockAction) -> Result<(), TableError> {
        self.set_track_size(Axis::Row, index, height, lock)
    }

    /// Sizes the row to its unwrapped content; unlocks it when reflow is allowed.
    pub fn set_row_height_from_contents(&mut self, index: usize, allow_reflow: bool) -> Result<(), TableError> {
        self.set_track_size_from_contents(Axis::Row, index, allow_reflow)
    }

    pub fn shrink_row_height_to_contents(&mut self, index: usize) -> Result<(), TableError> {
        self.check_track(Axis::Row, index)?;
        self.shrink_to_contents(Axis::Row, index)
    }

    pub fn minimum_row_height(&self, index: usize, allow_reflow: bool) -> Option<f64> {
        (index < self.rows.len()).then(|| self.minimum_size(Axis::Row, index, allow_reflow))
    }

    pub fn alternate_minimum_row_height(&self, index: usize) -> Option<f64> {
        (index < self.rows.len()).then(|| self.alternate_minimum_size(Axis::Row, index))
    }

    // Columns

    pub fn column_width(&self, index: usize) -> Option<f64> {
        (index < self.columns.len()).then(|| self.track_size(Axis::Column, index))
    }

    pub fn is_column_width_locked(&self, index: usize) -> Option<bool> {
        self.columns.get(index).map(|column| column.is_width_locked())
    }

    /// Sets the width, raised to the minimum if needed, and locks it.
    pub fn set_column_width(&mut self, index: usize, width: f64) -> Result<(), TableError> {
        self.set_track_size_clamped(Axis::Column, index, width)
    }

    /// Stores `width` as is and applies `lock`.
    pub fn set_column_width_with_lock(&mut self, index: usize, width: f64, lock: LockAction) -> Result<(), TableError> {
        self.set_track_size(Axis::Column, index, width, lock)
    }

    /// Sizes the column to its unwrapped content; unlocks it when reflow is allowed.
    pub fn set_column_width_from_contents(&mut self, index: usize, allow_reflow: bool) -> Result<(), TableError> {
        self.set_track_size_from_contents(Axis::Column, index, allow_reflow)
    }

    pub fn shrink_column_width_to_contents(&mut self, index: usize) -> Result<(), TableError> {
        self.check_track(Axis::Column, index)?;
        self.shrink_to_contents(Axis::Column, index)
    }

    pub fn minimum_column_width(&self, index: usize, allow_reflow: bool) -> Option<f64> {
        (index < self.columns.len()).then(|| self.minimum_size(Axis::Column, index, allow_reflow))
    }

    pub fn alternate_minimum_column_width(&self, index: usize) -> Option<f64> {
        (index < self.columns.len()).then(|| self.alternate_minimum_size(Axis::Column, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MonospaceMeasurer;
    use crate::content::TextBlock;
    use crate::options::TableOptions;
    use crate::style::StyleCatalog;
    use crate::style::TextStyle;
    use crate::table::cell::CellOrientation;
    use crate::table::tests::assert_close;
    use crate::table::tests::sample_table;
    use crate::table::TableEnvironment;

    fn put_text(table: &mut Table, row: usize, col: usize, text: &str) {
        let block = table.new_text_block(Region::Body, text);
        table.set_cell_text_block(CellIndex::new(row, col), block).expect("valid cell");
    }

    fn wrap_width(table: &Table, row: usize, col: usize) -> Option<f64> {
        table.text_block(CellIndex::new(row, col)).map(TextBlock::wrap_width)
    }

    #[test]
    fn widening_an_empty_column_leaves_everything_else_alone() {
        let mut table = sample_table(1, 3);
        let width = table.default_column_width() * 3.0;

        table.set_column_width_with_lock(1, width, LockAction::TurnOn).expect("valid column");

        assert_close(table.column_width(1).expect("column 1"), 30.0);
        assert_eq!(table.column(0).and_then(|column| column.width_override()), None);
        assert_eq!(table.column(2).and_then(|column| column.width_override()), None);
        assert_eq!(table.row(0).and_then(|row| row.height_override()), None);
        assert_close(table.row_height(0).expect("row 0"), table.default_row_height());
    }

    #[test]
    fn long_text_grows_its_row_and_widening_shrinks_it_back() {
        let mut table = sample_table(1, 3);
        put_text(&mut table, 0, 1, "alpha beta gamma delta");

        // Wrapped at 9.4 into four lines: 4 + 3 * 0.5 + margins.
        assert_close(table.row_height(0).expect("row 0"), 6.1);
        assert_close(wrap_width(&table, 0, 1).expect("text"), 9.4);

        table.set_column_width(1, 30.0).expect("valid column");

        assert_close(table.column_width(1).expect("column 1"), 30.0);
        assert_close(table.row_height(0).expect("row 0"), 1.6);
        assert_eq!(table.column(0).and_then(|column| column.width_override()), None);
        assert_eq!(table.column(2).and_then(|column| column.width_override()), None);
    }

    #[test]
    fn locked_row_keeps_its_height_when_content_shrinks() {
        let mut table = sample_table(1, 2);
        put_text(&mut table, 0, 0, "alpha beta gamma delta");
        table.set_row_height(0, 8.0).expect("valid row");

        table.set_column_width(0, 30.0).expect("valid column");

        assert_close(table.row_height(0).expect("row 0"), 8.0);
        assert_eq!(table.is_row_height_locked(0), Some(true));
    }

    #[test]
    fn user_width_is_clamped_to_the_minimum() {
        let mut table = sample_table(2, 2);
        put_text(&mut table, 1, 0, "extraordinarily");

        table.set_column_width(0, 2.0).expect("valid column");

        let minimum = table.minimum_column_width(0, true).expect("column 0");
        assert_close(minimum, 15.6);
        assert!(table.column_width(0).expect("column 0") >= minimum - SIZE_TOLERANCE);
        assert_eq!(table.is_column_width_locked(0), Some(true));
    }

    #[test]
    fn resolved_sizes_stay_above_minimum_after_user_resizes() {
        let mut table = sample_table(3, 3);
        put_text(&mut table, 0, 0, "nominal diameter");
        put_text(&mut table, 1, 1, "thread pitch 1.5");
        put_text(&mut table, 2, 2, "material");

        for (index, width) in [(0, 1.0), (1, 4.0), (2, 25.0)] {
            table.set_column_width(index, width).expect("valid column");
            let minimum = table.minimum_column_width(index, true).expect("column");
            assert!(table.column_width(index).expect("column") >= minimum - SIZE_TOLERANCE);
        }
        for index in 0..3 {
            table.set_row_height(index, 0.1).expect("valid row");
            let minimum = table.minimum_row_height(index, true).expect("row");
            assert!(table.row_height(index).expect("row") >= minimum - SIZE_TOLERANCE);
        }
    }

    #[test]
    fn resize_within_tolerance_does_not_refit() {
        let mut table = sample_table(1, 2);
        put_text(&mut table, 0, 0, "alpha beta gamma delta");
        assert_close(table.row_height(0).expect("row 0"), 6.1);
        // Leave the layout out of step with the column so any refit would show.
        table.rows[0].cells[0]
            .content
            .text_mut()
            .block_mut()
            .expect("text")
            .set_wrap_width(40.0);

        table
            .set_column_width_with_lock(0, 10.0 + 1e-9, LockAction::NoChange)
            .expect("valid column");

        assert_eq!(wrap_width(&table, 0, 0), Some(40.0));
        assert_close(table.row_height(0).expect("row 0"), 6.1);

        table
            .set_column_width_with_lock(0, 10.0 + 1e-6, LockAction::NoChange)
            .expect("valid column");

        assert_close(wrap_width(&table, 0, 0).expect("text"), 9.4 + 1e-6);
    }

    #[test]
    fn shrink_to_contents_is_idempotent() {
        let mut table = sample_table(2, 1);
        put_text(&mut table, 0, 0, "hex head bolt");
        put_text(&mut table, 1, 0, "washer");

        table.shrink_column_width_to_contents(0).expect("valid column");
        let first = table.column_width(0).expect("column 0");
        table.shrink_column_width_to_contents(0).expect("valid column");

        assert_close(first, 8.6);
        assert_close(table.column_width(0).expect("column 0"), first);
    }

    #[test]
    fn width_from_contents_unwraps_and_unlocks() {
        let mut table = sample_table(1, 1);
        put_text(&mut table, 0, 0, "alpha beta gamma delta");

        table.set_column_width_from_contents(0, true).expect("valid column");

        assert_close(table.column_width(0).expect("column 0"), 22.6);
        assert_eq!(table.is_column_width_locked(0), Some(false));
        assert_eq!(wrap_width(&table, 0, 0), Some(0.0));
        assert_close(table.row_height(0).expect("row 0"), 1.6);
    }

    #[test]
    fn height_from_contents_of_empty_row_is_the_default() {
        let mut table = sample_table(2, 2);

        table.set_row_height_from_contents(1, true).expect("valid row");

        assert_close(table.row_height(1).expect("row 1"), table.default_row_height());
        assert_eq!(table.is_row_height_locked(1), Some(false));
    }

    #[test]
    fn rotated_cell_couples_row_height_to_column_width() {
        let mut table = sample_table(1, 2);
        table
            .set_cell_orientation(CellIndex::new(0, 0), Some(CellOrientation::Rotate90))
            .expect("valid cell");
        put_text(&mut table, 0, 0, "alpha beta gamma");
        let height = table.row_height(0).expect("row 0");
        let width = table.column_width(0).expect("column 0");

        // An unlocked row unwraps the rotated text, a locked short row wraps it into more lines.
        assert_close(height, 16.6);
        table.set_row_height(0, 6.6).expect("valid row");

        assert_close(table.row_height(0).expect("row 0"), 6.6);
        assert!(table.column_width(0).expect("column 0") >= width);
        let need = table
            .cell_content_size(CellIndex::new(0, 0), SizeMode::Current)
            .expect("valid cell");
        assert!(need.width <= table.column_width(0).expect("column 0") + SIZE_TOLERANCE);
    }

    #[test]
    fn one_line_cell_fits_default_row_height_with_custom_descender() {
        let mut catalog = StyleCatalog::new();
        let body = catalog.insert(TextStyle::new(1.0, 1.0));
        let options = TableOptions::try_from("descender_ratio=0.2").expect("valid options");
        let env = TableEnvironment::new(catalog, MonospaceMeasurer::from(&options)).with_options(options);
        let mut table = Table::create(2, 2, body, env).expect("valid dimensions");
        assert_close(table.default_row_height(), 1.4);

        put_text(&mut table, 1, 0, "gasket");

        assert_close(table.row_height(1).expect("row 1"), table.default_row_height());
    }

    #[test]
    fn alternate_minimum_width_uses_the_column_band() {
        let mut catalog = StyleCatalog::new();
        let body = catalog.insert(TextStyle::new(1.0, 1.0));
        let wide = catalog.insert(TextStyle::new(1.0, 3.0));
        let env = TableEnvironment::new(catalog, MonospaceMeasurer::default());
        let mut table = Table::create(3, 2, body, env).expect("valid dimensions");
        table.set_header_column_count(1).expect("fits");
        table.set_text_style(Region::HeaderColumn, Some(wide));

        let header_width = table.empty_region_size(Region::HeaderColumn).width;
        assert_close(table.alternate_minimum_column_width(0).expect("column 0"), header_width);
        assert_close(header_width, 4.8);
        assert_close(table.alternate_minimum_column_width(1).expect("column 1"), 1.6);
    }

    #[test]
    fn alternate_minimum_height_of_title_row_spans_column_bands() {
        let mut catalog = StyleCatalog::new();
        let body = catalog.insert(TextStyle::new(1.0, 1.0));
        let tall = catalog.insert(TextStyle::new(2.0, 1.0));
        let env = TableEnvironment::new(catalog, MonospaceMeasurer::default());
        let mut table = Table::create(3, 3, body, env).expect("valid dimensions");
        table.set_title_row_count(1).expect("fits");
        table.set_footer_column_count(1).expect("fits");
        table.set_text_style(Region::FooterColumn, Some(tall));

        assert_close(table.alternate_minimum_row_height(0).expect("row 0"), 3.2);
        assert_close(table.alternate_minimum_row_height(1).expect("row 1"), 1.6);
    }

    #[test]
    fn runaway_propagation_is_reported() {
        let mut catalog = StyleCatalog::new();
        let body = catalog.insert(TextStyle::new(1.0, 1.0));
        let options = TableOptions {
            max_propagation_depth: 1,
            ..TableOptions::default()
        };
        let env = TableEnvironment::new(catalog, MonospaceMeasurer::default()).with_options(options);
        let mut table = Table::create(1, 1, body, env).expect("valid dimensions");
        let block = table.new_text_block(Region::Body, "one two three four");
        table
            .set_cell_text_block(CellIndex::new(0, 0), block)
            .expect("direct growth stays within the limit");

        let result = table.set_column_width_with_lock(0, 4.0, LockAction::TurnOn);

        assert_eq!(
            result,
            Err(TableError::PropagationLimit { axis: Axis::Row, index: 0, limit: 1 })
        );
    }

    #[test]
    fn out_of_range_tracks_are_rejected() {
        let mut table = sample_table(1, 1);
        assert_eq!(table.set_row_height(3, 1.0), Err(TableError::RowOutOfRange(3)));
        assert_eq!(table.shrink_column_width_to_contents(1), Err(TableError::ColumnOutOfRange(1)));
        assert_eq!(table.minimum_row_height(2, true), None);
    }
}
