//! Moving aspects between a [`Table`] and an [`AspectStore`].
use crate::error::AnnotationTableError;
use crate::error::ResultMessage;
use crate::persist::AspectType;
use crate::persist::Assignment;
use crate::persist::PersistError;
use crate::persist::PropertyValue;
use crate::persist::TableAspect;
use crate::table::ElementId;
use crate::table::IdAllocator;
use crate::table::Table;
use crate::table::TableEnvironment;
use crate::table::TableHeader;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// One persisted entity: its type, stable id and property values in ordinal order.
#[derive(Clone, Debug, PartialEq)]
pub struct AspectRecord {
    pub aspect: AspectType,
    pub id: ElementId,
    pub values: Vec<PropertyValue>,
}

impl AspectRecord {
    /// Reads the index-valued property at `ordinal`.
    fn index_at(&self, ordinal: usize) -> Result<usize, PersistError> {
        let value = self.values.get(ordinal).cloned().unwrap_or(PropertyValue::Null);
        Assignment::new(self.aspect, ordinal, value)?.required_index()
    }
}

/// Backing store for table aspects.
pub trait AspectStore {
    fn select(&self, aspect: AspectType) -> Result<Vec<AspectRecord>>;

    fn insert(&mut self, record: AspectRecord) -> Result<()>;

    fn update(&mut self, record: AspectRecord) -> Result<()>;

    fn delete(&mut self, aspect: AspectType, id: ElementId) -> Result<()>;
}

/// An [`AspectStore`] kept in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<(AspectType, ElementId), AspectRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of one aspect type.
    pub fn count(&self, aspect: AspectType) -> usize {
        self.records.keys().filter(|(kind, _)| *kind == aspect).count()
    }

    pub fn get(&self, aspect: AspectType, id: ElementId) -> Option<&AspectRecord> {
        self.records.get(&(aspect, id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AspectStore for MemoryStore {
    fn select(&self, aspect: AspectType) -> Result<Vec<AspectRecord>> {
        Ok(self
            .records
            .values()
            .filter(|record| record.aspect == aspect)
            .cloned()
            .collect())
    }

    fn insert(&mut self, record: AspectRecord) -> Result<()> {
        let key = (record.aspect, record.id);
        if self.records.contains_key(&key) {
            bail!("{} {} already exists", record.aspect, record.id);
        }
        self.records.insert(key, record);
        Ok(())
    }

    fn update(&mut self, record: AspectRecord) -> Result<()> {
        match self.records.get_mut(&(record.aspect, record.id)) {
            Some(existing) => *existing = record,
            None => bail!("{} {} does not exist", record.aspect, record.id),
        }
        Ok(())
    }

    fn delete(&mut self, aspect: AspectType, id: ElementId) -> Result<()> {
        if self.records.remove(&(aspect, id)).is_none() {
            bail!("{aspect} {id} does not exist");
        }
        Ok(())
    }
}

/// What one [`Table::save`] wrote.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Writes one aspect as needed and records the outcome in its state.
fn sync(store: &mut dyn AspectStore, aspect: &mut dyn TableAspect, summary: &mut SaveSummary) -> Result<(), AnnotationTableError> {
    let keep = aspect.should_be_persisted();
    let (kind, id) = (aspect.aspect_type(), aspect.aspect_id());
    match (aspect.state().is_persisted(), keep) {
        (false, true) => {
            store
                .insert(aspect.to_record()?)
                .with_context(|| format!("Failed to insert {kind} {id}"))?;
            summary.inserted += 1;
        }
        (true, true) if aspect.has_changes() => {
            store
                .update(aspect.to_record()?)
                .with_context(|| format!("Failed to update {kind} {id}"))?;
            summary.updated += 1;
        }
        (true, false) => {
            store
                .delete(kind, id)
                .with_context(|| format!("Failed to delete {kind} {id}"))?;
            summary.deleted += 1;
        }
        _ => (),
    }
    aspect.state_mut().mark_saved(keep);
    Ok(())
}

impl Table {
    /// Culls overrides that equal the table defaults on every entity.
    pub fn flush_changes_to_properties(&mut self) {
        let defaults = self.header.defaults();
        self.header.flush_changes_to_properties(&defaults);
        for row in self.rows.iter_mut() {
            row.flush_changes_to_properties(&defaults);
            for cell in row.cells.iter_mut() {
                cell.flush_changes_to_properties(&defaults);
            }
        }
        for column in self.columns.iter_mut() {
            column.flush_changes_to_properties(&defaults);
        }
    }

    /// Writes changed aspects to `store` and removes deleted ones.
    pub fn save(&mut self, store: &mut dyn AspectStore) -> Result<SaveSummary, AnnotationTableError> {
        self.flush_changes_to_properties();
        let mut summary = SaveSummary::default();

        while let Some(&(aspect, id)) = self.removed.last() {
            store
                .delete(aspect, id)
                .with_context(|| format!("Failed to delete {aspect} {id}"))?;
            self.removed.pop();
            summary.deleted += 1;
        }

        sync(store, &mut self.header, &mut summary)?;
        for row in self.rows.iter_mut() {
            sync(store, row, &mut summary)?;
            for cell in row.cells.iter_mut() {
                sync(store, cell, &mut summary)?;
            }
        }
        for column in self.columns.iter_mut() {
            sync(store, column, &mut summary)?;
        }

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "saved table"
        );
        Ok(summary)
    }

    /// Rebuilds a table from the aspects in `store`.
    pub fn load(store: &dyn AspectStore, env: TableEnvironment) -> Result<Self, AnnotationTableError> {
        let select = |aspect: AspectType| {
            store
                .select(aspect)
                .with_context(|| format!("Failed to select {aspect} aspects"))
        };
        let headers = select(AspectType::TableHeader)?;
        let rows = select(AspectType::Row)?;
        let columns = select(AspectType::Column)?;
        let cells = select(AspectType::Cell)?;
        let last_id = [&headers, &rows, &columns, &cells]
            .into_iter()
            .flatten()
            .map(|record| record.id.0)
            .max()
            .unwrap_or(0);

        let [header_record]: [AspectRecord; 1] = headers
            .try_into()
            .map_err(|headers: Vec<AspectRecord>| PersistError::HeaderCount(headers.len()))?;
        let mut header = TableHeader::new(header_record.id, 0, 0);
        header.assign_record(header_record).with_prefix("Failed to read table header")?;
        header.state.mark_saved(true);
        if header.row_count == 0 || header.column_count == 0 {
            return Err(PersistError::InvalidValue {
                aspect: AspectType::TableHeader,
                property: "RowCount",
                value: format!("{}x{}", header.row_count, header.column_count),
            }
            .into());
        }

        let mut table = Table::with_header(header, IdAllocator::starting_after(last_id), env);
        table.initialize(false);

        for record in rows {
            let index = record.index_at(0)?;
            let id = record.id;
            let row = table.rows.get_mut(index).ok_or_else(|| PersistError::OutsideTable {
                aspect: AspectType::Row,
                id,
                position: format!("row {index}"),
            })?;
            row.id = id;
            row.assign_record(record).with_prefix(&format!("Failed to read row {id}"))?;
            row.state.mark_saved(true);
        }

        for record in columns {
            let index = record.index_at(0)?;
            let id = record.id;
            let column = table.columns.get_mut(index).ok_or_else(|| PersistError::OutsideTable {
                aspect: AspectType::Column,
                id,
                position: format!("column {index}"),
            })?;
            column.id = id;
            column.assign_record(record).with_prefix(&format!("Failed to read column {id}"))?;
            column.state.mark_saved(true);
        }

        for record in cells {
            let (row, col) = (record.index_at(0)?, record.index_at(1)?);
            let id = record.id;
            let cell = table
                .rows
                .get_mut(row)
                .and_then(|entry| entry.cells.get_mut(col))
                .ok_or_else(|| PersistError::OutsideTable {
                    aspect: AspectType::Cell,
                    id,
                    position: format!("cell ({row}, {col})"),
                })?;
            cell.id = id;
            cell.assign_record(record).with_prefix(&format!("Failed to read cell {id}"))?;
            cell.state.mark_saved(true);
        }

        debug!(rows = table.row_count(), columns = table.column_count(), "loaded table");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MonospaceMeasurer;
    use crate::content::TextBlock;
    use crate::style::StyleCatalog;
    use crate::style::TextStyle;
    use crate::table::cell::CellIndex;
    use crate::table::region::Region;
    use crate::table::tests::assert_close;
    use crate::table::tests::sample_table;
    use crate::table::InsertDirection;

    fn environment() -> TableEnvironment {
        let mut catalog = StyleCatalog::new();
        catalog.insert(TextStyle::new(1.0, 1.0));
        TableEnvironment::new(catalog, MonospaceMeasurer::default())
    }

    fn counts(store: &MemoryStore) -> [usize; 4] {
        AspectType::ALL.map(|aspect| store.count(aspect))
    }

    #[test]
    fn new_table_persists_only_its_header() {
        let mut table = sample_table(5, 3);
        let mut store = MemoryStore::new();

        let summary = table.save(&mut store).expect("saved");

        assert_eq!(summary, SaveSummary { inserted: 1, updated: 0, deleted: 0 });
        assert_eq!(counts(&store), [1, 0, 0, 0]);
    }

    #[test]
    fn row_height_override_adds_and_removes_a_row_aspect() {
        let mut table = sample_table(5, 3);
        let mut store = MemoryStore::new();

        table.set_row_height(0, 2.0).expect("valid row");
        table.save(&mut store).expect("saved");
        assert_eq!(counts(&store), [1, 1, 0, 0]);

        table.set_row_height_from_contents(0, true).expect("valid row");
        table.save(&mut store).expect("saved");
        assert_eq!(counts(&store), [1, 0, 0, 0]);
    }

    #[test]
    fn default_width_is_culled_before_save() {
        let mut table = sample_table(2, 2);
        let mut store = MemoryStore::new();
        let width = table.default_column_width();

        table.set_column_width(1, width).expect("valid column");
        table.save(&mut store).expect("saved");

        assert_eq!(table.column(1).and_then(|column| column.width_override()), None);
        assert_close(table.column_width(1).expect("column 1"), width);
        assert_eq!(counts(&store), [1, 0, 0, 0]);
    }

    #[test]
    fn text_cells_are_persisted_and_cleared() {
        let mut table = sample_table(3, 3);
        let mut store = MemoryStore::new();
        for col in 0..3 {
            let block = table.new_text_block(Region::Body, "M6");
            table.set_cell_text_block(CellIndex::new(1, col), block).expect("valid cell");
        }
        table.save(&mut store).expect("saved");
        assert_eq!(store.count(AspectType::Cell), 3);

        table.clear_cell_text(CellIndex::new(1, 2)).expect("valid cell");
        let summary = table.save(&mut store).expect("saved");

        assert_eq!(store.count(AspectType::Cell), 2);
        assert_eq!(summary.deleted, 1);
    }

    #[test]
    fn deleted_rows_drop_their_aspects() {
        let mut table = sample_table(3, 2);
        let mut store = MemoryStore::new();
        table.set_row_height(2, 4.0).expect("valid row");
        let block = table.new_text_block(Region::Body, "nut");
        table.set_cell_text_block(CellIndex::new(2, 0), block).expect("valid cell");
        table.save(&mut store).expect("saved");
        assert_eq!(counts(&store), [1, 1, 0, 1]);

        table.delete_row(2).expect("deletable");
        table.save(&mut store).expect("saved");

        assert_eq!(counts(&store), [1, 0, 0, 0]);
    }

    #[test]
    fn load_restores_saved_table() {
        let mut table = sample_table(4, 3);
        table.set_header_row_count(1).expect("fits");
        table.set_column_width(2, 24.0).expect("valid column");
        let block = table.new_text_block(Region::Body, "stainless steel washer");
        table.set_cell_text_block(CellIndex::new(2, 1), block).expect("valid cell");
        let row_height = table.row_height(2).expect("row 2");
        let mut store = MemoryStore::new();
        table.save(&mut store).expect("saved");

        let loaded = Table::load(&store, environment()).expect("loaded");

        assert_eq!(loaded.row_count(), 4);
        assert_eq!(loaded.column_count(), 3);
        assert_eq!(loaded.header_row_count(), 1);
        assert_close(loaded.column_width(2).expect("column 2"), 24.0);
        assert_close(loaded.row_height(2).expect("row 2"), row_height);
        assert_eq!(
            loaded.text_block(CellIndex::new(2, 1)).map(TextBlock::text),
            Some("stainless steel washer")
        );
        assert_eq!(loaded.cell(CellIndex::new(2, 1)).map(|cell| cell.id()), table.cell(CellIndex::new(2, 1)).map(|cell| cell.id()));
    }

    #[test]
    fn unreadable_cell_text_survives_load_and_save() {
        let mut table = sample_table(2, 2);
        let block = table.new_text_block(Region::Body, "flange bolt");
        table.set_cell_text_block(CellIndex::new(1, 0), block).expect("valid cell");
        let mut store = MemoryStore::new();
        table.save(&mut store).expect("saved");

        let id = table.cell(CellIndex::new(1, 0)).map(|cell| cell.id()).expect("cell");
        let mut record = store.get(AspectType::Cell, id).cloned().expect("cell record");
        match record.values.get_mut(9) {
            Some(PropertyValue::Blob(bytes)) => bytes[0] = 2,
            other => panic!("expected a text blob, got {other:?}"),
        }
        store.update(record.clone()).expect("updated");

        let mut loaded = Table::load(&store, environment()).expect("loaded");
        assert_eq!(loaded.text_block(CellIndex::new(1, 0)), None);
        let summary = loaded.save(&mut store).expect("saved");

        assert_eq!(summary, SaveSummary::default());
        assert_eq!(store.get(AspectType::Cell, id), Some(&record));
    }

    #[test]
    fn loaded_table_allocates_fresh_ids() {
        let mut table = sample_table(2, 2);
        let mut store = MemoryStore::new();
        table.set_row_height(1, 3.0).expect("valid row");
        table.save(&mut store).expect("saved");

        let mut loaded = Table::load(&store, environment()).expect("loaded");
        let index = loaded.insert_row(1, InsertDirection::After).expect("valid seed");
        let saved_ids: Vec<ElementId> = [AspectType::TableHeader, AspectType::Row]
            .into_iter()
            .flat_map(|aspect| store.select(aspect).expect("selectable"))
            .map(|record| record.id)
            .collect();

        let new_id = loaded.row(index).map(|row| row.id()).expect("inserted row");
        assert!(!saved_ids.contains(&new_id));
        loaded.save(&mut store).expect("saved");
        assert_eq!(store.count(AspectType::Row), 2);
    }

    #[test]
    fn load_requires_a_single_header() {
        let store = MemoryStore::new();
        let error = Table::load(&store, environment()).err().expect("no header");
        assert_eq!(error.to_string(), "Expected exactly one table header, found 0");
    }

    #[test]
    fn load_rejects_records_outside_the_table() {
        let mut table = sample_table(2, 2);
        let mut store = MemoryStore::new();
        table.save(&mut store).expect("saved");
        store
            .insert(AspectRecord {
                aspect: AspectType::Row,
                id: ElementId(999),
                values: vec![PropertyValue::Integer(7), PropertyValue::Double(2.0), PropertyValue::Null],
            })
            .expect("inserted");

        let error = Table::load(&store, environment()).err().expect("row outside");
        assert_eq!(error.to_string(), "Row #999 refers to row 7, outside the table");
    }
}
