use crate::persist::AspectState;
use crate::table::cell::Cell;
use crate::table::cell::CellIndex;
use crate::table::ElementId;
use crate::table::IdAllocator;

/// A table row and the cells it owns.
#[derive(Clone, Debug)]
pub struct Row {
    pub(crate) id: ElementId,
    pub(crate) index: usize,
    /// Explicit height; `None` uses the table default
    pub(crate) height: Option<f64>,
    /// Explicit lock; `None` means unlocked
    pub(crate) height_lock: Option<bool>,
    pub(crate) cells: Vec<Cell>,
    pub(crate) state: AspectState,
}

impl Row {
    /// Builds row `index` with one fresh cell per column.
    pub(crate) fn new(ids: &mut IdAllocator, index: usize, column_count: usize) -> Self {
        let id = ids.next();
        let cells = (0..column_count)
            .map(|col| Cell::new(ids.next(), CellIndex::new(index, col)))
            .collect();
        Self {
            id,
            index,
            height: None,
            height_lock: None,
            cells,
            state: AspectState::default(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn height_override(&self) -> Option<f64> {
        self.height
    }

    pub fn height_lock_override(&self) -> Option<bool> {
        self.height_lock
    }

    pub fn is_height_locked(&self) -> bool {
        self.height_lock.unwrap_or(false)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    /// Moves the row to `index`, updating its cells' composite indices.
    pub(crate) fn reindex(&mut self, index: usize) {
        if self.index != index {
            self.index = index;
            self.state.mark_changed();
        }
        for (col, cell) in self.cells.iter_mut().enumerate() {
            let position = CellIndex::new(index, col);
            if cell.index != position {
                cell.index = position;
                cell.state.mark_changed();
            }
        }
    }
}
