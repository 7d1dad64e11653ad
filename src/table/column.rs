use crate::persist::AspectState;
use crate::table::ElementId;

/// A table column. Cells are owned by rows and reached by column index.
#[derive(Clone, Debug)]
pub struct Column {
    pub(crate) id: ElementId,
    pub(crate) index: usize,
    /// Explicit width; `None` uses the table default
    pub(crate) width: Option<f64>,
    /// Explicit lock; `None` means locked
    pub(crate) width_lock: Option<bool>,
    pub(crate) state: AspectState,
}

impl Column {
    pub(crate) fn new(id: ElementId, index: usize) -> Self {
        Self {
            id,
            index,
            width: None,
            width_lock: None,
            state: AspectState::default(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width_override(&self) -> Option<f64> {
        self.width
    }

    pub fn width_lock_override(&self) -> Option<bool> {
        self.width_lock
    }

    pub fn is_width_locked(&self) -> bool {
        self.width_lock.unwrap_or(true)
    }

    pub(crate) fn reindex(&mut self, index: usize) {
        if self.index != index {
            self.index = index;
            self.state.mark_changed();
        }
    }
}
