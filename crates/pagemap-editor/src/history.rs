use pagemap_core::TreeModel;

/// A snapshot plus the name of the edit that produced it.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: TreeModel,
    pub label: String,
}

/// Linear undo/redo over model snapshots.
///
/// Snapshots share structure with each other, so keeping fifty of them costs
/// little more than the nodes that actually changed.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, snapshot: TreeModel, label: impl Into<String>) {
        // Recording from the middle of the history discards the redo branch
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }

        self.entries.push(HistoryEntry {
            snapshot,
            label: label.into(),
        });
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn undo(&mut self) -> Option<&TreeModel> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).map(|e| &e.snapshot)
    }

    pub fn redo(&mut self) -> Option<&TreeModel> {
        let next = self.cursor.map(|c| c + 1).filter(|&n| n < self.entries.len())?;
        self.cursor = Some(next);
        self.entries.get(next).map(|e| &e.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Label of the edit an undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.entries.get(cursor).map(|e| e.label.as_str())
    }

    /// Label of the edit a redo would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        let next = self.cursor? + 1;
        self.entries.get(next).map(|e| e.label.as_str())
    }

    pub fn current(&self) -> Option<&TreeModel> {
        self.entries.get(self.cursor?).map(|e| &e.snapshot)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
