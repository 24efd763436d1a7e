//! Cell registry: per-event cell arena with resolved neighbour links.

use std::collections::{HashMap, HashSet};

use log::warn;
use pfcluster_core::{Cell, CellRecord, Error, Result};

/// Cells of one subsystem for one event, addressed by stable index.
///
/// Reused across events: every load clears the previous event first.
#[derive(Debug, Default)]
pub struct CellRegistry {
    cells: Vec<Cell>,
    index_by_id: HashMap<u32, usize>,
    neighbours_dropped: usize,
    duplicates_skipped: usize,
}

impl CellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all cells of the previous event.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.index_by_id.clear();
        self.neighbours_dropped = 0;
        self.duplicates_skipped = 0;
    }

    /// Loads one event's records and resolves their neighbour ids.
    ///
    /// Neighbour ids with no cell in the event are dropped silently. A record
    /// repeating an already loaded detector id is skipped with a warning.
    pub fn load(&mut self, records: &[CellRecord]) {
        self.load_with(records, true);
    }

    /// Like [`load`](Self::load), optionally leaving every cell unlinked.
    pub fn load_with(&mut self, records: &[CellRecord], find_neighbours: bool) {
        self.clear();
        self.cells.reserve(records.len());
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if self.index_by_id.contains_key(&record.detector_id) {
                warn!(
                    "skipping rechit with duplicate detector id {}",
                    record.detector_id
                );
                self.duplicates_skipped += 1;
                continue;
            }
            self.index_by_id.insert(record.detector_id, self.cells.len());
            self.cells.push(Cell::from_record(record));
            kept.push(record);
        }

        if find_neighbours {
            self.link(&kept);
        }
    }

    /// Strict load: fails on the first repeated detector id.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateDetectorId`]; the registry is left empty.
    pub fn try_load(&mut self, records: &[CellRecord]) -> Result<()> {
        self.load(records);
        if self.duplicates_skipped > 0 {
            let mut seen = HashSet::with_capacity(records.len());
            let duplicate = records
                .iter()
                .find(|r| !seen.insert(r.detector_id))
                .map_or(0, |r| r.detector_id);
            self.clear();
            return Err(Error::DuplicateDetectorId(duplicate));
        }
        Ok(())
    }

    fn link(&mut self, records: &[&CellRecord]) {
        for (index, record) in records.iter().enumerate() {
            let (n4, dropped4) = resolve(&self.index_by_id, &record.neighbours4);
            let (n8, dropped8) = resolve(&self.index_by_id, &record.neighbours8);
            self.neighbours_dropped += dropped4 + dropped8;
            let cell = &mut self.cells[index];
            cell.neighbours4 = n4;
            cell.neighbours8 = n8;
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cells are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, in load order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Index of the cell with the given detector id.
    #[must_use]
    pub fn index_of(&self, detector_id: u32) -> Option<usize> {
        self.index_by_id.get(&detector_id).copied()
    }

    /// Declared neighbour ids that had no cell in the event.
    #[must_use]
    pub fn neighbours_dropped(&self) -> usize {
        self.neighbours_dropped
    }

    /// Records skipped for a repeated detector id.
    #[must_use]
    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }
}

/// Maps declared ids to indices, returning the resolved list and drop count.
fn resolve(index_by_id: &HashMap<u32, usize>, ids: &[u32]) -> (Vec<usize>, usize) {
    let resolved: Vec<usize> = ids
        .iter()
        .filter_map(|id| index_by_id.get(id).copied())
        .collect();
    let dropped = ids.len() - resolved.len();
    (resolved, dropped)
}
