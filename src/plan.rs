use crate::error::{PfResult, PlanError};
use fnv::FnvHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A song (row) that needs a target amount of rehearsal points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub row_id: String,
    pub points_required: u32,
}

/// A rehearsal session (column) with a fixed point budget.
/// Column order is temporal: index 0 is the earliest session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub column_id: String,
    pub points_available: u32,
}

/// One (song, segment) point allocation. Absence of a cell means zero.
/// `auto_filled` cells were written by the search and may be freely
/// overwritten; user-entered cells are immutable inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row_id: String,
    pub column_id: String,
    pub points_allocated: u32,
    #[serde(default)]
    pub auto_filled: bool,
}

/// The full allocation document. The optimizer never mutates a caller-owned
/// plan; every search step works on its own clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub rows: Vec<Song>,
    pub columns: Vec<Segment>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl PlanDocument {
    pub fn new(rows: Vec<Song>, columns: Vec<Segment>) -> Self {
        Self {
            rows,
            columns,
            cells: Vec::new(),
        }
    }

    pub fn cell(&self, row_id: &str, column_id: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|c| c.row_id == row_id && c.column_id == column_id)
    }

    /// Overwrites the cell at (row_id, column_id), appending it if absent.
    /// Only ever called on clones owned by the search.
    pub fn upsert_cell(&mut self, row_id: &str, column_id: &str, points: u32, auto_filled: bool) {
        if let Some(cell) = self
            .cells
            .iter_mut()
            .find(|c| c.row_id == row_id && c.column_id == column_id)
        {
            cell.points_allocated = points;
            cell.auto_filled = auto_filled;
            return;
        }
        self.cells.push(Cell {
            row_id: row_id.to_string(),
            column_id: column_id.to_string(),
            points_allocated: points,
            auto_filled,
        });
    }

    /// Canonical identity of this plan's non-zero allocations.
    ///
    /// Cells are sorted by (row_id, column_id) and rendered as
    /// `rowId/columnId/points` triples joined by commas, so two plans with
    /// the same allocations compare equal no matter how they were built.
    /// Visited sets and memo tables key on this string.
    pub fn state_id(&self) -> String {
        self.cells
            .iter()
            .filter(|c| c.points_allocated > 0)
            .sorted_by(|a, b| {
                a.row_id
                    .cmp(&b.row_id)
                    .then_with(|| a.column_id.cmp(&b.column_id))
            })
            .map(|c| format!("{}/{}/{}", c.row_id, c.column_id, c.points_allocated))
            .join(",")
    }

    /// Referential-integrity precondition (dangling ids, duplicate ids,
    /// duplicate cells). The search algorithms assume a valid plan; hosts
    /// get an explicit failure here instead of garbage results.
    pub fn validate(&self) -> PfResult<()> {
        let mut row_ids: FnvHashSet<&str> = FnvHashSet::default();
        for song in &self.rows {
            if !row_ids.insert(&song.row_id) {
                return Err(PlanError::Integrity(format!(
                    "Duplicate rowId '{}'",
                    song.row_id
                )));
            }
        }
        let mut column_ids: FnvHashSet<&str> = FnvHashSet::default();
        for segment in &self.columns {
            if !column_ids.insert(&segment.column_id) {
                return Err(PlanError::Integrity(format!(
                    "Duplicate columnId '{}'",
                    segment.column_id
                )));
            }
        }

        let mut seen: FnvHashSet<(&str, &str)> = FnvHashSet::default();
        for cell in &self.cells {
            if !row_ids.contains(cell.row_id.as_str()) {
                return Err(PlanError::Integrity(format!(
                    "Cell references unknown rowId '{}'",
                    cell.row_id
                )));
            }
            if !column_ids.contains(cell.column_id.as_str()) {
                return Err(PlanError::Integrity(format!(
                    "Cell references unknown columnId '{}'",
                    cell.column_id
                )));
            }
            if !seen.insert((&cell.row_id, &cell.column_id)) {
                return Err(PlanError::Integrity(format!(
                    "Duplicate cell at ('{}', '{}')",
                    cell.row_id, cell.column_id
                )));
            }
        }
        Ok(())
    }
}
