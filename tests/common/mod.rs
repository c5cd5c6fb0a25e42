#![allow(dead_code)] // Not every test binary uses every helper.

use planforge::{Cell, CostPenalties, PlanDocument, Segment, Song};

pub fn song(row_id: &str, points_required: u32) -> Song {
    Song {
        row_id: row_id.to_string(),
        points_required,
    }
}

pub fn segment(column_id: &str, points_available: u32) -> Segment {
    Segment {
        column_id: column_id.to_string(),
        points_available,
    }
}

pub fn cell(row_id: &str, column_id: &str, points: u32, auto_filled: bool) -> Cell {
    Cell {
        row_id: row_id.to_string(),
        column_id: column_id.to_string(),
        points_allocated: points,
        auto_filled,
    }
}

/// Quick plan from (id, points) tuples.
pub fn plan(songs: &[(&str, u32)], segments: &[(&str, u32)]) -> PlanDocument {
    PlanDocument::new(
        songs.iter().map(|(id, p)| song(id, *p)).collect(),
        segments.iter().map(|(id, p)| segment(id, *p)).collect(),
    )
}

/// Standard mock: three songs of mixed weight over four sessions.
pub fn mock_plan_3x4() -> PlanDocument {
    plan(
        &[("intro", 8), ("ballad", 13), ("closer", 5)],
        &[("mon", 10), ("tue", 10), ("wed", 10), ("thu", 10)],
    )
}

pub fn default_penalties() -> CostPenalties {
    CostPenalties::default()
}
