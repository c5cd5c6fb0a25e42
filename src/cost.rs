use crate::plan::PlanDocument;
use crate::stats::PlanStats;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Linear penalty scaling: a term with raw value `v > 0` contributes
/// `v * mul + add` to the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub mul: f64,
    pub add: f64,
}

impl Penalty {
    pub const fn new(mul: f64, add: f64) -> Self {
        Self { mul, add }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.mul + self.add
    }
}

/// The flat named record of penalty pairs the host persists and edits.
/// Immutable during a single search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPenalties {
    pub under_rehearsed_song: Penalty,
    pub over_rehearsed_song: Penalty,
    pub delayed_rehearsal: Penalty,
    pub increasing_allocation: Penalty,
    pub fragmented_song: Penalty,
    pub exceeded_max_points_per_rehearsal: Penalty,
    pub lighter_before_heavier: Penalty,
    pub over_allocated_segment: Penalty,
    pub under_allocated_segment: Penalty,
    pub segment_under_utilized: Penalty,
}

impl Default for CostPenalties {
    fn default() -> Self {
        Self {
            under_rehearsed_song: Penalty::new(100.0, 0.0),
            over_rehearsed_song: Penalty::new(100.0, 0.0),
            delayed_rehearsal: Penalty::new(10.0, 0.0),
            increasing_allocation: Penalty::new(20.0, 0.0),
            fragmented_song: Penalty::new(20.0, 0.0),
            exceeded_max_points_per_rehearsal: Penalty::new(50.0, 0.0),
            lighter_before_heavier: Penalty::new(10.0, 0.0),
            over_allocated_segment: Penalty::new(100.0, 0.0),
            under_allocated_segment: Penalty::new(50.0, 0.0),
            segment_under_utilized: Penalty::new(5.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum CostTerm {
    TraversalBaseline,
    UnderRehearsedSong,
    OverRehearsedSong,
    DelayedRehearsal,
    IncreasingAllocation,
    FragmentedSong,
    ExceededMaxPointsPerRehearsal,
    LighterBeforeHeavier,
    OverAllocatedSegment,
    UnderAllocatedSegment,
    SegmentUnderUtilized,
}

/// One itemized contribution, with enough location info to point a user at
/// the offending song/session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostItem {
    pub term: CostTerm,
    pub cost: f64,
    pub explanation: String,
    pub row_index: Option<usize>,
    pub column_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub total_cost: f64,
    pub breakdown: Vec<CostItem>,
}

struct CostAccumulator {
    total: f64,
    breakdown: Vec<CostItem>,
}

impl CostAccumulator {
    fn new() -> Self {
        Self {
            total: 0.0,
            breakdown: Vec::new(),
        }
    }

    fn push(
        &mut self,
        term: CostTerm,
        penalty: Penalty,
        value: f64,
        explanation: String,
        row_index: Option<usize>,
        column_index: Option<usize>,
    ) {
        if value <= 0.0 {
            return;
        }
        let cost = penalty.apply(value);
        self.total += cost;
        self.breakdown.push(CostItem {
            term,
            cost,
            explanation,
            row_index,
            column_index,
        });
    }

    fn finish(self) -> CostReport {
        CostReport {
            total_cost: self.total,
            breakdown: self.breakdown,
        }
    }
}

/// Scores one plan snapshot. Pure: same (plan, stats, penalties) always
/// yields the same total and breakdown.
pub fn calculate_cost(
    plan: &PlanDocument,
    stats: &PlanStats,
    penalties: &CostPenalties,
) -> CostReport {
    let mut acc = CostAccumulator::new();
    let max_points = f64::from(stats.params.max_points_per_rehearsal.max(1));

    // Baseline: one cost unit per allocated point. Keeps the total from ever
    // dropping just because more points were handed out, which is what lets
    // the strategies treat cost as a search priority.
    acc.push(
        CostTerm::TraversalBaseline,
        Penalty::new(1.0, 0.0),
        stats.total_points_allocated as f64,
        format!("{} points allocated in total", stats.total_points_allocated),
        None,
        None,
    );

    for song in &stats.songs {
        let row_id = &plan.rows[song.row_index].row_id;
        let required = f64::from(song.points_required);

        if song.points_required > 0 && song.points_allocated < song.points_required {
            acc.push(
                CostTerm::UnderRehearsedSong,
                penalties.under_rehearsed_song,
                f64::from(song.points_required - song.points_allocated) / required,
                format!(
                    "Song '{}' is under-rehearsed ({}/{} points)",
                    row_id, song.points_allocated, song.points_required
                ),
                Some(song.row_index),
                None,
            );
        }
        if song.points_required > 0 && song.points_allocated > song.points_required {
            acc.push(
                CostTerm::OverRehearsedSong,
                penalties.over_rehearsed_song,
                f64::from(song.points_allocated - song.points_required) / required,
                format!(
                    "Song '{}' is over-rehearsed ({}/{} points)",
                    row_id, song.points_allocated, song.points_required
                ),
                Some(song.row_index),
                None,
            );
        }

        if let Some(first) = song.first_allocated_column {
            acc.push(
                CostTerm::DelayedRehearsal,
                penalties.delayed_rehearsal,
                first as f64 / stats.num_columns.max(1) as f64,
                format!(
                    "Song '{}' first rehearsed in session {} of {}",
                    row_id,
                    first + 1,
                    stats.num_columns
                ),
                Some(song.row_index),
                Some(first),
            );
        }

        // Rehearsal effort should taper off: a later rehearsal that is
        // bigger than the one before it costs.
        let taper_divisor = f64::from(song.points_required.saturating_sub(2).max(1));
        for (earlier, later) in song.allocated_cells.iter().tuple_windows() {
            if later.points > earlier.points {
                acc.push(
                    CostTerm::IncreasingAllocation,
                    penalties.increasing_allocation,
                    f64::from(later.points - earlier.points) / taper_divisor,
                    format!(
                        "Song '{}' ramps up from {} to {} points between sessions {} and {}",
                        row_id,
                        earlier.points,
                        later.points,
                        earlier.column_index + 1,
                        later.column_index + 1
                    ),
                    Some(song.row_index),
                    Some(later.column_index),
                );
            }
        }

        let rehearsal_count = song.allocated_cells.len() as u32;
        if song.ideal_rehearsal_count > 0 && rehearsal_count > song.ideal_rehearsal_count {
            acc.push(
                CostTerm::FragmentedSong,
                penalties.fragmented_song,
                f64::from(rehearsal_count) / f64::from(song.ideal_rehearsal_count) - 1.0,
                format!(
                    "Song '{}' is spread across {} sessions (ideal {})",
                    row_id, rehearsal_count, song.ideal_rehearsal_count
                ),
                Some(song.row_index),
                None,
            );
        }

        for cell in &song.allocated_cells {
            if cell.points > stats.params.max_points_per_rehearsal {
                acc.push(
                    CostTerm::ExceededMaxPointsPerRehearsal,
                    penalties.exceeded_max_points_per_rehearsal,
                    f64::from(cell.points - stats.params.max_points_per_rehearsal) / max_points,
                    format!(
                        "Song '{}' gets {} points in session {} (max {})",
                        row_id,
                        cell.points,
                        cell.column_index + 1,
                        stats.params.max_points_per_rehearsal
                    ),
                    Some(song.row_index),
                    Some(cell.column_index),
                );
            }
        }
    }

    // Heavier songs are riskier and should start earlier than lighter ones.
    let max_required = stats
        .songs
        .iter()
        .map(|s| s.points_required)
        .max()
        .unwrap_or(0)
        .max(1);
    for (a, b) in stats.songs.iter().tuple_combinations() {
        let (heavy, light) = if a.points_required > b.points_required {
            (a, b)
        } else if b.points_required > a.points_required {
            (b, a)
        } else {
            continue;
        };
        let (Some(heavy_first), Some(light_first)) =
            (heavy.first_allocated_column, light.first_allocated_column)
        else {
            continue;
        };
        if heavy_first > light_first {
            let column_dist = (heavy_first - light_first) as f64 / stats.num_columns.max(1) as f64;
            let weight_dist = f64::from(heavy.points_required - light.points_required)
                / f64::from(max_required);
            acc.push(
                CostTerm::LighterBeforeHeavier,
                penalties.lighter_before_heavier,
                (column_dist * column_dist + weight_dist * weight_dist).sqrt(),
                format!(
                    "Heavier song '{}' starts in session {} after lighter song '{}' (session {})",
                    plan.rows[heavy.row_index].row_id,
                    heavy_first + 1,
                    plan.rows[light.row_index].row_id,
                    light_first + 1
                ),
                Some(heavy.row_index),
                Some(heavy_first),
            );
        }
    }

    for segment in &stats.segments {
        let column_id = &plan.columns[segment.column_index].column_id;
        if segment.points_available > 0 {
            let available = f64::from(segment.points_available);
            if segment.points_allocated > segment.points_available {
                acc.push(
                    CostTerm::OverAllocatedSegment,
                    penalties.over_allocated_segment,
                    f64::from(segment.points_allocated - segment.points_available) / available,
                    format!(
                        "Session '{}' is over-allocated ({}/{} points)",
                        column_id, segment.points_allocated, segment.points_available
                    ),
                    None,
                    Some(segment.column_index),
                );
            }
            if segment.points_allocated < segment.points_available {
                acc.push(
                    CostTerm::UnderAllocatedSegment,
                    penalties.under_allocated_segment,
                    f64::from(segment.points_available - segment.points_allocated) / available,
                    format!(
                        "Session '{}' is under-allocated ({}/{} points)",
                        column_id, segment.points_allocated, segment.points_available
                    ),
                    None,
                    Some(segment.column_index),
                );
            }
        }

        if segment.songs_allocated == 1 {
            acc.push(
                CostTerm::SegmentUnderUtilized,
                penalties.segment_under_utilized,
                1.0,
                format!("Session '{}' rehearses only one song", column_id),
                None,
                Some(segment.column_index),
            );
        }
    }

    acc.finish()
}
