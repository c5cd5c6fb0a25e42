use crate::consts::{
    DEFAULT_CULL_CLAMP_MAX, DEFAULT_CULL_CLAMP_MIN, DEFAULT_CULL_PERCENT,
    DEFAULT_DEPTHS_WITHOUT_CULLING,
};
use crate::cost::CostPenalties;
use crate::optimizer::SearchState;
use crate::stats::StatsParams;
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// Branching-factor control. The first `depths_without_culling` depths keep
/// every candidate so the search can consider all opening moves; after that
/// only the top `cull_percent` fraction survives, clamped to
/// [cull_clamp_min, cull_clamp_max].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CullConfig {
    pub depths_without_culling: usize,
    pub cull_percent: f64,
    pub cull_clamp_min: usize,
    pub cull_clamp_max: usize,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self {
            depths_without_culling: DEFAULT_DEPTHS_WITHOUT_CULLING,
            cull_percent: DEFAULT_CULL_PERCENT,
            cull_clamp_min: DEFAULT_CULL_CLAMP_MIN,
            cull_clamp_max: DEFAULT_CULL_CLAMP_MAX,
        }
    }
}

/// Expands one state into its successors: for every still-open
/// (session, song) pair, a clone of the plan with that cell's ideal value
/// written as an auto-filled allocation.
///
/// Candidates already present in `visited` are dropped before their stats
/// and cost are recomputed; that check is the cheap path, the scoring is
/// the expensive one.
pub fn get_neighbors(
    state: &SearchState,
    depth: usize,
    cull: &CullConfig,
    penalties: &CostPenalties,
    params: StatsParams,
    visited: &FnvHashSet<String>,
) -> Vec<SearchState> {
    // (row, column, points) for every eligible opening.
    let mut openings: Vec<(usize, usize, u32)> = Vec::new();
    for segment in &state.stats.segments {
        if segment.remaining_capacity == 0 {
            continue;
        }
        for song in &state.stats.songs {
            if song.remaining_need == 0 {
                continue;
            }
            if let Some(points) = state
                .stats
                .ideal_value_for_cell(segment.column_index, song.row_index)
            {
                openings.push((song.row_index, segment.column_index, points));
            }
        }
    }

    // Large allocations first; ties broken by position for determinism.
    openings.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));

    if depth > cull.depths_without_culling {
        let keep = ((openings.len() as f64 * cull.cull_percent).ceil() as usize)
            .clamp(cull.cull_clamp_min, cull.cull_clamp_max);
        openings.truncate(keep);
    }

    let mut neighbors = Vec::with_capacity(openings.len());
    for (row_index, column_index, points) in openings {
        let row_id = state.plan.rows[row_index].row_id.clone();
        let column_id = state.plan.columns[column_index].column_id.clone();

        let mut plan = state.plan.clone();
        plan.upsert_cell(&row_id, &column_id, points, true);

        let state_id = plan.state_id();
        if visited.contains(&state_id) {
            continue;
        }

        let stats = crate::stats::PlanStats::calculate_with(&plan, params);
        let cost = crate::cost::calculate_cost(&plan, &stats, penalties);
        neighbors.push(SearchState {
            plan,
            stats,
            cost,
            state_id,
        });
    }
    neighbors
}
