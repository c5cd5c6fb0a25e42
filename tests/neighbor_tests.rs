mod common;

use common::{cell, default_penalties, mock_plan_3x4, plan};
use fnv::FnvHashSet;
use planforge::optimizer::get_neighbors;
use planforge::{CullConfig, SearchState, StatsParams};

fn state_of(p: &planforge::PlanDocument) -> SearchState {
    SearchState::from_plan(p.clone(), &default_penalties(), StatsParams::default())
}

fn expand(state: &SearchState, depth: usize, cull: &CullConfig) -> Vec<SearchState> {
    expand_with_visited(state, depth, cull, &FnvHashSet::default())
}

fn expand_with_visited(
    state: &SearchState,
    depth: usize,
    cull: &CullConfig,
    visited: &FnvHashSet<String>,
) -> Vec<SearchState> {
    get_neighbors(
        state,
        depth,
        cull,
        &default_penalties(),
        StatsParams::default(),
        visited,
    )
}

#[test]
fn test_one_neighbor_per_open_pair() {
    let state = state_of(&mock_plan_3x4());
    let neighbors = expand(&state, 0, &CullConfig::default());
    // 3 songs x 4 sessions, all open.
    assert_eq!(neighbors.len(), 12);

    // Every neighbor differs from the parent by exactly one auto cell.
    for n in &neighbors {
        assert_eq!(n.plan.cells.len(), 1);
        assert!(n.plan.cells[0].auto_filled);
    }
}

#[test]
fn test_neighbors_sorted_by_allocation_descending() {
    let state = state_of(&mock_plan_3x4());
    let neighbors = expand(&state, 0, &CullConfig::default());

    let points: Vec<u32> = neighbors
        .iter()
        .map(|n| n.plan.cells[0].points_allocated)
        .collect();
    let mut sorted = points.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(points, sorted);
}

#[test]
fn test_fixed_cells_are_not_touched() {
    let mut p = mock_plan_3x4();
    p.cells.push(cell("intro", "mon", 5, false));
    let state = state_of(&p);

    let neighbors = expand(&state, 0, &CullConfig::default());
    for n in &neighbors {
        let c = n.plan.cell("intro", "mon").unwrap();
        assert_eq!(c.points_allocated, 5);
        assert!(!c.auto_filled);
    }
}

#[test]
fn test_full_segment_generates_nothing() {
    let mut p = plan(&[("intro", 8), ("outro", 8)], &[("mon", 5)]);
    p.cells.push(cell("intro", "mon", 5, true));
    let state = state_of(&p);

    let neighbors = expand(&state, 0, &CullConfig::default());
    assert!(neighbors.is_empty());
}

#[test]
fn test_satisfied_song_generates_nothing() {
    let mut p = plan(&[("intro", 8)], &[("mon", 20), ("tue", 20)]);
    p.cells.push(cell("intro", "mon", 8, true));
    let state = state_of(&p);

    let neighbors = expand(&state, 0, &CullConfig::default());
    assert!(neighbors.is_empty());
}

#[test]
fn test_degenerate_plan_generates_nothing() {
    let empty = plan(&[], &[]);
    let state = state_of(&empty);
    assert!(expand(&state, 0, &CullConfig::default()).is_empty());
}

#[test]
fn test_visited_states_are_skipped() {
    let state = state_of(&mock_plan_3x4());
    let all = expand(&state, 0, &CullConfig::default());

    let mut visited = FnvHashSet::default();
    visited.insert(all[0].state_id.clone());
    visited.insert(all[1].state_id.clone());

    let remaining = expand_with_visited(&state, 0, &CullConfig::default(), &visited);
    assert_eq!(remaining.len(), all.len() - 2);
    for n in &remaining {
        assert!(!visited.contains(&n.state_id));
    }
}

#[test]
fn test_culling_only_past_configured_depth() {
    let cull = CullConfig {
        depths_without_culling: 2,
        cull_percent: 0.25,
        cull_clamp_min: 1,
        cull_clamp_max: 4,
    };
    let state = state_of(&mock_plan_3x4());

    // Depths 0..=2 keep the full fan-out.
    assert_eq!(expand(&state, 2, &cull).len(), 12);
    // Depth 3: ceil(12 * 0.25) = 3, within [1, 4].
    assert_eq!(expand(&state, 3, &cull).len(), 3);
}

#[test]
fn test_cull_clamp_bounds() {
    let state = state_of(&mock_plan_3x4());

    let floor = CullConfig {
        depths_without_culling: 0,
        cull_percent: 0.01,
        cull_clamp_min: 5,
        cull_clamp_max: 64,
    };
    assert_eq!(expand(&state, 1, &floor).len(), 5);

    let ceiling = CullConfig {
        depths_without_culling: 0,
        cull_percent: 1.0,
        cull_clamp_min: 1,
        cull_clamp_max: 2,
    };
    assert_eq!(expand(&state, 1, &ceiling).len(), 2);
}

#[test]
fn test_neighbor_costs_are_fresh() {
    let state = state_of(&mock_plan_3x4());
    for n in expand(&state, 0, &CullConfig::default()) {
        let stats = planforge::PlanStats::calculate(&n.plan);
        let report = planforge::calculate_cost(&n.plan, &stats, &default_penalties());
        assert_eq!(n.total_cost(), report.total_cost);
        assert_eq!(n.state_id, n.plan.state_id());
    }
}
