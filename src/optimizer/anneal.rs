use crate::consts::MUTATION_ATTEMPT_LIMIT;
use crate::cost::CostPenalties;
use crate::error::PfResult;
use crate::optimizer::{prepare, Driver, SearchContext, SearchReport, SearchState, SearchStatus};
use crate::stats::PlanStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnealConfig {
    pub initial_temp: f64,
    /// Temperature multiplier applied every iteration.
    pub cooling_rate: f64,
    pub max_iterations: usize,
    pub cells_to_mutate_per_iteration: usize,
    /// Chance a mutated cell is zeroed instead of set to its ideal value.
    /// A zero-point auto cell means "visited, nothing assigned".
    pub probability_of_empty: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temp: 100.0,
            cooling_rate: 0.995,
            max_iterations: 2_000,
            cells_to_mutate_per_iteration: 2,
            probability_of_empty: 0.1,
            seed: None,
        }
    }
}

/// Classic Metropolis acceptance: improving moves always pass, worsening
/// moves pass with probability exp(-delta / T).
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta < 0.0 {
        return 1.0;
    }
    if temperature <= 0.0 {
        return 0.0;
    }
    (-delta / temperature).exp()
}

/// Simulated annealing over random single-cell rewrites.
///
/// Each iteration mutates up to `cells_to_mutate_per_iteration` randomly
/// picked cells to their ideal value (re-rolling a bounded number of times
/// when a pick has no valid ideal value), then accepts or rejects the whole
/// mutated plan by Metropolis. The best state ever seen is tracked
/// independently of what the walk currently accepts.
pub fn anneal_search(
    plan: &crate::plan::PlanDocument,
    penalties: &CostPenalties,
    config: &AnnealConfig,
    ctx: &SearchContext,
) -> PfResult<SearchReport> {
    let initial = prepare(plan, penalties, ctx.stats_params, "anneal")?;
    let mut driver = Driver::new(ctx);

    if driver.cancelled() {
        return Ok(driver.finish(SearchStatus::Cancelled, initial));
    }
    // Degenerate input: nothing to mutate, the initial state is the result.
    if plan.rows.is_empty() || plan.columns.is_empty() {
        return Ok(driver.finish(SearchStatus::Converged, initial));
    }

    let mut rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let mut current = initial.clone();
    let mut best = initial;
    let mut temperature = config.initial_temp;

    let mut status = SearchStatus::IterationLimitReached;
    for _ in 0..config.max_iterations {
        if !driver.begin_iteration() {
            status = SearchStatus::Cancelled;
            break;
        }

        let mut candidate_plan = current.plan.clone();
        let mut mutated = false;
        for _ in 0..config.cells_to_mutate_per_iteration {
            // Stats must track the partially mutated plan so each rewrite
            // sees the capacity left by the previous one.
            let stats = PlanStats::calculate_with(&candidate_plan, ctx.stats_params);
            for _ in 0..MUTATION_ATTEMPT_LIMIT {
                let row_index = rng.usize(0..candidate_plan.rows.len());
                let column_index = rng.usize(0..candidate_plan.columns.len());
                let Some(ideal) = stats.ideal_value_for_cell(column_index, row_index) else {
                    continue;
                };
                let points = if rng.f64() < config.probability_of_empty {
                    0
                } else {
                    ideal
                };
                let row_id = candidate_plan.rows[row_index].row_id.clone();
                let column_id = candidate_plan.columns[column_index].column_id.clone();
                candidate_plan.upsert_cell(&row_id, &column_id, points, true);
                mutated = true;
                break;
            }
        }

        if mutated {
            let candidate = SearchState::from_plan(candidate_plan, penalties, ctx.stats_params);
            let delta = candidate.total_cost() - current.total_cost();
            if delta < 0.0 || rng.f64() < acceptance_probability(delta, temperature) {
                current = candidate;
            }
            if current.total_cost() < best.total_cost() {
                best = current.clone();
            }
        }

        temperature *= config.cooling_rate;
        driver.checkpoint(&best, &current);
        if driver.cancelled() {
            status = SearchStatus::Cancelled;
            break;
        }
    }

    Ok(driver.finish(status, best))
}
