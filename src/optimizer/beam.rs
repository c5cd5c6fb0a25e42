use crate::cost::CostPenalties;
use crate::error::PfResult;
use crate::optimizer::neighbors::{get_neighbors, CullConfig};
use crate::optimizer::{prepare, Driver, SearchContext, SearchReport, SearchState, SearchStatus};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// How many of the newly generated states survive into the next round.
/// The first two depths always keep everything so every opening move gets
/// considered; after that K = clamp(factor * count, min_amt, max_amt).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionConfig {
    pub min_amt: usize,
    pub max_amt: Option<usize>,
    pub factor: Option<f64>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            min_amt: 8,
            max_amt: Some(128),
            factor: Some(0.25),
        }
    }
}

impl RetentionConfig {
    fn keep_count(&self, depth: usize, count: usize) -> usize {
        if depth < 2 {
            return count;
        }
        let scaled = (count as f64 * self.factor.unwrap_or(1.0)).ceil() as usize;
        scaled
            .max(self.min_amt)
            .min(self.max_amt.unwrap_or(count))
            .max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamConfig {
    pub retention: RetentionConfig,
    pub cull: CullConfig,
    pub max_depth: Option<usize>,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            retention: RetentionConfig::default(),
            cull: CullConfig::default(),
            max_depth: None,
        }
    }
}

/// Beam / retention search: expand every frontier state, rank all the new
/// neighbors by cost, keep the top K as the next frontier. Runs until no
/// new neighbors appear.
pub fn beam_search(
    plan: &crate::plan::PlanDocument,
    penalties: &CostPenalties,
    config: &BeamConfig,
    ctx: &SearchContext,
) -> PfResult<SearchReport> {
    let initial = prepare(plan, penalties, ctx.stats_params, "beam")?;
    let mut driver = Driver::new(ctx);

    let mut visited: FnvHashSet<String> = FnvHashSet::default();
    visited.insert(initial.state_id.clone());

    let mut frontier: Vec<SearchState> = vec![initial.clone()];
    let mut best = initial.clone();
    let mut best_goal: Option<SearchState> = if initial.is_goal() {
        Some(initial)
    } else {
        None
    };

    let mut status = SearchStatus::Converged;
    'rounds: loop {
        if let Some(max) = config.max_depth {
            if driver.depth >= max {
                status = SearchStatus::IterationLimitReached;
                break;
            }
        }

        let mut generated: Vec<SearchState> = Vec::new();
        for state in &frontier {
            if !driver.begin_iteration() {
                status = SearchStatus::Cancelled;
                break 'rounds;
            }

            let neighbors = get_neighbors(
                state,
                driver.depth,
                &config.cull,
                penalties,
                ctx.stats_params,
                &visited,
            );
            for neighbor in neighbors {
                visited.insert(neighbor.state_id.clone());
                if neighbor.total_cost() < best.total_cost() {
                    best = neighbor.clone();
                }
                if neighbor.is_goal() {
                    let better = best_goal
                        .as_ref()
                        .map_or(true, |g| neighbor.total_cost() < g.total_cost());
                    if better {
                        best_goal = Some(neighbor.clone());
                    }
                }
                generated.push(neighbor);
            }

            // Suspension point inside the scoring loop keeps the host
            // responsive even on wide frontiers.
            driver.checkpoint(&best, state);
        }

        if generated.is_empty() {
            break;
        }

        generated.sort_by(|a, b| a.total_cost().total_cmp(&b.total_cost()));
        let keep = config.retention.keep_count(driver.depth, generated.len());
        generated.truncate(keep);
        frontier = generated;
        driver.depth += 1;
    }

    // A goal state beats a cheaper non-goal state in the final report.
    let result = best_goal.unwrap_or(best);
    Ok(driver.finish(status, result))
}
