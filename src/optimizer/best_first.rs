use crate::cost::CostPenalties;
use crate::error::PfResult;
use crate::optimizer::neighbors::{get_neighbors, CullConfig};
use crate::optimizer::{prepare, Driver, SearchContext, SearchReport, SearchState, SearchStatus};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestFirstConfig {
    pub cull: CullConfig,
    /// Stop as soon as the goal predicate holds instead of draining the
    /// whole frontier.
    pub stop_at_goal: bool,
    pub max_iterations: Option<usize>,
}

impl Default for BestFirstConfig {
    fn default() -> Self {
        Self {
            cull: CullConfig::default(),
            stop_at_goal: true,
            max_iterations: None,
        }
    }
}

struct HeapEntry {
    cost: f64,
    /// Insertion order, so equal-cost pops are deterministic.
    seq: u64,
    depth: usize,
    state: SearchState,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Greedy best-first search over the allocation space.
///
/// Pops the cheapest frontier state, expands it, and admits a neighbor only
/// when it does not cost more than the state that produced it. Non-improving
/// neighbors go straight into the visited set so the branch is pruned. This
/// is a deliberate greedy pruning rule, not an admissible A* bound; the
/// space is far too large for exhaustive search.
pub fn best_first_search(
    plan: &crate::plan::PlanDocument,
    penalties: &CostPenalties,
    config: &BestFirstConfig,
    ctx: &SearchContext,
) -> PfResult<SearchReport> {
    let initial = prepare(plan, penalties, ctx.stats_params, "bestFirst")?;
    let mut driver = Driver::new(ctx);

    let mut visited: FnvHashSet<String> = FnvHashSet::default();
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    let mut best = initial.clone();
    heap.push(Reverse(HeapEntry {
        cost: initial.total_cost(),
        seq,
        depth: 0,
        state: initial,
    }));

    let mut status = SearchStatus::Converged;
    while let Some(Reverse(entry)) = heap.pop() {
        if !driver.begin_iteration() {
            status = SearchStatus::Cancelled;
            break;
        }
        if let Some(limit) = config.max_iterations {
            if driver.iteration > limit {
                status = SearchStatus::IterationLimitReached;
                break;
            }
        }

        let current = entry.state;
        if visited.contains(&current.state_id) {
            continue;
        }
        visited.insert(current.state_id.clone());
        driver.depth = driver.depth.max(entry.depth);

        if current.total_cost() < best.total_cost() {
            best = current.clone();
        }
        if config.stop_at_goal && current.is_goal() {
            best = current;
            break;
        }

        driver.checkpoint(&best, &current);
        if driver.cancelled() {
            status = SearchStatus::Cancelled;
            break;
        }

        let neighbors = get_neighbors(
            &current,
            entry.depth,
            &config.cull,
            penalties,
            ctx.stats_params,
            &visited,
        );
        for neighbor in neighbors {
            if neighbor.total_cost() <= current.total_cost() {
                seq += 1;
                heap.push(Reverse(HeapEntry {
                    cost: neighbor.total_cost(),
                    seq,
                    depth: entry.depth + 1,
                    state: neighbor,
                }));
            } else {
                // Prune: never expand a branch that got more expensive.
                visited.insert(neighbor.state_id);
            }
        }
    }

    Ok(driver.finish(status, best))
}
