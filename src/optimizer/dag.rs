use crate::consts::DEFAULT_DAG_NODE_BUDGET;
use crate::cost::CostPenalties;
use crate::error::PfResult;
use crate::optimizer::neighbors::{get_neighbors, CullConfig};
use crate::optimizer::{prepare, Driver, SearchContext, SearchReport, SearchState, SearchStatus};
use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagConfig {
    pub cull: CullConfig,
    /// Hard cap on discovered states. Nodes past the budget are treated as
    /// dead ends rather than expanded.
    pub max_nodes: usize,
    /// Keep best-child back-pointers and walk them to pick the final state.
    pub reconstruct_path: bool,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            cull: CullConfig::default(),
            max_nodes: DEFAULT_DAG_NODE_BUDGET,
            reconstruct_path: true,
        }
    }
}

enum Phase {
    Discover,
    Post,
}

struct Frame {
    state_id: String,
    depth: usize,
    phase: Phase,
}

/// Memoized minimum-cost search over the implicit allocation DAG.
///
/// Iterative two-phase depth-first traversal: a DISCOVER frame expands a
/// node and re-pushes it as a POST frame behind its children, so the node's
/// minimal cost-to-goal is finalized only after every reachable child is
/// (bottom-up dynamic programming). Edge cost is the cost delta between
/// child and parent, so a path's cumulative cost telescopes to
/// `goal.total_cost - start.total_cost`; goal nodes memoize 0.
///
/// An in-stack set guards against cycle re-entry. The allocation graph is a
/// true DAG (every edge adds points), so a hit means a bookkeeping bug
/// upstream; it is skipped rather than escalated. This strategy exists as a
/// reference/validation path: the reachable graph is generally intractable
/// for exhaustive memoization, hence the node budget.
pub fn dag_search(
    plan: &crate::plan::PlanDocument,
    penalties: &CostPenalties,
    config: &DagConfig,
    ctx: &SearchContext,
) -> PfResult<SearchReport> {
    let initial = prepare(plan, penalties, ctx.stats_params, "dag")?;
    let mut driver = Driver::new(ctx);

    let root_id = initial.state_id.clone();
    let mut nodes: FnvHashMap<String, SearchState> = FnvHashMap::default();
    nodes.insert(root_id.clone(), initial.clone());

    // state_id -> minimal cumulative edge cost from here to any goal state.
    let mut memo: FnvHashMap<String, f64> = FnvHashMap::default();
    let mut best_child: FnvHashMap<String, String> = FnvHashMap::default();
    let mut children: FnvHashMap<String, Vec<(String, f64)>> = FnvHashMap::default();
    let mut in_stack: FnvHashSet<String> = FnvHashSet::default();

    let mut best = initial.clone();
    let mut best_goal: Option<SearchState> = None;
    let no_visited: FnvHashSet<String> = FnvHashSet::default();

    let mut stack: Vec<Frame> = vec![Frame {
        state_id: root_id.clone(),
        depth: 0,
        phase: Phase::Discover,
    }];

    let mut status = SearchStatus::Converged;
    while let Some(frame) = stack.pop() {
        if !driver.begin_iteration() {
            status = SearchStatus::Cancelled;
            break;
        }
        driver.depth = driver.depth.max(frame.depth);

        match frame.phase {
            Phase::Discover => {
                if memo.contains_key(&frame.state_id) {
                    continue;
                }
                if in_stack.contains(&frame.state_id) {
                    warn!(state_id = %frame.state_id, "cycle detected in allocation graph, skipping re-entry");
                    continue;
                }
                // The node map owns every discovered state; clone out to
                // keep expanding while the map keeps growing.
                let state = match nodes.get(&frame.state_id) {
                    Some(s) => s.clone(),
                    None => continue,
                };

                if state.total_cost() < best.total_cost() {
                    best = state.clone();
                }
                if state.is_goal() {
                    memo.insert(frame.state_id.clone(), 0.0);
                    let better = best_goal
                        .as_ref()
                        .map_or(true, |g| state.total_cost() < g.total_cost());
                    if better {
                        best_goal = Some(state);
                    }
                    continue;
                }
                if nodes.len() >= config.max_nodes {
                    memo.insert(frame.state_id.clone(), f64::INFINITY);
                    continue;
                }

                in_stack.insert(frame.state_id.clone());
                stack.push(Frame {
                    state_id: frame.state_id.clone(),
                    depth: frame.depth,
                    phase: Phase::Post,
                });

                // Dedup is handled by the memo table; edges to already
                // known children still need their weights recorded.
                let neighbors = get_neighbors(
                    &state,
                    frame.depth,
                    &config.cull,
                    penalties,
                    ctx.stats_params,
                    &no_visited,
                );
                let mut edges = Vec::with_capacity(neighbors.len());
                for neighbor in neighbors {
                    let edge_cost = neighbor.total_cost() - state.total_cost();
                    edges.push((neighbor.state_id.clone(), edge_cost));
                    if !memo.contains_key(&neighbor.state_id)
                        && !in_stack.contains(&neighbor.state_id)
                    {
                        let child_id = neighbor.state_id.clone();
                        nodes.entry(child_id.clone()).or_insert(neighbor);
                        stack.push(Frame {
                            state_id: child_id,
                            depth: frame.depth + 1,
                            phase: Phase::Discover,
                        });
                    }
                }
                children.insert(frame.state_id, edges);

                driver.checkpoint(&best, &state);
                if driver.cancelled() {
                    status = SearchStatus::Cancelled;
                    break;
                }
            }
            Phase::Post => {
                in_stack.remove(&frame.state_id);
                let mut min_cost = f64::INFINITY;
                let mut min_child: Option<&String> = None;
                if let Some(edges) = children.get(&frame.state_id) {
                    for (child_id, edge_cost) in edges {
                        let child_cost = memo.get(child_id).copied().unwrap_or(f64::INFINITY);
                        let total = edge_cost + child_cost;
                        if total < min_cost {
                            min_cost = total;
                            min_child = Some(child_id);
                        }
                    }
                }
                memo.insert(frame.state_id.clone(), min_cost);
                if config.reconstruct_path {
                    if let Some(child_id) = min_child {
                        best_child.insert(frame.state_id, child_id.clone());
                    }
                }
            }
        }
    }

    // Prefer the memoized optimal path's goal state when the traversal
    // completed; otherwise fall back to the best goal/state seen.
    let mut result = best_goal.unwrap_or(best);
    if status == SearchStatus::Converged && config.reconstruct_path {
        if let Some(final_state) = walk_best_path(&root_id, &memo, &best_child, &nodes) {
            result = final_state;
        }
    }

    Ok(driver.finish(status, result))
}

fn walk_best_path(
    root_id: &str,
    memo: &FnvHashMap<String, f64>,
    best_child: &FnvHashMap<String, String>,
    nodes: &FnvHashMap<String, SearchState>,
) -> Option<SearchState> {
    if !memo.get(root_id)?.is_finite() {
        return None;
    }
    let mut current = root_id;
    // Bounded by node count; back-pointers cannot loop in a DAG.
    for _ in 0..=nodes.len() {
        match best_child.get(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    nodes.get(current).cloned()
}
