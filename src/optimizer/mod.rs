pub mod anneal;
pub mod beam;
pub mod best_first;
pub mod dag;
pub mod neighbors;

pub use anneal::{anneal_search, AnnealConfig};
pub use beam::{beam_search, BeamConfig, RetentionConfig};
pub use best_first::{best_first_search, BestFirstConfig};
pub use dag::{dag_search, DagConfig};
pub use neighbors::{get_neighbors, CullConfig};

use crate::consts::DEFAULT_REPORT_EVERY;
use crate::cost::{calculate_cost, CostPenalties, CostReport};
use crate::error::PfResult;
use crate::job::JobIdentifier;
use crate::plan::PlanDocument;
use crate::stats::{PlanStats, StatsParams};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One fully-scored node of the search space. States are immutable once
/// built; strategies clone the plan, mutate the clone, and re-derive
/// everything here.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub plan: PlanDocument,
    pub stats: PlanStats,
    pub cost: CostReport,
    pub state_id: String,
}

impl SearchState {
    pub fn from_plan(plan: PlanDocument, penalties: &CostPenalties, params: StatsParams) -> Self {
        let stats = PlanStats::calculate_with(&plan, params);
        let cost = calculate_cost(&plan, &stats, penalties);
        let state_id = plan.state_id();
        Self {
            plan,
            stats,
            cost,
            state_id,
        }
    }

    #[inline]
    pub fn total_cost(&self) -> f64 {
        self.cost.total_cost
    }

    #[inline]
    pub fn is_goal(&self) -> bool {
        self.stats.is_goal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    Idle,
    Running,
    Converged,
    IterationLimitReached,
    Cancelled,
}

/// Advisory cancellation shared between the host and a running search.
/// Polled at the top of every iteration; once set the strategy returns the
/// best state found so far.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cooperative yield hook. The host decides what "yield" means: a thread
/// yield, an async suspension, or nothing at all in batch tests.
pub trait Scheduler: Send + Sync {
    fn yield_now(&self) {}
}

#[derive(Debug, Default)]
pub struct NoopScheduler;
impl Scheduler for NoopScheduler {}

#[derive(Debug, Default)]
pub struct ThreadYieldScheduler;
impl Scheduler for ThreadYieldScheduler {
    fn yield_now(&self) {
        std::thread::yield_now();
    }
}

/// Snapshot handed to the progress callback at the reporting cadence.
#[derive(Debug)]
pub struct SearchProgress<'a> {
    pub elapsed_millis: u64,
    pub best_state: &'a SearchState,
    pub current_state: &'a SearchState,
    pub depth: usize,
    pub iteration: usize,
}

/// Return `false` to stop the search; treated like cancellation.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, progress: &SearchProgress) -> bool;
}

impl<F> ProgressCallback for F
where
    F: Fn(&SearchProgress) -> bool + Send + Sync,
{
    fn on_progress(&self, progress: &SearchProgress) -> bool {
        self(progress)
    }
}

static NOOP_SCHEDULER: NoopScheduler = NoopScheduler;

/// Everything a strategy needs from its host besides the plan and tuning:
/// cancellation, progress reporting, the yield hook, and the injected stats
/// constants.
pub struct SearchContext<'a> {
    pub cancel: &'a CancelFlag,
    pub progress: &'a dyn ProgressCallback,
    pub scheduler: &'a dyn Scheduler,
    pub report_every: usize,
    pub stats_params: StatsParams,
}

impl<'a> SearchContext<'a> {
    pub fn new(cancel: &'a CancelFlag, progress: &'a dyn ProgressCallback) -> Self {
        Self {
            cancel,
            progress,
            scheduler: &NOOP_SCHEDULER,
            report_every: DEFAULT_REPORT_EVERY,
            stats_params: StatsParams::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: &'a dyn Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every.max(1);
        self
    }
}

/// What a strategy hands back: the best state it saw, how it stopped, and
/// how much work it did.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best: SearchState,
    pub status: SearchStatus,
    pub iterations: usize,
    pub depth: usize,
    pub elapsed_millis: u64,
}

/// The cooperative run-loop bookkeeping shared by all four strategies:
/// cancellation polling, iteration counting, cadence-based progress
/// reporting, and control-yielding between batches.
pub(crate) struct Driver<'a> {
    ctx: &'a SearchContext<'a>,
    started: Instant,
    pub iteration: usize,
    pub depth: usize,
    stopped_by_callback: bool,
}

impl<'a> Driver<'a> {
    pub fn new(ctx: &'a SearchContext<'a>) -> Self {
        Self {
            ctx,
            started: Instant::now(),
            iteration: 0,
            depth: 0,
            stopped_by_callback: false,
        }
    }

    /// Top-of-iteration check. Returns false once cancellation (host flag or
    /// callback veto) has been observed; the iteration is not counted then.
    pub fn begin_iteration(&mut self) -> bool {
        if self.cancelled() {
            return false;
        }
        self.iteration += 1;
        true
    }

    pub fn cancelled(&self) -> bool {
        self.stopped_by_callback || self.ctx.cancel.is_cancelled()
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Cadence point: report progress and yield control every
    /// `report_every` iterations.
    pub fn checkpoint(&mut self, best: &SearchState, current: &SearchState) {
        if self.iteration % self.ctx.report_every != 0 {
            return;
        }
        let progress = SearchProgress {
            elapsed_millis: self.elapsed_millis(),
            best_state: best,
            current_state: current,
            depth: self.depth,
            iteration: self.iteration,
        };
        if !self.ctx.progress.on_progress(&progress) {
            self.stopped_by_callback = true;
        }
        self.ctx.scheduler.yield_now();
    }

    pub fn finish(self, status: SearchStatus, best: SearchState) -> SearchReport {
        debug!(
            ?status,
            iterations = self.iteration,
            depth = self.depth,
            best_cost = best.total_cost(),
            "search finished"
        );
        SearchReport {
            best,
            status,
            iterations: self.iteration,
            depth: self.depth,
            elapsed_millis: self.elapsed_millis(),
        }
    }
}

/// Shared entry-point preamble: enforce the plan precondition, log the job
/// identity, and score the caller's plan as the initial state.
pub(crate) fn prepare(
    plan: &PlanDocument,
    penalties: &CostPenalties,
    params: StatsParams,
    strategy: &str,
) -> PfResult<SearchState> {
    plan.validate()?;
    let job = JobIdentifier::from_parts(plan, penalties, strategy)?;
    info!(
        strategy,
        job = %job.hash,
        rows = plan.rows.len(),
        columns = plan.columns.len(),
        "starting search"
    );
    Ok(SearchState::from_plan(plan.clone(), penalties, params))
}
