pub mod consts;
pub mod cost;
pub mod error;
pub mod job;
pub mod optimizer;
pub mod plan;
pub mod stats;

pub use cost::{calculate_cost, CostItem, CostPenalties, CostReport, CostTerm, Penalty};
pub use error::{PfResult, PlanError};
pub use job::JobIdentifier;
pub use optimizer::{
    anneal_search, beam_search, best_first_search, dag_search, AnnealConfig, BeamConfig,
    BestFirstConfig, CancelFlag, CullConfig, DagConfig, NoopScheduler, ProgressCallback,
    RetentionConfig, Scheduler, SearchContext, SearchProgress, SearchReport, SearchState,
    SearchStatus, ThreadYieldScheduler,
};
pub use plan::{Cell, PlanDocument, Segment, Song};
pub use stats::{PlanStats, SegmentStats, SongStats, StatsParams};
