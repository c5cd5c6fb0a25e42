/// The most points a single rehearsal of one song can usefully absorb.
/// Drives both the ideal-value lookup and the exceeded-points penalty.
pub const MAX_POINTS_PER_REHEARSAL: u32 = 8;

/// Allocation sizes the ideal-value lookup may pick from.
/// The table extends past MAX_POINTS_PER_REHEARSAL so callers can inject a
/// larger per-rehearsal cap without touching the lookup.
pub const FIBONACCI: [u32; 10] = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

/// Progress callbacks fire every N iterations.
pub const DEFAULT_REPORT_EVERY: usize = 64;

/// Search depths that are expanded without culling the candidate list.
pub const DEFAULT_DEPTHS_WITHOUT_CULLING: usize = 2;

/// Fraction of candidates retained once culling kicks in.
pub const DEFAULT_CULL_PERCENT: f64 = 0.5;

/// Bounds for the culled candidate count.
pub const DEFAULT_CULL_CLAMP_MIN: usize = 4;
pub const DEFAULT_CULL_CLAMP_MAX: usize = 64;

/// How many times the annealer re-rolls a random cell before giving up on
/// finding one with a defined ideal value.
pub const MUTATION_ATTEMPT_LIMIT: usize = 12;

/// Node budget for the memoized DAG search. The implicit state graph is
/// combinatorial; anything past this is treated as a dead end.
pub const DEFAULT_DAG_NODE_BUDGET: usize = 10_000;
