use crate::consts::{FIBONACCI, MAX_POINTS_PER_REHEARSAL};
use crate::plan::PlanDocument;
use fnv::{FnvHashMap, FnvHashSet};

/// Constants injected into the stats/ideal-value math so tests can vary them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsParams {
    pub max_points_per_rehearsal: u32,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            max_points_per_rehearsal: MAX_POINTS_PER_REHEARSAL,
        }
    }
}

/// A non-zero allocation resolved to row/column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStat {
    pub row_index: usize,
    pub column_index: usize,
    pub linear_index: usize,
    pub points: u32,
    pub auto_filled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongStats {
    pub row_index: usize,
    pub points_required: u32,
    pub points_allocated: u32,
    pub remaining_need: u32,
    /// Non-zero cells for this song, ordered by column index.
    pub allocated_cells: Vec<CellStat>,
    pub first_allocated_column: Option<usize>,
    /// ceil(points_required / max_points_per_rehearsal).
    pub ideal_rehearsal_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    pub column_index: usize,
    pub points_available: u32,
    pub points_allocated: u32,
    pub remaining_capacity: u32,
    /// Distinct songs with a non-zero allocation in this segment.
    pub songs_allocated: u32,
}

/// Derived statistics for one plan snapshot. Pure function of the plan:
/// recomputed for every candidate state, never cached across states.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStats {
    pub params: StatsParams,
    pub num_rows: usize,
    pub num_columns: usize,
    pub songs: Vec<SongStats>,
    pub segments: Vec<SegmentStats>,
    pub total_points_allocated: u64,
    /// Sum over songs of (allocated - required).
    pub song_balance: i64,
    /// Sum over segments of (allocated - available).
    pub segment_balance: i64,
    /// (row, column) pairs occupied by user-entered cells.
    fixed_cells: FnvHashSet<(usize, usize)>,
}

impl PlanStats {
    pub fn calculate(plan: &PlanDocument) -> Self {
        Self::calculate_with(plan, StatsParams::default())
    }

    pub fn calculate_with(plan: &PlanDocument, params: StatsParams) -> Self {
        let num_rows = plan.rows.len();
        let num_columns = plan.columns.len();

        let row_index: FnvHashMap<&str, usize> = plan
            .rows
            .iter()
            .enumerate()
            .map(|(i, s)| (s.row_id.as_str(), i))
            .collect();
        let column_index: FnvHashMap<&str, usize> = plan
            .columns
            .iter()
            .enumerate()
            .map(|(i, s)| (s.column_id.as_str(), i))
            .collect();

        let mut songs: Vec<SongStats> = plan
            .rows
            .iter()
            .enumerate()
            .map(|(i, song)| SongStats {
                row_index: i,
                points_required: song.points_required,
                points_allocated: 0,
                remaining_need: song.points_required,
                allocated_cells: Vec::new(),
                first_allocated_column: None,
                ideal_rehearsal_count: song
                    .points_required
                    .div_ceil(params.max_points_per_rehearsal.max(1)),
            })
            .collect();

        let mut segments: Vec<SegmentStats> = plan
            .columns
            .iter()
            .enumerate()
            .map(|(i, segment)| SegmentStats {
                column_index: i,
                points_available: segment.points_available,
                points_allocated: 0,
                remaining_capacity: segment.points_available,
                songs_allocated: 0,
            })
            .collect();

        let mut fixed_cells: FnvHashSet<(usize, usize)> = FnvHashSet::default();
        let mut live: Vec<CellStat> = Vec::with_capacity(plan.cells.len());

        for cell in &plan.cells {
            // Validation is the caller's contract; unknown ids are skipped
            // here rather than panicking mid-search.
            let (Some(&r), Some(&c)) = (
                row_index.get(cell.row_id.as_str()),
                column_index.get(cell.column_id.as_str()),
            ) else {
                continue;
            };
            if !cell.auto_filled {
                fixed_cells.insert((r, c));
            }
            if cell.points_allocated == 0 {
                continue;
            }
            live.push(CellStat {
                row_index: r,
                column_index: c,
                linear_index: r * num_columns + c,
                points: cell.points_allocated,
                auto_filled: cell.auto_filled,
            });
        }

        // Column order within a song matters for the adjacency cost terms.
        live.sort_by_key(|c| c.linear_index);

        let mut total_points_allocated: u64 = 0;
        for cell in live {
            total_points_allocated += u64::from(cell.points);

            let song = &mut songs[cell.row_index];
            song.points_allocated += cell.points;
            song.first_allocated_column = Some(
                song.first_allocated_column
                    .map_or(cell.column_index, |f| f.min(cell.column_index)),
            );
            song.allocated_cells.push(cell);

            let segment = &mut segments[cell.column_index];
            segment.points_allocated += cell.points;
            segment.songs_allocated += 1;
        }

        let mut song_balance: i64 = 0;
        for song in &mut songs {
            song.remaining_need = song.points_required.saturating_sub(song.points_allocated);
            song_balance += i64::from(song.points_allocated) - i64::from(song.points_required);
        }
        let mut segment_balance: i64 = 0;
        for segment in &mut segments {
            segment.remaining_capacity = segment
                .points_available
                .saturating_sub(segment.points_allocated);
            segment_balance +=
                i64::from(segment.points_allocated) - i64::from(segment.points_available);
        }

        Self {
            params,
            num_rows,
            num_columns,
            songs,
            segments,
            total_points_allocated,
            song_balance,
            segment_balance,
            fixed_cells,
        }
    }

    /// The point value the search would write into (column, row).
    ///
    /// `None` when the cell is already occupied by a user-entered allocation
    /// (those are immutable). Otherwise the largest Fibonacci number that
    /// fits `min(max per rehearsal, segment remaining, song remaining)`,
    /// falling back to the bound itself (possibly 0) when no Fibonacci
    /// number fits.
    pub fn ideal_value_for_cell(&self, column_index: usize, row_index: usize) -> Option<u32> {
        if self.fixed_cells.contains(&(row_index, column_index)) {
            return None;
        }
        let song = self.songs.get(row_index)?;
        let segment = self.segments.get(column_index)?;

        let bound = self
            .params
            .max_points_per_rehearsal
            .min(segment.remaining_capacity)
            .min(song.remaining_need);

        Some(largest_fibonacci_at_most(bound).unwrap_or(bound))
    }

    /// Goal predicate shared by every strategy: aggregate allocation meets
    /// aggregate demand or aggregate capacity.
    pub fn is_goal(&self) -> bool {
        self.song_balance >= 0 || self.segment_balance >= 0
    }
}

pub fn largest_fibonacci_at_most(bound: u32) -> Option<u32> {
    FIBONACCI.iter().rev().find(|&&f| f <= bound).copied()
}
