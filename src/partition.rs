//! Static partitioning of the permutation index space across workers.
//!
//! Each worker gets `floor(N! / W)` consecutive indices. The remainder
//! `N! mod W` goes entirely to the highest rank, so the last worker can carry
//! up to `W - 1` extra candidates.

use std::ops::Range;

use crate::board::permutation_count;
use crate::error::{QueensError, Result};

/// Half-open interval `[start, end)` of permutation indices owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    pub start: u64,
    pub end: u64,
}

impl WorkRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Computes the range of rank `rank` for an `N!` space split over `workers`.
pub fn partition(board_size: usize, workers: usize, rank: usize) -> Result<WorkRange> {
    let total = permutation_count(board_size)?;
    partition_space(total, workers, rank)
}

/// Splits `0..total` across `workers` and returns the slice for `rank`.
pub fn partition_space(total: u64, workers: usize, rank: usize) -> Result<WorkRange> {
    if workers == 0 {
        return Err(QueensError::InvalidWorkerCount(workers));
    }
    if rank >= workers {
        return Err(QueensError::InvalidRank { rank, workers });
    }

    let workers = workers as u64;
    let rank = rank as u64;
    let group_size = total / workers;
    let start = rank * group_size;
    let end = if rank == workers - 1 {
        total
    } else {
        start + group_size
    };

    Ok(WorkRange { start, end })
}

/// Ranges for every rank, in rank order.
pub fn partition_all(board_size: usize, workers: usize) -> Result<Vec<WorkRange>> {
    (0..workers)
        .map(|rank| partition(board_size, workers, rank))
        .collect()
}
