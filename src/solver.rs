//! Brute-force generate-and-test search over one work range.
//!
//! Key points:
//! - One decode buffer per worker, reused for every candidate
//! - Factorial table computed once per range, not per candidate
//! - Valid placements are appended to a flat batch in discovery order
//!
//! There is no pruning: every index in the range is decoded and checked.

use tracing::debug;

use crate::board::{permutation_count, Placement};
use crate::error::Result;
use crate::partition::WorkRange;
use crate::permutation::{decode_into, factorials};
use crate::validator::is_valid;

/// Solutions found by one worker.
///
/// Placements are stored flat, `count * board_size` columns. The count is
/// kept separately because the 0×0 board has one solution with no columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionBatch {
    board_size: usize,
    count: usize,
    columns: Vec<u8>,
}

impl SolutionBatch {
    pub fn new(board_size: usize) -> Self {
        Self {
            board_size,
            count: 0,
            columns: Vec::new(),
        }
    }

    /// Rebuilds a batch from a received count and payload.
    ///
    /// Returns `None` if the payload length is not `count * board_size`.
    pub fn from_parts(board_size: usize, count: usize, columns: Vec<u8>) -> Option<Self> {
        if count.checked_mul(board_size)? != columns.len() {
            return None;
        }
        Some(Self {
            board_size,
            count,
            columns,
        })
    }

    /// Number of solutions in the batch.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn push(&mut self, placement: &[u8]) {
        debug_assert_eq!(placement.len(), self.board_size);
        self.columns.extend_from_slice(placement);
        self.count += 1;
    }

    /// The flattened payload, placements concatenated in discovery order.
    pub fn columns(&self) -> &[u8] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<u8> {
        self.columns
    }

    /// Iterates the placements in discovery order.
    pub fn placements(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let size = self.board_size;
        (0..self.count).map(move |i| &self.columns[i * size..(i + 1) * size])
    }
}

/// Outcome of a worker's search over its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    pub range: WorkRange,
    pub candidates_evaluated: u64,
    pub batch: SolutionBatch,
}

/// Decodes and validates every index of `range`, collecting valid placements.
pub fn search_range(board_size: usize, range: WorkRange) -> WorkerOutcome {
    let fact = factorials(board_size);
    let mut candidate: Placement = vec![0u8; board_size];
    let mut batch = SolutionBatch::new(board_size);

    for index in range.indices() {
        decode_into(index, &fact, &mut candidate);
        if is_valid(&candidate) {
            batch.push(&candidate);
        }
    }

    debug!(
        start = range.start,
        end = range.end,
        solutions = batch.len(),
        "range searched"
    );

    WorkerOutcome {
        range,
        candidates_evaluated: range.len(),
        batch,
    }
}

/// Finds every solution for a board on the current thread.
pub fn solve(board_size: usize) -> Result<Vec<Placement>> {
    let total = permutation_count(board_size)?;
    let outcome = search_range(board_size, WorkRange { start: 0, end: total });
    Ok(outcome.batch.placements().map(<[u8]>::to_vec).collect())
}
