//! Board geometry for the N-queens search.
//!
//! A placement stores one column per row. Cells are addressed by a flat
//! row-major index: `idx = row * N + column`, so every cell of an N×N board
//! maps to `0..N*N`.

use crate::error::{QueensError, Result};

/// Largest board whose permutation space `N!` fits in a `u64`.
///
/// `20! = 2_432_902_008_176_640_000 < 2^64 < 21!`.
pub const MAX_BOARD_SIZE: usize = 20;

/// A column assignment, one entry per row.
///
/// Columns are at most `MAX_BOARD_SIZE - 1`, so a byte is enough.
pub type Placement = Vec<u8>;

/// Checks a board size against [`MAX_BOARD_SIZE`].
pub fn validate_board_size(size: usize) -> Result<()> {
    if size > MAX_BOARD_SIZE {
        return Err(QueensError::board_too_large(size));
    }
    Ok(())
}

/// Returns `n!`, or `None` if it overflows `u64`.
pub fn factorial(n: usize) -> Option<u64> {
    (1..=n as u64).try_fold(1u64, |acc, k| acc.checked_mul(k))
}

/// Size of the permutation space for a board, `N!`.
pub fn permutation_count(size: usize) -> Result<u64> {
    validate_board_size(size)?;
    factorial(size).ok_or_else(|| QueensError::board_too_large(size))
}

/// Converts (row, column) to a flat cell index.
#[inline(always)]
pub const fn cell_index(size: usize, row: usize, column: usize) -> usize {
    row * size + column
}

/// Converts a flat cell index back to (row, column).
#[inline(always)]
pub const fn cell_coords(size: usize, cell: usize) -> (usize, usize) {
    (cell / size, cell % size)
}

/// Formats a placement as one line of semicolon-terminated cell indices.
///
/// `[1, 3, 0, 2]` on a 4×4 board becomes `1;7;8;14;`.
pub fn format_solution_line(placement: &[u8]) -> String {
    let size = placement.len();
    let mut line = String::with_capacity(size * 4);
    for (row, &column) in placement.iter().enumerate() {
        line.push_str(&cell_index(size, row, column as usize).to_string());
        line.push(';');
    }
    line
}
