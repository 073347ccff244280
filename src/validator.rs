//! Diagonal conflict check for a candidate placement.
//!
//! Placements coming out of the decoder are permutations, so no two queens
//! share a row or a column. Only the two diagonal directions need checking.

/// Returns `true` if no two queens in `placement` share a diagonal.
///
/// For each row, scans the rows after it and then the rows before it, and
/// stops at the first conflict. Queens `dist` rows apart conflict when their
/// columns also differ by exactly `dist`.
#[inline]
pub fn is_valid(placement: &[u8]) -> bool {
    let n = placement.len();

    for j in 0..n {
        let value = placement[j] as isize;

        for (dist, &other) in placement[j + 1..].iter().enumerate() {
            if attacks(value, other, dist as isize + 1) {
                return false;
            }
        }

        for (dist, &other) in placement[..j].iter().rev().enumerate() {
            if attacks(value, other, dist as isize + 1) {
                return false;
            }
        }
    }

    true
}

#[inline(always)]
fn attacks(value: isize, other: u8, dist: isize) -> bool {
    let other = other as isize;
    value - dist == other || value + dist == other
}
