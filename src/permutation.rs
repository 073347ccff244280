//! Index to permutation decoding.
//!
//! Every index in `0..N!` names one permutation of `0..N`. Decoding happens in
//! two stages:
//! - split the index into factorial-base digits, where digit `b` has base
//!   `(N-1-b)!` and lies in `0..=N-1-b`
//! - correct that insertion code into a real permutation by bumping each
//!   digit past the earlier digits that are less than or equal to it
//!
//! The resulting order over indices is lexicographic over placements.

use crate::board::MAX_BOARD_SIZE;

/// Factorials `0!..(n-1)!`, the digit bases for an `n`-element permutation.
///
/// `n` must not exceed [`MAX_BOARD_SIZE`].
pub fn factorials(n: usize) -> Vec<u64> {
    debug_assert!(n <= MAX_BOARD_SIZE);
    let mut table = Vec::with_capacity(n);
    let mut value = 1u64;
    for k in 0..n {
        if k > 0 {
            value *= k as u64;
        }
        table.push(value);
    }
    table
}

/// Writes the factorial-base digits of `index` into `digits`.
///
/// `digits.len()` must equal `fact.len()`, and `index` must be below
/// `fact.len()!`.
#[inline]
pub fn factorial_digits(mut index: u64, fact: &[u64], digits: &mut [u8]) {
    let n = fact.len();
    debug_assert_eq!(digits.len(), n);
    for (position, digit) in digits.iter_mut().enumerate() {
        let base = fact[n - 1 - position];
        *digit = (index / base) as u8;
        index %= base;
    }
}

/// Turns a factorial-base insertion code into a permutation, in place.
///
/// Positions are corrected right to left. For each position the earlier
/// digits are scanned nearest first, and every one that is `<=` the current
/// value bumps it by one. Earlier digits are still uncorrected when they are
/// compared; scanning them in the other direction does not yield a
/// permutation.
#[inline]
pub fn correct_insertion_code(digits: &mut [u8]) {
    for b in (1..digits.len()).rev() {
        for a in (0..b).rev() {
            if digits[a] <= digits[b] {
                digits[b] += 1;
            }
        }
    }
}

/// Decodes `index` into the placement buffer `out`.
///
/// The buffer is caller-owned so the search loop can reuse one allocation for
/// every candidate.
#[inline]
pub fn decode_into(index: u64, fact: &[u64], out: &mut [u8]) {
    factorial_digits(index, fact, out);
    correct_insertion_code(out);
}

/// Decodes `index` into a fresh placement of length `n`.
pub fn decode(index: u64, n: usize) -> Vec<u8> {
    let fact = factorials(n);
    let mut placement = vec![0u8; n];
    decode_into(index, &fact, &mut placement);
    placement
}
