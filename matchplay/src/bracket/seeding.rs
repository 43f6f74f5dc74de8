//! Seed-spacing order for round-one matches.

use super::errors::{BracketError, BracketResult};

/// Seed-spacing permutation of `0..n` for a power-of-two `n`.
///
/// `seeding_order(1) == [0]`, and every `x` of `seeding_order(n / 2)` expands
/// to `x, n - 1 - x`. Filling round-one slots in this order spreads byes evenly
/// across the bracket.
pub fn seeding_order(n: usize) -> BracketResult<Vec<usize>> {
    if !n.is_power_of_two() {
        return Err(BracketError::NotPowerOfTwo(n));
    }

    let mut order = vec![0];
    let mut size = 1;
    while size < n {
        size *= 2;
        order = order.iter().flat_map(|&x| [x, size - 1 - x]).collect();
    }

    Ok(order)
}
