//! Fixed-point arithmetic for rebase indices
//!
//! Indices are `u128` values scaled by [`UNIT`] (1e18). Every product of two
//! `u128` quantities is formed in 256 bits, so `amount * UNIT` cannot
//! overflow before the division brings the result back into range.
//!
//! CRITICAL: All asset amounts are u128 in the asset's smallest denomination

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer used for intermediate products.
    pub struct U256(4);
}

/// Asset amount in the smallest denomination
pub type Amount = u128;

/// Rebase index, fixed-point with base [`UNIT`]
pub type Index = u128;

/// Normalization base of the rebase index: 1.0 == 10^18
pub const UNIT: Index = 1_000_000_000_000_000_000;

/// Compute `floor(a * b / denominator)`.
///
/// Returns `None` when `denominator` is zero or the quotient does not fit
/// in a `u128`.
///
/// # Example
///
/// ```rust
/// use yield_splitter_core_rs::core::{mul_div_floor, UNIT};
///
/// // 1000 units at index 1.25 -> 800 agnostic units
/// let index = UNIT + UNIT / 4;
/// assert_eq!(mul_div_floor(1000, UNIT, index), Some(800));
/// assert_eq!(mul_div_floor(1, 1, 0), None);
/// ```
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    narrow(quotient)
}

/// Compute `ceil(a * b / denominator)`.
///
/// Same failure modes as [`mul_div_floor`].
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient = quotient + U256::one();
    }
    narrow(quotient)
}

fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}
