//! Pro-rata distribution of swap proceeds

use crate::core::{mul_div_floor, Amount, BasisPoints};

/// Shares of one distribution, in the order of the weights given
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    pub shares: Vec<Amount>,
    /// Undistributed remainder, `total - sum(shares)`
    pub dust: Amount,
}

impl Allocation {
    pub fn distributed(&self) -> Amount {
        self.shares.iter().sum()
    }
}

/// Split `total` proportionally to `weights`, rounding each share down
///
/// With a zero weight sum nothing is distributed and `total` is dust.
///
/// # Example
///
/// ```rust
/// use yield_splitter_core_rs::upkeep::prorate;
///
/// let allocation = prorate(324, &[100, 300]);
/// assert_eq!(allocation.shares, vec![81, 243]);
/// assert_eq!(allocation.dust, 0);
///
/// let allocation = prorate(10, &[1, 1, 1]);
/// assert_eq!(allocation.shares, vec![3, 3, 3]);
/// assert_eq!(allocation.dust, 1);
/// ```
pub fn prorate(total: Amount, weights: &[Amount]) -> Allocation {
    let weight_sum = weights
        .iter()
        .try_fold(0u128, |acc, w| acc.checked_add(*w));

    let weight_sum = match weight_sum {
        Some(sum) if sum > 0 => sum,
        // An overflowing sum cannot come from the ledger: yields are
        // summed with checked arithmetic before they get here
        _ => {
            return Allocation {
                shares: vec![0; weights.len()],
                dust: total,
            }
        }
    };

    // share <= total because weight <= weight_sum, so narrowing cannot fail
    let shares: Vec<Amount> = weights
        .iter()
        .map(|w| mul_div_floor(total, *w, weight_sum).unwrap_or(0))
        .collect();
    let distributed: Amount = shares.iter().sum();

    Allocation {
        shares,
        dust: total - distributed,
    }
}

/// Least acceptable swap output for a quote under a slippage tolerance
///
/// # Example
///
/// ```rust
/// use yield_splitter_core_rs::core::BasisPoints;
/// use yield_splitter_core_rs::upkeep::minimum_output;
///
/// assert_eq!(minimum_output(10_000, BasisPoints(100)), 9_900);
/// assert_eq!(minimum_output(999, BasisPoints(50)), 994);
/// ```
pub fn minimum_output(quote: Amount, max_slippage: BasisPoints) -> Amount {
    max_slippage.complement().of_rounded_down(quote)
}
