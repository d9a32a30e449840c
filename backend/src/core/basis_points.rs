//! Basis points
//!
//! One basis point is 1/100th of 1%, i.e. 0.0001. Fee shares and slippage
//! bounds are configured in basis points.

use crate::core::fixed_point::{mul_div_floor, Amount};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Fraction expressed in 1/10_000 units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BasisPoints(pub u16);

impl BasisPoints {
    pub const ZERO: BasisPoints = BasisPoints(0);

    /// 100%
    pub const MAX: BasisPoints = BasisPoints(10_000);

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Whether the fraction lies within `[0, 100%]`
    pub fn is_valid(&self) -> bool {
        *self <= Self::MAX
    }

    /// `amount * bps / 10_000`, rounded down
    ///
    /// # Example
    ///
    /// ```rust
    /// use yield_splitter_core_rs::core::BasisPoints;
    ///
    /// assert_eq!(BasisPoints(1_000).of_rounded_down(400), 40);
    /// assert_eq!(BasisPoints(1).of_rounded_down(9_999), 0);
    /// ```
    pub fn of_rounded_down(&self, amount: Amount) -> Amount {
        // bps <= u16::MAX, so the quotient is at most ~6.5 * amount and
        // only `None` on a quotient overflow, which saturates.
        mul_div_floor(amount, u128::from(self.0), 10_000).unwrap_or(Amount::MAX)
    }

    /// The complementary fraction `100% - self`, saturating at zero
    pub fn complement(&self) -> BasisPoints {
        BasisPoints(Self::MAX.0.saturating_sub(self.0))
    }
}

impl From<u16> for BasisPoints {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl Display for BasisPoints {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}
