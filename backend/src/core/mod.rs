//! Core primitives: fixed-point arithmetic, basis points and time

pub mod basis_points;
pub mod fixed_point;
pub mod time;

pub use basis_points::BasisPoints;
pub use fixed_point::{mul_div_ceil, mul_div_floor, Amount, Index, UNIT, U256};
pub use time::{elapsed_since, is_due, Timestamp};
