//! Yield accounting
//!
//! Pure valuation layer: converts between flat and agnostic units at one
//! index snapshot and derives the outstanding yield of a record.

pub mod yield_accountant;

pub use yield_accountant::{AccountingError, YieldAccountant};
