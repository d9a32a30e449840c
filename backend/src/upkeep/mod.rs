//! Upkeep Module
//!
//! Periodic batch settlement of accrued yield:
//! - Aggregate the yield of every due deposit and re-baseline it
//! - Deduct the protocol fee and convert the rest in one swap
//! - Pro-rate the proceeds by each deposit's share of the batch yield
//! - Push claimable balances that reached their payout threshold
//!
//! # Critical Invariants
//!
//! 1. **All-or-nothing conversion**: a failed swap restores every record
//!    touched by the cycle
//! 2. **No over-distribution**: the sum of shares never exceeds proceeds
//!    plus carried dust; the remainder is carried to the next cycle
//! 3. **Exclusive cycle**: lifecycle operations are rejected while the
//!    scheduler is not idle

pub mod distribution;
pub mod scheduler;

pub use distribution::{minimum_output, prorate, Allocation};
pub use scheduler::{
    eligible_ids, CycleResources, SettledDeposit, UpkeepPhase, UpkeepReport, UpkeepScheduler,
};
