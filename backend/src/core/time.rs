//! Time handling for settlement eligibility
//!
//! The ledger has no ambient clock. Every timestamped operation receives
//! `now` from its caller, the way a tick is threaded through settlement.

/// Seconds since an arbitrary epoch chosen by the host
pub type Timestamp = u64;

/// Seconds elapsed from `since` to `now`, zero if `now` is earlier
///
/// # Example
/// ```
/// use yield_splitter_core_rs::core::elapsed_since;
///
/// assert_eq!(elapsed_since(100, 160), 60);
/// assert_eq!(elapsed_since(160, 100), 0);
/// ```
pub fn elapsed_since(since: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(since)
}

/// Whether a position settled at `last_settled` is due at `now`
///
/// A position is due once the elapsed time meets or exceeds its interval.
///
/// # Example
/// ```
/// use yield_splitter_core_rs::core::is_due;
///
/// assert!(!is_due(1_000, 3_600, 4_599));
/// assert!(is_due(1_000, 3_600, 4_600));
/// ```
pub fn is_due(last_settled: Timestamp, interval: u64, now: Timestamp) -> bool {
    elapsed_since(last_settled, now) >= interval
}
