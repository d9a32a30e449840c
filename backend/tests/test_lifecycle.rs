//! Lifecycle Tests - deposits through the YieldSplitter facade
//!
//! Critical invariants tested:
//! - Asset movement matches the bookkeeping (principal in, yield to recipient)
//! - Failed transfers leave the record exactly as it was
//! - Close removes the record from every index and pays everything owed

mod common;

use common::{Harness, CUSTODY, INDEX_1_1};
use yield_splitter_core_rs::core::UNIT;
use yield_splitter_core_rs::interfaces::LedgerAsset;
use yield_splitter_core_rs::ledger::{LedgerError, OpenRequest, Operation};
use yield_splitter_core_rs::models::{Event, LedgerConfig};

// ============================================================================
// Open / Top-up
// ============================================================================

#[test]
fn test_open_pulls_principal_into_custody() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 1_000 * UNIT);

    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();

    assert_eq!(id, 1);
    assert_eq!(h.steth.balance_of("alice"), 0);
    assert_eq!(h.steth.balance_of(CUSTODY), 1_000 * UNIT);
    assert_eq!(h.ledger.deposits_by_depositor("alice"), &[1]);
    assert_eq!(h.ledger.deposits_by_recipient("bob"), &[1]);
    assert_eq!(h.ledger.active_deposits(), &[1]);
    assert_eq!(h.ledger.total_principal(), 1_000 * UNIT);

    let record = h.ledger.deposit(id).unwrap();
    assert_eq!(record.settlement_interval(), h.ledger.config().default_settlement_interval);
    assert_eq!(h.ledger.event_log().events_of_type("DepositOpened").len(), 1);
}

#[test]
fn test_open_with_explicit_terms() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 10 * UNIT);

    let request = OpenRequest::new("alice", "alice", 10 * UNIT, 3_600).with_payout_threshold(5);
    let id = h.ledger.open_with(&request, 100).unwrap();

    let record = h.ledger.deposit(id).unwrap();
    assert!(record.is_self_directed());
    assert_eq!(record.settlement_interval(), 3_600);
    assert_eq!(record.minimum_payout_threshold(), 5);
    assert_eq!(record.last_settled(), 100);
}

#[test]
fn test_ids_are_never_reused() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 30 * UNIT);

    let first = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();
    h.ledger.close("alice", first, 1).unwrap();
    let second = h.ledger.open("alice", "bob", 10 * UNIT, 2).unwrap();

    assert_ne!(first, second);
    assert_eq!(second, 2);
}

#[test]
fn test_top_up_at_higher_index_keeps_accrued_yield() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 2_000 * UNIT);
    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();

    h.rebase_to(INDEX_1_1);
    h.ledger.top_up("alice", id, 550 * UNIT, 1).unwrap();

    assert_eq!(h.ledger.deposit(id).unwrap().principal(), 1_550 * UNIT);
    assert_eq!(h.ledger.outstanding_yield(id).unwrap(), 100 * UNIT);
}

#[test]
fn test_top_up_by_recipient_is_unauthorized() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 10 * UNIT);
    h.fund("bob", 10 * UNIT);
    let id = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();

    let result = h.ledger.top_up("bob", id, UNIT, 1);
    assert!(matches!(
        result,
        Err(LedgerError::Unauthorized { op: Operation::TopUp, id: Some(1), .. })
    ));
    assert_eq!(h.steth.balance_of("bob"), 10 * UNIT);
}

#[test]
fn test_top_up_without_funds_restores_record() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 10 * UNIT);
    let id = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();
    let before = h.ledger.deposit(id).cloned();

    let result = h.ledger.top_up("alice", id, UNIT, 1);
    assert!(matches!(result, Err(LedgerError::TransferFailed { op: Operation::TopUp, .. })));
    assert_eq!(h.ledger.deposit(id).cloned(), before);
}

// ============================================================================
// Withdrawals
// ============================================================================

#[test]
fn test_partial_withdraw_returns_principal() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 100 * UNIT);
    let id = h.ledger.open("alice", "bob", 100 * UNIT, 0).unwrap();

    let remaining = h.ledger.partial_withdraw("alice", id, 40 * UNIT, 1).unwrap();

    assert_eq!(remaining, 60 * UNIT);
    assert_eq!(h.steth.balance_of("alice"), 40 * UNIT);
    assert_eq!(h.ledger.outstanding_yield(id).unwrap(), 0);
}

#[test]
fn test_partial_withdraw_of_full_principal_points_to_close() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 100 * UNIT);
    let id = h.ledger.open("alice", "bob", 100 * UNIT, 0).unwrap();

    let err = h.ledger.partial_withdraw("alice", id, 100 * UNIT, 1).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount { op: Operation::PartialWithdraw, .. }));
    assert!(err.to_string().contains("close"));
}

#[test]
fn test_failed_withdraw_transfer_restores_record() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 100 * UNIT);
    let id = h.ledger.open("alice", "bob", 100 * UNIT, 0).unwrap();
    h.steth.block_account("alice");

    let result = h.ledger.partial_withdraw("alice", id, 10 * UNIT, 1);
    assert!(matches!(result, Err(LedgerError::TransferFailed { .. })));
    assert_eq!(h.ledger.deposit(id).unwrap().principal(), 100 * UNIT);
    assert_eq!(h.ledger.event_log().events_of_type("PrincipalWithdrawn").len(), 0);
}

#[test]
fn test_extract_yield_pays_recipient() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 1_000 * UNIT);
    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();
    h.rebase_to(INDEX_1_1);

    // Depositor asks, recipient is paid
    let paid = h.ledger.extract_yield("alice", id, 1).unwrap();

    assert_eq!(paid, 100 * UNIT);
    assert_eq!(h.steth.balance_of("bob"), 100 * UNIT);
    assert_eq!(h.steth.balance_of("alice"), 0);
    assert_eq!(h.ledger.outstanding_yield(id).unwrap(), 0);
    assert_eq!(h.ledger.position_value(id).unwrap(), 1_000 * UNIT);
}

#[test]
fn test_repeated_extraction_stays_backed_by_custody() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 3);
    let id = h.ledger.open("alice", "bob", 3, 0).unwrap();

    // 3 units grow to 4.5 and then 6.0; each extraction pays only whole
    // units of growth the custody balance actually holds
    h.rebase_to(UNIT + UNIT / 2);
    assert_eq!(h.ledger.extract_yield("bob", id, 1), Ok(1));
    h.rebase_to(2 * UNIT);
    assert_eq!(h.ledger.extract_yield("bob", id, 2), Ok(1));
    assert!(h.ledger.position_value(id).unwrap() <= h.steth.balance_of(CUSTODY));

    let closed = h.ledger.close("alice", id, 3).unwrap();
    assert_eq!(closed.total_value, 3);
    assert_eq!(h.steth.balance_of("bob"), 2);
    assert_eq!(h.steth.balance_of("alice"), 3);
    assert_eq!(h.steth.balance_of(CUSTODY), 0);
}

#[test]
fn test_extract_yield_by_stranger_is_unauthorized() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 10 * UNIT);
    let id = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();

    assert!(matches!(
        h.ledger.extract_yield("mallory", id, 1),
        Err(LedgerError::Unauthorized { .. })
    ));
}

// ============================================================================
// Close
// ============================================================================

#[test]
fn test_close_pays_total_value_and_unlinks() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 1_000 * UNIT);
    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();
    h.rebase_to(INDEX_1_1);

    let closed = h.ledger.close("alice", id, 1).unwrap();

    assert_eq!(closed.principal, 1_000 * UNIT);
    assert_eq!(closed.total_value, 1_100 * UNIT);
    assert_eq!(h.steth.balance_of("alice"), 1_100 * UNIT);
    assert!(h.ledger.deposit(id).is_none());
    assert!(h.ledger.active_deposits().is_empty());
    assert!(h.ledger.deposits_by_depositor("alice").is_empty());
    assert!(h.ledger.deposits_by_recipient("bob").is_empty());
    assert_eq!(
        h.ledger.outstanding_yield(id),
        Err(LedgerError::NotFound { op: Operation::Query, id })
    );
}

#[test]
fn test_close_swap_remove_keeps_other_indices() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 30 * UNIT);
    let a = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();
    let b = h.ledger.open("alice", "carol", 10 * UNIT, 0).unwrap();
    let c = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();

    h.ledger.close("alice", a, 1).unwrap();

    assert_eq!(h.ledger.active_deposits().len(), 2);
    assert!(h.ledger.active_deposits().contains(&b));
    assert!(h.ledger.active_deposits().contains(&c));
    assert_eq!(h.ledger.deposits_by_recipient("bob"), &[c]);
    assert_eq!(h.ledger.deposits_by_depositor("alice").len(), 2);
    h.ledger.registry().check_consistency().unwrap();
}

#[test]
fn test_close_pays_unclaimed_settlement_to_recipient() {
    let mut config = LedgerConfig::default();
    config.default_settlement_interval = 0;
    let mut h = Harness::new(config);
    h.fund("alice", 1_000 * UNIT);
    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();
    h.ledger.set_payout_threshold("bob", id, 2_000 * UNIT, 0).unwrap();
    h.rebase_to(2 * UNIT);
    h.ledger.run_upkeep(1).unwrap();
    assert_eq!(h.ledger.deposit(id).unwrap().claimable_settlement_asset(), 1_000 * UNIT);
    // Held by the threshold, so nothing reached bob yet
    assert_eq!(h.usdc.balance_of("bob"), 0);

    let closed = h.ledger.close("alice", id, 2).unwrap();

    assert_eq!(closed.claimable_settlement_asset, 1_000 * UNIT);
    assert_eq!(closed.total_value, 1_000 * UNIT);
    assert_eq!(h.usdc.balance_of("bob"), 1_000 * UNIT);
    assert_eq!(h.steth.balance_of("alice"), 1_000 * UNIT);
    match h.ledger.event_log().events_of_type("DepositClosed")[0] {
        Event::DepositClosed { settlement_paid, .. } => assert_eq!(*settlement_paid, 1_000 * UNIT),
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_close_with_failed_settlement_transfer_reinstates() {
    let mut config = LedgerConfig::default();
    config.default_settlement_interval = 0;
    let mut h = Harness::new(config);
    h.fund("alice", 100 * UNIT);
    let id = h.ledger.open("alice", "bob", 100 * UNIT, 0).unwrap();
    h.ledger.set_payout_threshold("alice", id, 1_000 * UNIT, 0).unwrap();
    h.rebase_to(2 * UNIT);
    h.ledger.run_upkeep(1).unwrap();
    let before = h.ledger.deposit(id).cloned();
    h.usdc.block_account("bob");

    let result = h.ledger.close("alice", id, 2);

    assert!(matches!(result, Err(LedgerError::TransferFailed { op: Operation::Close, .. })));
    assert_eq!(h.ledger.deposit(id).cloned(), before);
    assert_eq!(h.ledger.deposits_by_recipient("bob"), &[id]);
    assert_eq!(h.steth.balance_of("alice"), 0);
}

#[test]
fn test_close_with_failed_principal_transfer_keeps_paid_settlement() {
    let mut config = LedgerConfig::default();
    config.default_settlement_interval = 0;
    let mut h = Harness::new(config);
    h.fund("alice", 100 * UNIT);
    let id = h.ledger.open("alice", "bob", 100 * UNIT, 0).unwrap();
    h.ledger.set_payout_threshold("alice", id, 1_000 * UNIT, 0).unwrap();
    h.rebase_to(2 * UNIT);
    h.ledger.run_upkeep(1).unwrap();
    h.steth.block_account("alice");

    let result = h.ledger.close("alice", id, 2);

    assert!(result.is_err());
    let record = h.ledger.deposit(id).unwrap();
    assert_eq!(record.claimable_settlement_asset(), 0);
    assert_eq!(record.principal(), 100 * UNIT);
    assert_eq!(h.usdc.balance_of("bob"), 100 * UNIT);
}

// ============================================================================
// Record terms
// ============================================================================

#[test]
fn test_change_recipient_redirects_future_yield() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 1_000 * UNIT);
    let id = h.ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();

    h.ledger.change_recipient("alice", id, "carol", 1).unwrap();
    h.rebase_to(INDEX_1_1);
    h.ledger.extract_yield("carol", id, 2).unwrap();

    assert_eq!(h.steth.balance_of("carol"), 100 * UNIT);
    assert_eq!(h.steth.balance_of("bob"), 0);
    assert!(h.ledger.deposits_by_recipient("bob").is_empty());
    assert_eq!(h.ledger.deposits_by_recipient("carol"), &[id]);
    assert!(matches!(
        h.ledger.change_recipient("carol", id, "dave", 3),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(matches!(
        h.ledger.change_recipient("alice", id, "", 3),
        Err(LedgerError::InvalidRecipient { .. })
    ));
}

#[test]
fn test_payout_threshold_clamped_to_floor() {
    let mut h = Harness::with_defaults();
    h.fund("alice", 10 * UNIT);
    let id = h.ledger.open("alice", "bob", 10 * UNIT, 0).unwrap();
    h.ledger
        .set_min_payout_threshold_floor(common::ADMIN, 50, 1)
        .unwrap();

    assert_eq!(h.ledger.set_payout_threshold("bob", id, 10, 2), Ok(50));
    assert_eq!(h.ledger.set_payout_threshold("alice", id, 70, 2), Ok(70));
}

#[test]
fn test_unknown_deposit() {
    let mut h = Harness::with_defaults();
    assert_eq!(
        h.ledger.extract_yield("alice", 42, 0),
        Err(LedgerError::NotFound { op: Operation::ExtractYield, id: 42 })
    );
    assert_eq!(
        h.ledger.set_settlement_interval("alice", 42, 5, 0),
        Err(LedgerError::NotFound { op: Operation::SetSettlementInterval, id: 42 })
    );
}
