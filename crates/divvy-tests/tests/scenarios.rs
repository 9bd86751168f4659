//! Literal accounting scenarios.
//!
//! Each test replays a fixed sequence of deposits, withdrawals and
//! transfers and checks exact base-unit results.

use std::sync::Arc;

use divvy_core::error::LedgerError;
use divvy_core::{Amount, DivvyError, LedgerEvent};
use divvy_ledger::{Ledger, PayoutLog};
use divvy_node::{Node, NodeConfig};
use divvy_tests::helpers::*;

/// Scenario 1: the sole holder is entitled to the whole first deposit.
fn after_first_deposit() -> (Arc<Ledger>, Arc<PayoutLog>) {
    let (ledger, payouts) = test_ledger();
    ledger.deposit(&acct(0xEE), amt("1.0")).unwrap();
    (ledger, payouts)
}

// --- single holder ---

#[test]
fn scenario_1_deposit() {
    let (ledger, _) = after_first_deposit();
    assert_eq!(ledger.available_for_withdrawal(&DEPLOYER).unwrap(), amt("1"));
    assert_eq!(ledger.total_earnings(), amt("1"));
}

#[test]
fn scenario_2_partial_withdraw() {
    let (ledger, payouts) = after_first_deposit();
    ledger.withdraw(&DEPLOYER, amt("0.2")).unwrap();
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("0.8"));
    assert_eq!(ledger.available_for_withdrawal(&DEPLOYER).unwrap(), amt("0.8"));
    assert_eq!(payouts.paid_to(&DEPLOYER), amt("0.2"));
}

#[test]
fn scenario_3_stale_left_fresh_available() {
    let (ledger, _) = after_first_deposit();
    ledger.withdraw(&DEPLOYER, amt("0.2")).unwrap();
    ledger.deposit(&acct(0xEE), amt("1.0")).unwrap();

    assert_eq!(ledger.total_earnings(), amt("2"));
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("0.8"));
    assert_eq!(ledger.available_for_withdrawal(&DEPLOYER).unwrap(), amt("1.8"));
}

#[test]
fn scenario_4_withdraw_remaining() {
    let (ledger, payouts) = after_first_deposit();
    ledger.withdraw(&DEPLOYER, amt("0.2")).unwrap();
    ledger.deposit(&acct(0xEE), amt("1.0")).unwrap();
    ledger.withdraw(&DEPLOYER, amt("1.8")).unwrap();

    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), Amount::ZERO);
    assert_eq!(ledger.available_for_withdrawal(&DEPLOYER).unwrap(), Amount::ZERO);
    assert_eq!(ledger.snapshot_total_earnings(&DEPLOYER), amt("2"));
    assert_eq!(payouts.total_paid(), amt("2"));
    assert_eq!(ledger.pool_balance(), Amount::ZERO);
}

#[test]
fn scenario_5_over_withdraw_advances_checkpoint() {
    let (ledger, payouts) = after_first_deposit();
    let err = ledger.withdraw(&DEPLOYER, amt("1.000000000000000001")).unwrap_err();

    assert_eq!(
        err.as_ledger(),
        Some(&LedgerError::InsufficientEntitlement {
            requested: amt("1.000000000000000001"),
            available: amt("1"),
        })
    );
    assert_eq!(ledger.snapshot_total_earnings(&DEPLOYER), ledger.total_earnings());
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("1"));
    assert_eq!(payouts.total_paid(), Amount::ZERO);
}

#[test]
fn withdrawing_unusual_precision() {
    let (ledger, _) = test_ledger();
    ledger.deposit(&acct(0xEE), amt("5")).unwrap();
    ledger.withdraw(&DEPLOYER, amt("3.000010000001")).unwrap();
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("1.999989999999"));
}

// --- two holders ---

#[test]
fn two_holders_split_after_transfer() {
    let user = acct(1);
    let (ledger, payouts) = after_first_deposit();
    ledger.transfer(&DEPLOYER, &user, units(10)).unwrap();
    ledger.deposit(&acct(0xEE), amt("1.0")).unwrap();

    ledger.withdraw(&DEPLOYER, amt("1.9")).unwrap();
    ledger.withdraw(&user, amt("0.1")).unwrap();

    for account in [DEPLOYER, user] {
        assert_eq!(ledger.snapshot_total_earnings(&account), amt("2"));
        assert_eq!(ledger.left_for_withdrawal(&account), Amount::ZERO);
        assert_eq!(ledger.available_for_withdrawal(&account).unwrap(), Amount::ZERO);
    }
    assert_eq!(payouts.paid_to(&DEPLOYER), amt("1.9"));
    assert_eq!(payouts.paid_to(&user), amt("0.1"));
}

#[test]
fn transfer_checkpoints_both_parties() {
    let user = acct(1);
    let (ledger, _) = after_first_deposit();
    ledger.transfer(&DEPLOYER, &user, units(10)).unwrap();

    assert_eq!(ledger.snapshot_total_earnings(&DEPLOYER), amt("1"));
    assert_eq!(ledger.snapshot_total_earnings(&user), amt("1"));
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("1"));
    assert_eq!(ledger.left_for_withdrawal(&user), Amount::ZERO);
}

#[test]
fn full_transfer_stops_accrual() {
    let user = acct(1);
    let (ledger, _) = after_first_deposit();
    let before = ledger.available_for_withdrawal(&DEPLOYER).unwrap();
    ledger.transfer(&DEPLOYER, &user, units(100)).unwrap();
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), before);

    ledger.deposit(&acct(0xEE), amt("7")).unwrap();
    assert_eq!(ledger.available_for_withdrawal(&DEPLOYER).unwrap(), before);
    assert_eq!(ledger.available_for_withdrawal(&user).unwrap(), amt("7"));
}

#[test]
fn transfer_to_holder_with_unsettled_accrual() {
    let (a, b) = (acct(1), acct(2));
    let (ledger, _) = test_ledger();
    ledger.transfer(&DEPLOYER, &a, units(50)).unwrap();
    ledger.transfer(&DEPLOYER, &b, units(50)).unwrap();
    ledger.deposit(&acct(0xEE), amt("2")).unwrap();

    // b has 1.0 accrued but unsettled when a sends it more shares.
    ledger.transfer(&a, &b, units(25)).unwrap();
    assert_eq!(ledger.left_for_withdrawal(&b), amt("1"));
    assert_eq!(ledger.left_for_withdrawal(&a), amt("1"));

    ledger.deposit(&acct(0xEE), amt("4")).unwrap();
    assert_eq!(ledger.available_for_withdrawal(&a).unwrap(), amt("2"));
    assert_eq!(ledger.available_for_withdrawal(&b).unwrap(), amt("4"));
    ledger.check_invariants().unwrap();
}

#[test]
fn overdrawn_transfer_fails_with_values() {
    let (ledger, _) = test_ledger();
    let err = ledger.transfer(&acct(1), &DEPLOYER, units(1)).unwrap_err();
    match err {
        DivvyError::Ledger(LedgerError::InsufficientBalance { requested, balance }) => {
            assert_eq!(requested, units(1));
            assert_eq!(balance, Amount::ZERO);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ledger.balance_of(&DEPLOYER), units(100));
}

// --- dust ---

#[test]
fn dust_is_forfeited() {
    let (a, b, c) = (acct(1), acct(2), acct(3));
    let (ledger, _) = test_ledger_with_supply(Amount::new(3));
    for holder in [a, b, c] {
        ledger.transfer(&DEPLOYER, &holder, Amount::new(1)).unwrap();
    }
    ledger.deposit(&acct(0xEE), Amount::new(10)).unwrap();

    let mut owed = Amount::ZERO;
    for holder in [a, b, c] {
        let available = ledger.available_for_withdrawal(&holder).unwrap();
        assert_eq!(available, Amount::new(3));
        owed = owed.checked_add(available).unwrap();
    }
    // One base unit stays in the pool for good.
    assert_eq!(owed, Amount::new(9));
    for holder in [a, b, c] {
        ledger.withdraw(&holder, Amount::new(3)).unwrap();
    }
    assert_eq!(ledger.pool_balance(), Amount::new(1));
    assert_eq!(ledger.available_for_withdrawal(&a).unwrap(), Amount::ZERO);
}

// --- events ---

#[test]
fn events_are_published_in_order() {
    let user = acct(1);
    let (ledger, _) = test_ledger();
    let mut rx = ledger.subscribe();

    ledger.deposit(&acct(0xEE), amt("1")).unwrap();
    ledger.transfer(&DEPLOYER, &user, units(10)).unwrap();
    ledger.withdraw(&DEPLOYER, amt("0.5")).unwrap();
    let _ = ledger.withdraw(&user, amt("5"));

    assert_eq!(
        rx.try_recv().unwrap(),
        LedgerEvent::Deposited { depositor: acct(0xEE), amount: amt("1") }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        LedgerEvent::Transfer { from: DEPLOYER, to: user, amount: units(10) }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        LedgerEvent::Withdrawn { account: DEPLOYER, amount: amt("0.5") }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn events_reach_async_subscribers() {
    let (ledger, _) = test_ledger();
    let mut rx = ledger.subscribe();
    let writer = Arc::clone(&ledger);
    tokio::task::spawn_blocking(move || writer.deposit(&acct(0xEE), amt("3")).unwrap())
        .await
        .unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.to_string(), format!("Deposited({}, 3)", acct(0xEE)));
}

// --- persistence ---

#[test]
fn scenarios_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        deployer: DEPLOYER,
        ..NodeConfig::default()
    };
    {
        let node = Node::open(config.clone(), Arc::new(PayoutLog::new())).unwrap();
        let ledger = node.ledger();
        ledger.deposit(&acct(0xEE), amt("1")).unwrap();
        ledger.withdraw(&DEPLOYER, amt("0.2")).unwrap();
        ledger.deposit(&acct(0xEE), amt("1")).unwrap();
        assert!(ledger.withdraw(&DEPLOYER, amt("5")).is_err());
        node.shutdown().unwrap();
    }

    let node = Node::open(config, Arc::new(PayoutLog::new())).unwrap();
    let ledger = node.ledger();
    // The refused withdrawal's settlement was persisted.
    assert_eq!(ledger.left_for_withdrawal(&DEPLOYER), amt("1.8"));
    assert_eq!(ledger.snapshot_total_earnings(&DEPLOYER), amt("2"));
    assert_eq!(ledger.pool_balance(), amt("1.8"));
    ledger.check_invariants().unwrap();
}
