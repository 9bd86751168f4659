//! Multi-threaded runs against a shared ledger.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use divvy_core::constants::UNIT;
use divvy_core::{Amount, LedgerEvent};
use divvy_tests::helpers::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const THREADS: u8 = 8;
const OPS_PER_THREAD: usize = 400;

#[test]
fn interleaved_mutations_keep_invariants() {
    let (ledger, payouts) = test_ledger();
    // Spread the supply so every worker has shares to move.
    for t in 1..=THREADS {
        ledger.transfer(&DEPLOYER, &acct(t), units(10)).unwrap();
    }

    let handles: Vec<_> = (1..=THREADS)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t as u64);
                let me = acct(t);
                // Settlements performed; each may forfeit a base unit of dust.
                let mut settled = 0u128;
                for _ in 0..OPS_PER_THREAD {
                    match rng.gen_range(0..4) {
                        0 => {
                            let amount = Amount::new(rng.gen_range(1..=10 * UNIT));
                            ledger.deposit(&me, amount).unwrap();
                        }
                        1 => {
                            let available = ledger.available_for_withdrawal(&me).unwrap();
                            // Another thread may deposit in between; withdrawing
                            // a stale figure must still succeed.
                            let _ = ledger.withdraw(&me, available).unwrap();
                            settled += 1;
                        }
                        2 => {
                            let to = acct(rng.gen_range(0..=THREADS));
                            let shares = Amount::new(rng.gen_range(0..=units(3).get()));
                            let _ = ledger.transfer(&me, &to, shares);
                            settled += if to == me { 1 } else { 2 };
                        }
                        _ => {
                            let _ = ledger.left_for_withdrawal(&me);
                            let _ = ledger.snapshot_total_earnings(&me);
                        }
                    }
                }
                settled
            })
        })
        .collect();

    let settlements: u128 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    ledger.check_invariants().unwrap();
    assert_eq!(ledger.total_supply(), units(100));

    let mut owed = payouts.total_paid();
    let mut holders = vec![DEPLOYER];
    holders.extend((0..=THREADS).map(acct));
    for holder in &holders {
        owed = owed
            .checked_add(ledger.available_for_withdrawal(holder).unwrap())
            .unwrap();
    }
    assert!(owed <= ledger.total_earnings());
    let shortfall = ledger.total_earnings().checked_sub(owed).unwrap().get();
    assert!(shortfall <= settlements + holders.len() as u128);
    assert_eq!(payouts.total_paid(), ledger.with_state(|s| s.total_withdrawn()));
}

#[test]
fn readers_never_see_partial_transfers() {
    let (ledger, _) = test_ledger();
    let (a, b) = (acct(1), acct(2));
    ledger.transfer(&DEPLOYER, &a, units(50)).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let ledger = Arc::clone(&ledger);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..2_000 {
                let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                ledger.transfer(&from, &to, units(50)).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let (ba, bb) = ledger.with_state(|s| (s.balance_of(&a), s.balance_of(&b)));
                    assert_eq!(ba.checked_add(bb), Some(units(50)));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn every_deposit_is_published_once() {
    let (ledger, _) = test_ledger();
    let mut rx = ledger.subscribe();

    let handles: Vec<_> = (1..=4u8)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..50 {
                    ledger.deposit(&acct(t), Amount::new(1)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = 0;
    while let Ok(event) = rx.try_recv() {
        assert!(matches!(event, LedgerEvent::Deposited { .. }));
        seen += 1;
    }
    assert_eq!(seen, 200);
    assert_eq!(ledger.total_earnings(), Amount::new(200));
}
