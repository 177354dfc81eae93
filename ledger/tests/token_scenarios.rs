//! End-to-end scenarios against the shared ledger handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tinydex_common::{Address, LedgerError, TokenAmount};
use tinydex_ledger::{Event, Ledger, TOTAL_SUPPLY};

fn deployer() -> Address {
    Address::derive("deployer")
}

fn tdex(whole: u64) -> TokenAmount {
    TokenAmount::from_whole(whole)
}

#[test]
fn test_genesis_credits_deployer_only() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();

    assert_eq!(ledger.total_supply(), tdex(21_000_000));
    assert_eq!(ledger.balance_of(&deployer()), tdex(21_000_000));
    assert_eq!(ledger.balance_of(&Address::derive("alice")), TokenAmount::ZERO);
    assert_eq!(ledger.snapshot().balances.holders(), 1);
}

#[test]
fn test_transfer_moves_funds_and_emits_event() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let b = Address::derive("b");

    let receipt = ledger.transfer(deployer(), b, tdex(10)).unwrap();

    assert!(receipt.success);
    assert_eq!(ledger.balance_of(&deployer()), tdex(20_999_990));
    assert_eq!(ledger.balance_of(&b), tdex(10));
    assert_eq!(
        receipt.events,
        vec![Event::Transfer {
            from: deployer(),
            to: b,
            value: tdex(10),
        }]
    );
    assert_eq!(ledger.events_since(1)[0].event, receipt.events[0]);
}

#[test]
fn test_transfer_without_funds_is_rejected() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let broke = Address::derive("broke");
    let before = ledger.snapshot();

    let err = ledger.transfer(broke, deployer(), tdex(100)).unwrap_err();

    assert_eq!(
        err,
        LedgerError::InsufficientBalance {
            account: broke,
            required: tdex(100),
            available: TokenAmount::ZERO,
        }
    );
    assert_eq!(ledger.next_sequence(), 1);
    assert_eq!(ledger.snapshot().balances, before.balances);
}

#[test]
fn test_transfer_from_consumes_full_allowance() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let spender = Address::derive("spender");
    let receiver = Address::derive("receiver");

    ledger.approve(deployer(), spender, tdex(100)).unwrap();
    assert_eq!(ledger.allowance(&deployer(), &spender), tdex(100));

    let receipt = ledger
        .transfer_from(spender, deployer(), receiver, tdex(100))
        .unwrap();

    assert_eq!(ledger.balance_of(&receiver), tdex(100));
    assert_eq!(ledger.balance_of(&deployer()), tdex(20_999_900));
    assert_eq!(ledger.allowance(&deployer(), &spender), TokenAmount::ZERO);
    // Only the transfer; the allowance decrement is silent
    assert_eq!(receipt.events.len(), 1);
    assert_eq!(ledger.next_sequence(), 3);
}

#[test]
fn test_transfer_from_over_allowance_is_rejected() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let spender = Address::derive("spender");
    let receiver = Address::derive("receiver");
    ledger.approve(deployer(), spender, tdex(100)).unwrap();

    let err = ledger
        .transfer_from(spender, deployer(), receiver, tdex(101))
        .unwrap_err();

    assert_eq!(
        err,
        LedgerError::InsufficientAllowance {
            owner: deployer(),
            spender,
            required: tdex(101),
            available: tdex(100),
        }
    );
    assert_eq!(ledger.balance_of(&deployer()), TOTAL_SUPPLY);
    assert_eq!(ledger.balance_of(&receiver), TokenAmount::ZERO);
    assert_eq!(ledger.allowance(&deployer(), &spender), tdex(100));
}

#[test]
fn test_transfer_from_over_balance_is_rejected() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let holder = Address::derive("holder");
    let spender = Address::derive("spender");
    ledger.transfer(deployer(), holder, tdex(5)).unwrap();
    ledger.approve(holder, spender, tdex(50)).unwrap();

    let err = ledger
        .transfer_from(spender, holder, spender, tdex(6))
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    assert_eq!(ledger.balance_of(&holder), tdex(5));
    assert_eq!(ledger.allowance(&holder, &spender), tdex(50));
}

#[test]
fn test_transfer_to_null_address_is_rejected() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();

    let err = ledger
        .transfer(deployer(), Address::ZERO, tdex(1))
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_RECIPIENT");
    assert_eq!(ledger.balance_of(&deployer()), TOTAL_SUPPLY);
}

#[test]
fn test_transfer_from_back_to_owner() {
    let ledger = Ledger::with_deployer(deployer()).unwrap();
    let spender = Address::derive("spender");
    ledger.approve(deployer(), spender, tdex(10)).unwrap();

    let receipt = ledger
        .transfer_from(spender, deployer(), deployer(), tdex(4))
        .unwrap();

    assert_eq!(
        receipt.events,
        vec![Event::Transfer {
            from: deployer(),
            to: deployer(),
            value: tdex(4),
        }]
    );
    assert_eq!(ledger.balance_of(&deployer()), TOTAL_SUPPLY);
    assert_eq!(ledger.allowance(&deployer(), &spender), tdex(6));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submission_conserves_supply() {
    let ledger = Arc::new(Ledger::with_deployer(deployer()).unwrap());
    let accounts: Vec<Address> = (0..8).map(|i| Address::derive(&format!("acct-{i}"))).collect();

    for account in &accounts {
        ledger.transfer(deployer(), *account, tdex(1_000)).unwrap();
    }

    let mut handles = Vec::new();
    for (i, from) in accounts.iter().copied().enumerate() {
        let ledger = Arc::clone(&ledger);
        let to = accounts[(i + 1) % accounts.len()];
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                ledger.transfer(from, to, tdex(7)).unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Ring of equal transfers: every account ends where it started
    for account in &accounts {
        assert_eq!(ledger.balance_of(account), tdex(1_000));
    }
    assert!(ledger.verify_integrity().is_consistent());

    let sequences: Vec<u64> = ledger.events_since(0).iter().map(|r| r.sequence).collect();
    let expected: Vec<u64> = (0..ledger.next_sequence()).collect();
    assert_eq!(sequences, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_partial_updates() {
    let ledger = Arc::new(Ledger::with_deployer(deployer()).unwrap());
    let owners: Vec<Address> = (0..4).map(|i| Address::derive(&format!("owner-{i}"))).collect();
    let spenders: Vec<Address> = (0..4).map(|i| Address::derive(&format!("spender-{i}"))).collect();

    for owner in &owners {
        ledger.transfer(deployer(), *owner, tdex(500)).unwrap();
    }

    let done = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..2 {
        let ledger = Arc::clone(&ledger);
        let done = Arc::clone(&done);
        readers.push(tokio::spawn(async move {
            while !done.load(Ordering::Acquire) {
                assert!(ledger.verify_integrity().is_consistent());

                let snapshot = ledger.snapshot();
                assert_eq!(snapshot.balances.total(), Some(TOTAL_SUPPLY));
                for entry in &snapshot.allowances {
                    assert!(entry.amount <= tdex(3));
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    let mut writers = Vec::new();
    for i in 0..owners.len() {
        let ledger = Arc::clone(&ledger);
        let owner = owners[i];
        let spender = spenders[i];
        let recipient = owners[(i + 1) % owners.len()];
        writers.push(tokio::spawn(async move {
            for _ in 0..200 {
                ledger.approve(owner, spender, tdex(3)).unwrap();
                tokio::task::yield_now().await;
                ledger
                    .transfer_from(spender, owner, recipient, tdex(3))
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.await.unwrap();
    }

    for (owner, spender) in owners.iter().zip(&spenders) {
        assert_eq!(ledger.balance_of(owner), tdex(500));
        assert_eq!(ledger.allowance(owner, spender), TokenAmount::ZERO);
    }
    assert!(ledger.verify_integrity().is_consistent());
}
