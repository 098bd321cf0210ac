//! Property-based tests for LedgerService.
//!
//! - Property 1: Balance conservation
//! - Property 2: Balances never go negative
//! - Property 3: Self-transfers always fail
//! - Property 4: Invalid amounts never reach the store

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::error::LedgerError;
use super::memory::MemoryLedger;
use super::service::LedgerService;
use super::types::Coins;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Strategy for starting balances (0 to 10,000 coins).
fn balance() -> impl Strategy<Value = Coins> {
    0i64..=10_000
}

/// Strategy for positive transfer amounts (1 to 12,000 coins).
fn positive_amount() -> impl Strategy<Value = Coins> {
    1i64..=12_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// **Property 1: Balance conservation**
    ///
    /// A successful transfer of `amount` debits the sender by exactly
    /// `amount` and keeps the pair's total unchanged.
    #[test]
    fn prop_transfer_conserves_balance(
        sender_balance in balance(),
        receiver_balance in balance(),
        amount in positive_amount(),
    ) {
        let ledger = MemoryLedger::new();
        let sender = ledger.open_account(sender_balance).unwrap();
        let receiver = ledger.open_account(receiver_balance).unwrap();
        let service = LedgerService::new(ledger.clone());

        let result = block_on(service.transfer_coins(
            &CancellationToken::new(),
            sender.id,
            receiver.id,
            amount,
        ));

        let sender_after = ledger.committed_balance(sender.id).unwrap();
        let receiver_after = ledger.committed_balance(receiver.id).unwrap();
        prop_assert_eq!(sender_after + receiver_after, sender_balance + receiver_balance);

        if amount <= sender_balance {
            prop_assert!(result.is_ok());
            prop_assert_eq!(sender_after, sender_balance - amount);
            prop_assert_eq!(ledger.transfers().len(), 1);
        } else {
            let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(sender_after, sender_balance);
            prop_assert!(ledger.transfers().is_empty());
        }
    }

    /// **Property 2: Balances never go negative**
    ///
    /// After any sequence of transfers and purchases, every balance is
    /// non-negative and the total equals the initial total minus what was
    /// spent on merch.
    #[test]
    fn prop_balances_never_negative(
        balances in prop::collection::vec(balance(), 2..5),
        ops in prop::collection::vec((0usize..5, 0usize..5, 1i64..3_000, any::<bool>()), 1..20),
    ) {
        let ledger = MemoryLedger::new();
        ledger.add_item("hoody", 300).unwrap();
        let accounts: Vec<_> = balances
            .iter()
            .map(|b| ledger.open_account(*b).unwrap())
            .collect();
        let initial: Coins = balances.iter().sum();
        let service = LedgerService::new(ledger.clone());
        let cancel = CancellationToken::new();

        block_on(async {
            for (from, to, amount, buy) in &ops {
                let from = accounts[from % accounts.len()].id;
                let to = accounts[to % accounts.len()].id;
                if *buy {
                    let _ = service.purchase_merch(&cancel, from, "hoody").await;
                } else {
                    let _ = service.transfer_coins(&cancel, from, to, *amount).await;
                }
            }
        });

        for account in &accounts {
            prop_assert!(ledger.committed_balance(account.id).unwrap() >= 0);
        }
        let spent = 300 * i64::try_from(ledger.purchases().len()).unwrap();
        prop_assert_eq!(ledger.total_balance(), initial - spent);
    }

    /// **Property 3: Self-transfers always fail**
    #[test]
    fn prop_self_transfer_rejected(
        start in balance(),
        amount in positive_amount(),
    ) {
        let ledger = MemoryLedger::new();
        let account = ledger.open_account(start).unwrap();
        let service = LedgerService::new(ledger.clone());

        let result = block_on(service.transfer_coins(
            &CancellationToken::new(),
            account.id,
            account.id,
            amount,
        ));

        prop_assert!(matches!(result, Err(LedgerError::SelfTransfer)));
        prop_assert_eq!(ledger.committed_balance(account.id), Some(start));
    }

    /// **Property 4: Invalid amounts never reach the store**
    #[test]
    fn prop_non_positive_amount_rejected(amount in i64::MIN..=0) {
        let ledger = MemoryLedger::new();
        let sender = ledger.open_account(1000).unwrap();
        let receiver = ledger.open_account(1000).unwrap();
        let service = LedgerService::new(ledger.clone());

        let result = block_on(service.transfer_coins(
            &CancellationToken::new(),
            sender.id,
            receiver.id,
            amount,
        ));

        let is_invalid = matches!(result, Err(LedgerError::InvalidAmount(a)) if a == amount);
        prop_assert!(is_invalid);
        prop_assert_eq!(ledger.stats().begins, 0);
    }
}
