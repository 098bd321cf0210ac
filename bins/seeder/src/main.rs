//! Demo data seeder for the merch ledger.
//!
//! Opens a handful of employee accounts with the configured starting
//! balance and runs a few transfers and purchases through the ledger so that
//! account summaries have something to show. Expects the schema to be
//! migrated.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use merchledger_core::ledger::{Account, LedgerService, RetryPolicy};
use merchledger_db::{AccountRepository, PgCoordinator};
use merchledger_shared::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Number of demo accounts.
const DEMO_ACCOUNTS: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merchledger=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = merchledger_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let accounts = AccountRepository::new(db.clone());
    if accounts.count().await? > 0 {
        info!("Accounts already exist, skipping");
        return Ok(());
    }

    info!(count = DEMO_ACCOUNTS, "Opening demo accounts");
    let mut opened: Vec<Account> = Vec::with_capacity(DEMO_ACCOUNTS);
    for _ in 0..DEMO_ACCOUNTS {
        let account = accounts.open(config.ledger.starting_balance).await?;
        info!(account_id = %account.id, balance = account.balance, "Account opened");
        opened.push(account);
    }

    let service = LedgerService::new(PgCoordinator::new(db))
        .with_retry_policy(RetryPolicy::from_config(&config.ledger));
    let cancel = CancellationToken::new();

    info!("Recording demo history");
    let (alice, bob, carol) = (opened[0].id, opened[1].id, opened[2].id);
    service.transfer_coins(&cancel, alice, bob, 100).await?;
    service.transfer_coins(&cancel, bob, carol, 30).await?;
    service.purchase_merch(&cancel, alice, "t-shirt").await?;
    service.purchase_merch(&cancel, carol, "cup").await?;
    service.purchase_merch(&cancel, carol, "cup").await?;

    for account in &opened {
        let summary = service.account_summary(&cancel, account.id).await?;
        info!(
            account_id = %summary.account_id,
            balance = summary.balance,
            items = summary.inventory.len(),
            "Seeded account"
        );
    }

    info!("Seeding complete");
    Ok(())
}
