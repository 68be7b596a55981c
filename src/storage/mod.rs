mod repository;

use std::future::Future;

use anyhow::Result;

use crate::application::{LedgerError, WalletService};
use crate::domain::LedgerState;

pub use repository::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Load/save hooks a wallet service is initialized from and checkpointed to.
pub trait LedgerStore {
    fn load(&self) -> impl Future<Output = Result<LedgerState>> + Send;

    fn save(&self, state: &LedgerState) -> impl Future<Output = Result<()>> + Send;
}

/// Load the stored state, run one operation against it, and save the result.
/// Nothing is written when the operation fails.
pub async fn with_service<S, T, F>(store: &S, op: F) -> Result<T>
where
    S: LedgerStore,
    F: FnOnce(&mut WalletService) -> Result<T, LedgerError>,
{
    let mut service = WalletService::from_state(store.load().await?);
    let output = op(&mut service)?;
    store.save(&service.into_state()).await?;
    Ok(output)
}
