// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use purse::application::WalletService;
use purse::domain::{Account, Money, Payment};
use purse::storage::Repository;
use tempfile::TempDir;

pub const DEFAULT_PHONE: &str = "+992900801441";

/// Helper to create a repository backed by a temporary database
pub async fn test_repository() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let url = Repository::sqlite_url(db_path.to_str().unwrap(), true);
    let repo = Repository::init(&url).await?;
    Ok((repo, temp_dir))
}

/// Test fixture: an account with an opening balance and some payments
pub struct TestAccount {
    pub phone: &'static str,
    pub balance: Money,
    pub payments: Vec<(Money, &'static str)>,
}

impl TestAccount {
    /// 10.00 deposited, one 1.00 payment for "fun"
    pub fn standard() -> Self {
        Self {
            phone: DEFAULT_PHONE,
            balance: 1000,
            payments: vec![(100, "fun")],
        }
    }

    /// Register, deposit and make the payments.
    /// Returns the account as it stands afterwards.
    pub fn create(&self, service: &mut WalletService) -> Result<(Account, Vec<Payment>)> {
        let account = add_account_with_balance(service, self.phone, self.balance)?;

        let payments = self
            .payments
            .iter()
            .map(|(amount, category)| service.pay(account.id, *amount, *category))
            .collect::<Result<Vec<_>, _>>()?;

        let account = service.find_account_by_id(account.id)?.clone();
        Ok((account, payments))
    }
}

/// Register an account and deposit an opening balance into it
pub fn add_account_with_balance(
    service: &mut WalletService,
    phone: &str,
    balance: Money,
) -> Result<Account> {
    let account = service.register_account(phone)?;
    service.deposit(account.id, balance)?;
    Ok(service.find_account_by_id(account.id)?.clone())
}
