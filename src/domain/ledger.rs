use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Favorite, FavoriteId, Money, Payment, PaymentId};

/// Everything a wallet service holds, in insertion order.
/// This is what storage loads and saves, and what snapshots carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Last allocated account ID (0 when no account was ever registered)
    pub next_account_id: AccountId,
    pub accounts: Vec<Account>,
    pub payments: Vec<Payment>,
    pub favorites: Vec<Favorite>,
}

impl LedgerState {
    /// Sum of all account balances, or `None` if it does not fit in `Money`.
    pub fn total_balance(&self) -> Option<Money> {
        self.accounts
            .iter()
            .try_fold(0 as Money, |total, account| total.checked_add(account.balance))
    }

    /// Inspect the state for broken invariants.
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut issues = Vec::new();

        let mut ids: HashSet<AccountId> = HashSet::new();
        let mut phones: HashSet<&str> = HashSet::new();
        for account in &self.accounts {
            if !ids.insert(account.id) {
                issues.push(IntegrityIssue::DuplicateAccountId(account.id));
            }
            if !phones.insert(account.phone.as_str()) {
                issues.push(IntegrityIssue::DuplicatePhone(account.phone.clone()));
            }
            if account.balance < 0 {
                issues.push(IntegrityIssue::NegativeBalance {
                    account_id: account.id,
                    balance: account.balance,
                });
            }
            if account.id <= 0 || account.id > self.next_account_id {
                issues.push(IntegrityIssue::AccountIdOutOfRange {
                    account_id: account.id,
                    next_account_id: self.next_account_id,
                });
            }
        }

        let mut payment_ids: HashSet<PaymentId> = HashSet::new();
        for payment in &self.payments {
            if !payment_ids.insert(payment.id) {
                issues.push(IntegrityIssue::DuplicatePaymentId(payment.id));
            }
            if payment.amount <= 0 {
                issues.push(IntegrityIssue::NonPositivePayment(payment.id));
            }
            if !ids.contains(&payment.account_id) {
                issues.push(IntegrityIssue::DanglingPayment {
                    payment_id: payment.id,
                    account_id: payment.account_id,
                });
            }
        }

        let mut favorite_ids: HashSet<FavoriteId> = HashSet::new();
        for favorite in &self.favorites {
            if !favorite_ids.insert(favorite.id) {
                issues.push(IntegrityIssue::DuplicateFavoriteId(favorite.id));
            }
            if favorite.amount <= 0 {
                issues.push(IntegrityIssue::NonPositiveFavorite(favorite.id));
            }
            if !ids.contains(&favorite.account_id) {
                issues.push(IntegrityIssue::DanglingFavorite {
                    favorite_id: favorite.id,
                    account_id: favorite.account_id,
                });
            }
        }

        let total_balance = self.total_balance();
        if total_balance.is_none() {
            issues.push(IntegrityIssue::TotalBalanceOverflow);
        }

        IntegrityReport {
            account_count: self.accounts.len(),
            payment_count: self.payments.len(),
            rejected_count: self.payments.iter().filter(|p| p.is_rejected()).count(),
            favorite_count: self.favorites.len(),
            total_balance,
            issues,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub account_count: usize,
    pub payment_count: usize,
    pub rejected_count: usize,
    pub favorite_count: usize,
    /// `None` when the balances do not add up within `Money`
    pub total_balance: Option<Money>,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DuplicateAccountId(AccountId),
    DuplicatePhone(String),
    NegativeBalance {
        account_id: AccountId,
        balance: Money,
    },
    AccountIdOutOfRange {
        account_id: AccountId,
        next_account_id: AccountId,
    },
    DuplicatePaymentId(PaymentId),
    NonPositivePayment(PaymentId),
    DanglingPayment {
        payment_id: PaymentId,
        account_id: AccountId,
    },
    DuplicateFavoriteId(FavoriteId),
    NonPositiveFavorite(FavoriteId),
    DanglingFavorite {
        favorite_id: FavoriteId,
        account_id: AccountId,
    },
    TotalBalanceOverflow,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateAccountId(id) => write!(f, "account ID {} is used twice", id),
            IntegrityIssue::DuplicatePhone(phone) => {
                write!(f, "phone {} is registered to more than one account", phone)
            }
            IntegrityIssue::NegativeBalance {
                account_id,
                balance,
            } => write!(f, "account {} has negative balance {}", account_id, balance),
            IntegrityIssue::AccountIdOutOfRange {
                account_id,
                next_account_id,
            } => write!(
                f,
                "account ID {} is outside the allocated range 1..={}",
                account_id, next_account_id
            ),
            IntegrityIssue::DuplicatePaymentId(id) => write!(f, "payment ID {} is used twice", id),
            IntegrityIssue::NonPositivePayment(id) => {
                write!(f, "payment {} has a non-positive amount", id)
            }
            IntegrityIssue::DanglingPayment {
                payment_id,
                account_id,
            } => write!(
                f,
                "payment {} references missing account {}",
                payment_id, account_id
            ),
            IntegrityIssue::DuplicateFavoriteId(id) => {
                write!(f, "favorite ID {} is used twice", id)
            }
            IntegrityIssue::NonPositiveFavorite(id) => {
                write!(f, "favorite {} has a non-positive amount", id)
            }
            IntegrityIssue::DanglingFavorite {
                favorite_id,
                account_id,
            } => write!(
                f,
                "favorite {} references missing account {}",
                favorite_id, account_id
            ),
            IntegrityIssue::TotalBalanceOverflow => {
                write!(f, "sum of account balances does not fit in 64 bits")
            }
        }
    }
}
