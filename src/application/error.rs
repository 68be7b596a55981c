use thiserror::Error;

use crate::domain::{AccountId, FavoriteId, Money, PaymentId, Phone};

/// Every way a wallet operation can fail.
/// A failed operation leaves the service state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Phone already registered: {0}")]
    PhoneAlreadyRegistered(Phone),

    #[error("Amount must be greater than zero, got {0}")]
    AmountMustBePositive(Money),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient balance on account {account_id}: balance {balance}, required {required}")]
    InsufficientBalance {
        account_id: AccountId,
        balance: Money,
        required: Money,
    },

    #[error("Balance of account {account_id} would overflow: balance {balance}, adding {amount}")]
    BalanceOverflow {
        account_id: AccountId,
        balance: Money,
        amount: Money,
    },

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("Payment already rejected: {0}")]
    PaymentAlreadyRejected(PaymentId),

    #[error("Could not repeat payment {payment_id}: {source}")]
    PaymentCreationFailed {
        payment_id: PaymentId,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("Favorite not found: {0}")]
    FavoriteNotFound(FavoriteId),
}
