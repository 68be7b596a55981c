use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Money};

pub type PaymentId = Uuid;

/// Free-form label such as "fun" or "groceries".
pub type PaymentCategory = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Debited and not reversed
    InProgress,
    /// Rejected; the amount went back to the account
    Fail,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::InProgress => "inprogress",
            PaymentStatus::Fail => "fail",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inprogress" => Ok(PaymentStatus::InProgress),
            "fail" => Ok(PaymentStatus::Fail),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl std::fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid payment status: {}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single debit against an account.
/// Only `status` changes after creation, and only through a reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub account_id: AccountId,
    /// Always positive
    pub amount: Money,
    pub category: PaymentCategory,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(account_id: AccountId, amount: Money, category: impl Into<PaymentCategory>) -> Self {
        assert!(amount > 0, "Payment amount must be positive");
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            category: category.into(),
            status: PaymentStatus::InProgress,
            created_at: Utc::now(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.status == PaymentStatus::Fail
    }
}
