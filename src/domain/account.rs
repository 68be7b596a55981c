use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;

pub type AccountId = i64;

/// Phone numbers are stored verbatim; uniqueness is exact string equality.
pub type Phone = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub phone: Phone,
    /// Current balance in minor units, never negative
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an empty account. The ID is allocated by the wallet service.
    pub fn new(id: AccountId, phone: impl Into<Phone>) -> Self {
        Self {
            id,
            phone: phone.into(),
            balance: 0,
            created_at: Utc::now(),
        }
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.balance >= amount
    }
}
