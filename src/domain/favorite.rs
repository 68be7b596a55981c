use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Money, Payment, PaymentCategory};

pub type FavoriteId = Uuid;

/// A named template for re-issuing a payment.
/// Copies the payment's fields at creation time and never follows it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub name: String,
    pub account_id: AccountId,
    pub amount: Money,
    pub category: PaymentCategory,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn from_payment(payment: &Payment, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            account_id: payment.account_id,
            amount: payment.amount,
            category: payment.category.clone(),
            created_at: Utc::now(),
        }
    }
}
