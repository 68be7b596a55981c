use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Account, Favorite, LedgerState, Payment, PaymentStatus};

use super::{LedgerStore, MIGRATION_001_INITIAL};

const NEXT_ACCOUNT_ID_KEY: &str = "next_account_id";

/// SQLite-backed store for the whole ledger state.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build a connection URL for a database file.
    /// With `create`, the file is created when missing.
    pub fn sqlite_url(path: &str, create: bool) -> String {
        if create {
            format!("sqlite:{}?mode=rwc", path)
        } else {
            format!("sqlite:{}", path)
        }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    async fn load_state(&self) -> Result<LedgerState> {
        let next_account_id: i64 = sqlx::query("SELECT value FROM ledger_meta WHERE key = ?")
            .bind(NEXT_ACCOUNT_ID_KEY)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read account counter")?
            .map(|row| row.get("value"))
            .unwrap_or(0);

        let accounts = sqlx::query(
            "SELECT id, phone, balance, created_at FROM accounts ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load accounts")?
        .iter()
        .map(Self::row_to_account)
        .collect::<Result<Vec<_>>>()?;

        let payments = sqlx::query(
            r#"
            SELECT id, account_id, amount, category, status, created_at
            FROM payments
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load payments")?
        .iter()
        .map(Self::row_to_payment)
        .collect::<Result<Vec<_>>>()?;

        let favorites = sqlx::query(
            r#"
            SELECT id, name, account_id, amount, category, created_at
            FROM favorites
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load favorites")?
        .iter()
        .map(Self::row_to_favorite)
        .collect::<Result<Vec<_>>>()?;

        debug!(
            accounts = accounts.len(),
            payments = payments.len(),
            favorites = favorites.len(),
            "Loaded ledger state"
        );

        Ok(LedgerState {
            next_account_id,
            accounts,
            payments,
            favorites,
        })
    }

    /// Replace the stored state. Runs in one transaction, so a failed save
    /// leaves the previous state in place.
    async fn save_state(&self, state: &LedgerState) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // Children first so account references never dangle mid-transaction.
        for table in ["favorites", "payments", "accounts"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table))?;
        }

        for (position, account) in state.accounts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO accounts (id, position, phone, balance, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(account.id)
            .bind(position as i64)
            .bind(&account.phone)
            .bind(account.balance)
            .bind(account.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save account {}", account.id))?;
        }

        for (position, payment) in state.payments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO payments (id, position, account_id, amount, category, status, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(payment.id.to_string())
            .bind(position as i64)
            .bind(payment.account_id)
            .bind(payment.amount)
            .bind(&payment.category)
            .bind(payment.status.as_str())
            .bind(payment.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save payment {}", payment.id))?;
        }

        for (position, favorite) in state.favorites.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO favorites (id, position, name, account_id, amount, category, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(favorite.id.to_string())
            .bind(position as i64)
            .bind(&favorite.name)
            .bind(favorite.account_id)
            .bind(favorite.amount)
            .bind(&favorite.category)
            .bind(favorite.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save favorite {}", favorite.id))?;
        }

        sqlx::query(
            r#"
            INSERT INTO ledger_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(NEXT_ACCOUNT_ID_KEY)
        .bind(state.next_account_id)
        .execute(&mut *tx)
        .await
        .context("Failed to save account counter")?;

        tx.commit().await.context("Failed to commit ledger state")?;

        debug!(
            accounts = state.accounts.len(),
            payments = state.payments.len(),
            favorites = state.favorites.len(),
            "Saved ledger state"
        );
        Ok(())
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let created_at: String = row.get("created_at");
        Ok(Account {
            id: row.get("id"),
            phone: row.get("phone"),
            balance: row.get("balance"),
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn row_to_payment(row: &SqliteRow) -> Result<Payment> {
        let id: String = row.get("id");
        let status: String = row.get("status");
        let created_at: String = row.get("created_at");
        Ok(Payment {
            id: Uuid::parse_str(&id).context("Invalid payment ID")?,
            account_id: row.get("account_id"),
            amount: row.get("amount"),
            category: row.get("category"),
            status: status
                .parse::<PaymentStatus>()
                .context("Invalid payment status")?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn row_to_favorite(row: &SqliteRow) -> Result<Favorite> {
        let id: String = row.get("id");
        let created_at: String = row.get("created_at");
        Ok(Favorite {
            id: Uuid::parse_str(&id).context("Invalid favorite ID")?,
            name: row.get("name"),
            account_id: row.get("account_id"),
            amount: row.get("amount"),
            category: row.get("category"),
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

impl LedgerStore for Repository {
    async fn load(&self) -> Result<LedgerState> {
        self.load_state().await
    }

    async fn save(&self, state: &LedgerState) -> Result<()> {
        self.save_state(state).await
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {}", value))?
        .with_timezone(&Utc))
}
