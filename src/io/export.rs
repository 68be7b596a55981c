use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::WalletService;
use crate::domain::LedgerState;

/// Snapshot format version written by this build
pub const SNAPSHOT_VERSION: &str = "1";

/// Full ledger snapshot for export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub state: LedgerState,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a WalletService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Export accounts to CSV format
    pub fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "phone", "balance", "created_at"])?;

        for account in self.service.accounts() {
            csv_writer.write_record(&[
                account.id.to_string(),
                account.phone.clone(),
                account.balance.to_string(),
                account.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.service.accounts().len())
    }

    /// Export payments to CSV format, in the order they were made
    pub fn export_payments_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "id",
            "account_id",
            "amount",
            "category",
            "status",
            "created_at",
        ])?;

        for payment in self.service.payments() {
            csv_writer.write_record(&[
                payment.id.to_string(),
                payment.account_id.to_string(),
                payment.amount.to_string(),
                payment.category.clone(),
                payment.status.as_str().to_string(),
                payment.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.service.payments().len())
    }

    /// Export favorites to CSV format
    pub fn export_favorites_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "id",
            "name",
            "account_id",
            "amount",
            "category",
            "created_at",
        ])?;

        for favorite in self.service.favorites() {
            csv_writer.write_record(&[
                favorite.id.to_string(),
                favorite.name.clone(),
                favorite.account_id.to_string(),
                favorite.amount.to_string(),
                favorite.category.clone(),
                favorite.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.service.favorites().len())
    }

    /// Export the whole ledger as pretty-printed JSON
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            state: self.service.snapshot(),
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(snapshot)
    }
}
