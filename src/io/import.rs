use anyhow::{Context, Result};
use std::io::Read;

use crate::domain::{IntegrityReport, LedgerState};
use crate::io::export::{LedgerSnapshot, SNAPSHOT_VERSION};

/// Result of reading a snapshot
#[derive(Debug)]
pub struct ImportResult {
    pub state: LedgerState,
    pub report: IntegrityReport,
}

/// Reads full ledger snapshots written by `Exporter::export_full_json`.
pub struct Importer;

impl Importer {
    /// Parse and validate a snapshot.
    /// Unsupported versions and states with integrity issues are refused.
    pub fn import_full_json<R: Read>(reader: R) -> Result<ImportResult> {
        let snapshot: LedgerSnapshot =
            serde_json::from_reader(reader).context("Failed to parse ledger snapshot")?;

        if snapshot.version != SNAPSHOT_VERSION {
            anyhow::bail!(
                "Unsupported snapshot version '{}' (expected '{}')",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        let report = snapshot.state.check_integrity();
        if !report.is_healthy() {
            let issues: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
            anyhow::bail!("Snapshot failed integrity check: {}", issues.join("; "));
        }

        Ok(ImportResult {
            state: snapshot.state,
            report,
        })
    }
}
