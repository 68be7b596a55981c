pub mod export;
pub mod import;

pub use export::{Exporter, LedgerSnapshot, SNAPSHOT_VERSION};
pub use import::{ImportResult, Importer};
