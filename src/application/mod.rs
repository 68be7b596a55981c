// Application layer: the wallet service and its error taxonomy.
// Storage and the CLI sit on top of this and never mutate state directly.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
