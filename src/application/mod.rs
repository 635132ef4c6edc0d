// Application layer: the ledger service every caller goes through, plus the
// summary types it reports.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
