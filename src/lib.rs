pub mod config;
pub mod error;
pub mod ledger_config;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items
pub use crate::config::Config;
pub use error::{Error, Result};
pub use ledger_config::{ConfKey, LedgerSettings, LEDGER_KEYS, TOTAL_QUERY_LIMIT};
