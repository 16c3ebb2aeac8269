//! Ledger configuration keys and the typed `ledger` settings section.
//!
//! Each setting is optional in every configuration layer. When none of the
//! layers assigns it, the code-level default declared here applies, no matter
//! what the underlying store would return for a missing key.

use serde::Deserialize;
use std::time::Duration;

/// Maximum number of records a range or rich query may return.
pub const TOTAL_QUERY_LIMIT: ConfKey = ConfKey::new("ledger.state.totalQueryLimit", 10_000);

/// Number of collection eligibility entries the private data store converts
/// per database batch.
pub const COLL_ELG_PROC_MAX_DB_BATCH_SIZE: ConfKey = ConfKey::new("ledger.pvtdataStore.collElgProcMaxDbBatchSize", 5_000);

/// Pause between two collection eligibility batches, in milliseconds.
pub const COLL_ELG_PROC_DB_BATCHES_INTERVAL: ConfKey = ConfKey::new("ledger.pvtdataStore.collElgProcDbBatchesInterval", 1_000);

pub static LEDGER_KEYS: [ConfKey; 3] = [
    TOTAL_QUERY_LIMIT,
    COLL_ELG_PROC_MAX_DB_BATCH_SIZE,
    COLL_ELG_PROC_DB_BATCHES_INTERVAL,
];

/// A named configuration entry and the value used when it is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfKey {
    pub name: &'static str,
    pub default: u64,
}

impl ConfKey {
    pub const fn new(name: &'static str, default: u64) -> Self {
        Self { name, default }
    }

    pub fn resolve(&self, value: Option<u64>) -> u64 {
        value.unwrap_or(self.default)
    }

    /// Like [`ConfKey::resolve`] for settings held as `usize`.
    pub fn resolve_usize(&self, value: Option<usize>) -> usize {
        value.unwrap_or_else(|| usize::try_from(self.default).unwrap_or(usize::MAX))
    }

    /// Looks up one of the ledger keys by name, ignoring case.
    pub fn find(name: &str) -> Option<&'static ConfKey> {
        LEDGER_KEYS
            .iter()
            .find(|key| key.name.eq_ignore_ascii_case(name))
    }
}

// Field names are lowercase because the configuration facade lowercases every
// key it collects.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct LedgerSettings {
    #[serde(default)]
    pub state: StateSettings,
    #[serde(default, rename = "pvtdatastore")]
    pub pvtdata_store: PvtdataStoreSettings,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct StateSettings {
    #[serde(default, rename = "totalquerylimit")]
    pub total_query_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PvtdataStoreSettings {
    #[serde(default, rename = "collelgprocmaxdbbatchsize")]
    pub coll_elg_proc_max_db_batch_size: Option<usize>,
    #[serde(default, rename = "collelgprocdbbatchesinterval")]
    pub coll_elg_proc_db_batches_interval: Option<u64>,
}

impl LedgerSettings {
    /// Maximum number of records a query may return. An explicit `0` is kept.
    pub fn total_query_limit(&self) -> usize {
        TOTAL_QUERY_LIMIT.resolve_usize(self.state.total_query_limit)
    }

    pub fn coll_elg_proc_max_db_batch_size(&self) -> usize {
        COLL_ELG_PROC_MAX_DB_BATCH_SIZE
            .resolve_usize(self.pvtdata_store.coll_elg_proc_max_db_batch_size)
    }

    pub fn coll_elg_proc_db_batches_interval(&self) -> Duration {
        Duration::from_millis(
            COLL_ELG_PROC_DB_BATCHES_INTERVAL
                .resolve(self.pvtdata_store.coll_elg_proc_db_batches_interval),
        )
    }

    pub fn with_total_query_limit(mut self, limit: usize) -> Self {
        self.state.total_query_limit = Some(limit);
        self
    }
}
