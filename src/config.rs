use crate::error::{InvalidValueSnafu, LoadSnafu, Result};
use crate::ledger_config::{ConfKey, LedgerSettings, TOTAL_QUERY_LIMIT};
use config::{
    Config as ConfigTree, ConfigError, Environment, File, Map, Source, Value, ValueKind,
};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::path::Path;
use tracing::debug;

const ENVIRONMENT_PREFIX: &str = "CORE";
const CONFIG_SEPARATOR: &str = "_";
const CONFIG_FILE_STEM: &str = "core";
const DEFAULT_PROFILE: &str = "development";

/// Peer configuration loaded from the config directory and the environment.
///
/// Keys are matched without regard to case, so `ledger.state.totalQueryLimit`
/// in `core.yaml` and `CORE_LEDGER_STATE_TOTALQUERYLIMIT` name the same
/// setting.
#[derive(Debug, Clone)]
pub struct Config {
    config: ConfigTree,
}

impl Config {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        Self::with_environment(config_dir, Self::environment_source())
    }

    /// Loads `core.yaml`, then the optional `core.<environment>.yaml` and
    /// `core.local.yaml`, then `environment` on top.
    ///
    /// The profile name comes from the `environment` key of `environment`
    /// itself (`CORE_ENVIRONMENT` for the default source).
    pub fn with_environment<P: AsRef<Path>>(
        config_dir: P,
        environment: Environment,
    ) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        let profile = profile_name(&environment).context(LoadSnafu { path: config_dir })?;

        let default_config = config_dir.join(format!("{CONFIG_FILE_STEM}.yaml"));
        let env_config = config_dir.join(format!("{CONFIG_FILE_STEM}.{profile}.yaml"));
        let local_config = config_dir.join(format!("{CONFIG_FILE_STEM}.local.yaml"));

        let config = ConfigTree::builder()
            .add_source(LowercaseKeys(File::from(default_config)))
            .add_source(LowercaseKeys(File::from(env_config).required(false)))
            .add_source(LowercaseKeys(File::from(local_config).required(false)))
            .add_source(LowercaseKeys(environment))
            .build()
            .context(LoadSnafu { path: config_dir })?;

        debug!(
            "Loaded configuration from {} (environment: {})",
            config_dir.display(),
            profile
        );
        Ok(Config { config })
    }

    /// `CORE_` prefixed variables, `_` separated, with typed values. Empty
    /// variables are treated as unset.
    pub fn environment_source() -> Environment {
        Environment::with_prefix(ENVIRONMENT_PREFIX)
            .separator(CONFIG_SEPARATOR)
            .try_parsing(true)
            .ignore_empty(true)
    }

    /// A configuration in which no key is set.
    pub fn empty() -> Result<Self> {
        let config = ConfigTree::builder()
            .build()
            .context(LoadSnafu { path: "<memory>" })?;
        Ok(Config { config })
    }

    pub fn from_tree(config: ConfigTree) -> Result<Self> {
        let config = ConfigTree::builder()
            .add_source(LowercaseKeys(config))
            .build()
            .context(LoadSnafu { path: "<memory>" })?;
        Ok(Config { config })
    }

    /// Returns a copy of this configuration with `key` explicitly set.
    pub fn with_override<V: Into<Value>>(&self, key: &str, value: V) -> Result<Self> {
        let config = ConfigTree::builder()
            .add_source(self.config.clone())
            .set_override(key.to_lowercase(), value)
            .context(InvalidValueSnafu { key })?
            .build()
            .context(InvalidValueSnafu { key })?;
        Ok(Config { config })
    }

    /// Integer value of `key`, or `None` when no layer sets it.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_optional(key)
    }

    /// Value of `key`, or its declared default when no layer sets it.
    pub fn get_setting(&self, key: &ConfKey) -> Result<u64> {
        let value = self.get_optional(key.name)?;
        if value.is_none() {
            debug!("{} is not set, using default {}", key.name, key.default);
        }
        Ok(key.resolve(value))
    }

    pub fn total_query_limit(&self) -> Result<usize> {
        let limit = self.get_setting(&TOTAL_QUERY_LIMIT)?;
        Ok(usize::try_from(limit).unwrap_or(usize::MAX))
    }

    pub fn ledger_settings(&self) -> Result<LedgerSettings> {
        let settings: LedgerSettings = self.get_optional("ledger")?.unwrap_or_default();
        debug!(
            "Ledger settings: total_query_limit={}, coll_elg_proc_max_db_batch_size={}, coll_elg_proc_db_batches_interval={:?}",
            settings.total_query_limit(),
            settings.coll_elg_proc_max_db_batch_size(),
            settings.coll_elg_proc_db_batches_interval(),
        );
        Ok(settings)
    }

    // A key that is missing or null counts as unset. Anything else that fails
    // to deserialize is an error.
    fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = key.to_lowercase();
        match self.config.get::<Option<T>>(&path) {
            Ok(value) => Ok(value),
            Err(ConfigError::NotFound(_)) => {
                self.check_parents(&path).context(InvalidValueSnafu { key })?;
                Ok(None)
            }
            Err(e) => Err(e).context(InvalidValueSnafu { key }),
        }
    }

    // A scalar at a parent path, e.g. `CORE_LEDGER_STATE=goleveldb`, replaces
    // the whole section below it. The key is then not unset but shadowed.
    fn check_parents(&self, path: &str) -> Result<(), ConfigError> {
        for (idx, _) in path.match_indices('.') {
            let parent = &path[..idx];
            if let Ok(value) = self.config.get::<Value>(parent) {
                if !matches!(value.kind, ValueKind::Table(_) | ValueKind::Nil) {
                    return Err(ConfigError::Message(format!(
                        "{parent} is set to {value}, which replaces the section holding {path}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn profile_name(environment: &Environment) -> Result<String, ConfigError> {
    let vars = lowercase_table(environment.collect()?);
    match vars.get("environment") {
        Some(value) => value.clone().into_string(),
        None => Ok(DEFAULT_PROFILE.to_string()),
    }
}

/// Wraps a source so that every key it yields is lowercase.
#[derive(Debug, Clone)]
struct LowercaseKeys<S>(S);

impl<S> Source for LowercaseKeys<S>
where
    S: Source + Clone + Send + Sync + 'static,
{
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        Ok(lowercase_table(self.0.collect()?))
    }
}

fn lowercase_table(table: Map<String, Value>) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), lowercase_value(value)))
        .collect()
}

fn lowercase_value(mut value: Value) -> Value {
    if let ValueKind::Table(table) = &mut value.kind {
        *table = lowercase_table(std::mem::take(table));
    }
    value
}
