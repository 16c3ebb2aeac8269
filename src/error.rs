use config::ConfigError;
use snafu::{Backtrace, Snafu};
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to load configuration from {}: {source}", path.display()))]
    Load {
        path: PathBuf,
        source: ConfigError,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid value for {key}: {source}"))]
    InvalidValue {
        key: String,
        source: ConfigError,
        backtrace: Backtrace,
    },
}

impl Error {
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::InvalidValue { key, .. } => Some(key),
            Error::Load { .. } => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
