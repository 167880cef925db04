//! Configuration load errors.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly named config file is absent.
    #[error("config file {path} does not exist")]
    MissingConfig { path: PathBuf },
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid URL for {key}: '{value}'")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// Only `http` and `https` are accepted.
    #[error("unsupported URL scheme for {key}: '{value}'")]
    UnsupportedScheme { key: &'static str, value: String },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    /// A named `.env` file exists but could not be parsed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
