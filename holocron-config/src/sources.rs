//! Raw configuration sources: the TOML file and the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable names.
#[allow(missing_docs)]
pub mod env_keys {
    /// Path to the TOML config file.
    pub const CONFIG_PATH: &str = "HOLOCRON_CONFIG";
    pub const CATALOG_URL: &str = "HOLOCRON_CATALOG_URL";
    pub const OMDB_API_KEY: &str = "OMDB_API_KEY";
    pub const OMDB_API_URL: &str = "OMDB_API_URL";
    pub const WIKI_API_BASE: &str = "WOOKIEEPEDIA_API_BASE";
    pub const CACHE_DIR: &str = "HOLOCRON_CACHE_DIR";
    /// Bare seconds or a humantime string.
    pub const PROBE_TIMEOUT: &str = "HOLOCRON_PROBE_TIMEOUT";
    pub const FRANCHISE_KEYWORD: &str = "HOLOCRON_FRANCHISE_KEYWORD";
}

/// Raw configuration as written in a TOML file. Every key is optional.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub metadata: FileMetadataConfig,
    #[serde(default)]
    pub wiki: FileWikiConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub resolver: FileResolverConfig,
}

/// `[catalog]` table.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `[metadata]` table.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileMetadataConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[wiki]` table.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileWikiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// `[cache]` table.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// `[resolver]` table.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileResolverConfig {
    /// Humantime string, e.g. `"10s"` or `"1500ms"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub franchise_keyword: Option<String>,
}

/// Values read from the environment. Blank variables count as unset.
/// Fields mirror [`env_keys`].
#[allow(missing_docs)]
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub omdb_api_key: Option<String>,
    pub omdb_api_url: Option<String>,
    pub wiki_api_base: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub probe_timeout: Option<String>,
    pub franchise_keyword: Option<String>,
}

impl EnvConfig {
    /// Reads the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads through `lookup`, for tests and embedding.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            config_path: get(env_keys::CONFIG_PATH).map(PathBuf::from),
            catalog_url: get(env_keys::CATALOG_URL),
            omdb_api_key: get(env_keys::OMDB_API_KEY),
            omdb_api_url: get(env_keys::OMDB_API_URL),
            wiki_api_base: get(env_keys::WIKI_API_BASE),
            cache_dir: get(env_keys::CACHE_DIR).map(PathBuf::from),
            probe_timeout: get(env_keys::PROBE_TIMEOUT),
            franchise_keyword: get(env_keys::FRANCHISE_KEYWORD),
        }
    }
}
