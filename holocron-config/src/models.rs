//! Resolved configuration types.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// GraphQL catalog.
    pub catalog: CatalogConfig,
    /// OMDb-style metadata provider.
    pub metadata: MetadataConfig,
    /// MediaWiki image source.
    pub wiki: WikiConfig,
    /// On-disk image cache.
    pub cache: CacheConfig,
    /// Image resolution tunables.
    pub resolver: ResolverConfig,
    /// Where the values came from.
    pub source: ConfigMetadata,
}

impl Config {
    /// Directory for the on-disk image cache.
    pub fn cache_root(&self) -> &Path {
        &self.cache.root
    }

    /// Creates the cache directory if it is missing.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.cache.root)
    }
}

/// Catalog endpoint settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// GraphQL endpoint URL.
    pub url: String,
}

/// Metadata provider settings. `Debug` redacts the key.
#[derive(Clone)]
pub struct MetadataConfig {
    /// `None` disables the provider.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
}

impl fmt::Debug for MetadataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Wiki settings.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// `api.php` URL.
    pub api_url: String,
}

/// Image cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory handed to the on-disk image cache.
    pub root: PathBuf,
}

/// Image resolution settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound for one image validation request.
    pub probe_timeout: Duration,
    /// Prefix for the second character search.
    pub franchise_keyword: String,
}

/// Where the loaded values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// TOML file that was read, if any.
    pub config_path: Option<PathBuf>,
    /// Whether a `.env` file was applied.
    pub env_file_loaded: bool,
}

/// Non-fatal findings collected while loading.
#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    items: Vec<String>,
}

impl ConfigWarnings {
    /// Records a warning.
    pub fn push(&mut self, warning: impl Into<String>) {
        self.items.push(warning.into());
    }

    /// `true` when loading found nothing to report.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Warnings in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// `true` when any warning mentions `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|item| item.contains(needle))
    }
}
