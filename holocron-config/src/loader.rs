//! Layered configuration loading.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use holocron_core::constants::{
    DEFAULT_CATALOG_URL, DEFAULT_FRANCHISE_KEYWORD, DEFAULT_OMDB_URL,
    DEFAULT_WIKI_API_URL,
};
use tracing::debug;
use url::Url;

use crate::error::ConfigLoadError;
use crate::models::{
    CacheConfig, CatalogConfig, Config, ConfigMetadata, ConfigWarnings,
    MetadataConfig, ResolverConfig, WikiConfig,
};
use crate::sources::{EnvConfig, FileConfig, env_keys};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["holocron.toml", "config/holocron.toml"];

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Used only when the platform reports no cache directory.
const FALLBACK_CACHE_DIR: &str = ".holocron/images";

/// Explicit paths, usually from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// TOML file; takes precedence over `HOLOCRON_CONFIG` and must exist.
    pub config_path: Option<PathBuf>,
    /// `.env` file; `.env` in the working directory when unset.
    pub env_file: Option<PathBuf>,
}

/// Resolves [`Config`] from defaults, TOML and the environment.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A loaded configuration and its non-fatal warnings.
#[derive(Debug)]
pub struct ConfigLoad {
    /// The resolved configuration.
    pub config: Config,
    /// Problems worth logging that did not stop the load.
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    /// Loader with no explicit paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with the given paths.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Sets the TOML file.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Sets the `.env` file.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Folds `.env` into the process environment, then resolves against it.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_from_env(EnvConfig::gather())?;
        load.config.source.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolves against `env` only; the process environment and `.env`
    /// files are not consulted.
    pub fn load_from_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();

        let catalog_url = validate_url(
            env_keys::CATALOG_URL,
            env.catalog_url
                .or(file.catalog.url)
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        )?;
        let omdb_url = validate_url(
            env_keys::OMDB_API_URL,
            env.omdb_api_url
                .or(file.metadata.base_url)
                .unwrap_or_else(|| DEFAULT_OMDB_URL.to_string()),
        )?;
        let wiki_url = validate_url(
            env_keys::WIKI_API_BASE,
            env.wiki_api_base
                .or(file.wiki.api_url)
                .unwrap_or_else(|| DEFAULT_WIKI_API_URL.to_string()),
        )?;

        let api_key = env
            .omdb_api_key
            .or(file.metadata.api_key)
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warnings.push(format!(
                "{} is not set; posters and film details fall back to placeholders",
                env_keys::OMDB_API_KEY
            ));
        }

        let probe_timeout = match env.probe_timeout.or(file.resolver.probe_timeout) {
            Some(raw) => parse_duration(env_keys::PROBE_TIMEOUT, &raw)?,
            None => DEFAULT_PROBE_TIMEOUT,
        };
        if probe_timeout.is_zero() {
            warnings.push(format!(
                "{} is zero; every image validation will time out",
                env_keys::PROBE_TIMEOUT
            ));
        }

        let franchise_keyword = env
            .franchise_keyword
            .or(file.resolver.franchise_keyword)
            .unwrap_or_else(|| DEFAULT_FRANCHISE_KEYWORD.to_string());

        let cache_root = match env.cache_dir.or(file.cache.root) {
            Some(root) => root,
            None => default_cache_root().unwrap_or_else(|| {
                warnings.push(format!(
                    "no platform cache directory; using {FALLBACK_CACHE_DIR}"
                ));
                PathBuf::from(FALLBACK_CACHE_DIR)
            }),
        };

        let config = Config {
            catalog: CatalogConfig { url: catalog_url },
            metadata: MetadataConfig {
                api_key,
                base_url: omdb_url,
            },
            wiki: WikiConfig { api_url: wiki_url },
            cache: CacheConfig { root: cache_root },
            resolver: ResolverConfig {
                probe_timeout,
                franchise_keyword,
            },
            source: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };
        debug!(?config, "configuration resolved");

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(FileConfig, Option<PathBuf>), ConfigLoadError> {
        // An explicitly named file must exist; default locations are optional.
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((FileConfig::default(), None)),
            },
        };

        let file = read_file_config(&path)?;
        Ok((file, Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_url(
    key: &'static str,
    value: String,
) -> Result<String, ConfigLoadError> {
    let parsed = Url::parse(&value).map_err(|source| {
        ConfigLoadError::InvalidUrl {
            key,
            value: value.clone(),
            source,
        }
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(value),
        _ => Err(ConfigLoadError::UnsupportedScheme { key, value }),
    }
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    // Bare numbers are seconds.
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw.to_string(),
            source,
        }
    })
}

fn default_cache_root() -> Option<PathBuf> {
    ProjectDirs::from("", "holocron", "holocron")
        .map(|dirs| dirs.cache_dir().join("images"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numbers_are_seconds() {
        assert_eq!(
            parse_duration(env_keys::PROBE_TIMEOUT, "15").unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(
            parse_duration(env_keys::PROBE_TIMEOUT, "1500ms").unwrap(),
            Duration::from_millis(1500)
        );
        assert!(parse_duration(env_keys::PROBE_TIMEOUT, "soon").is_err());
    }

    #[test]
    fn url_scheme_is_checked() {
        assert!(validate_url("K", "https://example.org/graphql".into()).is_ok());
        assert!(matches!(
            validate_url("K", "ftp://example.org".into()),
            Err(ConfigLoadError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            validate_url("K", "not a url".into()),
            Err(ConfigLoadError::InvalidUrl { .. })
        ));
    }
}
