//! Configuration for Holocron binaries.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then environment variables (after a `.env` file, if any, has been
//! folded into the process environment).

mod error;
mod loader;
mod models;
mod sources;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    CacheConfig, CatalogConfig, Config, ConfigMetadata, ConfigWarnings,
    MetadataConfig, ResolverConfig, WikiConfig,
};
pub use sources::{EnvConfig, FileConfig, env_keys};
