use std::sync::Arc;

use anyhow::Context;
use holocron_config::Config;
use holocron_core::{
    catalog::CatalogService,
    details::DetailsService,
    infra::cache::{CacacheStore, DurableStore, ImageCache, MemoryStore},
    lookup::SlugLookup,
    providers::{HttpImageProbe, MetadataProvider, OmdbProvider, SwapiClient, WikiProvider},
    resolver::{ImageResolver, ResolverOptions},
};
use tracing::info;

/// Services wired from one loaded configuration.
#[derive(Debug)]
pub struct App {
    pub catalog: CatalogService,
    pub resolver: ImageResolver,
    pub details: DetailsService,
    pub cache: Arc<ImageCache>,
}

impl App {
    pub async fn build(config: &Config, ephemeral: bool) -> anyhow::Result<Self> {
        let store: Arc<dyn DurableStore> = if ephemeral {
            Arc::new(MemoryStore::new())
        } else {
            config.ensure_directories().with_context(|| {
                format!(
                    "failed to create cache directory {}",
                    config.cache_root().display()
                )
            })?;
            Arc::new(CacacheStore::new(config.cache_root()))
        };
        let cache = Arc::new(ImageCache::load(store).await);

        let metadata: Arc<dyn MetadataProvider> = Arc::new(OmdbProvider::with_base_url(
            config.metadata.api_key.clone(),
            config.metadata.base_url.clone(),
        ));
        let catalog = CatalogService::new(
            Arc::new(SwapiClient::new(config.catalog.url.clone())),
            Arc::new(SlugLookup::new()),
        );
        let resolver = ImageResolver::new(
            cache.clone(),
            metadata.clone(),
            Arc::new(WikiProvider::new(config.wiki.api_url.clone())),
            Arc::new(HttpImageProbe::new(Some(config.resolver.probe_timeout))),
        )
        .with_options(ResolverOptions {
            franchise_keyword: config.resolver.franchise_keyword.clone(),
            ..ResolverOptions::default()
        });
        let details = DetailsService::new(metadata)
            .with_franchise_keyword(config.resolver.franchise_keyword.clone());

        info!(
            catalog = %config.catalog.url,
            cache_entries = cache.len(),
            ephemeral,
            "holocron ready"
        );

        Ok(Self {
            catalog,
            resolver,
            details,
            cache,
        })
    }
}
