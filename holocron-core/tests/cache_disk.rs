use std::sync::Arc;

use holocron_core::{
    constants::IMAGE_CACHE_STORAGE_KEY,
    infra::cache::{CacacheStore, DurableStore, ImageCache, ImageCacheKey},
    providers::{HttpImageProbe, OmdbProvider, WikiProvider},
    resolver::{ImageResolver, ImageSource},
};

#[tokio::test]
async fn entries_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("images");

    {
        let cache = ImageCache::load(Arc::new(CacacheStore::new(&root))).await;
        assert!(cache.is_empty());
        cache
            .put(
                ImageCacheKey::film("A New Hope", Some("1977")),
                "https://img.example/anh.jpg".into(),
            )
            .await;
        cache
            .put_many([(
                ImageCacheKey::character("Yoda"),
                "https://img.example/yoda.png".into(),
            )])
            .await;
    }

    let reopened = ImageCache::load(Arc::new(CacacheStore::new(&root))).await;
    assert_eq!(reopened.len(), 2);
    assert_eq!(
        reopened
            .get(&ImageCacheKey::character("Yoda"))
            .await
            .as_deref(),
        Some("https://img.example/yoda.png")
    );
}

#[tokio::test]
async fn persisted_poster_skips_providers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CacacheStore::new(dir.path()));
    store
        .set(
            IMAGE_CACHE_STORAGE_KEY,
            br#"{"A New Hope|1977":"https://img.example/anh.jpg"}"#,
        )
        .await
        .unwrap();

    // Every provider points at a closed port; a fetch would fall back.
    let resolver = ImageResolver::new(
        Arc::new(ImageCache::load(store).await),
        Arc::new(OmdbProvider::with_base_url(
            Some("key".into()),
            "http://127.0.0.1:9/",
        )),
        Arc::new(WikiProvider::new("http://127.0.0.1:9/api.php")),
        Arc::new(HttpImageProbe::new(None)),
    );

    let poster = resolver.resolve_film_poster("A New Hope", Some("1977")).await;
    assert_eq!(poster.source, ImageSource::Cache);
    assert_eq!(poster.url, "https://img.example/anh.jpg");
}

#[tokio::test]
async fn cleared_cache_stays_empty_on_reload() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ImageCache::load(Arc::new(CacacheStore::new(dir.path()))).await;
    cache
        .put(ImageCacheKey::character("Leia Organa"), "https://img.example/leia.png".into())
        .await;
    cache.clear().await;

    let reopened = ImageCache::load(Arc::new(CacacheStore::new(dir.path()))).await;
    assert!(reopened.is_empty());
}
