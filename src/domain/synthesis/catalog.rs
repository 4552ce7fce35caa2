use super::client::SynthesisClient;
use super::error::SynthesisError;
use super::model::VoiceCatalog;
use crate::domain::settings::api_key_fingerprint;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Voice catalog lookups, cached per api key
pub struct VoiceCatalogService {
    client: Arc<SynthesisClient>,
    cache: Option<Cache<String, Arc<VoiceCatalog>>>,
}

impl VoiceCatalogService {
    pub fn new(client: Arc<SynthesisClient>, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(16)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self { client, cache }
    }

    /// Fetch the catalog, from cache unless `refresh` is set
    pub async fn catalog(
        &self,
        api_key: &str,
        refresh: bool,
    ) -> Result<Arc<VoiceCatalog>, SynthesisError> {
        let key = api_key_fingerprint(api_key);

        if let Some(cache) = &self.cache {
            if !refresh {
                if let Some(cached) = cache.get(&key).await {
                    tracing::debug!(voice_count = cached.voices.len(), "Voice catalog cache hit");
                    return Ok(cached);
                }
            }
        }

        let catalog = Arc::new(self.client.fetch_voice_catalog(api_key).await?);

        if let Some(cache) = &self.cache {
            cache.insert(key, catalog.clone()).await;
            tracing::debug!(voice_count = catalog.voices.len(), "Voice catalog cached");
        }

        Ok(catalog)
    }

    /// Drop every cached catalog, e.g. after the api key changed
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}
