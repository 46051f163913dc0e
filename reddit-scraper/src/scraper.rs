use crate::api::RedditApiClient;
use crate::cache::CacheStore;
use crate::normalize::{ListingNormalizer, MarkdownNormalizer, Normalize};
use insight_core::{AppConfig, CoreError, FetchResult, SourceId};
use tracing::{debug, info};

/// Pipeline orchestrator: cache → fetch → normalize → cache.
/// The normalization strategy is fixed at construction.
#[derive(Debug)]
pub struct Scraper<N> {
    client: RedditApiClient,
    cache: CacheStore,
    normalizer: N,
}

impl Scraper<ListingNormalizer> {
    /// Scraper over the structured Reddit listing API.
    pub fn listing(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            client: RedditApiClient::new(config)?,
            cache: CacheStore::new(config.cache_dir.clone()),
            normalizer: ListingNormalizer::new(config),
        })
    }
}

impl Scraper<MarkdownNormalizer> {
    /// Scraper over a markdown-bearing scrape service.
    pub fn markdown(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            client: RedditApiClient::new(config)?,
            cache: CacheStore::new(config.cache_dir.clone()),
            normalizer: MarkdownNormalizer::from_app_config(config),
        })
    }
}

impl<N: Normalize> Scraper<N> {
    pub async fn run(
        &self,
        source: &str,
        max_pages: u32,
        use_cache: bool,
    ) -> Result<FetchResult, CoreError> {
        let source = SourceId::parse(source);

        if use_cache {
            if let Some(cached) = self.cache.load(&source).await {
                return Ok(cached);
            }
        }

        if max_pages > 1 {
            debug!(
                "max_pages={} requested, but scraping is bounded to a single listing fetch",
                max_pages
            );
        }

        let raw = self.client.fetch_listing(&source).await?;
        let result = self.normalizer.normalize(raw, &source, &self.client).await?;
        info!(
            "Scraped {} posts from {} ({} page)",
            result.metadata.total_posts, source, result.metadata.pages_scraped
        );

        if use_cache {
            self.cache.save(&source, &result).await;
        }

        Ok(result)
    }
}
