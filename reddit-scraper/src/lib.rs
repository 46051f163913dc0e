pub mod api;
pub mod cache;
pub mod normalize;
pub mod pacing;
pub mod retry;
pub mod scraper;

pub use api::RedditApiClient;
pub use cache::CacheStore;
pub use normalize::{ListingNormalizer, MarkdownNormalizer, Normalize, NormalizationPolicy};
pub use scraper::Scraper;
