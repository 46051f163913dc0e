use insight_core::{CoreError, FetchResult, SourceId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read-through/write-through store for normalized fetch results, one
/// JSON file per source identifier. Loading tolerates corrupt or
/// partially written files by treating them as misses; saving is
/// best-effort and never fails the pipeline.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source: &SourceId) -> PathBuf {
        self.dir.join(format!("data_{}.json", source.as_str()))
    }

    pub async fn load(&self, source: &SourceId) -> Option<FetchResult> {
        let path = self.path_for(source);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No cache entry for {}", source);
                return None;
            }
        };

        match serde_json::from_str::<FetchResult>(&raw) {
            Ok(result) => {
                info!("Using cached data for {}", source);
                Some(result)
            }
            Err(e) => {
                warn!(
                    "Cache file for {} is corrupted ({}). Will scrape fresh data.",
                    source, e
                );
                None
            }
        }
    }

    pub async fn save(&self, source: &SourceId, result: &FetchResult) {
        if let Err(e) = self.try_save(source, result).await {
            warn!("Failed to cache data for {}: {}", source, e);
        }
    }

    async fn try_save(&self, source: &SourceId, result: &FetchResult) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_string_pretty(result)?;
        tokio::fs::write(self.path_for(source), raw).await?;
        info!("Cached data for {}", source);
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
