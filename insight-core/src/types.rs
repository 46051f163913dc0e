use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel author used when the upstream reports a deleted account.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// A subreddit name, case-normalized with any `r/` prefix stripped.
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn parse(raw: &str) -> Self {
        let name = raw.trim();
        let name = name.strip_prefix("r/").unwrap_or(name);
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r/{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub score: i32,
    #[serde(default = "deleted_author")]
    pub author: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub score: i32,
    #[serde(default = "deleted_author")]
    pub author: String,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub subreddit: String,
    pub pages_scraped: u32,
    pub total_posts: usize,
}

/// Canonical output of one acquisition run. This is the unit persisted
/// to the cache and returned to callers. `total_posts == posts.len()`
/// whenever `error` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub posts: Vec<Post>,
    pub metadata: FetchMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResult {
    pub fn new(source: &SourceId, posts: Vec<Post>, pages_scraped: u32) -> Self {
        let total_posts = posts.len();
        Self {
            posts,
            metadata: FetchMetadata {
                subreddit: source.as_str().to_string(),
                pages_scraped,
                total_posts,
            },
            error: None,
        }
    }
}

fn deleted_author() -> String {
    DELETED_AUTHOR.to_string()
}
