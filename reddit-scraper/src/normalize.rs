use crate::api::RedditApiClient;
use insight_core::{
    AppConfig, Comment, CoreError, FetchResult, Post, RedditApiError, SourceId, DELETED_AUTHOR,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Below this many characters a markdown blob is considered an
/// upstream failure rather than a legitimately small page.
const MIN_MARKDOWN_LEN: usize = 50;

/// Governs whether malformed raw payloads raise or degrade to
/// placeholder posts. Strict is the default; the lenient fallback can
/// mask real upstream failures as empty-looking results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationPolicy {
    Strict,
    Lenient,
}

/// Capability to turn one raw upstream payload into the canonical
/// `FetchResult`. Selected once at pipeline construction; everything
/// downstream is strategy-agnostic.
pub trait Normalize {
    #[allow(async_fn_in_trait)]
    async fn normalize(
        &self,
        raw: Value,
        source: &SourceId,
        client: &RedditApiClient,
    ) -> Result<FetchResult, CoreError>;
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    #[serde(default)]
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default = "deleted_author")]
    author: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default = "deleted_author")]
    author: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    created_utc: f64,
}

fn deleted_author() -> String {
    DELETED_AUTHOR.to_string()
}

impl RawPost {
    fn into_post(self) -> Post {
        let url = if self.permalink.starts_with("http") {
            self.permalink.clone()
        } else {
            format!("https://www.reddit.com{}", self.permalink)
        };
        Post {
            id: self.id,
            title: self.title,
            content: self.selftext,
            url,
            score: self.score,
            author: self.author,
            comment_count: self.num_comments,
            created_at: self.created_utc as i64,
            comments: vec![],
        }
    }
}

impl RawComment {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            content: self.body,
            score: self.score,
            author: self.author,
            created_at: self.created_utc as i64,
        }
    }
}

/// Strategy A: the structured Reddit listing shape (`data.children[]`
/// with `t3` posts and `t1` comments).
#[derive(Debug, Clone)]
pub struct ListingNormalizer {
    comment_limit: u32,
    comment_sort: String,
}

impl ListingNormalizer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            comment_limit: config.comment_limit,
            comment_sort: config.comment_sort.clone(),
        }
    }
}

impl Normalize for ListingNormalizer {
    async fn normalize(
        &self,
        raw: Value,
        source: &SourceId,
        client: &RedditApiClient,
    ) -> Result<FetchResult, CoreError> {
        let listing: ListingEnvelope =
            serde_json::from_value(raw).map_err(|e| RedditApiError::InvalidResponse {
                details: format!("Malformed listing payload for {}: {}", source, e),
            })?;

        let mut posts = Vec::new();
        let mut fetched_any_comments = false;

        for child in listing.data.children {
            match child.kind.as_str() {
                "t3" => match serde_json::from_value::<RawPost>(child.data) {
                    Ok(raw_post) => {
                        let mut post = raw_post.into_post();
                        if post.comment_count > 0 {
                            if fetched_any_comments {
                                sleep(client.comment_delay()).await;
                            }
                            // One post's comment failure does not sink the listing
                            match client
                                .fetch_comments(
                                    source,
                                    &post.id,
                                    self.comment_limit,
                                    &self.comment_sort,
                                )
                                .await
                                .and_then(|raw_comments| parse_comments(raw_comments, &post.id))
                            {
                                Ok(comments) => post.comments = comments,
                                Err(e) => {
                                    warn!("Comments unavailable for post {}: {}", post.id, e)
                                }
                            }
                            fetched_any_comments = true;
                        }
                        posts.push(post);
                    }
                    Err(e) => warn!("Skipping malformed post entry in {}: {}", source, e),
                },
                other => warn!("Skipping listing child of kind '{}' in {}", other, source),
            }
        }

        Ok(FetchResult::new(source, posts, 1))
    }
}

/// The comments endpoint returns `[post_listing, comment_listing]`;
/// only `t1` children of the second listing are real comments.
pub(crate) fn parse_comments(raw: Value, post_id: &str) -> Result<Vec<Comment>, CoreError> {
    let listings: Vec<ListingEnvelope> =
        serde_json::from_value(raw).map_err(|e| RedditApiError::InvalidResponse {
            details: format!("Malformed comment payload for post {}: {}", post_id, e),
        })?;

    let Some(comment_listing) = listings.into_iter().nth(1) else {
        warn!("No comment listing returned for post {}", post_id);
        return Ok(vec![]);
    };

    let mut comments = Vec::new();
    for child in comment_listing.data.children {
        match child.kind.as_str() {
            "t1" => match serde_json::from_value::<RawComment>(child.data) {
                Ok(raw_comment) => comments.push(raw_comment.into_comment()),
                Err(e) => warn!("Skipping malformed comment on post {}: {}", post_id, e),
            },
            other => debug!("Skipping comment node of kind '{}'", other),
        }
    }
    Ok(comments)
}

/// Strategy B: a free-form markdown blob wrapped in
/// `{content: [{text}]}`. Sections split on `## ` headings become
/// posts; `### ` sub-blocks become their comments.
#[derive(Debug, Clone)]
pub struct MarkdownNormalizer {
    policy: NormalizationPolicy,
}

impl MarkdownNormalizer {
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self { policy }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        let policy = if config.lenient_markdown {
            NormalizationPolicy::Lenient
        } else {
            NormalizationPolicy::Strict
        };
        Self::new(policy)
    }

    fn posts_from_markdown(&self, text: &str, source: &SourceId) -> Result<Vec<Post>, CoreError> {
        if text.trim().is_empty() || text.len() < MIN_MARKDOWN_LEN {
            return match self.policy {
                NormalizationPolicy::Strict => Err(RedditApiError::InvalidResponse {
                    details: format!(
                        "Markdown content too short for {} ({} bytes)",
                        source,
                        text.len()
                    ),
                }
                .into()),
                NormalizationPolicy::Lenient => {
                    warn!(
                        "Insufficient markdown content for {}. Using placeholder posts.",
                        source
                    );
                    Ok(placeholder_posts(source))
                }
            };
        }

        let now = chrono::Utc::now().timestamp();
        let mut posts = Vec::new();

        for (idx, section) in text.split("\n## ").enumerate() {
            if section.trim().is_empty() {
                continue;
            }

            // The leading section may not carry a heading at all
            let (title, body) = if idx == 0 && !section.starts_with("## ") {
                ("Main Content".to_string(), section.to_string())
            } else {
                let mut lines = section.lines();
                let title = lines.next().unwrap_or("").trim().replace("## ", "");
                let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
                (title, body)
            };

            let blocks: Vec<String> = body.split("\n### ").map(str::to_string).collect();
            let (content, comment_blocks) = if blocks.len() > 1 {
                (blocks[0].trim().to_string(), &blocks[1..])
            } else {
                (body, &blocks[..0])
            };

            let mut comments = Vec::new();
            for (comment_idx, block) in comment_blocks.iter().enumerate() {
                let mut lines = block.lines();
                let label = lines.next().unwrap_or("").trim().to_string();
                let rest = lines.collect::<Vec<_>>().join("\n").trim().to_string();
                comments.push(Comment {
                    id: format!("comment_{}_{}", idx, comment_idx),
                    content: format!("{}: {}", label, rest),
                    score: 50 - (comment_idx as i32 * 5),
                    author: DELETED_AUTHOR.to_string(),
                    created_at: now,
                });
            }

            posts.push(Post {
                id: format!("post_{}", idx),
                title,
                content,
                url: format!(
                    "https://www.reddit.com/r/{}/comments/{}",
                    source.as_str(),
                    idx
                ),
                score: 100 - (idx as i32 * 10),
                author: DELETED_AUTHOR.to_string(),
                comment_count: comments.len() as u32,
                created_at: now,
                comments,
            });
        }

        Ok(posts)
    }
}

impl Normalize for MarkdownNormalizer {
    async fn normalize(
        &self,
        raw: Value,
        source: &SourceId,
        _client: &RedditApiClient,
    ) -> Result<FetchResult, CoreError> {
        let text = raw
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|first| first.get("text"))
            .and_then(|text| text.as_str())
            .unwrap_or("");

        let posts = self.posts_from_markdown(text, source)?;
        Ok(FetchResult::new(source, posts, 1))
    }
}

fn placeholder_posts(source: &SourceId) -> Vec<Post> {
    let now = chrono::Utc::now().timestamp();
    (0..5)
        .map(|i| Post {
            id: format!("post_{}", i),
            title: format!("Sample post {} about challenges in {}", i, source),
            content: "Parents face many challenges with neurodivergent children. \
                 It's a struggle to find the right support and resources. \
                 The school system can be especially difficult to navigate. \
                 Finding time for self-care is a problem many parents mention."
                .to_string(),
            url: format!(
                "https://www.reddit.com/r/{}/comments/sample_{}",
                source.as_str(),
                i
            ),
            score: 100 - (i * 10),
            author: DELETED_AUTHOR.to_string(),
            comment_count: 2,
            created_at: now,
            comments: vec![
                Comment {
                    id: format!("comment_{}_1", i),
                    content: "I struggle with this too. It's so hard to find good resources."
                        .to_string(),
                    score: 50 - (i * 5),
                    author: DELETED_AUTHOR.to_string(),
                    created_at: now,
                },
                Comment {
                    id: format!("comment_{}_2", i),
                    content: "Have you tried this approach? It helped with our challenges."
                        .to_string(),
                    score: 30 - (i * 3),
                    author: DELETED_AUTHOR.to_string(),
                    created_at: now,
                },
            ],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> RedditApiClient {
        RedditApiClient::new(&AppConfig::default()).unwrap()
    }

    fn source() -> SourceId {
        SourceId::parse("test")
    }

    #[tokio::test]
    async fn test_markdown_sections_become_posts() {
        let normalizer = MarkdownNormalizer::new(NormalizationPolicy::Strict);
        let raw = json!({
            "content": [{
                "text": "## First Post\nBody A\n### C1\nHello\n\n## Second Post\nBody B"
            }]
        });

        let result = normalizer
            .normalize(raw, &source(), &test_client())
            .await
            .unwrap();

        assert_eq!(result.posts.len(), 2);
        assert_eq!(result.metadata.total_posts, 2);

        let first = &result.posts[0];
        assert_eq!(first.title, "First Post");
        assert_eq!(first.content, "Body A");
        assert_eq!(first.comments.len(), 1);
        assert_eq!(first.comments[0].content, "C1: Hello");

        let second = &result.posts[1];
        assert_eq!(second.title, "Second Post");
        assert_eq!(second.content, "Body B");
        assert!(second.comments.is_empty());
    }

    #[tokio::test]
    async fn test_markdown_leading_section_gets_synthetic_title() {
        let normalizer = MarkdownNormalizer::new(NormalizationPolicy::Strict);
        let raw = json!({
            "content": [{
                "text": "An introduction paragraph that stands before any heading at all.\n## Thread\nBody text"
            }]
        });

        let result = normalizer
            .normalize(raw, &source(), &test_client())
            .await
            .unwrap();

        assert_eq!(result.posts.len(), 2);
        assert_eq!(result.posts[0].title, "Main Content");
        assert_eq!(result.posts[1].title, "Thread");
    }

    #[tokio::test]
    async fn test_short_markdown_fails_in_strict_mode() {
        let normalizer = MarkdownNormalizer::new(NormalizationPolicy::Strict);
        let raw = json!({"content": [{"text": "too short"}]});

        let result = normalizer.normalize(raw, &source(), &test_client()).await;
        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::InvalidResponse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_short_markdown_degrades_in_lenient_mode() {
        let normalizer = MarkdownNormalizer::new(NormalizationPolicy::Lenient);
        let raw = json!({"content": [{"text": ""}]});

        let result = normalizer
            .normalize(raw, &source(), &test_client())
            .await
            .unwrap();

        assert_eq!(result.posts.len(), 5);
        assert_eq!(result.metadata.total_posts, 5);
        assert_eq!(result.posts[0].comments.len(), 2);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_listing_posts_without_comments() {
        let normalizer = ListingNormalizer::new(&AppConfig::default());
        let raw = json!({
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "abc",
                            "title": "A post",
                            "selftext": "Post body",
                            "author": "someone",
                            "permalink": "/r/test/comments/abc",
                            "score": 42,
                            "num_comments": 0,
                            "created_utc": 1700000000.0
                        }
                    },
                    {
                        "kind": "t5",
                        "data": {"id": "sub", "display_name": "test"}
                    }
                ]
            }
        });

        let result = normalizer
            .normalize(raw, &source(), &test_client())
            .await
            .unwrap();

        // The t5 child is skipped with a warning, not an error
        assert_eq!(result.posts.len(), 1);
        let post = &result.posts[0];
        assert_eq!(post.id, "abc");
        assert_eq!(post.url, "https://www.reddit.com/r/test/comments/abc");
        assert_eq!(post.score, 42);
        assert_eq!(post.created_at, 1700000000);
    }

    #[tokio::test]
    async fn test_listing_defaults_for_missing_fields() {
        let normalizer = ListingNormalizer::new(&AppConfig::default());
        let raw = json!({
            "data": {
                "children": [
                    {"kind": "t3", "data": {"id": "xyz"}}
                ]
            }
        });

        let result = normalizer
            .normalize(raw, &source(), &test_client())
            .await
            .unwrap();

        let post = &result.posts[0];
        assert_eq!(post.title, "");
        assert_eq!(post.author, DELETED_AUTHOR);
        assert_eq!(post.comment_count, 0);
    }

    #[tokio::test]
    async fn test_malformed_listing_is_an_error() {
        let normalizer = ListingNormalizer::new(&AppConfig::default());
        let raw = json!({"unexpected": "shape"});

        let result = normalizer.normalize(raw, &source(), &test_client()).await;
        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::InvalidResponse { .. }))
        ));
    }

    #[test]
    fn test_parse_comments_filters_non_comment_kinds() {
        let raw = json!([
            {"data": {"children": [{"kind": "t3", "data": {"id": "abc"}}]}},
            {"data": {"children": [
                {"kind": "t1", "data": {"id": "c1", "body": "First comment", "author": "a", "score": 5, "created_utc": 1.0}},
                {"kind": "more", "data": {"count": 10}},
                {"kind": "t1", "data": {"id": "c2", "body": "Second comment", "score": 2}}
            ]}}
        ]);

        let comments = parse_comments(raw, "abc").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "First comment");
        // Missing author defaults to the deleted sentinel
        assert_eq!(comments[1].author, DELETED_AUTHOR);
    }

    #[test]
    fn test_parse_comments_missing_listing_is_empty() {
        let raw = json!([{"data": {"children": []}}]);
        let comments = parse_comments(raw, "abc").unwrap();
        assert!(comments.is_empty());
    }
}
