use insight_core::{AppConfig, CoreError, RedditApiError};
use reddit_scraper::Scraper;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server_uri: &str, cache_dir: &Path) -> AppConfig {
    AppConfig {
        reddit_base_url: server_uri.to_string(),
        cache_dir: cache_dir.to_path_buf(),
        comment_delay_ms: 0,
        retry_base_delay_ms: 1,
        request_timeout_secs: 5,
        ..Default::default()
    }
}

fn listing_body() -> serde_json::Value {
    json!({
        "data": {
            "children": [
                {
                    "kind": "t3",
                    "data": {
                        "id": "abc",
                        "title": "Struggling with bedtime routines",
                        "selftext": "We have a problem with transitions every evening.",
                        "author": "tired_parent",
                        "permalink": "/r/parenting/comments/abc",
                        "score": 42,
                        "num_comments": 2,
                        "created_utc": 1700000000.0
                    }
                },
                {
                    "kind": "t3",
                    "data": {
                        "id": "def",
                        "title": "Weekly wins thread",
                        "selftext": "",
                        "author": "mod_bot",
                        "permalink": "/r/parenting/comments/def",
                        "score": 10,
                        "num_comments": 0,
                        "created_utc": 1700001000.0
                    }
                }
            ]
        }
    })
}

fn comments_body() -> serde_json::Value {
    json!([
        {"data": {"children": [{"kind": "t3", "data": {"id": "abc"}}]}},
        {"data": {"children": [
            {"kind": "t1", "data": {"id": "c1", "body": "Same here, it is so hard.", "author": "other_parent", "score": 7, "created_utc": 1700000100.0}},
            {"kind": "more", "data": {"count": 14}}
        ]}}
    ])
}

#[tokio::test]
async fn listing_fetch_attaches_comments() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/parenting/comments/abc.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments_body()))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("r/Parenting", 1, false).await.unwrap();

    assert_eq!(result.posts.len(), 2);
    assert_eq!(result.metadata.total_posts, result.posts.len());
    assert_eq!(result.metadata.subreddit, "parenting");
    assert!(result.error.is_none());

    let first = &result.posts[0];
    assert_eq!(first.comments.len(), 1, "non-comment kinds are filtered");
    assert_eq!(first.comments[0].author, "other_parent");
    assert!(result.posts[1].comments.is_empty());
}

#[tokio::test]
async fn cache_hit_issues_no_upstream_requests() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"children": [{
                "kind": "t3",
                "data": {"id": "abc", "title": "Cached post", "num_comments": 0}
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let first = scraper.run("parenting", 1, true).await.unwrap();
    let second = scraper.run("parenting", 1, true).await.unwrap();

    // Byte-identical results, zero upstream requests for the second call
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn corrupt_cache_falls_back_to_fresh_fetch() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"children": [{
                "kind": "t3",
                "data": {"id": "abc", "title": "Fresh post", "num_comments": 0}
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    std::fs::write(cache_dir.path().join("data_parenting.json"), "{broken json").unwrap();

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("parenting", 1, true).await.unwrap();
    assert_eq!(result.posts[0].title, "Fresh post");
}

#[tokio::test]
async fn forbidden_subreddit_fails_immediately() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/private_sub/hot.json"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("private_sub", 1, false).await;
    match result {
        Err(CoreError::RedditApi(err)) => {
            assert!(err.is_access_failure());
            assert!(matches!(err, RedditApiError::Forbidden { .. }));
        }
        other => panic!("Expected access failure, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn missing_subreddit_is_classified_apart_from_transport() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/doesnotexist/hot.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("doesnotexist", 1, false).await;
    match result {
        Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { subreddit })) => {
            assert_eq!(subreddit, "doesnotexist");
        }
        other => panic!("Expected SubredditNotFound, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn server_errors_are_retried_until_exhaustion() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("parenting", 1, false).await;
    assert!(matches!(
        result,
        Err(CoreError::RedditApi(RedditApiError::ServerError { status_code: 500 }))
    ));
}

#[tokio::test]
async fn markdown_payloads_flow_through_the_pipeline() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/focus/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{
                "text": "## First Post\nBody A\n### C1\nHello\n\n## Second Post\nBody B"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::markdown(&config).unwrap();

    let result = scraper.run("focus", 1, true).await.unwrap();

    assert_eq!(result.posts.len(), 2);
    assert_eq!(result.metadata.total_posts, 2);
    assert_eq!(result.posts[0].title, "First Post");
    assert_eq!(result.posts[0].comments.len(), 1);
    assert_eq!(result.posts[0].comments[0].content, "C1: Hello");
    assert_eq!(result.posts[1].title, "Second Post");
    assert!(result.posts[1].comments.is_empty());

    // The markdown result is cached like any other
    assert!(cache_dir.path().join("data_focus.json").exists());
}

#[tokio::test]
async fn rate_limit_retries_after_specified_delay() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/parenting/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"children": [{
                "kind": "t3",
                "data": {"id": "abc", "title": "After rate limit", "num_comments": 0}
            }]}
        })))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), cache_dir.path());
    let scraper = Scraper::listing(&config).unwrap();

    let result = scraper.run("parenting", 1, false).await.unwrap();
    assert_eq!(result.posts[0].title, "After rate limit");
}
