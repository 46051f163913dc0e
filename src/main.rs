use anyhow::Context;
use idea_engine::{IdeaEngine, Platform};
use insight_core::error_utils::ErrorExt;
use insight_core::{AppConfig, SourceId};
use pain_analyzer::PainPointExtractor;
use reddit_scraper::Scraper;
use std::path::Path;

const CONFIG_PATH: &str = "config.toml";
const DEFAULT_SUBREDDIT: &str = "autismparenting";
const MAX_DISPLAYED_POINTS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reddit_insight=info,reddit_scraper=info".into()),
        )
        .init();

    tracing::info!("Starting Reddit Insight - community pain point analysis");

    let mut config = if Path::new(CONFIG_PATH).exists() {
        AppConfig::load(Path::new(CONFIG_PATH))
            .with_context(|| format!("failed to load {CONFIG_PATH}"))?
    } else {
        AppConfig::default()
    };
    if config.openai_api_key.is_none() {
        config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    config.validate().context("invalid configuration")?;

    let subreddits: Vec<String> = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.is_empty() {
            vec![DEFAULT_SUBREDDIT.to_string()]
        } else {
            args
        }
    };

    let scraper = Scraper::listing(&config)?;
    let extractor = PainPointExtractor::new();
    let engine = IdeaEngine::new(&config)?;

    for subreddit in &subreddits {
        println!("=== r/{subreddit} ===");

        let result = match scraper.run(subreddit, 1, true).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Scrape failed for r/{}: {}", subreddit, e);
                println!("  {}", e.user_friendly_message());
                continue;
            }
        };

        println!(
            "Fetched {} posts ({} pages)",
            result.metadata.total_posts, result.metadata.pages_scraped
        );

        let pain_points = extractor.extract_from_result(&result);
        println!("\nFound {} pain points:", pain_points.len());
        for (i, point) in pain_points.iter().take(MAX_DISPLAYED_POINTS).enumerate() {
            println!("{}. {}", i + 1, point);
        }

        let source = SourceId::parse(&result.metadata.subreddit);
        let ideas = engine.synthesize(&source, &pain_points, Platform::All).await;

        println!("\nTikTok ideas:");
        for idea in &ideas.tiktok {
            println!("- {idea}");
        }
        println!("\nInstagram ideas:");
        for idea in &ideas.instagram {
            println!("- {idea}");
        }
        println!();
    }

    Ok(())
}
