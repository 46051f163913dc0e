use crate::{IdeaGenerator, IdeaSet, Platform};
use insight_core::{CoreError, LlmError, SourceId};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: &str = "openai";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Idea generation backed by the OpenAI chat-completions endpoint, one
/// request per requested platform.
#[derive(Debug)]
pub struct OpenAiGenerator {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    /// Point the generator at a different endpoint, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn complete(&self, system: &str, prompt: String) -> Result<String, CoreError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Llm(LlmError::ServiceUnavailable {
                        provider: PROVIDER.to_string(),
                    })
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Llm(classify_status(status)));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            debug!("Failed to decode completion response: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            })
        })?;

        match parsed.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            })),
        }
    }
}

fn classify_status(status: StatusCode) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after: 60,
        },
        s if s.is_server_error() => LlmError::ServiceUnavailable {
            provider: PROVIDER.to_string(),
        },
        _ => LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
        },
    }
}

fn bullet_list(pain_points: &[String]) -> String {
    pain_points
        .iter()
        .map(|point| format!("- {}", point))
        .collect::<Vec<_>>()
        .join(", ")
}

fn tiktok_prompt(source: &SourceId, pain_points: &[String]) -> String {
    format!(
        "You are a creative social media content strategist for TikTok.\n\n\
         Based on the following pain points identified in the {} subreddit:\n{}\n\n\
         Create 3 engaging TikTok video ideas that would resonate with this audience.\n\
         Each idea should be specific, actionable, and structured in a way that works for TikTok's short format.\n\n\
         Format each idea as a one-sentence hook followed by a brief description of the video concept.\n\
         Do not include hashtags or emojis.",
        source,
        bullet_list(pain_points)
    )
}

fn instagram_prompt(source: &SourceId, pain_points: &[String]) -> String {
    format!(
        "You are a creative social media content strategist for Instagram.\n\n\
         Based on the following pain points identified in the {} subreddit:\n{}\n\n\
         Create 3 engaging Instagram content ideas that would resonate with this audience.\n\
         Consider both feed posts and reels. Ideas should be specific, actionable, and visually compelling.\n\n\
         Format each idea as a one-sentence hook followed by a brief description of the content concept.\n\
         Do not include hashtags or emojis.",
        source,
        bullet_list(pain_points)
    )
}

impl IdeaGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        source: &SourceId,
        pain_points: &[String],
        platform: Platform,
    ) -> Result<IdeaSet, CoreError> {
        let mut ideas = IdeaSet::default();

        if platform.wants_tiktok() {
            info!("Requesting TikTok content ideas for {}", source);
            let text = self
                .complete(
                    "You are a creative social media content strategist specialized in TikTok.",
                    tiktok_prompt(source, pain_points),
                )
                .await?;
            ideas.tiktok = parse_ideas(&text);
        }

        if platform.wants_instagram() {
            info!("Requesting Instagram content ideas for {}", source);
            let text = self
                .complete(
                    "You are a creative social media content strategist specialized in Instagram.",
                    instagram_prompt(source, pain_points),
                )
                .await?;
            ideas.instagram = parse_ideas(&text);
        }

        Ok(ideas)
    }
}

// Numbered items ("1. ", "2) ") or dash bullets open a new idea
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+[.)]|-)\s+(.*)").unwrap());

/// Parse free-form completion text into a list of ideas: numbered or
/// bulleted items with continuation lines folded in, falling back to
/// double-newline paragraphs, then to the whole text.
pub fn parse_ideas(text: &str) -> Vec<String> {
    let mut ideas = Vec::new();
    let mut current = String::new();

    for line in text.trim().lines() {
        let line = line.trim();
        if let Some(captures) = LIST_MARKER_RE.captures(line) {
            if !current.is_empty() {
                ideas.push(current.trim().to_string());
            }
            current = captures[1].trim().to_string();
        } else if !current.is_empty() && !line.is_empty() {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        ideas.push(current.trim().to_string());
    }

    if ideas.is_empty() {
        ideas = text
            .split("\n\n")
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }

    if ideas.is_empty() && !text.trim().is_empty() {
        ideas.push(text.trim().to_string());
    }

    ideas
}
