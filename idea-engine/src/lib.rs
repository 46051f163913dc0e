use insight_core::{AppConfig, CoreError, SourceId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub mod openai;
pub mod template;

pub use openai::OpenAiGenerator;
pub use template::TemplateGenerator;

/// At most this many pain points are handed to any generator, to keep
/// prompts and template output bounded.
pub const MAX_PAIN_POINTS: usize = 5;

/// Target platform for generated content ideas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    TikTok,
    Instagram,
    All,
}

impl Platform {
    pub fn wants_tiktok(&self) -> bool {
        matches!(self, Platform::TikTok | Platform::All)
    }

    pub fn wants_instagram(&self) -> bool {
        matches!(self, Platform::Instagram | Platform::All)
    }
}

/// Content ideas keyed by platform, each list ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeaSet {
    pub tiktok: Vec<String>,
    pub instagram: Vec<String>,
}

impl IdeaSet {
    pub fn is_empty(&self) -> bool {
        self.tiktok.is_empty() && self.instagram.is_empty()
    }
}

#[allow(async_fn_in_trait)]
pub trait IdeaGenerator {
    async fn generate(
        &self,
        source: &SourceId,
        pain_points: &[String],
        platform: Platform,
    ) -> Result<IdeaSet, CoreError>;
}

/// Idea synthesis entry point: prefers the completion service when an
/// API key is configured, falls back to templates on any failure.
pub struct IdeaEngine {
    service: Option<OpenAiGenerator>,
    templates: TemplateGenerator,
}

impl IdeaEngine {
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        let service = match &config.openai_api_key {
            Some(key) => Some(OpenAiGenerator::new(
                key.clone(),
                config.openai_model.clone(),
                config.request_timeout_secs,
            )?),
            None => {
                info!("No OpenAI API key configured, using template-based idea generation");
                None
            }
        };

        Ok(Self {
            service,
            templates: TemplateGenerator::new(),
        })
    }

    /// Template-only engine, used when no service should ever be called.
    pub fn template_only() -> Self {
        Self {
            service: None,
            templates: TemplateGenerator::new(),
        }
    }

    /// Engine backed by a specific service generator.
    pub fn with_service(service: OpenAiGenerator) -> Self {
        Self {
            service: Some(service),
            templates: TemplateGenerator::new(),
        }
    }

    /// Produce content ideas for the given pain points. Service failure
    /// is logged and recovered by template substitution; this method
    /// never returns an error to the pipeline.
    pub async fn synthesize(
        &self,
        source: &SourceId,
        pain_points: &[String],
        platform: Platform,
    ) -> IdeaSet {
        let bounded = &pain_points[..pain_points.len().min(MAX_PAIN_POINTS)];

        if !bounded.is_empty() {
            if let Some(service) = &self.service {
                match service.generate(source, bounded, platform).await {
                    Ok(ideas) => return ideas,
                    Err(e) => {
                        warn!(
                            "Idea generation via service failed for {}: {}. Falling back to templates",
                            source, e
                        );
                    }
                }
            }
        }

        self.templates.fill(bounded, platform)
    }
}
