//! Story segment generation.
//!
//! One request runs two sequential provider calls: the language model writes
//! the segment, then the image model illustrates it. Provider failures are
//! reported as a [`StoryOutcome::Failure`], never propagated to the caller.

use crate::ai::{
    ChatService, GeminiChatClient, GeminiImageClient, ImageGenerationService, OpenAiImageClient,
};
use crate::models::{AiProvider, Config, Language, StorySegment};
use crate::{prompts, Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

pub const IMAGE_SIZE: &str = "1024x1024";
pub const IMAGE_QUALITY: &str = "standard";

/// Result of one `/create_novel` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoryOutcome {
    Success(StorySegment),
    Failure { error: String },
}

impl StoryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StoryOutcome::Success(_))
    }
}

/// Generates illustrated story segments from the configured providers.
#[derive(Clone)]
pub struct StoryService {
    chat: Arc<dyn ChatService>,
    image_gen: Arc<dyn ImageGenerationService>,
}

impl StoryService {
    pub fn new(chat: Arc<dyn ChatService>, image_gen: Arc<dyn ImageGenerationService>) -> Self {
        Self { chat, image_gen }
    }

    /// Build the provider clients described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        info!("Chat provider: Gemini (model: {})", config.chat_model);
        let chat = GeminiChatClient::new_with_client(
            config.gemini_api_key.clone(),
            config.chat_model.clone(),
            http_client.clone(),
        )
        .with_settings(config.generation.clone(), config.safety_settings.clone());

        let image_gen: Arc<dyn ImageGenerationService> = match config.image_provider {
            AiProvider::OpenAi => {
                let api_key = config.openai_api_key.clone().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY is required for OpenAI images".to_string())
                })?;
                info!("Image provider: OpenAI (model: {})", config.image_model);
                Arc::new(OpenAiImageClient::new_with_client(
                    api_key,
                    config.image_model.clone(),
                    http_client,
                ))
            }
            AiProvider::Gemini => {
                info!("Image provider: Gemini (model: {})", config.image_model);
                Arc::new(GeminiImageClient::new_with_client(
                    config.gemini_api_key.clone(),
                    config.image_model.clone(),
                    http_client,
                ))
            }
        };

        Ok(Self::new(Arc::new(chat), image_gen))
    }

    pub async fn create_novel(&self, language: Language) -> StoryOutcome {
        match self.generate_segment(language).await {
            Ok(segment) => StoryOutcome::Success(segment),
            Err(e) => {
                error!("Story generation failed: {}", e);
                StoryOutcome::Failure {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn generate_segment(&self, language: Language) -> Result<StorySegment> {
        let raw = self
            .chat
            .generate_text(prompts::create_novel(language))
            .await?;

        let mut segment = StorySegment::from_model_output(&raw);
        info!(
            "Story text generated ({} chars, {} answers)",
            segment.text.chars().count(),
            segment.answers.len()
        );

        let image_prompt = prompts::image_prompt(&segment.illustration);
        let image = self
            .image_gen
            .generate_image(&image_prompt, IMAGE_SIZE, IMAGE_QUALITY)
            .await?;

        segment.image = Some(image);
        Ok(segment)
    }
}
