//! AI service integration for story and illustration generation
//!
//! Provides interfaces to Gemini's `generateContent` API for story text, and
//! to OpenAI or Gemini image models for the illustration.

pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::{GeminiChatClient, GeminiImageClient};
pub use mock::{MockChatClient, MockImageGenerationClient};
pub use openai::OpenAiImageClient;

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;

/// Text-generation provider used for story segments.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Image-generation provider used for story illustrations.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str, size: &str, quality: &str)
        -> Result<GeneratedImage>;
}
