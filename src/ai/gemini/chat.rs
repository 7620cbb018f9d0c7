use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::ChatService;
use crate::models::{default_safety_settings, GenerationParams, SafetySetting};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationParams,
    safety_settings: &'a [SafetySetting],
}

pub struct GeminiChatClient {
    http: GeminiHttpClient,
    generation: GenerationParams,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::from_http(GeminiHttpClient::new(api_key, model, REQUEST_TIMEOUT))
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self::from_http(GeminiHttpClient::new_with_client(
            api_key,
            model,
            REQUEST_TIMEOUT,
            client,
        ))
    }

    fn from_http(http: GeminiHttpClient) -> Self {
        Self {
            http,
            generation: GenerationParams::default(),
            safety_settings: default_safety_settings(),
        }
    }

    /// Replace the sampling parameters and safety thresholds sent with every request.
    pub fn with_settings(
        mut self,
        generation: GenerationParams,
        safety_settings: Vec<SafetySetting>,
    ) -> Self {
        self.generation = generation;
        self.safety_settings = safety_settings;
        self
    }

    /// Joined text parts of the first candidate, `None` when it carries no text part.
    ///
    /// An empty text part is still content and yields `Some("")`.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let mut texts = response
            .first_parts()
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .peekable();

        texts.peek()?;
        Some(texts.collect())
    }
}

super::impl_with_gemini_base_url!(GeminiChatClient);

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: &self.generation,
            safety_settings: &self.safety_settings,
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(&response).ok_or_else(|| {
            let reason = response.missing_content_reason();
            tracing::warn!("Gemini ({}) returned no text: {}", self.http.model(), reason);
            Error::AiProvider(format!("No text in Gemini chat response: {}", reason))
        })
    }
}
