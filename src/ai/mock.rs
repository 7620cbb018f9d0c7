use super::{ChatService, ImageGenerationService};
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory [`ChatService`] that replays canned responses in order.
pub struct MockChatClient {
    text_responses: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            text_responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text_response(self, response: impl Into<String>) -> Self {
        self.text_responses.lock().unwrap().push(response.into());
        self
    }

    /// Make every call fail with an [`Error::AiProvider`] carrying `message`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.text_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(serde_json::json!({
                "text": "The lantern flickered as the door creaked open.",
                "emotion": "suspense",
                "question": "What did the lantern do?",
                "answers": ["It flickered", "It went out", "It exploded"],
                "explanation": "The text says the lantern flickered.",
                "illustration": "A dim hallway lit by a flickering lantern"
            })
            .to_string())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

/// A recorded call to [`MockImageGenerationClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCall {
    pub prompt: String,
    pub size: String,
    pub quality: String,
}

/// In-memory [`ImageGenerationService`] that records every request.
pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<GeneratedImage>>>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<ImageCall>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: GeneratedImage) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    /// Make every call fail with an [`Error::AiProvider`] carrying `message`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        quality: &str,
    ) -> Result<GeneratedImage> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ImageCall {
                prompt: prompt.to_string(),
                size: size.to_string(),
                quality: quality.to_string(),
            });
            calls.len()
        };

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(GeneratedImage {
                url: Some("https://images.example.com/mock.png".to_string()),
                ..GeneratedImage::default()
            })
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
