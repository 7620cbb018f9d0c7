//! Data models and structures
//!
//! Defines the story segment returned to clients, the generation settings
//! sent to the language model, and the service configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Prefix used to synthesize an illustration when the model output is not JSON.
pub const FALLBACK_ILLUSTRATION_PREFIX: &str = "A scene from the story: ";

/// Number of characters of raw model output kept in a fallback illustration.
pub const FALLBACK_ILLUSTRATION_CHARS: usize = 100;

/// One generated story beat with its reader question and illustration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorySegment {
    pub text: String,
    pub emotion: String,
    pub question: String,
    pub answers: Vec<String>,
    pub explanation: String,
    pub illustration: String,
    #[serde(default, skip_deserializing)]
    pub image: Option<GeneratedImage>,
}

impl StorySegment {
    /// Interpret raw model output, wrapping it as plain narrative when it is
    /// not a JSON object of the expected shape.
    pub fn from_model_output(raw: &str) -> Self {
        match serde_json::from_str::<StorySegment>(raw) {
            Ok(segment) => segment,
            Err(e) => {
                tracing::warn!("Model output is not a story segment, wrapping as text: {}", e);
                Self::fallback(raw)
            }
        }
    }

    pub fn fallback(raw: &str) -> Self {
        let excerpt: String = raw.chars().take(FALLBACK_ILLUSTRATION_CHARS).collect();

        Self {
            text: raw.to_string(),
            emotion: String::new(),
            question: String::new(),
            answers: Vec::new(),
            explanation: String::new(),
            illustration: format!("{}{}", FALLBACK_ILLUSTRATION_PREFIX, excerpt),
            image: None,
        }
    }
}

/// Image returned by the image-generation provider.
///
/// OpenAI returns a hosted `url` (or base64 when asked), Gemini always returns
/// inline base64 data with its MIME type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Story language. Only the exact code `Eng` selects English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Ukrainian,
}

impl Language {
    pub const ENGLISH_CODE: &'static str = "Eng";

    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(Self::ENGLISH_CODE) => Language::English,
            _ => Language::Ukrainian,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => Self::ENGLISH_CODE,
            Language::Ukrainian => "Ua",
        }
    }
}

/// Sampling parameters for the language model (`generationConfig`).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Safety thresholds applied to every story request.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::HarmCategoryHarassment,
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryDangerousContent,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    fn parse(value: &str) -> crate::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(crate::Error::Config(format!(
                "Unknown IMAGE_PROVIDER '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }

    fn default_image_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "dall-e-3",
            AiProvider::Gemini => "gemini-2.5-flash-image",
        }
    }
}

// Configuration
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub image_provider: AiProvider,
    pub image_model: String,
    pub bind_addr: SocketAddr,
    pub generation: GenerationParams,
    pub safety_settings: Vec<SafetySetting>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = var("GEMINI_API_KEY")
            .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let image_provider = match var("IMAGE_PROVIDER") {
            Some(value) => AiProvider::parse(&value)?,
            None => AiProvider::OpenAi,
        };

        let openai_api_key = var("OPENAI_API_KEY");
        if image_provider == AiProvider::OpenAi && openai_api_key.is_none() {
            return Err(crate::Error::Config(
                "OPENAI_API_KEY not set (required for IMAGE_PROVIDER=openai)".to_string(),
            ));
        }

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| crate::Error::Config(format!("Invalid BIND_ADDR: {}", e)))?;

        Ok(Self {
            gemini_api_key,
            openai_api_key,
            chat_model: var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            image_model: var("IMAGE_MODEL")
                .unwrap_or_else(|| image_provider.default_image_model().to_string()),
            image_provider,
            bind_addr,
            generation: GenerationParams::default(),
            safety_settings: default_safety_settings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parses_well_formed_segment() {
        let raw = r#"{"text":"Once upon a time","emotion":"calm","question":"What next?","answers":["run","hide"],"explanation":"choice matters","illustration":"a forest at dawn"}"#;

        let segment = StorySegment::from_model_output(raw);

        assert_eq!(
            segment,
            StorySegment {
                text: "Once upon a time".to_string(),
                emotion: "calm".to_string(),
                question: "What next?".to_string(),
                answers: vec!["run".to_string(), "hide".to_string()],
                explanation: "choice matters".to_string(),
                illustration: "a forest at dawn".to_string(),
                image: None,
            }
        );
    }

    #[test]
    fn test_model_supplied_image_key_is_ignored() {
        let raw = r#"{"text":"t","emotion":"","question":"","answers":[],"explanation":"","illustration":"i","image":{"url":"http://evil"}}"#;

        let segment = StorySegment::from_model_output(raw);
        assert_eq!(segment.illustration, "i");
        assert!(segment.image.is_none());
    }

    #[test]
    fn test_plain_text_falls_back() {
        let segment = StorySegment::from_model_output("Якось");

        assert_eq!(segment.text, "Якось");
        assert_eq!(segment.emotion, "");
        assert_eq!(segment.question, "");
        assert!(segment.answers.is_empty());
        assert_eq!(segment.explanation, "");
        assert_eq!(segment.illustration, "A scene from the story: Якось");
    }

    #[test]
    fn test_fallback_truncates_to_100_characters_not_bytes() {
        let raw = "ї".repeat(150);

        let segment = StorySegment::fallback(&raw);

        assert_eq!(segment.text, raw);
        assert_eq!(
            segment.illustration,
            format!("A scene from the story: {}", "ї".repeat(100))
        );
    }

    #[test]
    fn test_json_with_wrong_shape_falls_back() {
        let raw = r#"{"text":"only text"}"#;
        let segment = StorySegment::from_model_output(raw);
        assert_eq!(segment.text, raw);
        assert!(segment.illustration.starts_with(FALLBACK_ILLUSTRATION_PREFIX));
    }

    #[test]
    fn test_language_selection() {
        assert_eq!(Language::from_code(Some("Eng")), Language::English);
        assert_eq!(Language::from_code(Some("Ua")), Language::Ukrainian);
        assert_eq!(Language::from_code(Some("")), Language::Ukrainian);
        assert_eq!(Language::from_code(Some("eng")), Language::Ukrainian);
        assert_eq!(Language::from_code(Some("English")), Language::Ukrainian);
        assert_eq!(Language::from_code(None), Language::Ukrainian);
    }

    #[test]
    fn test_generation_params_serialize_camel_case() {
        let json = serde_json::to_value(GenerationParams::default()).unwrap();
        assert_eq!(json["topK"], 32);
        assert_eq!(json["maxOutputTokens"], 8192);
        assert_eq!(json["topP"], 1.0);
    }

    #[test]
    fn test_safety_settings_block_medium_and_above() {
        let json = serde_json::to_value(default_safety_settings()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
            ])
        );
    }

    #[test]
    fn test_config_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "g"), ("OPENAI_API_KEY", "o")]))
                .unwrap();

        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.image_provider, AiProvider::OpenAi);
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.safety_settings.len(), 4);
    }

    #[test]
    fn test_config_gemini_image_provider_needs_no_openai_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "g"),
            ("IMAGE_PROVIDER", "Gemini"),
        ]))
        .unwrap();

        assert_eq!(config.image_provider, AiProvider::Gemini);
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_config_requires_gemini_key() {
        let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "o")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_requires_openai_key_for_openai_images() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "g")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_config_rejects_unknown_provider() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "g"),
            ("IMAGE_PROVIDER", "midjourney"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_rejects_bad_bind_addr() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
            ("BIND_ADDR", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
