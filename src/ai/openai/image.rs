use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::ImageGenerationService;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: OpenAiHttpClient::new(api_key, REQUEST_TIMEOUT),
            model,
        }
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, REQUEST_TIMEOUT, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        quality: &str,
    ) -> Result<GeneratedImage> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: size.to_string(),
            quality: quality.to_string(),
        };

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        if image_data.url.is_none() && image_data.b64_json.is_none() {
            return Err(Error::AiProvider(
                "No image data (neither base64 nor URL) in response".to_string(),
            ));
        }

        Ok(GeneratedImage {
            url: image_data.url,
            b64_json: image_data.b64_json,
            mime_type: None,
            revised_prompt: image_data.revised_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> OpenAiImageClient {
        OpenAiImageClient::new("key".to_string(), "dall-e-3".to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_generate_image_returns_url_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(header("Authorization", "Bearer key"))
            .and(body_json(serde_json::json!({
                "model": "dall-e-3",
                "prompt": "a forest at dawn",
                "n": 1,
                "size": "1024x1024",
                "quality": "standard"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "created": 1700000000,
                "data": [{
                    "url": "https://images.example.com/forest.png",
                    "revised_prompt": "A misty forest at dawn"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = make_client(&server)
            .generate_image("a forest at dawn", "1024x1024", "standard")
            .await
            .unwrap();

        assert_eq!(
            image,
            GeneratedImage {
                url: Some("https://images.example.com/forest.png".to_string()),
                b64_json: None,
                mime_type: None,
                revised_prompt: Some("A misty forest at dawn".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_generate_image_handles_b64_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "b64_json": "iVBORw==" }]
            })))
            .mount(&server)
            .await;

        let image = make_client(&server)
            .generate_image("a dream", "1024x1024", "standard")
            .await
            .unwrap();
        assert_eq!(image.b64_json.as_deref(), Some("iVBORw=="));
        assert!(image.url.is_none());
    }

    #[tokio::test]
    async fn test_generate_image_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_image("a dream", "1024x1024", "standard")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("server error"));
    }

    #[tokio::test]
    async fn test_generate_image_rejects_empty_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_image("a dream", "1024x1024", "standard")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_generate_image_rejects_item_without_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "revised_prompt": "nothing" }]
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_image("a dream", "1024x1024", "standard")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
