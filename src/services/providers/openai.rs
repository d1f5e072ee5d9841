/// OpenAI chat completions provider
///
/// Posts to `{api_url}/chat/completions` with JSON-object response format so
/// the model answers with a single JSON document.
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    error::{AppError, AppResult},
    models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat},
    services::providers::CompletionProvider,
};

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            temperature: 0.7,
            max_tokens: 1000,
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat::json_object(),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited(
                "Completion API is rate limiting requests".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "openai",
                "Completion request failed"
            );
            return Err(AppError::ExternalApi(
                "Failed to get recommendations from AI".to_string(),
            ));
        }

        let response_text = response.text().await?;

        let completion: ChatCompletionResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    response = %response_text,
                    "Failed to deserialize completion response"
                );
                AppError::ExternalApi("Invalid response from AI".to_string())
            })?;

        let content = completion.into_content().ok_or_else(|| {
            tracing::error!(
                response = %response_text,
                "Completion response has no message content"
            );
            AppError::ExternalApi("Invalid response from AI".to_string())
        })?;

        tracing::info!(
            model = %self.model,
            content_len = content.len(),
            provider = "openai",
            "Completion received"
        );

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
