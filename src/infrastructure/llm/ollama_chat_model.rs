use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatModel, ChatModelError};

/// Chat adapter for an Ollama server's non-streaming generate endpoint.
pub struct OllamaChatModel {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaChatModel {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatModelError::ApiRequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn chat(&self, prompt: &str) -> Result<String, ChatModelError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::debug!(model = %self.model, "Sending prompt to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatModelError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatModelError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChatModelError::Timeout
            } else {
                ChatModelError::InvalidResponse(e.to_string())
            }
        })?;

        tracing::info!(chars = generated.response.len(), "Ollama reply received");

        Ok(generated.response)
    }
}

fn map_transport_error(e: reqwest::Error) -> ChatModelError {
    if e.is_timeout() {
        ChatModelError::Timeout
    } else {
        ChatModelError::ApiRequestFailed(e.to_string())
    }
}
