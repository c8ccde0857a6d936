// src/providers/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Instant;

use crate::config::GeminiConfig;
use crate::errors::{Result, ServiceError};
use crate::providers::{LlmProvider, Role, Turn};

/// A provider for interacting with Google's Gemini models.
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`, or `None` when no API key is configured.
    pub fn new(client: Client, config: &GeminiConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            client,
            api_base: config.api_base.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn request_body(conversation: &[Turn]) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = conversation
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.text }] })
            })
            .collect();
        json!({ "contents": contents })
    }

    fn extract_text(response_json: &serde_json::Value) -> Result<String> {
        if let Some(error) = response_json.get("error") {
            return Err(ServiceError::ApiResponse(error.to_string()));
        }

        let output = response_json
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .ok_or_else(|| ServiceError::UnexpectedResponse(response_json.to_string()))?;

        if output.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        Ok(output)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    /// Calls the Gemini API with a conversation and returns the model's response text and latency.
    async fn generate(&self, conversation: &[Turn]) -> Result<(String, u64)> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );

        log::info!("Calling Gemini: {} ({} turns)", url, conversation.len());

        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(conversation))
            .send()
            .await?;

        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        log::info!("Gemini response status: {} ({}ms)", status, latency_ms);

        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(ServiceError::ApiError {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let response_json: serde_json::Value = resp.json().await?;
        let output = Self::extract_text(&response_json)?;

        Ok((output, latency_ms))
    }
}
