// src/providers/mod.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub mod gemini;

/// Who said a turn of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// A common trait for Large Language Model (LLM) providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a reply to a conversation.
    ///
    /// # Arguments
    /// * `conversation` - The turns so far; the last one is normally the user's.
    ///
    /// # Returns
    /// A `Result` containing a tuple of the generated `String` and the latency in milliseconds (`u64`).
    async fn generate(&self, conversation: &[Turn]) -> Result<(String, u64)>;

    /// Single-prompt convenience.
    async fn complete(&self, prompt: &str) -> Result<(String, u64)> {
        self.generate(&[Turn::user(prompt)]).await
    }
}

/// HTTP client shared by the providers. A stalled upstream fails the request
/// after `timeout` instead of holding it open.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}
