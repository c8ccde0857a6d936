// src/config.rs
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::errors::{Result, ServiceError};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_INTERPRETER: &str = "python3";
const DEFAULT_TIMEOUT_MS: u64 = 3000;
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_GEMINI_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the Gemini provider.
///
/// The API key is optional: without one every assistant feature answers with
/// its static fallback text.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound for one generation request, connect included.
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Same endpoint and model, different key. Used for per-request keys.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..self.clone()
        }
    }
}

/// How submitted programs are run.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub interpreter: String,
    pub timeout: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// High-level application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub execution: ExecutionConfig,
    pub catalog_path: Option<PathBuf>,
    /// Rule-based assessment questions; the embedded bank when unset.
    pub assessment_bank_path: Option<PathBuf>,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ServiceError::Config(format!("PORT must be a port number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        let timeout_ms = positive_millis(&non_empty, "EXECUTION_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;

        let execution = ExecutionConfig {
            interpreter: non_empty("PYTHON_INTERPRETER")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            timeout: Duration::from_millis(timeout_ms),
        };

        let gemini = GeminiConfig {
            api_base: non_empty("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            request_timeout: Duration::from_millis(positive_millis(&non_empty, "GEMINI_TIMEOUT_MS", DEFAULT_GEMINI_TIMEOUT_MS)?),
        };

        Ok(AppConfig {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            execution,
            catalog_path: non_empty("CATALOG_PATH").map(PathBuf::from),
            assessment_bank_path: non_empty("ASSESSMENT_BANK_PATH").map(PathBuf::from),
            gemini,
        })
    }
}

fn positive_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let millis = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ServiceError::Config(format!("{} must be an integer, got '{}'", key, raw)))?,
        None => default,
    };
    if millis == 0 {
        return Err(ServiceError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(millis)
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is valid"));

/// Simple template renderer using regex.
/// Placeholders are in the format `{{key}}`; unknown keys are left in place.
pub fn render_template(template: &str, data: &serde_json::Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            data.get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}
