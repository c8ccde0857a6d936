// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML catalog: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("API returned an error: {0}")]
    ApiResponse(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Received empty text response from model")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid question catalog: {0}")]
    Catalog(String),

    #[error("Invalid assessment question bank: {0}")]
    QuestionBank(String),

    #[error("Question '{0}' not found")]
    QuestionNotFound(String),

    /// The judge itself could not run the program (interpreter missing,
    /// temporary file not writable). Never a grading outcome.
    #[error("Code execution unavailable: {0}")]
    Infrastructure(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
