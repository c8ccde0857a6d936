// src/api/handlers/mentor.rs
use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::assistant::ChatMessage;
use crate::errors::ServiceError;
use crate::models::error_response;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    #[serde(default)]
    pub code: String,
    pub question_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub code: String,
    pub question_id: String,
    #[serde(default)]
    pub role: Option<String>,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Overrides the server's Gemini key for this request.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// POST /api/hint
pub async fn get_hint(
    state: web::Data<AppState>,
    req: web::Json<HintRequest>,
) -> Result<HttpResponse> {
    let Some(question) = state.catalog.find_question(&req.question_id) else {
        return Ok(error_response(&ServiceError::QuestionNotFound(req.question_id.clone())));
    };

    let hint = state
        .assistant
        .hint(question, &req.code, req.role.as_deref())
        .await;
    Ok(HttpResponse::Ok().json(json!({ "hint": hint })))
}

/// POST /api/chat
pub async fn chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let Some(question) = state.catalog.find_question(&req.question_id) else {
        return Ok(error_response(&ServiceError::QuestionNotFound(req.question_id.clone())));
    };

    let reply = state
        .assistant_for_key(req.api_key.as_deref())
        .chat(question, &req.code, req.role.as_deref(), &req.message, &req.history)
        .await;
    Ok(HttpResponse::Ok().json(json!({ "reply": reply })))
}
