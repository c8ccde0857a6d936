// src/api/handlers/submissions.rs
use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::errors::ServiceError;
use crate::judge::CaseResult;
use crate::models::error_response;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub code: String,
    pub question_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub code: String,
    pub question_id: String,
    /// Defaults to the level the question belongs to.
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub success: bool,
    pub results: Vec<CaseResult>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub results: Vec<CaseResult>,
    pub is_completed: bool,
}

/// POST /api/run - judge the sample case only
pub async fn run_code(
    state: web::Data<AppState>,
    req: web::Json<RunRequest>,
) -> Result<HttpResponse> {
    let Some(question) = state.catalog.find_question(&req.question_id) else {
        return Ok(error_response(&ServiceError::QuestionNotFound(req.question_id.clone())));
    };

    match state.judge.run_sample(&req.code, question).await {
        Ok(result) => Ok(HttpResponse::Ok().json(RunResponse {
            success: result.passed,
            results: vec![result],
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /api/submit - judge every case and record the attempt
pub async fn submit_code(
    state: web::Data<AppState>,
    req: web::Json<SubmitRequest>,
) -> Result<HttpResponse> {
    let Some(question) = state.catalog.find_question(&req.question_id) else {
        return Ok(error_response(&ServiceError::QuestionNotFound(req.question_id.clone())));
    };

    let verdict = match state.judge.run_full(&req.code, question).await {
        Ok(verdict) => verdict,
        Err(e) => return Ok(error_response(&e)),
    };

    let level = req.level.unwrap_or(question.level);
    match state
        .progress
        .record_attempt(level, &question.id, verdict.all_passed)
        .await
    {
        Ok(entry) => log::info!(
            "Recorded attempt {} for {} (passed: {})",
            entry.attempts,
            entry.question_id,
            entry.passed
        ),
        Err(e) => log::error!("Failed to record progress for {}: {}", question.id, e),
    }

    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: verdict.all_passed,
        is_completed: verdict.all_passed,
        results: verdict.results,
    }))
}
