// src/api/handlers/assessment.rs
use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::assessment::{self, AnswerRecord, DifficultyMode, DEFAULT_TIME_LIMIT_SEC};
use crate::errors::ServiceError;
use crate::models::{error_response, ApiError};

#[derive(Deserialize)]
pub struct SubmitAssessmentRequest {
    #[serde(default)]
    pub answers: serde_json::Value,
}

/// POST /api/assessment/generate
pub async fn generate_assessment(state: web::Data<AppState>) -> Result<HttpResponse> {
    let assessment = state.assistant.generate_assessment().await;
    Ok(HttpResponse::Ok().json(assessment))
}

/// POST /api/assessment/submit
pub async fn submit_assessment(
    state: web::Data<AppState>,
    req: web::Json<SubmitAssessmentRequest>,
) -> Result<HttpResponse> {
    let report = state.assistant.grade_assessment(&req.answers).await;
    Ok(HttpResponse::Ok().json(report))
}

#[derive(Deserialize)]
pub struct GenerateTestRequest {
    #[serde(default)]
    pub difficulty_mode: DifficultyMode,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SEC
}

#[derive(Deserialize)]
pub struct SubmitAnswerRequest {
    pub user_id: String,
    #[serde(default)]
    pub attempt_id: Option<String>,
    #[serde(flatten)]
    pub record: AnswerRecord,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct SubmitAttemptRequest {
    pub user_id: String,
    /// Used only when nothing was saved through /submit-answer.
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
}

/// POST /api/generate-test - draw a rule-based test from the bank
pub async fn generate_test(
    state: web::Data<AppState>,
    req: Option<web::Json<GenerateTestRequest>>,
) -> Result<HttpResponse> {
    let (mode, time_limit) = match req {
        Some(req) => (req.difficulty_mode, req.time_limit),
        None => (DifficultyMode::default(), DEFAULT_TIME_LIMIT_SEC),
    };

    let test = assessment::generate_test(&state.bank, mode, time_limit, &mut rand::thread_rng());
    log::info!(
        "Generated {:?} test: {} questions, {}s",
        mode,
        test.test_meta.total_questions,
        test.test_meta.total_time_sec
    );
    Ok(HttpResponse::Ok().json(test))
}

/// POST /api/submit-answer - save one answer of a running test
pub async fn submit_answer(
    state: web::Data<AppState>,
    req: web::Json<SubmitAnswerRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    if state.bank.get(&req.record.question_id).is_none() {
        return Ok(error_response(&ServiceError::QuestionNotFound(req.record.question_id)));
    }

    match state.attempts.record_answer(&req.user_id, req.record).await {
        Ok(saved) => {
            log::debug!(
                "Saved answer {} for {} (attempt {:?})",
                saved,
                req.user_id,
                req.attempt_id
            );
            Ok(HttpResponse::Ok().json(json!({ "status": "saved" })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /api/finish-test?user_id= - score the saved answers
pub async fn finish_test(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    match state.attempts.answers(&query.user_id).await {
        Ok(answers) => Ok(finished_response(&state, &answers)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// POST /api/submit-attempt - score saved answers, or the ones in the body
pub async fn submit_attempt(
    state: web::Data<AppState>,
    req: web::Json<SubmitAttemptRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let saved = match state.attempts.answers(&req.user_id).await {
        Ok(saved) => saved,
        Err(e) => return Ok(error_response(&e)),
    };

    let answers = if saved.is_empty() { req.answers } else { saved };
    Ok(finished_response(&state, &answers))
}

fn finished_response(state: &AppState, answers: &[AnswerRecord]) -> HttpResponse {
    match assessment::finish_test(&state.bank, answers) {
        Some(finished) => {
            log::info!(
                "Assessment finished: {} ({}% accuracy)",
                finished.level,
                finished.features.accuracy
            );
            HttpResponse::Ok().json(finished)
        }
        None => HttpResponse::BadRequest().json(ApiError::new("No answers submitted")),
    }
}
