// src/api/handlers/reports.rs
use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use serde_json::json;

use crate::api::AppState;
use crate::models::error_response;
use crate::progress::ProgressReport;

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ProgressReport,
}

/// GET /api/report - score and per-question attempts
pub async fn get_report(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.progress.entries().await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ReportResponse {
            success: true,
            report: ProgressReport::from_entries(entries),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// GET /api/generate-ai-report - narrative review of the ledger
pub async fn generate_ai_report(state: web::Data<AppState>) -> Result<HttpResponse> {
    let entries = match state.progress.entries().await {
        Ok(entries) => entries,
        Err(e) => return Ok(error_response(&e)),
    };

    let report = state.assistant.performance_report(&entries).await;
    Ok(HttpResponse::Ok().json(json!({ "report": report })))
}
