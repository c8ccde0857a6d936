// src/api/handlers/questions.rs
use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::api::AppState;
use crate::catalog::PublicQuestion;
use crate::models::ApiError;

#[derive(Serialize)]
pub struct LevelResponse<'a> {
    pub number: u32,
    pub level: &'a str,
    pub questions: Vec<PublicQuestion<'a>>,
}

/// GET /api/levels/{level}/questions
pub async fn get_level_questions(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let level = path
        .into_inner()
        .parse::<u32>()
        .ok()
        .and_then(|n| state.catalog.level(n));

    match level {
        Some(level) => Ok(HttpResponse::Ok().json(LevelResponse {
            number: level.number,
            level: &level.name,
            questions: level.questions.iter().map(|q| q.public_view()).collect(),
        })),
        None => Ok(HttpResponse::NotFound().json(ApiError::new("Level not found"))),
    }
}
