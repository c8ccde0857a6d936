// src/api/routes.rs
use actix_web::web;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health_check))
            .route("/levels/{level}/questions", web::get().to(handlers::get_level_questions))
            .route("/run", web::post().to(handlers::run_code))
            .route("/submit", web::post().to(handlers::submit_code))
            .route("/report", web::get().to(handlers::get_report))
            .route("/generate-ai-report", web::get().to(handlers::generate_ai_report))
            .route("/hint", web::post().to(handlers::get_hint))
            .route("/chat", web::post().to(handlers::chat))
            .route("/generate-test", web::post().to(handlers::generate_test))
            .route("/submit-answer", web::post().to(handlers::submit_answer))
            .route("/finish-test", web::post().to(handlers::finish_test))
            .route("/submit-attempt", web::post().to(handlers::submit_attempt))
            .service(
                web::scope("/assessment")
                    .route("/generate", web::post().to(handlers::generate_assessment))
                    .route("/submit", web::post().to(handlers::submit_assessment))
            )
    );
}
