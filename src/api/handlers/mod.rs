// src/api/handlers/mod.rs
mod health;
mod questions;
mod submissions;
mod reports;
mod mentor;
mod assessment;

pub use health::health_check;
pub use questions::get_level_questions;
pub use submissions::{run_code, submit_code};
pub use reports::{get_report, generate_ai_report};
pub use mentor::{get_hint, chat};
pub use assessment::{
    finish_test, generate_assessment, generate_test, submit_answer, submit_assessment, submit_attempt,
};
