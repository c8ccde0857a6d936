// src/assessment/mod.rs
//! Rule-based DSA assessment: a question bank, blueprint-driven test
//! selection, per-type answer scoring and a readiness report.

use rand::Rng;
use serde::Serialize;

pub mod attempts;
pub mod bank;
pub mod report;
pub mod scoring;
pub mod selector;

pub use attempts::{AttemptStore, InMemoryAttemptStore};
pub use bank::{BankQuestion, Difficulty, PublicBankQuestion, QuestionBank, QuestionType};
pub use report::{AttemptReport, Readiness, StudentFeatures};
pub use scoring::{AnswerRecord, ScoredAnswer};
pub use selector::{Blueprint, DifficultyMode, Selection};

/// Default time budget of a generated test, in seconds.
pub const DEFAULT_TIME_LIMIT_SEC: u32 = 1500;

#[derive(Debug, Serialize)]
pub struct TestMeta {
    pub total_questions: usize,
    pub total_time_sec: u32,
    pub difficulty_mode: DifficultyMode,
    pub topics_covered: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedTest<'a> {
    pub test_meta: TestMeta,
    pub questions: Vec<PublicBankQuestion<'a>>,
}

/// Draws a test from the bank with the default blueprint.
pub fn generate_test<'a, R>(
    bank: &'a QuestionBank,
    mode: DifficultyMode,
    time_limit_sec: u32,
    rng: &mut R,
) -> GeneratedTest<'a>
where
    R: Rng + ?Sized,
{
    let selection = selector::select_questions(bank.questions(), &Blueprint::default(), time_limit_sec, mode, rng);

    GeneratedTest {
        test_meta: TestMeta {
            total_questions: selection.questions.len(),
            total_time_sec: selection.total_time_sec,
            difficulty_mode: selection.difficulty_mode,
            topics_covered: selection.topics_covered().into_iter().map(str::to_string).collect(),
        },
        questions: selection.questions.into_iter().map(BankQuestion::public_view).collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct FinishedTest {
    pub level: Readiness,
    pub features: StudentFeatures,
    pub paragraph: String,
    pub evaluation: AttemptReport,
}

/// Scores a finished test. `None` when no answer refers to a known question.
pub fn finish_test(bank: &QuestionBank, answers: &[AnswerRecord]) -> Option<FinishedTest> {
    let results = scoring::evaluate_attempts(bank, answers);
    let features = StudentFeatures::from_results(&results)?;
    let level = features.level();

    Some(FinishedTest {
        level,
        paragraph: report::generate_paragraph(&features, level),
        features,
        evaluation: report::evaluate_attempt(bank, answers),
    })
}
