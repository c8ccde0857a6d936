// src/assessment/scoring.rs
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bank::{BankQuestion, Difficulty, QuestionBank, QuestionType};

/// Seconds assumed for an answer that does not say how long it took.
pub const DEFAULT_ANSWER_TIME_SEC: f64 = 60.0;

const MSQ_PASS: f64 = 0.6;
const FREE_TEXT_PASS: f64 = 0.4;
const REFERENCE_PREFIX_CHARS: usize = 10;

/// One saved answer. `answer` is whatever the client sent: a string, a list
/// of selected options, or `{"output": ...}` for code traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    #[serde(default, alias = "user_answer")]
    pub answer: Value,
    #[serde(default = "default_time")]
    pub time: f64,
}

fn default_time() -> f64 {
    DEFAULT_ANSWER_TIME_SEC
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAnswer {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub topic: String,
    pub difficulty: Difficulty,
    pub is_correct: bool,
    pub time: f64,
    /// Fraction of the question earned, in `0.0..=1.0`.
    pub score: f64,
    pub feedback: String,
}

/// Keeps the last answer given to each question, in order of first answer.
pub fn latest_answers(answers: &[AnswerRecord]) -> Vec<&AnswerRecord> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&AnswerRecord> = Vec::new();

    for answer in answers {
        match position.get(answer.question_id.as_str()) {
            Some(&i) => latest[i] = answer,
            None => {
                position.insert(&answer.question_id, latest.len());
                latest.push(answer);
            }
        }
    }

    latest
}

/// Scores the latest answer per question. Answers to questions the bank does
/// not know are skipped.
pub fn evaluate_attempts(bank: &QuestionBank, answers: &[AnswerRecord]) -> Vec<ScoredAnswer> {
    latest_answers(answers)
        .into_iter()
        .filter_map(|answer| match bank.get(&answer.question_id) {
            Some(question) => Some(score_answer(question, answer)),
            None => {
                log::debug!("Skipping answer to unknown question {}", answer.question_id);
                None
            }
        })
        .collect()
}

pub fn score_answer(question: &BankQuestion, answer: &AnswerRecord) -> ScoredAnswer {
    let (score, is_correct, feedback) = match question.question_type {
        QuestionType::Mcq => score_mcq(question, &answer.answer),
        QuestionType::Msq => score_msq(question, &answer.answer),
        QuestionType::ShortAnswer | QuestionType::Reasoning => score_free_text(question, &answer.answer),
        QuestionType::CodeTrace => score_code_trace(question, &answer.answer),
    };

    ScoredAnswer {
        question_id: question.id.clone(),
        question_type: question.question_type,
        topic: question.topic.clone(),
        difficulty: question.difficulty,
        is_correct,
        time: answer.time,
        score,
        feedback,
    }
}

fn score_mcq(question: &BankQuestion, answer: &Value) -> (f64, bool, String) {
    let chosen = choices(answer);
    let correct: BTreeSet<&str> = question.correct_answer.iter().map(|s| s.trim()).collect();

    if !chosen.is_empty() && chosen == correct {
        (1.0, true, "Correct".to_string())
    } else {
        (0.0, false, "Incorrect".to_string())
    }
}

/// Partial credit per correct option picked; wrong picks cost nothing.
fn score_msq(question: &BankQuestion, answer: &Value) -> (f64, bool, String) {
    let chosen = choices(answer);
    let correct: BTreeSet<&str> = question.correct_answer.iter().map(|s| s.trim()).collect();

    let matched = correct.intersection(&chosen).count();
    let score = matched as f64 / correct.len() as f64;
    (score, score >= MSQ_PASS, format!("{}/{} options correct", matched, correct.len()))
}

fn score_free_text(question: &BankQuestion, answer: &Value) -> (f64, bool, String) {
    let Some(text) = answer_text(answer).filter(|t| !t.trim().is_empty()) else {
        return (0.0, false, "No answer given".to_string());
    };
    let text = text.to_lowercase();

    let (score, feedback) = if question.expected_keywords.is_empty() {
        // Without keywords, look for the start of the reference answer.
        let reference = question
            .ideal_answer
            .as_deref()
            .or(question.correct_answer.first().map(String::as_str))
            .unwrap_or_default()
            .to_lowercase();
        let prefix: String = reference.chars().take(REFERENCE_PREFIX_CHARS).collect();
        let score = if text.contains(&prefix) { 0.5 } else { 0.2 };
        (score, "Compared with the reference answer".to_string())
    } else {
        let total = question.expected_keywords.len();
        let matched = question
            .expected_keywords
            .iter()
            .filter(|k| text.contains(&k.to_lowercase()))
            .count();
        (matched as f64 / total as f64, format!("Covered {} of {} key concepts", matched, total))
    };

    (score, score >= FREE_TEXT_PASS, feedback)
}

fn score_code_trace(question: &BankQuestion, answer: &Value) -> (f64, bool, String) {
    let output = match answer {
        Value::Object(map) => map.get("output").and_then(answer_text),
        other => answer_text(other),
    };
    let Some(output) = output else {
        return (0.0, false, "No answer given".to_string());
    };

    let expected = question.correct_answer.first().map(|s| s.trim()).unwrap_or_default();
    if output.trim() == expected {
        (1.0, true, "Correct output".to_string())
    } else {
        (0.0, false, "Incorrect output".to_string())
    }
}

/// Selected options as a set: a single string is one choice.
fn choices(answer: &Value) -> BTreeSet<&str> {
    match answer {
        Value::String(s) => [s.trim()].into_iter().filter(|s| !s.is_empty()).collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::trim).collect(),
        _ => BTreeSet::new(),
    }
}

fn answer_text(answer: &Value) -> Option<String> {
    match answer {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(answer_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => Some(other.to_string()),
    }
}
