// src/assessment/bank.rs
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogAssets;
use crate::errors::{Result, ServiceError};

const EMBEDDED_BANK: &str = "assessment_bank.toml";

const DEFAULT_WEIGHT: f64 = 1.0;
const DEFAULT_MAX_TIME_SEC: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Mcq,
    Msq,
    CodeTrace,
    ShortAnswer,
    Reasoning,
}

impl QuestionType {
    /// Free-text types, graded by keyword coverage.
    pub fn is_conceptual(self) -> bool {
        matches!(self, QuestionType::ShortAnswer | QuestionType::Reasoning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_max_time_sec")]
    pub max_time_sec: u32,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn default_max_time_sec() -> u32 {
    DEFAULT_MAX_TIME_SEC
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            max_time_sec: DEFAULT_MAX_TIME_SEC,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankQuestion {
    pub id: String,
    #[serde(default)]
    pub track: String,
    pub topic: String,
    #[serde(default)]
    pub subtopic: String,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub correct_answer: Vec<String>,
    #[serde(default)]
    pub ideal_answer: Option<String>,
    #[serde(default, alias = "keywords")]
    pub expected_keywords: Vec<String>,
    #[serde(default)]
    pub user_explanation_required: bool,
    #[serde(default)]
    pub evaluation: Evaluation,
}

impl BankQuestion {
    pub fn weight(&self) -> f64 {
        self.evaluation.weight
    }

    pub fn max_time_sec(&self) -> u32 {
        self.evaluation.max_time_sec
    }

    /// The question as a candidate sees it: no answers, no keywords.
    pub fn public_view(&self) -> PublicBankQuestion<'_> {
        PublicBankQuestion {
            id: &self.id,
            track: &self.track,
            topic: &self.topic,
            subtopic: &self.subtopic,
            difficulty: self.difficulty,
            question_type: self.question_type,
            question: &self.question,
            options: &self.options,
            user_explanation_required: self.user_explanation_required,
            code: match self.question_type {
                QuestionType::CodeTrace => self.code.as_deref(),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
impl BankQuestion {
    pub(crate) fn stub(
        id: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        topic: &str,
        weight: f64,
        max_time_sec: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            track: "DSA".to_string(),
            topic: topic.to_string(),
            subtopic: String::new(),
            difficulty,
            question_type,
            question: format!("Question {}", id),
            options: Vec::new(),
            code: None,
            correct_answer: Vec::new(),
            ideal_answer: None,
            expected_keywords: Vec::new(),
            user_explanation_required: false,
            evaluation: Evaluation { weight, max_time_sec },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicBankQuestion<'a> {
    pub id: &'a str,
    pub track: &'a str,
    pub topic: &'a str,
    pub subtopic: &'a str,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub question: &'a str,
    pub options: &'a [String],
    pub user_explanation_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    questions: Vec<BankQuestion>,
}

/// Read-only pool the assessment draws from.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<BankQuestion>,
}

impl QuestionBank {
    pub fn embedded() -> Result<Self> {
        let asset = CatalogAssets::get(EMBEDDED_BANK)
            .ok_or_else(|| ServiceError::QuestionBank(format!("embedded {} is missing", EMBEDDED_BANK)))?;
        let text = std::str::from_utf8(&asset.data)
            .map_err(|e| ServiceError::QuestionBank(format!("embedded bank is not UTF-8: {}", e)))?;
        Self::from_toml_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: BankFile = toml::from_str(text)?;
        Self::from_questions(file.questions)
    }

    pub fn from_questions(questions: Vec<BankQuestion>) -> Result<Self> {
        let mut ids = HashSet::new();

        for question in &questions {
            if !ids.insert(question.id.as_str()) {
                return Err(ServiceError::QuestionBank(format!("question id '{}' defined twice", question.id)));
            }
            let needs_answer = matches!(
                question.question_type,
                QuestionType::Mcq | QuestionType::Msq | QuestionType::CodeTrace
            );
            if needs_answer && question.correct_answer.is_empty() {
                return Err(ServiceError::QuestionBank(format!(
                    "question '{}' has no correct_answer",
                    question.id
                )));
            }
            if question.weight().is_nan() || question.weight() <= 0.0 {
                return Err(ServiceError::QuestionBank(format!(
                    "question '{}' must have a positive weight",
                    question.id
                )));
            }
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[BankQuestion] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&BankQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_bank_loads() {
        let bank = QuestionBank::embedded().unwrap();

        assert!(bank.len() >= 30);
        for qtype in [
            QuestionType::Mcq,
            QuestionType::Msq,
            QuestionType::CodeTrace,
            QuestionType::ShortAnswer,
            QuestionType::Reasoning,
        ] {
            assert!(bank.questions().iter().any(|q| q.question_type == qtype), "{:?}", qtype);
        }
        let trace = bank.get("CT-REC-01").unwrap();
        assert_eq!(trace.correct_answer, vec!["24"]);
        assert!(trace.code.as_deref().unwrap().contains("func(x - 1)"));
    }

    #[test]
    fn test_defaults_and_keyword_alias() {
        let bank = QuestionBank::from_toml_str(
            r#"
[[questions]]
id = "SA-1"
topic = "Arrays"
difficulty = "Easy"
question_type = "SHORT_ANSWER"
question = "Why?"
keywords = ["index"]
"#,
        )
        .unwrap();
        let question = bank.get("SA-1").unwrap();

        assert_eq!(question.expected_keywords, vec!["index"]);
        assert_eq!(question.weight(), 1.0);
        assert_eq!(question.max_time_sec(), 60);
    }

    #[test]
    fn test_public_view_hides_answers() {
        let bank = QuestionBank::embedded().unwrap();

        let trace = serde_json::to_value(bank.get("CT-REC-01").unwrap().public_view()).unwrap();
        assert_eq!(trace["question_type"], "CODE_TRACE");
        assert!(trace.get("correct_answer").is_none());
        assert!(trace["code"].as_str().is_some());

        let short = serde_json::to_value(bank.get("SA-ARR-01").unwrap().public_view()).unwrap();
        assert!(short.get("expected_keywords").is_none());
        assert!(short.get("ideal_answer").is_none());
        assert!(short.get("code").is_none());
    }

    #[test]
    fn test_rejects_invalid_banks() {
        let missing_answer = r#"
[[questions]]
id = "MCQ-1"
topic = "Arrays"
difficulty = "Easy"
question_type = "MCQ"
question = "Pick one"
options = ["a", "b"]
"#;
        assert!(matches!(
            QuestionBank::from_toml_str(missing_answer),
            Err(ServiceError::QuestionBank(_))
        ));

        let duplicate = r#"
[[questions]]
id = "SA-1"
topic = "Arrays"
difficulty = "Easy"
question_type = "SHORT_ANSWER"
question = "Why?"

[[questions]]
id = "SA-1"
topic = "Trees"
difficulty = "Hard"
question_type = "REASONING"
question = "How?"
"#;
        assert!(matches!(
            QuestionBank::from_toml_str(duplicate),
            Err(ServiceError::QuestionBank(_))
        ));
    }
}
