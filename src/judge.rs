// src/judge.rs
use serde::{Deserialize, Serialize};

use crate::catalog::{Question, TestCase};
use crate::errors::{Result, ServiceError};
use crate::executor::{ExecutionRequest, ExecutionResult, Executor};

/// Reported as the actual output of a case that ran out of time.
pub const TIMEOUT_MARKER: &str = "Execution Timeout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseKind {
    Sample,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    #[serde(rename = "type")]
    pub kind: CaseKind,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// Every case of one submission, in the order {sample, hidden...}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub results: Vec<CaseResult>,
    pub all_passed: bool,
}

impl Verdict {
    fn from_results(results: Vec<CaseResult>) -> Self {
        let all_passed = results.iter().all(|r| r.passed);
        Verdict { results, all_passed }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

/// Line endings become `\n`, surrounding whitespace is dropped.
pub fn normalize_output(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Grades submissions by running them against a question's cases.
#[derive(Debug, Clone)]
pub struct Judge {
    executor: Executor,
}

impl Judge {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Runs the question's sample case only.
    pub async fn run_sample(&self, source: &str, question: &Question) -> Result<CaseResult> {
        let sample = question
            .sample_case()
            .ok_or_else(|| ServiceError::Catalog(format!("question '{}' has no cases", question.id)))?;
        self.run_case(source, question, CaseKind::Sample, &sample).await
    }

    /// Runs the sample and then every hidden case, one at a time. A failing
    /// case does not stop the remaining ones.
    pub async fn run_full(&self, source: &str, question: &Question) -> Result<Verdict> {
        let mut results = Vec::with_capacity(question.hidden_cases().len() + 1);
        results.push(self.run_sample(source, question).await?);

        for case in question.hidden_cases() {
            results.push(self.run_case(source, question, CaseKind::Hidden, case).await?);
        }

        let verdict = Verdict::from_results(results);
        log::info!(
            "Judged {}: {}/{} cases passed",
            question.id,
            verdict.passed_count(),
            verdict.results.len()
        );
        Ok(verdict)
    }

    async fn run_case(
        &self,
        source: &str,
        question: &Question,
        kind: CaseKind,
        case: &TestCase,
    ) -> Result<CaseResult> {
        let request = ExecutionRequest::new(source, case.input.clone());

        let (actual, passed) = match self.executor.run(&request).await {
            // Simulation questions have no exact output to match.
            ExecutionResult::Completed { .. } if question.is_simulation() => (case.expected.clone(), true),
            ExecutionResult::Completed { stdout } => {
                let passed = outputs_match(&stdout, &case.expected);
                (stdout, passed)
            }
            ExecutionResult::Failed { diagnostic } => (diagnostic, false),
            ExecutionResult::TimedOut => (TIMEOUT_MARKER.to_string(), false),
            ExecutionResult::Unavailable { reason } => {
                log::error!("Cannot judge {} ({:?}): {}", question.id, kind, reason);
                return Err(ServiceError::Infrastructure(reason));
            }
        };

        Ok(CaseResult {
            kind,
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual,
            passed,
        })
    }
}
