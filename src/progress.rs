// src/progress.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::Result;

/// Points awarded for each passed question.
pub const POINTS_PER_QUESTION: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub level: u32,
    pub question_id: String,
    /// Outcome of the latest submission.
    pub passed: bool,
    pub attempts: u32,
    pub last_attempt_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub total_score: u32,
    pub details: Vec<ProgressEntry>,
}

impl ProgressReport {
    pub fn from_entries(details: Vec<ProgressEntry>) -> Self {
        let total_score = details.iter().filter(|e| e.passed).count() as u32 * POINTS_PER_QUESTION;
        Self { total_score, details }
    }
}

/// Per-user pass/attempt ledger.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Records one submission and returns the updated entry.
    async fn record_attempt(&self, level: u32, question_id: &str, passed: bool) -> Result<ProgressEntry>;

    /// All entries, ordered by level then question id.
    async fn entries(&self) -> Result<Vec<ProgressEntry>>;
}

#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    entries: RwLock<BTreeMap<(u32, String), ProgressEntry>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn record_attempt(&self, level: u32, question_id: &str, passed: bool) -> Result<ProgressEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry((level, question_id.to_string()))
            .or_insert_with(|| ProgressEntry {
                level,
                question_id: question_id.to_string(),
                passed: false,
                attempts: 0,
                last_attempt_at: String::new(),
            });

        entry.passed = passed;
        entry.attempts += 1;
        entry.last_attempt_at = chrono::Utc::now().to_rfc3339();

        Ok(entry.clone())
    }

    async fn entries(&self) -> Result<Vec<ProgressEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attempts_accumulate_and_latest_outcome_wins() {
        let store = InMemoryProgressStore::new();

        store.record_attempt(3, "L3_Q1", false).await.unwrap();
        let entry = store.record_attempt(3, "L3_Q1", true).await.unwrap();

        assert_eq!(entry.attempts, 2);
        assert!(entry.passed);

        let entry = store.record_attempt(3, "L3_Q1", false).await.unwrap();
        assert_eq!(entry.attempts, 3);
        assert!(!entry.passed);
    }

    #[tokio::test]
    async fn test_entries_are_ordered() {
        let store = InMemoryProgressStore::new();
        store.record_attempt(3, "L3_Q2", true).await.unwrap();
        store.record_attempt(1, "L1-SIM-1", true).await.unwrap();
        store.record_attempt(3, "L3_Q1", false).await.unwrap();

        let ids: Vec<String> = store
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.question_id)
            .collect();

        assert_eq!(ids, vec!["L1-SIM-1", "L3_Q1", "L3_Q2"]);
    }

    #[tokio::test]
    async fn test_report_scores_passed_questions() {
        let store = InMemoryProgressStore::new();
        store.record_attempt(1, "L1-SIM-1", true).await.unwrap();
        store.record_attempt(1, "L1-SIM-2", false).await.unwrap();
        store.record_attempt(3, "L3_Q5", true).await.unwrap();

        let report = ProgressReport::from_entries(store.entries().await.unwrap());

        assert_eq!(report.total_score, 20);
        assert_eq!(report.details.len(), 3);
    }
}
