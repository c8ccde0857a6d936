// src/assessment/attempts.rs
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::scoring::AnswerRecord;
use crate::errors::Result;

/// Answers saved while a test is in progress, keyed by user.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Appends an answer and returns how many the user has saved so far.
    async fn record_answer(&self, user_id: &str, answer: AnswerRecord) -> Result<usize>;

    /// Every saved answer for the user, oldest first.
    async fn answers(&self, user_id: &str) -> Result<Vec<AnswerRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    answers: RwLock<HashMap<String, Vec<AnswerRecord>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn record_answer(&self, user_id: &str, answer: AnswerRecord) -> Result<usize> {
        let mut answers = self.answers.write().await;
        let saved = answers.entry(user_id.to_string()).or_default();
        saved.push(answer);
        Ok(saved.len())
    }

    async fn answers(&self, user_id: &str) -> Result<Vec<AnswerRecord>> {
        Ok(self.answers.read().await.get(user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer(question_id: &str) -> AnswerRecord {
        AnswerRecord {
            question_id: question_id.to_string(),
            answer: json!("x"),
            time: 10.0,
        }
    }

    #[tokio::test]
    async fn test_answers_are_kept_per_user_in_order() {
        let store = InMemoryAttemptStore::new();

        assert_eq!(store.record_answer("alice", answer("q1")).await.unwrap(), 1);
        assert_eq!(store.record_answer("bob", answer("q9")).await.unwrap(), 1);
        assert_eq!(store.record_answer("alice", answer("q2")).await.unwrap(), 2);

        let ids: Vec<String> = store
            .answers("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.question_id)
            .collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert!(store.answers("carol").await.unwrap().is_empty());
    }
}
