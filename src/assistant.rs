// src/assistant.rs
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::Question;
use crate::config::render_template;
use crate::errors::{Result, ServiceError};
use crate::progress::ProgressEntry;
use crate::providers::{LlmProvider, Role, Turn};

const SENIOR_DEVELOPER: &str = "Senior Developer";
const QA_ENGINEER: &str = "QA Engineer";

const HINT_TEMPLATE: &str = r#"
{{persona}}

Question Title: {{title}}
Description: {{description}}

Here is the student's current code:
```python
{{code}}
```

Give a short, 1-3 sentence hint. Limit giving direct answers, instead guide their thought process.
"#;

const CHAT_TEMPLATE: &str = r#"
{{persona}}

Context:
Question Title: {{title}}
Description: {{description}}

Student's current code:
```python
{{code}}
```

You must respond as a real team member in a chat interface. Keep responses concise and conversational (1-3 sentences max). NEVER reveal the full code solution. Let the user figure it out.
"#;

const CHAT_PRIMER: &str = "Understood. I will act as a helpful team member reviewing their code.";
const CHAT_NO_KEY: &str = "I lack an AI brain! Please connect a GEMINI API KEY via the settings!";
const CHAT_UNAVAILABLE: &str =
    "I'm currently unable to chat because there's an issue with the AI key or Google genai network connection!";

const HINT_FALLBACK_QA: &str =
    "Have you considered what happens if the input array is completely empty or contains negative numbers?";
const HINT_FALLBACK: &str =
    "Look closely at your loop logic. Are you iterating over all the necessary elements? Think about constraints.";

const NO_ATTEMPTS_REPORT: &str =
    "You haven't attempted any challenges yet. Start coding to generate an AI performance report!";

const REPORT_TEMPLATE: &str = "Give a short 2-3 paragraph performance review of a coding student with the following stats. Sound encouraging but professional like a Senior Developer giving feedback. \n\n{{summary}}";

const ASSESSMENT_PROMPT: &str = r#"Generate a 3-question software engineering assessment containing exactly ONE "CODE_TRACE" question (where they must read a python snippet and explain the output), ONE "MCQ" question about algorithmic time complexity, and ONE "SHORT_ANSWER" question about system design. Return the result strictly in valid JSON format matching this schema:
{
   "questions": [
       { "id": "q1", "topic": "...", "difficulty": "...", "question_type": "CODE_TRACE|MCQ|SHORT_ANSWER", "question": "...", "code": "optional python code...", "options": ["opt1 if MCQ..."] }
   ]
}
Return ONLY valid JSON. Do not include markdown backticks."#;

const GRADING_TEMPLATE: &str = r#"Act as an expert technical interviewer. Review the user's answers to an assessment.
User's provided answers JSON context:
{{answers}}

Give a fair grade and a 2-3 paragraph summary report.
Limit your entire response exclusively to the text report."#;

const GRADED_SUMMARY: &str = "AI Engine Evaluation Complete";
const OFFLINE_SUMMARY: &str = "Static Evaluation Complete (Offline Fallback)";
const OFFLINE_GRADING_REPORT: &str = "Due to missing AI credentials, we cannot accurately grade your answers dynamically. However, your payload was successfully serialized and received format validation. Connect your Gemini API Key in the `.env` file to unlock dynamic test grading and custom code execution analysis!";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("code fence pattern is valid"));

/// One prior message of a chat, as sent by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: String,
    pub topic: String,
    pub difficulty: String,
    pub question_type: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub questions: Vec<AssessmentQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    pub summary: String,
    pub report_text: String,
}

/// Generative-text features. Every call falls back to static text when no
/// provider is configured or the provider fails.
#[derive(Clone, Default)]
pub struct Assistant {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl Assistant {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn is_online(&self) -> bool {
        self.provider.is_some()
    }

    async fn ask(&self, conversation: &[Turn]) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ServiceError::Config("no generative API key configured".to_string()))?;
        let (text, _latency_ms) = provider.generate(conversation).await?;
        Ok(text)
    }

    async fn ask_or(&self, prompt: &str, feature: &str, fallback: impl FnOnce() -> String) -> String {
        match self.ask(&[Turn::user(prompt)]).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{} generation failed, using fallback: {}", feature, e);
                fallback()
            }
        }
    }

    pub async fn hint(&self, question: &Question, code: &str, role: Option<&str>) -> String {
        let prompt = render_template(
            HINT_TEMPLATE,
            &json!({
                "persona": hint_persona(role),
                "title": question.title,
                "description": question.description,
                "code": code,
            }),
        );

        self.ask_or(&prompt, "Hint", || {
            let fallback = if role == Some(QA_ENGINEER) { HINT_FALLBACK_QA } else { HINT_FALLBACK };
            fallback.to_string()
        })
        .await
    }

    pub async fn chat(
        &self,
        question: &Question,
        code: &str,
        role: Option<&str>,
        message: &str,
        history: &[ChatMessage],
    ) -> String {
        if !self.is_online() {
            return CHAT_NO_KEY.to_string();
        }

        let system_prompt = render_template(
            CHAT_TEMPLATE,
            &json!({
                "persona": chat_persona(role),
                "title": question.title,
                "description": question.description,
                "code": code,
            }),
        );

        let mut conversation = vec![Turn::user(system_prompt), Turn::model(CHAT_PRIMER)];
        conversation.extend(history.iter().map(|msg| Turn {
            role: if msg.role == "user" { Role::User } else { Role::Model },
            text: msg.content.clone(),
        }));
        conversation.push(Turn::user(message));

        match self.ask(&conversation).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Chat generation failed: {}", e);
                CHAT_UNAVAILABLE.to_string()
            }
        }
    }

    pub async fn performance_report(&self, entries: &[ProgressEntry]) -> String {
        if entries.is_empty() {
            return NO_ATTEMPTS_REPORT.to_string();
        }

        let stats = PerformanceStats::from_entries(entries);
        let prompt = render_template(REPORT_TEMPLATE, &json!({ "summary": stats.summary() }));

        self.ask_or(&prompt, "Performance report", || stats.fallback_report()).await
    }

    pub async fn generate_assessment(&self) -> Assessment {
        let parsed = match self.ask(&[Turn::user(ASSESSMENT_PROMPT)]).await {
            Ok(raw) => parse_assessment(&raw),
            Err(e) => Err(e),
        };

        parsed.unwrap_or_else(|e| {
            log::warn!("Assessment generation failed, using static test: {}", e);
            static_assessment()
        })
    }

    pub async fn grade_assessment(&self, answers: &serde_json::Value) -> AssessmentReport {
        let answers_json = serde_json::to_string_pretty(answers).unwrap_or_else(|_| answers.to_string());
        let prompt = render_template(GRADING_TEMPLATE, &json!({ "answers": answers_json }));

        match self.ask(&[Turn::user(prompt)]).await {
            Ok(report_text) => AssessmentReport {
                summary: GRADED_SUMMARY.to_string(),
                report_text,
            },
            Err(e) => {
                log::warn!("Assessment grading failed, using offline report: {}", e);
                AssessmentReport {
                    summary: OFFLINE_SUMMARY.to_string(),
                    report_text: OFFLINE_GRADING_REPORT.to_string(),
                }
            }
        }
    }
}

fn hint_persona(role: Option<&str>) -> &'static str {
    match role {
        Some(SENIOR_DEVELOPER) => "You are Sarah Chen, a Senior Developer. Give a high-level architectural hint or point out logical flaws in the approach. DO NOT provide the exact code solution. Be encouraging but expect them to figure out the syntax.",
        Some(QA_ENGINEER) => "You are Mike Johnson, a QA Engineer. Point out edge cases they might have missed, or explain why a test case might be failing based on their code. DO NOT provide the exact code solution. Focus on inputs and outputs.",
        _ => "You are an AI assistant. Give a subtle hint to guide the user towards the right answer without revealing the code.",
    }
}

fn chat_persona(role: Option<&str>) -> &'static str {
    match role {
        Some(SENIOR_DEVELOPER) => "You are Sarah Chen, a Senior Developer. Give high-level architectural guidance and point out logical flaws in the approach. DO NOT provide the exact code solution. Be encouraging but expect them to figure out the syntax.",
        Some(QA_ENGINEER) => "You are Mike Johnson, a QA Engineer. Point out edge cases they might have missed, or explain why a test case might be failing based on their code. DO NOT provide the exact code solution. Focus on inputs and outputs.",
        _ => "",
    }
}

struct PerformanceStats {
    total_attempts: u32,
    passed: usize,
    question_ids: Vec<String>,
}

impl PerformanceStats {
    fn from_entries(entries: &[ProgressEntry]) -> Self {
        Self {
            total_attempts: entries.iter().map(|e| e.attempts).sum(),
            passed: entries.iter().filter(|e| e.passed).count(),
            question_ids: entries.iter().map(|e| e.question_id.clone()).collect(),
        }
    }

    fn accuracy_percent(&self) -> u32 {
        if self.total_attempts == 0 {
            return 0;
        }
        (self.passed as f64 / self.total_attempts as f64 * 100.0).round() as u32
    }

    fn summary(&self) -> String {
        format!(
            "The user has attempted {} challenges and passed {}. They worked on questions: {}. Their accuracy is {}%.",
            self.total_attempts,
            self.passed,
            self.question_ids.join(", "),
            self.accuracy_percent()
        )
    }

    fn fallback_report(&self) -> String {
        format!(
            "Overall, you've shown a solid understanding based on the metrics. With an accuracy of {}% across {} total submissions, you've successfully passed {} modules! \n\nI recommend continuing to hone your fundamental typing constraints and reviewing edge cases in testing environments before submitting code. Keep pushing your skills and exploring more algorithms!",
            self.accuracy_percent(),
            self.total_attempts,
            self.passed
        )
    }
}

/// Parses model output that may be wrapped in Markdown code fences.
fn parse_assessment(raw: &str) -> Result<Assessment> {
    let cleaned = CODE_FENCE.replace_all(raw, "");
    Ok(serde_json::from_str(cleaned.trim())?)
}

fn static_assessment() -> Assessment {
    Assessment {
        questions: vec![
            AssessmentQuestion {
                id: "q1".to_string(),
                topic: "Recursion".to_string(),
                difficulty: "Medium".to_string(),
                question_type: "CODE_TRACE".to_string(),
                question: "What is the output of this code?".to_string(),
                code: Some("def func(x):\n  if x <= 1: return 1\n  return x * func(x - 1)\n\nprint(func(4))".to_string()),
                options: None,
            },
            AssessmentQuestion {
                id: "q2".to_string(),
                topic: "Big O".to_string(),
                difficulty: "Easy".to_string(),
                question_type: "MCQ".to_string(),
                question: "What is the time complexity of a nested for-loop over an array of size N comparing every element against every other?".to_string(),
                code: None,
                options: Some(vec![
                    "O(N)".to_string(),
                    "O(N log N)".to_string(),
                    "O(N^2)".to_string(),
                    "O(1)".to_string(),
                ]),
            },
            AssessmentQuestion {
                id: "q3".to_string(),
                topic: "Architecture".to_string(),
                difficulty: "Hard".to_string(),
                question_type: "SHORT_ANSWER".to_string(),
                question: "Explain the architectural difference between horizontally scaling and vertically scaling a database.".to_string(),
                code: None,
                options: None,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed text and remembers what it was asked.
    struct ScriptedProvider {
        reply: Option<String>,
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply.to_string()), seen: Mutex::new(Vec::new()) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: None, seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, conversation: &[Turn]) -> Result<(String, u64)> {
            self.seen.lock().unwrap().push(conversation.to_vec());
            match &self.reply {
                Some(text) => Ok((text.clone(), 5)),
                None => Err(ServiceError::ApiError { status: 503, body: "overloaded".to_string() }),
            }
        }
    }

    fn question() -> Question {
        crate::catalog::Catalog::embedded()
            .unwrap()
            .find_question("L1-SIM-1")
            .unwrap()
            .clone()
    }

    fn entry(id: &str, passed: bool, attempts: u32) -> ProgressEntry {
        ProgressEntry {
            level: 1,
            question_id: id.to_string(),
            passed,
            attempts,
            last_attempt_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_hint_uses_persona_and_code() {
        let provider = ScriptedProvider::replying("Count your loop iterations.");
        let assistant = Assistant::new(Some(provider.clone()));

        let hint = assistant.hint(&question(), "total = 0", Some("QA Engineer")).await;

        assert_eq!(hint, "Count your loop iterations.");
        let seen = provider.seen.lock().unwrap();
        let prompt = &seen[0][0].text;
        assert!(prompt.contains("Mike Johnson"));
        assert!(prompt.contains("total = 0"));
        assert!(prompt.contains("PayFlow Labs: Revenue Mismatch"));
    }

    #[tokio::test]
    async fn test_hint_fallback_depends_on_role() {
        let assistant = Assistant::new(Some(ScriptedProvider::failing()));

        assert_eq!(assistant.hint(&question(), "", Some("QA Engineer")).await, HINT_FALLBACK_QA);
        assert_eq!(assistant.hint(&question(), "", Some("Senior Developer")).await, HINT_FALLBACK);
        assert_eq!(Assistant::offline().hint(&question(), "", None).await, HINT_FALLBACK);
    }

    #[tokio::test]
    async fn test_chat_builds_conversation() {
        let provider = ScriptedProvider::replying("What happens to the last element?");
        let assistant = Assistant::new(Some(provider.clone()));
        let history = vec![
            ChatMessage { role: "user".into(), content: "hi".into() },
            ChatMessage { role: "assistant".into(), content: "hello".into() },
        ];

        let reply = assistant
            .chat(&question(), "code", Some("Senior Developer"), "is my loop right?", &history)
            .await;

        assert_eq!(reply, "What happens to the last element?");
        let seen = provider.seen.lock().unwrap();
        let roles: Vec<Role> = seen[0].iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model, Role::User, Role::Model, Role::User]);
        assert_eq!(seen[0][1].text, CHAT_PRIMER);
        assert_eq!(seen[0][4].text, "is my loop right?");
    }

    #[tokio::test]
    async fn test_chat_fallbacks() {
        assert_eq!(Assistant::offline().chat(&question(), "", None, "hi", &[]).await, CHAT_NO_KEY);
        assert_eq!(
            Assistant::new(Some(ScriptedProvider::failing()))
                .chat(&question(), "", None, "hi", &[])
                .await,
            CHAT_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_performance_report() {
        let offline = Assistant::offline();
        assert_eq!(offline.performance_report(&[]).await, NO_ATTEMPTS_REPORT);

        let entries = vec![entry("L3_Q1", true, 3), entry("L3_Q2", false, 1)];
        let fallback = offline.performance_report(&entries).await;
        assert!(fallback.contains("accuracy of 25% across 4 total submissions"));
        assert!(fallback.contains("passed 1 modules"));
        assert!(fallback.ends_with("Keep pushing your skills and exploring more algorithms!"));

        let provider = ScriptedProvider::replying("Great progress.");
        let online = Assistant::new(Some(provider.clone()));
        assert_eq!(online.performance_report(&entries).await, "Great progress.");
        let seen = provider.seen.lock().unwrap();
        assert!(seen[0][0].text.contains("They worked on questions: L3_Q1, L3_Q2."));
    }

    #[tokio::test]
    async fn test_generate_assessment_strips_fences() {
        let raw = "```json\n{\"questions\":[{\"id\":\"q1\",\"topic\":\"Graphs\",\"difficulty\":\"Hard\",\"question_type\":\"MCQ\",\"question\":\"BFS?\",\"options\":[\"a\",\"b\"]}]}\n```";
        let assistant = Assistant::new(Some(ScriptedProvider::replying(raw)));

        let assessment = assistant.generate_assessment().await;

        assert_eq!(assessment.questions.len(), 1);
        assert_eq!(assessment.questions[0].topic, "Graphs");
        assert_eq!(assessment.questions[0].options.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_assessment_falls_back_on_bad_json() {
        let assistant = Assistant::new(Some(ScriptedProvider::replying("Sure! Here are some questions")));

        let assessment = assistant.generate_assessment().await;

        assert_eq!(assessment, static_assessment());
        let types: Vec<&str> = assessment.questions.iter().map(|q| q.question_type.as_str()).collect();
        assert_eq!(types, vec!["CODE_TRACE", "MCQ", "SHORT_ANSWER"]);
    }

    #[tokio::test]
    async fn test_grade_assessment() {
        let answers = json!({ "q1": "24" });

        let offline = Assistant::offline().grade_assessment(&answers).await;
        assert_eq!(offline.summary, OFFLINE_SUMMARY);

        let provider = ScriptedProvider::replying("Grade: B+");
        let graded = Assistant::new(Some(provider.clone())).grade_assessment(&answers).await;
        assert_eq!(graded.summary, GRADED_SUMMARY);
        assert_eq!(graded.report_text, "Grade: B+");
        assert!(provider.seen.lock().unwrap()[0][0].text.contains("\"q1\": \"24\""));
    }
}
