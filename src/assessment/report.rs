// src/assessment/report.rs
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::bank::{QuestionBank, QuestionType};
use super::scoring::{latest_answers, score_answer, AnswerRecord, ScoredAnswer};

/// An answer in this many seconds or less earns full speed credit.
const TARGET_ANSWER_SEC: f64 = 60.0;
const STRONG_AREA: f64 = 70.0;
const SLOW_PACE: f64 = 60.0;
const STRONG_TOPIC: f64 = 75.0;
const WEAK_TOPIC: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    #[serde(rename = "Industry Ready")]
    IndustryReady,
    #[serde(rename = "Almost Ready")]
    AlmostReady,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Foundation Level")]
    FoundationLevel,
}

impl Readiness {
    pub fn as_str(self) -> &'static str {
        match self {
            Readiness::IndustryReady => "Industry Ready",
            Readiness::AlmostReady => "Almost Ready",
            Readiness::NeedsImprovement => "Needs Improvement",
            Readiness::FoundationLevel => "Foundation Level",
        }
    }

    fn verdict(self) -> &'static str {
        match self {
            Readiness::IndustryReady => "Candidate demonstrates strong system thinking and problem-solving.",
            Readiness::AlmostReady => "Candidate has solid fundamentals but needs refinement.",
            Readiness::NeedsImprovement => "Candidate shows partial understanding and needs structured practice.",
            Readiness::FoundationLevel => "Candidate requires foundational learning.",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_readiness(percent: f64) -> Readiness {
    if percent >= 85.0 {
        Readiness::IndustryReady
    } else if percent >= 65.0 {
        Readiness::AlmostReady
    } else if percent >= 40.0 {
        Readiness::NeedsImprovement
    } else {
        Readiness::FoundationLevel
    }
}

/// Skill profile derived from one test's scored answers. All scores are
/// percentages rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StudentFeatures {
    /// Share of answers judged correct.
    pub accuracy: f64,
    /// Mean score over short-answer and reasoning questions.
    pub conceptual_score: f64,
    /// Mean score over code-trace questions.
    pub logical_score: f64,
    pub speed_score: f64,
    pub avg_time: f64,
}

impl StudentFeatures {
    /// `None` when there is nothing to profile.
    pub fn from_results(results: &[ScoredAnswer]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let total = results.len() as f64;
        let correct = results.iter().filter(|r| r.is_correct).count() as f64;
        let avg_time = results.iter().map(|r| r.time).sum::<f64>() / total;

        let mean_percent = |scores: Vec<f64>| {
            if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64 * 100.0
            }
        };
        let conceptual = mean_percent(
            results
                .iter()
                .filter(|r| r.question_type.is_conceptual())
                .map(|r| r.score)
                .collect(),
        );
        let logical = mean_percent(
            results
                .iter()
                .filter(|r| r.question_type == QuestionType::CodeTrace)
                .map(|r| r.score)
                .collect(),
        );

        let speed = if avg_time > 0.0 {
            (TARGET_ANSWER_SEC / avg_time * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Some(Self {
            accuracy: round2(correct / total * 100.0),
            conceptual_score: round2(conceptual),
            logical_score: round2(logical),
            speed_score: round2(speed),
            avg_time: round2(avg_time),
        })
    }

    /// Readiness level for this profile, read off its accuracy.
    pub fn level(&self) -> Readiness {
        classify_readiness(self.accuracy)
    }
}

pub fn generate_summary(percent: f64, readiness: Readiness, strong: &[String], weak: &[String]) -> String {
    let mut summary = format!("Overall Performance: {}%.\nSkill Level: {}.\n", percent, readiness);

    if !strong.is_empty() {
        summary.push_str(&format!("Strong Areas: {}.\n", strong.join(", ")));
    }
    if !weak.is_empty() {
        summary.push_str(&format!("Needs Improvement: {}.\n", weak.join(", ")));
    }

    summary.push_str(readiness.verdict());
    summary
}

/// Short narrative of strengths and weaknesses for the candidate.
pub fn generate_paragraph(features: &StudentFeatures, level: Readiness) -> String {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    if features.conceptual_score > STRONG_AREA {
        strengths.push("conceptual understanding");
    } else {
        weaknesses.push("conceptual clarity");
    }
    if features.logical_score > STRONG_AREA {
        strengths.push("logical reasoning");
    } else {
        weaknesses.push("problem solving");
    }
    if features.speed_score < SLOW_PACE {
        weaknesses.push("time management");
    }

    let mut lines = vec![format!("Your current performance level is {}.", level)];
    if !strengths.is_empty() {
        lines.push(format!("You demonstrate strengths in {}.", strengths.join(", ")));
    }
    if !weaknesses.is_empty() {
        lines.push(format!("However, you need to focus more on {}.", weaknesses.join(", ")));
    }
    lines.push("Regular practice and timed tests will help you improve.".to_string());
    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedResult {
    pub question_id: String,
    pub topic: String,
    pub score: f64,
    pub max_score: f64,
    pub feedback: String,
}

/// Weighted, per-topic view of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptReport {
    pub overall_score_percent: f64,
    pub readiness_level: Readiness,
    pub strong_topics: Vec<String>,
    pub weak_topics: Vec<String>,
    pub topic_wise_performance_percent: BTreeMap<String, f64>,
    pub summary: String,
    pub detailed_results: Vec<DetailedResult>,
}

pub fn evaluate_attempt(bank: &QuestionBank, answers: &[AnswerRecord]) -> AttemptReport {
    let mut earned = 0.0;
    let mut possible = 0.0;
    let mut topics: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    let mut detailed_results = Vec::new();

    for answer in latest_answers(answers) {
        let Some(question) = bank.get(&answer.question_id) else {
            continue;
        };
        let scored = score_answer(question, answer);
        let weight = question.weight();
        let weighted = scored.score * weight;

        earned += weighted;
        possible += weight;
        let topic = topics.entry(question.topic.clone()).or_insert((0.0, 0.0));
        topic.0 += weighted;
        topic.1 += weight;

        detailed_results.push(DetailedResult {
            question_id: question.id.clone(),
            topic: question.topic.clone(),
            score: round2(weighted),
            max_score: weight,
            feedback: scored.feedback,
        });
    }

    let overall_score_percent = if possible > 0.0 { round2(earned / possible * 100.0) } else { 0.0 };
    let topic_wise_performance_percent: BTreeMap<String, f64> = topics
        .into_iter()
        .map(|(topic, (score, max))| (topic, round2(score / max * 100.0)))
        .collect();

    let strong_topics: Vec<String> = topic_wise_performance_percent
        .iter()
        .filter(|&(_, &p)| p >= STRONG_TOPIC)
        .map(|(t, _)| t.clone())
        .collect();
    let weak_topics: Vec<String> = topic_wise_performance_percent
        .iter()
        .filter(|&(_, &p)| p < WEAK_TOPIC)
        .map(|(t, _)| t.clone())
        .collect();

    let readiness_level = classify_readiness(overall_score_percent);
    let summary = generate_summary(overall_score_percent, readiness_level, &strong_topics, &weak_topics);

    AttemptReport {
        overall_score_percent,
        readiness_level,
        strong_topics,
        weak_topics,
        topic_wise_performance_percent,
        summary,
        detailed_results,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::bank::BankQuestion;
    use crate::assessment::bank::Difficulty::Easy;
    use crate::assessment::bank::QuestionType::{CodeTrace, Mcq, ShortAnswer};
    use serde_json::{json, Value};

    fn scored(question_type: QuestionType, score: f64, is_correct: bool, time: f64) -> ScoredAnswer {
        ScoredAnswer {
            question_id: "q".to_string(),
            question_type,
            topic: "Arrays".to_string(),
            difficulty: Easy,
            is_correct,
            time,
            score,
            feedback: String::new(),
        }
    }

    fn answer(question_id: &str, value: Value) -> AnswerRecord {
        AnswerRecord {
            question_id: question_id.to_string(),
            answer: value,
            time: 60.0,
        }
    }

    #[test]
    fn test_readiness_boundaries() {
        assert_eq!(classify_readiness(85.0), Readiness::IndustryReady);
        assert_eq!(classify_readiness(84.99), Readiness::AlmostReady);
        assert_eq!(classify_readiness(65.0), Readiness::AlmostReady);
        assert_eq!(classify_readiness(40.0), Readiness::NeedsImprovement);
        assert_eq!(classify_readiness(39.9), Readiness::FoundationLevel);
        assert_eq!(serde_json::to_value(Readiness::AlmostReady).unwrap(), "Almost Ready");
    }

    #[test]
    fn test_features_from_results() {
        let results = vec![
            scored(Mcq, 1.0, true, 30.0),
            scored(CodeTrace, 1.0, true, 90.0),
            scored(CodeTrace, 0.0, false, 120.0),
            scored(ShortAnswer, 0.75, true, 120.0),
        ];

        let features = StudentFeatures::from_results(&results).unwrap();

        assert_eq!(features.accuracy, 75.0);
        assert_eq!(features.conceptual_score, 75.0);
        assert_eq!(features.logical_score, 50.0);
        assert_eq!(features.avg_time, 90.0);
        assert_eq!(features.speed_score, 66.67);
        assert_eq!(features.level(), Readiness::AlmostReady);
    }

    #[test]
    fn test_features_edge_cases() {
        assert!(StudentFeatures::from_results(&[]).is_none());

        // No free-text or trace questions, and instant answers.
        let features = StudentFeatures::from_results(&[scored(Mcq, 1.0, true, 0.0)]).unwrap();
        assert_eq!(features.conceptual_score, 0.0);
        assert_eq!(features.logical_score, 0.0);
        assert_eq!(features.speed_score, 100.0);
    }

    #[test]
    fn test_paragraph_lists_strengths_and_weaknesses() {
        let features = StudentFeatures {
            accuracy: 70.0,
            conceptual_score: 80.0,
            logical_score: 40.0,
            speed_score: 50.0,
            avg_time: 120.0,
        };

        let paragraph = generate_paragraph(&features, Readiness::AlmostReady);

        assert_eq!(
            paragraph,
            "Your current performance level is Almost Ready.\n\
             You demonstrate strengths in conceptual understanding.\n\
             However, you need to focus more on problem solving, time management.\n\
             Regular practice and timed tests will help you improve."
        );
    }

    #[test]
    fn test_paragraph_skips_empty_strengths() {
        let features = StudentFeatures {
            accuracy: 10.0,
            conceptual_score: 10.0,
            logical_score: 0.0,
            speed_score: 100.0,
            avg_time: 20.0,
        };

        let paragraph = generate_paragraph(&features, Readiness::FoundationLevel);

        assert!(!paragraph.contains("strengths in"));
        assert!(paragraph.contains("conceptual clarity, problem solving."));
    }

    #[test]
    fn test_summary_text() {
        let summary = generate_summary(
            72.5,
            Readiness::AlmostReady,
            &["Arrays".to_string()],
            &[],
        );

        assert_eq!(
            summary,
            "Overall Performance: 72.5%.\nSkill Level: Almost Ready.\nStrong Areas: Arrays.\n\
             Candidate has solid fundamentals but needs refinement."
        );
    }

    #[test]
    fn test_weighted_attempt_report() {
        let mut arrays = BankQuestion::stub("arr", Mcq, Easy, "Arrays", 1.0, 60);
        arrays.correct_answer = vec!["O(1)".into()];
        let mut trees = BankQuestion::stub("tree", CodeTrace, Easy, "Trees", 3.0, 60);
        trees.correct_answer = vec!["4".into()];
        let bank = QuestionBank::from_questions(vec![arrays, trees]).unwrap();

        let report = evaluate_attempt(
            &bank,
            &[answer("arr", json!("O(1)")), answer("tree", json!("5")), answer("ghost", json!("x"))],
        );

        assert_eq!(report.overall_score_percent, 25.0);
        assert_eq!(report.readiness_level, Readiness::FoundationLevel);
        assert_eq!(report.strong_topics, vec!["Arrays"]);
        assert_eq!(report.weak_topics, vec!["Trees"]);
        assert_eq!(report.topic_wise_performance_percent["Trees"], 0.0);
        assert_eq!(report.detailed_results.len(), 2);
        assert_eq!(report.detailed_results[1].max_score, 3.0);
        assert!(report.summary.ends_with("Candidate requires foundational learning."));
    }

    #[test]
    fn test_empty_attempt_report() {
        let bank = QuestionBank::from_questions(Vec::new()).unwrap();

        let report = evaluate_attempt(&bank, &[]);

        assert_eq!(report.overall_score_percent, 0.0);
        assert!(report.detailed_results.is_empty());
        assert_eq!(report.readiness_level, Readiness::FoundationLevel);
    }
}
