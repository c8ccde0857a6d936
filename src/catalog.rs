// src/catalog.rs
use std::collections::HashSet;
use std::path::Path;

use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};

#[derive(RustEmbed)]
#[folder = "catalog/"]
pub(crate) struct CatalogAssets;

const EMBEDDED_CATALOG: &str = "questions.toml";

/// Marker in a question id that flags a simulation question.
const SIMULATION_MARKER: &str = "SIM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "output")]
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub difficulty: String,
    pub description: String,
    pub input_format: String,
    pub output_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default)]
    pub sample_input: Option<String>,
    #[serde(default)]
    pub sample_output: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Filled in from the enclosing level when the catalog is loaded.
    #[serde(skip)]
    pub level: u32,
}

impl Question {
    /// Simulation questions ask for free-form reasoning rather than exact output.
    pub fn is_simulation(&self) -> bool {
        self.id.contains(SIMULATION_MARKER)
    }

    /// The case shown before submission: the explicit sample if the question
    /// defines a non-empty one, otherwise its first hidden case.
    pub fn sample_case(&self) -> Option<TestCase> {
        match self.sample_output.as_deref().filter(|s| !s.is_empty()) {
            Some(expected) => Some(TestCase {
                input: self.sample_input.clone().unwrap_or_default(),
                expected: expected.to_string(),
            }),
            None => self.test_cases.first().cloned(),
        }
    }

    pub fn hidden_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    /// What a user may see before submitting: everything but the hidden cases.
    pub fn public_view(&self) -> PublicQuestion<'_> {
        let sample = self.sample_case();
        PublicQuestion {
            id: &self.id,
            title: &self.title,
            topic: &self.topic,
            difficulty: &self.difficulty,
            description: &self.description,
            input_format: &self.input_format,
            output_format: &self.output_format,
            constraints: self.constraints.as_deref(),
            sample_input: sample.as_ref().map(|c| c.input.clone()),
            sample_output: sample.map(|c| c.expected),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicQuestion<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub topic: &'a str,
    pub difficulty: &'a str,
    pub description: &'a str,
    pub input_format: &'a str,
    pub output_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<&'a str>,
    pub sample_input: Option<String>,
    pub sample_output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    levels: Vec<Level>,
}

/// Read-only question bank, loaded once at start-up.
#[derive(Debug, Clone)]
pub struct Catalog {
    levels: Vec<Level>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let asset = CatalogAssets::get(EMBEDDED_CATALOG)
            .ok_or_else(|| ServiceError::Catalog(format!("embedded {} is missing", EMBEDDED_CATALOG)))?;
        let text = std::str::from_utf8(&asset.data)
            .map_err(|e| ServiceError::Catalog(format!("embedded catalog is not UTF-8: {}", e)))?;
        Self::from_toml_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::from_levels(file.levels)
    }

    pub fn from_levels(mut levels: Vec<Level>) -> Result<Self> {
        let mut numbers = HashSet::new();
        let mut ids = HashSet::new();

        for level in &mut levels {
            if !numbers.insert(level.number) {
                return Err(ServiceError::Catalog(format!("level {} defined twice", level.number)));
            }
            for question in &mut level.questions {
                if !ids.insert(question.id.clone()) {
                    return Err(ServiceError::Catalog(format!("question id '{}' defined twice", question.id)));
                }
                if question.sample_case().is_none() {
                    return Err(ServiceError::Catalog(format!(
                        "question '{}' has neither a sample nor a test case",
                        question.id
                    )));
                }
                question.level = level.number;
            }
        }

        levels.sort_by_key(|l| l.number);
        Ok(Catalog { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, number: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.number == number)
    }

    pub fn find_question(&self, id: &str) -> Option<&Question> {
        self.levels
            .iter()
            .flat_map(|l| l.questions.iter())
            .find(|q| q.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.levels.iter().map(|l| l.questions.len()).sum()
    }
}
