// src/api/state.rs
use std::sync::Arc;

use reqwest::Client;

use crate::assessment::{AttemptStore, InMemoryAttemptStore, QuestionBank};
use crate::assistant::Assistant;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::executor::Executor;
use crate::judge::Judge;
use crate::progress::{InMemoryProgressStore, ProgressStore};
use crate::providers::gemini::GeminiProvider;
use crate::providers::{http_client, LlmProvider};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Client,
    pub catalog: Arc<Catalog>,
    pub judge: Arc<Judge>,
    pub progress: Arc<dyn ProgressStore>,
    pub bank: Arc<QuestionBank>,
    pub attempts: Arc<dyn AttemptStore>,
    pub assistant: Assistant,
}

impl AppState {
    /// Loads the catalog and assessment bank named by the configuration (or the
    /// embedded ones) and starts with an empty progress ledger.
    pub fn new(config: AppConfig) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                log::info!("Loading question catalog from {}", path.display());
                Catalog::load(path)?
            }
            None => Catalog::embedded()?,
        };
        log::info!(
            "Catalog ready: {} levels, {} questions",
            catalog.levels().len(),
            catalog.question_count()
        );

        let bank = match &config.assessment_bank_path {
            Some(path) => {
                log::info!("Loading assessment bank from {}", path.display());
                QuestionBank::load(path)?
            }
            None => QuestionBank::embedded()?,
        };
        log::info!("Assessment bank ready: {} questions", bank.len());

        let client = http_client(config.gemini.request_timeout)?;
        let provider = GeminiProvider::new(client.clone(), &config.gemini)
            .map(|p| Arc::new(p) as Arc<dyn LlmProvider>);
        if provider.is_none() {
            log::warn!("GEMINI_API_KEY not set; assistant features will use static fallbacks");
        }

        Ok(Self::with_parts(
            config,
            client,
            catalog,
            Arc::new(InMemoryProgressStore::new()),
            bank,
            Assistant::new(provider),
        ))
    }

    pub fn with_parts(
        config: AppConfig,
        client: Client,
        catalog: Catalog,
        progress: Arc<dyn ProgressStore>,
        bank: QuestionBank,
        assistant: Assistant,
    ) -> Self {
        let judge = Judge::new(Executor::from_config(&config.execution));
        Self {
            config: Arc::new(config),
            client,
            catalog: Arc::new(catalog),
            judge: Arc::new(judge),
            progress,
            bank: Arc::new(bank),
            attempts: Arc::new(InMemoryAttemptStore::new()),
            assistant,
        }
    }

    /// The configured assistant, or one backed by a caller-supplied API key.
    pub fn assistant_for_key(&self, api_key: Option<&str>) -> Assistant {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => {
                let config = self.config.gemini.with_api_key(key);
                let provider = GeminiProvider::new(self.client.clone(), &config)
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>);
                Assistant::new(provider)
            }
            None => self.assistant.clone(),
        }
    }
}
