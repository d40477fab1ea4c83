//! Detect-then-translate language pipeline
//!
//! Two sequential network calls per submission: classify the input's
//! language against the configured set, then generate a translation with the
//! prompt configured for that language.

mod detect;
mod error;
mod translate;

pub use detect::{LanguageDetector, DETECTION_CHAR_THRESHOLD};
pub use error::{LlmError, LlmErrorKind};
pub use translate::Translator;

use crate::settings::Settings;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Per-request timeout on the shared HTTP client. A hung call fails its own
/// submission without blocking input handling.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure of one submission's pipeline. Local to that submission: history
/// keeps the already-recorded user turn and navigation state is untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no system prompt configured for language {language:?}")]
    MissingPrompt { language: String },
    #[error("language detection failed: {0}")]
    Detection(#[source] LlmError),
    #[error("translation failed: {0}")]
    Translation(#[source] LlmError),
}

/// The detect-then-translate sequence behind a seam, so the interactive
/// session and pipe mode run against mocks in tests.
#[async_trait]
pub trait TranslatePipeline: Send + Sync {
    async fn run(&self, text: &str) -> Result<String, PipelineError>;
}

/// Production pipeline wiring a [`LanguageDetector`] to a [`Translator`].
pub struct DetectTranslate {
    detector: LanguageDetector,
    translator: Translator,
}

impl DetectTranslate {
    pub fn from_settings(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        let detector = LanguageDetector::new(
            client.clone(),
            &settings.api_base_url,
            settings.api_key.clone(),
            &settings.language_detection.model_name,
            &settings.language_detection.system_prompt,
            settings.translation.languages.clone(),
        );
        let translator = Translator::new(
            client,
            &settings.api_base_url,
            settings.api_key.clone(),
            &settings.translation.model_name,
            settings.translation.system_prompts.clone(),
        );
        Self {
            detector,
            translator,
        }
    }
}

#[async_trait]
impl TranslatePipeline for DetectTranslate {
    async fn run(&self, text: &str) -> Result<String, PipelineError> {
        let start = std::time::Instant::now();

        let language = self
            .detector
            .detect(text)
            .await
            .map_err(PipelineError::Detection)?;
        tracing::info!(language = %language, "input language detected");

        let result = self.translator.translate(text, &language).await;
        let duration = start.elapsed();
        match &result {
            Ok(reply) => {
                tracing::info!(
                    language = %language,
                    duration_ms = %duration.as_millis(),
                    reply_chars = reply.chars().count(),
                    "translation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    language = %language,
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "translation failed"
                );
            }
        }
        result
    }
}
