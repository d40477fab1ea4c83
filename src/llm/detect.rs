//! Language detection over the chat-completions endpoint
//!
//! Classification is constrained server-side: the request carries a strict
//! JSON schema whose `language` property enumerates the configured set, so
//! the reply is one of those labels or the call has violated its contract.

use super::LlmError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Character budget for the classification payload. Whole lines are
/// accumulated until the running total crosses this; the crossing line is
/// kept, and no line is ever split.
pub const DETECTION_CHAR_THRESHOLD: usize = 500;

/// Classifies input text into one of a closed set of language labels.
pub struct LanguageDetector {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
    languages: Vec<String>,
}

impl LanguageDetector {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
            system_prompt: system_prompt.into(),
            languages,
        }
    }

    /// Detect the language of `text`. Returns a label from the configured
    /// set; anything else the endpoint sends back is a hard error.
    pub async fn detect(&self, text: &str) -> Result<String, LlmError> {
        let request = self.build_request(text);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::invalid_response(format!("Failed to parse detection response: {e}"))
        })?;
        self.extract_label(parsed)
    }

    fn build_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: detection_prefix(text, DETECTION_CHAR_THRESHOLD),
                },
            ],
            response_format: language_schema(&self.languages),
        }
    }

    fn extract_label(&self, response: ChatResponse) -> Result<String, LlmError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::invalid_response("No content in detection response"))?;

        let detected: DetectedLanguage = serde_json::from_str(&content).map_err(|e| {
            LlmError::invalid_response(format!("Unparseable detection content: {e}"))
        })?;

        if !self.languages.iter().any(|l| *l == detected.language) {
            return Err(LlmError::invalid_response(format!(
                "Detected language {:?} is not in the configured set",
                detected.language
            )));
        }
        Ok(detected.language)
    }
}

/// Whole-line prefix of `text` whose cumulative character count is the
/// smallest one exceeding `threshold` (or all of `text` if it never does).
fn detection_prefix(text: &str, threshold: usize) -> String {
    let mut prefix = Vec::new();
    let mut total = 0usize;
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        total += line.chars().count();
        prefix.push(line);
        if total > threshold {
            break;
        }
    }
    prefix.join("\n")
}

fn language_schema(languages: &[String]) -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "language_detection",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "language": { "type": "string", "enum": languages }
                },
                "required": ["language"],
                "additionalProperties": false
            }
        }
    })
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectedLanguage {
    language: String,
}
