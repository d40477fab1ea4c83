//! Translation over the responses endpoint
//!
//! The system prompt is resolved per detected language; a missing entry
//! aborts before any request is sent. Extraction is forgiving the other way:
//! a response with no `output_text` item falls back to the serialized body so
//! the session always produces visible output.

use super::{LlmError, PipelineError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Issues generation requests using the prompt configured for a language.
pub struct Translator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    prompts: HashMap<String, String>,
}

impl Translator {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        prompts: HashMap<String, String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/v1/responses", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
            prompts,
        }
    }

    /// Translate `text`, which was detected as `language`. The input is sent
    /// untruncated.
    pub async fn translate(&self, text: &str, language: &str) -> Result<String, PipelineError> {
        let request = self.build_request(text, language)?;

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PipelineError::Translation(LlmError::transport(&e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PipelineError::Translation(LlmError::network(format!("Failed to read response: {e}")))
        })?;

        if !status.is_success() {
            return Err(PipelineError::Translation(LlmError::from_status(
                status, &body,
            )));
        }

        let parsed: ResponsesBody = serde_json::from_str(&body).map_err(|e| {
            PipelineError::Translation(LlmError::invalid_response(format!(
                "Failed to parse generation response: {e}"
            )))
        })?;
        Ok(extract_reply(&parsed, &body))
    }

    fn build_request(&self, text: &str, language: &str) -> Result<ResponsesRequest, PipelineError> {
        let prompt = self
            .prompts
            .get(language)
            .ok_or_else(|| PipelineError::MissingPrompt {
                language: language.to_string(),
            })?;

        Ok(ResponsesRequest {
            model: self.model.clone(),
            input: vec![
                InputItem::text("system", prompt),
                InputItem::text("user", text),
            ],
        })
    }
}

/// First `output_text` item of the first output message, or the serialized
/// body when the response carries none.
fn extract_reply(parsed: &ResponsesBody, raw_body: &str) -> String {
    parsed
        .output
        .first()
        .and_then(|output| {
            output
                .content
                .iter()
                .find(|item| item.r#type == "output_text")
        })
        .and_then(|item| item.text.clone())
        .unwrap_or_else(|| raw_body.to_string())
}

// Wire types

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputItem>,
}

#[derive(Debug, Serialize)]
struct InputItem {
    role: String,
    content: Vec<InputContent>,
}

impl InputItem {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            content: vec![InputContent {
                r#type: "input_text".to_string(),
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct InputContent {
    r#type: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translator() -> Translator {
        let mut prompts = HashMap::new();
        prompts.insert("en".to_string(), "Reply in French".to_string());
        prompts.insert("fr".to_string(), "Reply in English".to_string());
        Translator::new(
            Client::new(),
            "http://localhost:1234",
            None,
            "hy-mt1.5-1.8b",
            prompts,
        )
    }

    #[test]
    fn test_request_carries_resolved_prompt_and_untruncated_input() {
        let request = translator().build_request("Hello world", "en").unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "hy-mt1.5-1.8b");
        assert_eq!(value["input"][0]["role"], "system");
        assert_eq!(
            value["input"][0]["content"],
            json!([{ "type": "input_text", "text": "Reply in French" }])
        );
        assert_eq!(value["input"][1]["role"], "user");
        assert_eq!(value["input"][1]["content"][0]["text"], "Hello world");
    }

    #[test]
    fn test_missing_prompt_short_circuits() {
        let err = translator().build_request("Hallo Welt", "de").unwrap_err();
        match err {
            PipelineError::MissingPrompt { language } => assert_eq!(language, "de"),
            other => panic!("expected MissingPrompt, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_reply_takes_first_output_text() {
        let raw = r#"{"output":[{"content":[
            {"type":"reasoning","text":"…"},
            {"type":"output_text","text":"Bonjour le monde"},
            {"type":"output_text","text":"ignored"}
        ]}]}"#;
        let parsed: ResponsesBody = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_reply(&parsed, raw), "Bonjour le monde");
    }

    #[test]
    fn test_extract_reply_falls_back_to_serialized_body() {
        let raw = r#"{"output":[{"content":[{"type":"refusal","text":"no"}]}]}"#;
        let parsed: ResponsesBody = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_reply(&parsed, raw), raw);

        let raw = r#"{"error":{"message":"shape is wrong"}}"#;
        let parsed: ResponsesBody = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_reply(&parsed, raw), raw);
    }

    #[test]
    fn test_extract_reply_reads_only_the_first_output() {
        let raw = r#"{"output":[
            {"content":[]},
            {"content":[{"type":"output_text","text":"second message"}]}
        ]}"#;
        let parsed: ResponsesBody = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_reply(&parsed, raw), raw);
    }
}
