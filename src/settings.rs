//! Settings model, file I/O, and the first-run wizard
//!
//! The settings file is JSON with camelCase field names. It lives in the
//! platform config directory; in debug mode a `settings.json` in the current
//! directory takes precedence when present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_DIR: &str = "termtrans";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub translation: TranslationSettings,
    pub language_detection: DetectionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSettings {
    pub model_name: String,
    /// The closed set of labels the detector may return.
    pub languages: Vec<String>,
    /// One system prompt per language label. Absence of a detected
    /// language's entry is a runtime failure, not validated at load time.
    pub system_prompts: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSettings {
    pub model_name: String,
    pub system_prompt: String,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("could not determine a configuration directory")]
    NoConfigDir,
}

/// Resolve the settings file path. `TERMTRANS_SETTINGS` overrides
/// everything; in debug mode an existing `./settings.json` wins.
pub fn settings_path(debug: bool) -> Result<PathBuf, SettingsError> {
    if let Ok(path) = std::env::var("TERMTRANS_SETTINGS") {
        return Ok(PathBuf::from(path));
    }
    if debug {
        let local = PathBuf::from(SETTINGS_FILE);
        if local.exists() {
            return Ok(local);
        }
    }
    let base = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(base.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let write_err = |source| SettingsError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    let raw = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, raw).map_err(write_err)
}

/// Split a comma-separated language list, requiring at least two non-empty
/// labels and no empty entries.
pub fn parse_languages(raw: &str) -> Result<Vec<String>, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err("Language name cannot be empty".to_string());
    }
    if parts.len() < 2 {
        return Err("Please specify at least 2 languages".to_string());
    }
    Ok(parts.into_iter().map(str::to_string).collect())
}

/// Interactive first-run wizard. Prompts on stdout, reads answers line by
/// line; empty answers take the default (seeded from `existing` when
/// re-configuring).
pub fn run_wizard(existing: Option<&Settings>) -> io::Result<Settings> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    collect_settings(&mut input, &mut output, existing)
}

fn collect_settings(
    input: &mut impl BufRead,
    output: &mut impl Write,
    existing: Option<&Settings>,
) -> io::Result<Settings> {
    let default_base = existing.map_or("http://localhost:1234", |s| s.api_base_url.as_str());
    let api_base_url = prompt(input, output, "API Base URL", default_base)?;

    let default_key = existing.and_then(|s| s.api_key.as_deref()).unwrap_or("");
    let api_key = prompt(input, output, "API Key", default_key)?;
    let api_key = if api_key.is_empty() { None } else { Some(api_key) };

    let default_model = existing.map_or("hy-mt1.5-1.8b", |s| s.translation.model_name.as_str());
    let model_name = prompt(input, output, "Translation Model Name", default_model)?;

    let languages = loop {
        let raw = prompt(
            input,
            output,
            "Languages (comma-separated, at least 2)",
            "",
        )?;
        match parse_languages(&raw) {
            Ok(languages) => break languages,
            Err(message) => writeln!(output, "{message}")?,
        }
    };

    let existing_prompts = existing.map(|s| &s.translation.system_prompts);
    let mut system_prompts = HashMap::new();
    for language in &languages {
        let default = existing_prompts
            .and_then(|p| p.get(language))
            .map_or("", String::as_str);
        let label = format!("System prompt when input is {language:?}");
        system_prompts.insert(language.clone(), prompt(input, output, &label, default)?);
    }

    let default_detect_model =
        existing.map_or("qwen3-0.6b", |s| s.language_detection.model_name.as_str());
    let detection_model = prompt(
        input,
        output,
        "Language Detection Model Name",
        default_detect_model,
    )?;

    let default_detect_prompt = existing.map_or(
        "Classify the language of the input text.",
        |s| s.language_detection.system_prompt.as_str(),
    );
    let detection_prompt = prompt(
        input,
        output,
        "Language Detection System Prompt",
        default_detect_prompt,
    )?;

    Ok(Settings {
        api_base_url,
        api_key,
        translation: TranslationSettings {
            model_name,
            languages,
            system_prompts,
        },
        language_detection: DetectionSettings {
            model_name: detection_model,
            system_prompt: detection_prompt,
        },
    })
}

fn prompt(
    input: &mut impl BufRead,
    output: &mut impl Write,
    label: &str,
    default: &str,
) -> io::Result<String> {
    if default.is_empty() {
        write!(output, "{label}: ")?;
    } else {
        write!(output, "{label} [{default}]: ")?;
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}
