//! Application configuration
//!
//! Settings come from an optional TOML file and the environment. The API key
//! is only ever taken from the environment and loading fails without it.

use crate::llm::{LlmConfig, StyleDirective};
use crate::speech::{RecognitionConfig, SpeechConfig};
use crate::{NyayaError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const API_KEY_VARS: [&str; 2] = ["NYAYA_API_KEY", "GEMINI_API_KEY"];
pub const CONFIG_PATH_VAR: &str = "NYAYA_CONFIG";
pub const MODEL_VAR: &str = "NYAYA_MODEL";
pub const BASE_URL_VAR: &str = "NYAYA_BASE_URL";
pub const WHISPER_MODEL_VAR: &str = "NYAYA_WHISPER_MODEL";

/// Window and presentation settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Reply style selected at startup
    pub default_style: StyleDirective,

    /// Show the privacy notice when the window opens
    pub show_privacy_on_start: bool,

    pub window_width: f32,
    pub window_height: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_style: StyleDirective::Default,
            show_privacy_on_start: false,
            window_width: 900.0,
            window_height: 700.0,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub recognition: RecognitionConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load from the default locations and the process environment.
    pub fn load() -> Result<Self> {
        Self::from_sources(|name| std::env::var(name).ok())
    }

    /// Load using `env` to look up variables.
    pub fn from_sources(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = env(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(&env)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            NyayaError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)
            .map_err(|e| NyayaError::ConfigError(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        config.llm.base_url = config.llm.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(model) = env(MODEL_VAR).filter(|v| !v.trim().is_empty()) {
            self.llm.model = model.trim().to_string();
        }
        if let Some(base_url) = env(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.llm = self.llm.clone().with_base_url(base_url.trim());
        }
        if let Some(model_path) = env(WHISPER_MODEL_VAR).filter(|v| !v.trim().is_empty()) {
            self.recognition.model_path = Some(PathBuf::from(model_path.trim()));
        }

        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| env(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| {
                NyayaError::ConfigError(format!(
                    "No API key configured. Set {} or {}.",
                    API_KEY_VARS[0], API_KEY_VARS[1]
                ))
            })?;
        self.llm.api_key = api_key;

        Ok(())
    }

    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_recognition(mut self, recognition: RecognitionConfig) -> Self {
        self.recognition = recognition;
        self
    }

    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = ui;
        self
    }
}

/// `<config_dir>/nyaya/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nyaya").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        let env = env_from(&[(CONFIG_PATH_VAR, missing.to_str().unwrap())]);

        let err = AppConfig::from_sources(env).unwrap_err();
        assert!(matches!(err, NyayaError::ConfigError(ref m) if m.contains("NYAYA_API_KEY")));
    }

    #[test]
    fn test_blank_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        let env = env_from(&[
            (CONFIG_PATH_VAR, missing.to_str().unwrap()),
            ("NYAYA_API_KEY", "   "),
        ]);

        assert!(AppConfig::from_sources(env).is_err());
    }

    #[test]
    fn test_gemini_key_fallback_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        let env = env_from(&[
            (CONFIG_PATH_VAR, missing.to_str().unwrap()),
            ("GEMINI_API_KEY", "key-123"),
        ]);

        let config = AppConfig::from_sources(env).unwrap();
        assert_eq!(config.llm.api_key, "key-123");
        assert_eq!(config.llm.model, crate::llm::config::DEFAULT_MODEL);
        assert_eq!(config.ui.default_style, StyleDirective::Default);
        assert!(config.speech.enabled);
    }

    #[test]
    fn test_file_and_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "gemini-from-file"
base_url = "http://file.example/"
request_timeout_secs = 30

[speech]
enabled = false

[recognition]
language = "hi"
max_duration_secs = 15.0

[ui]
default_style = "Concise"
"#,
        )
        .unwrap();

        let env = env_from(&[
            (CONFIG_PATH_VAR, path.to_str().unwrap()),
            ("NYAYA_API_KEY", "k"),
            (MODEL_VAR, "gemini-from-env"),
            (WHISPER_MODEL_VAR, "/opt/models/ggml-small.bin"),
        ]);

        let config = AppConfig::from_sources(env).unwrap();
        assert_eq!(config.llm.model, "gemini-from-env");
        assert_eq!(config.llm.base_url, "http://file.example");
        assert_eq!(config.llm.request_timeout_secs, 30);
        assert!(!config.speech.enabled);
        assert_eq!(config.recognition.language.as_deref(), Some("hi"));
        assert_eq!(config.recognition.max_duration_secs, 15.0);
        assert_eq!(
            config.recognition.model_path,
            Some(PathBuf::from("/opt/models/ggml-small.bin"))
        );
        assert_eq!(config.ui.default_style, StyleDirective::Concise);
    }

    #[test]
    fn test_api_key_in_file_is_ignored() {
        let config = AppConfig::from_toml("[llm]\napi_key = \"embedded\"\n").unwrap();
        assert!(config.llm.api_key.is_empty());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nmodel = ").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(NyayaError::ConfigError(_))
        ));
    }
}
