use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::quiz::QuizConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Overrides the embedded question bank when present
    #[serde(default)]
    pub quiz: Option<QuizConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Third-party identity login; disabled when absent
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// User data file for the file backend (default: ~/.config/path-finder/users.json)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Chat completion settings. The API key is read from the environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Previous messages sent along with each question
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Request timeout, e.g. "30s" or "1m"
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// YAML map of tradition (key, alias, or name) -> common questions text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            history_limit: default_history_limit(),
            timeout: default_timeout(),
            reference_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_transcription_model")]
    pub model: String,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_transcription_model(),
            language: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// OAuth client id the ID token must be issued for
    pub client_id: String,

    #[serde(default = "default_tokeninfo_url")]
    pub tokeninfo_url: String,
}

fn default_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_chat_model() -> String {
    "meta-llama/Meta-Llama-3-8B-Instruct-Lite".to_string()
}

fn default_transcription_model() -> String {
    "openai/whisper-large-v3".to_string()
}

fn default_max_tokens() -> u32 {
    80
}

fn default_temperature() -> f32 {
    0.7
}

fn default_history_limit() -> usize {
    5
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_tokeninfo_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.quiz.is_none());
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.chat.history_limit, 5);
        assert_eq!(config.chat.max_tokens, 80);
    }

    #[test]
    fn test_partial_chat_config() {
        let yaml = r#"
chat:
  model: "mistralai/Mixtral-8x7B-Instruct-v0.1"
  timeout: "1m"
storage:
  backend: memory
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.chat.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert_eq!(config.chat.timeout, "1m");
        assert_eq!(config.chat.base_url, "https://api.together.xyz/v1");
        assert!(config.chat.reference_file.is_none());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_chat_reference_file() {
        let yaml = "chat:\n  reference_file: /srv/path-finder/religions.yaml\n";
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            config.chat.reference_file,
            Some(PathBuf::from("/srv/path-finder/religions.yaml"))
        );
    }

    #[test]
    fn test_identity_config() {
        let yaml = r#"
identity:
  client_id: "1234.apps.googleusercontent.com"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let identity = config.identity.unwrap();
        assert_eq!(identity.client_id, "1234.apps.googleusercontent.com");
        assert_eq!(identity.tokeninfo_url, "https://oauth2.googleapis.com/tokeninfo");
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(serde_saphyr::from_str::<Config>("queries: []").is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            quiz: Some(QuizConfig::default()),
            ..Config::default()
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
