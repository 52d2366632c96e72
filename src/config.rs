//! Configuration surface: language pair, provider credentials and endpoints,
//! pipeline policies. Loaded from a JSON file or from the environment and
//! validated before first use; a missing credential is a fatal configuration
//! error, not a retryable one.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which transcript stream drives translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackPolicy {
    /// Translate growing interim text, skip finals (low latency, unstable).
    /// Canonical behavior.
    #[default]
    Flow,
    /// Translate only final segments, ignore interims (stable, delayed).
    FinalOnly,
}

/// Whether auth/configuration failures on the primary provider may still be
/// retried against the fallback provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Only transient provider failures fall through; auth errors surface
    /// immediately. Default.
    #[default]
    TransientOnly,
    /// Every primary failure falls through; a fallback with different auth
    /// requirements may still succeed.
    Always,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source language code (e.g. "id").
    pub source_lang: String,
    /// Target language code (e.g. "de").
    pub target_lang: String,
    /// Credential for the primary provider. Absent means the primary cannot
    /// be constructed.
    #[serde(default)]
    pub deepl_api_key: Option<String>,
    /// Primary provider endpoint.
    #[serde(default = "default_deepl_url")]
    pub deepl_api_url: String,
    /// Fallback provider endpoint.
    #[serde(default = "default_mymemory_url")]
    pub mymemory_api_url: String,
    #[serde(default)]
    pub track_policy: TrackPolicy,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    /// Keep listening across recognizer restarts.
    #[serde(default = "default_true")]
    pub continuous: bool,
}

fn default_deepl_url() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_mymemory_url() -> String {
    "https://api.mymemory.translated.net/get".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Config with defaults for the given language pair.
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            deepl_api_key: None,
            deepl_api_url: default_deepl_url(),
            mymemory_api_url: default_mymemory_url(),
            track_policy: TrackPolicy::default(),
            fallback_policy: FallbackPolicy::default(),
            continuous: true,
        }
    }

    /// Load configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the primary credential from `DEEPL_API_KEY` if not already set.
    pub fn with_env_credentials(mut self) -> Self {
        if self.deepl_api_key.is_none() {
            self.deepl_api_key = std::env::var("DEEPL_API_KEY").ok();
        }
        self
    }

    /// Check that the language pair is present and well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_lang.trim().is_empty() {
            return Err(ConfigError::MissingField("source_lang"));
        }
        if self.target_lang.trim().is_empty() {
            return Err(ConfigError::MissingField("target_lang"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    MissingField(&'static str),
    /// Credential required by a configured provider is absent.
    MissingCredential(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::MissingField(name) => write!(f, "missing config field: {name}"),
            ConfigError::MissingCredential(name) => {
                write!(f, "missing credential: {name} (check your config)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_langs() {
        let config = Config::new("", "de");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("source_lang"))
        ));
        let config = Config::new("id", "  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("target_lang"))
        ));
    }

    #[test]
    fn defaults_applied_on_parse() {
        let config: Config =
            serde_json::from_str(r#"{"source_lang":"id","target_lang":"de"}"#)
                .expect("parse");
        assert_eq!(config.track_policy, TrackPolicy::Flow);
        assert_eq!(config.fallback_policy, FallbackPolicy::TransientOnly);
        assert!(config.continuous);
        assert!(config.deepl_api_url.contains("deepl.com"));
    }

    #[test]
    fn policies_parse_from_snake_case() {
        let config: Config = serde_json::from_str(
            r#"{"source_lang":"id","target_lang":"de",
                "track_policy":"final_only","fallback_policy":"always"}"#,
        )
        .expect("parse");
        assert_eq!(config.track_policy, TrackPolicy::FinalOnly);
        assert_eq!(config.fallback_policy, FallbackPolicy::Always);
    }
}
