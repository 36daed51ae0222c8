//! Runtime configuration for a planning session.
//!
//! `main.rs` fills a [`PlannerConfig`] from clap flags and environment
//! variables; everything below the CLI works from this struct only.

use std::time::Duration;

use serde::Serialize;

use crate::constants;
use crate::error::ConfigError;

/// Which hosted text-generation service answers the prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Ollama,
}

impl Provider {
    pub fn default_url(self) -> String {
        match self {
            Provider::Gemini => constants::GEMINI_URL.clone(),
            Provider::Ollama => constants::OLLAMA_URL.clone(),
        }
    }

    pub fn default_model(self) -> String {
        match self {
            Provider::Gemini => constants::GEMINI_MODEL.clone(),
            Provider::Ollama => constants::OLLAMA_MODEL.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub completion_url: String,
    pub search_url: String,
    /// Applied to every outbound request, completion and search alike.
    pub timeout: Duration,
    pub research: bool,
    pub personalize: bool,
    pub record_failures: bool,
}

impl PlannerConfig {
    /// Defaults for `provider`, with no credential set.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            api_key: None,
            model: provider.default_model(),
            completion_url: provider.default_url(),
            search_url: constants::SEARCH_URL.clone(),
            timeout: Duration::from_secs(60),
            research: true,
            personalize: false,
            record_failures: true,
        }
    }

    /// Returns the credential the provider needs, or `None` when it needs none.
    ///
    /// A blank key counts as missing.
    pub fn credential(&self) -> Result<Option<&str>, ConfigError> {
        match self.provider {
            Provider::Gemini => self
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(Some)
                .ok_or(ConfigError::MissingCredential {
                    var: constants::GEMINI_API_KEY_VAR,
                }),
            Provider::Ollama => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credential().map(|_| ())
    }

    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_without_key_is_a_configuration_error() {
        let config = PlannerConfig::new(Provider::Gemini);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut config = PlannerConfig::new(Provider::Gemini);
        config.api_key = Some("   ".to_string());
        assert!(matches!(
            config.credential(),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn gemini_key_is_trimmed() {
        let mut config = PlannerConfig::new(Provider::Gemini);
        config.api_key = Some(" abc123\n".to_string());
        assert_eq!(config.credential().unwrap(), Some("abc123"));
    }

    #[test]
    fn ollama_needs_no_credential() {
        let config = PlannerConfig::new(Provider::Ollama);
        assert_eq!(config.credential().unwrap(), None);
        assert_eq!(config.model, constants::OLLAMA_MODEL.clone());
    }
}
