//! Backend configuration.
//!
//! Everything is read from the environment at startup. Missing Azure credentials are not
//! a startup error; the endpoints that need them answer with a 500 instead.

use std::env;
use std::net::SocketAddr;

use secrecy::SecretString;
use tracing::Level;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Speech service settings.
#[derive(Debug, Clone, Default)]
pub struct SpeechConfig {
    pub key: Option<SecretString>,
    pub region: Option<String>,
    pub avatar_character: Option<String>,
    pub avatar_style: Option<String>,
    pub voice: Option<String>,
}

/// A fully specified chat deployment. Only exists when all three values are set.
#[derive(Debug, Clone)]
pub struct OpenAiDeployment {
    pub endpoint: String,
    pub key: SecretString,
    pub deployment: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub speech: SpeechConfig,
    pub openai: Option<OpenAiDeployment>,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables, after reading `.env` if present.
    ///
    /// *   `BIND_ADDRESS`: (Optional) Listen address. Defaults to "0.0.0.0:8000".
    /// *   `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_KEY`, `AZURE_OPENAI_DEPLOYMENT`: chat deployment for `/ask`.
    /// *   `AZURE_SPEECH_KEY`, `AZURE_SPEECH_REGION`: speech subscription for `/avatar/token`.
    /// *   `AZURE_SPEECH_AVATAR`, `AZURE_SPEECH_AVATAR_STYLE`, `AZURE_SPEECH_VOICE`: avatar look served by `/config`.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let speech = SpeechConfig {
            key: var("AZURE_SPEECH_KEY").map(SecretString::from),
            region: var("AZURE_SPEECH_REGION"),
            avatar_character: var("AZURE_SPEECH_AVATAR"),
            avatar_style: var("AZURE_SPEECH_AVATAR_STYLE"),
            voice: var("AZURE_SPEECH_VOICE"),
        };

        let openai = match (
            var("AZURE_OPENAI_ENDPOINT"),
            var("AZURE_OPENAI_KEY"),
            var("AZURE_OPENAI_DEPLOYMENT"),
        ) {
            (Some(endpoint), Some(key), Some(deployment)) => Some(OpenAiDeployment {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                key: SecretString::from(key),
                deployment,
            }),
            _ => None,
        };

        Ok(Self {
            bind_address,
            speech,
            openai,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.speech.key.is_none());
        assert!(config.openai.is_none());
    }

    #[test]
    fn test_openai_needs_all_three_values() {
        let partial = Config::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "k"),
            ("AZURE_OPENAI_DEPLOYMENT", ""),
        ]))
        .unwrap();
        assert!(partial.openai.is_none());

        let full = Config::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
            ("AZURE_OPENAI_KEY", "k"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o-mini"),
        ]))
        .unwrap();
        let openai = full.openai.unwrap();
        assert_eq!(openai.endpoint, "https://example.openai.azure.com");
        assert_eq!(openai.deployment, "gpt-4o-mini");
    }

    #[test]
    fn test_speech_settings() {
        let config = Config::from_lookup(lookup(&[
            ("AZURE_SPEECH_KEY", "secret"),
            ("AZURE_SPEECH_REGION", "westus2"),
            ("AZURE_SPEECH_AVATAR", "lisa"),
            ("AZURE_SPEECH_AVATAR_STYLE", "casual-sitting"),
        ]))
        .unwrap();
        assert!(config.speech.key.is_some());
        assert_eq!(config.speech.region.as_deref(), Some("westus2"));
        assert_eq!(config.speech.avatar_character.as_deref(), Some("lisa"));
        assert_eq!(config.speech.voice, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("BIND_ADDRESS", "not-an-address")])).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDRESS"));

        let err = Config::from_lookup(lookup(&[("RUST_LOG", "chatty")])).unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}
