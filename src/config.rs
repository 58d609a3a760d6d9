use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use crate::logging::LoggingConfig;
use crate::suggestions::{
    GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_SUGGESTION_COUNT,
};

/// Runtime configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    /// Without a key the AI suggestion path is disabled.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_recipe_count: usize,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ai_recipe_count: DEFAULT_SUGGESTION_COUNT,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get("GEMINI_API_KEY");
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY is not set, AI recipe suggestions are disabled");
        }

        Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            ai_recipe_count: parse_or(
                "AI_RECIPE_COUNT",
                get("AI_RECIPE_COUNT"),
                defaults.ai_recipe_count,
            ),
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: parse_or("LOG_FORMAT", get("LOG_FORMAT"), defaults.logging.format),
            },
        }
    }

    /// The configured Gemini client, if an API key is available.
    pub fn gemini_client(&self) -> Option<GeminiClient> {
        self.gemini_api_key.as_ref().map(|key| {
            GeminiClient::new(key.clone())
                .with_model(&self.gemini_model)
                .with_base_url(&self.gemini_base_url)
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.gemini_api_key.is_none());
        assert!(config.gemini_client().is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.ai_recipe_count, 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn reads_values() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("AI_RECIPE_COUNT", "5"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.ai_recipe_count, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        let client = config.gemini_client().unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn bad_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "   "),
            ("AI_RECIPE_COUNT", "lots"),
            ("LOG_FORMAT", "xml"),
        ]));
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.ai_recipe_count, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
