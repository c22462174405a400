use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::collaborators::search::DEFAULT_SEARCH_API_URL;
use crate::collaborators::street_view::DEFAULT_STREET_VIEW_API_URL;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a number does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Street-level imagery; `None` means reports never carry a photo.
    pub maps_api_key: Option<String>,
    /// Web search; `None` means prompts get the "no data" placeholder.
    pub search_api_key: Option<String>,
    pub search_api_url: String,
    pub street_view_api_url: String,
    pub knowledge_base_dir: PathBuf,
    pub default_lookback_months: u32,
    pub search_max_results: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_lookback_months = get("DEFAULT_LOOKBACK_MONTHS")
            .unwrap_or_else(|| "6".to_string())
            .trim()
            .parse::<u32>()
            .context("DEFAULT_LOOKBACK_MONTHS must be a whole number of months")?;
        if default_lookback_months == 0 {
            bail!("DEFAULT_LOOKBACK_MONTHS must be greater than 0");
        }

        Ok(Config {
            anthropic_api_key: get("ANTHROPIC_API_KEY")
                .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?,
            maps_api_key: get("MAPS_API_KEY"),
            search_api_key: get("SEARCH_API_KEY"),
            search_api_url: get("SEARCH_API_URL").unwrap_or_else(|| DEFAULT_SEARCH_API_URL.to_string()),
            street_view_api_url: get("STREET_VIEW_API_URL")
                .unwrap_or_else(|| DEFAULT_STREET_VIEW_API_URL.to_string()),
            knowledge_base_dir: PathBuf::from(
                get("KNOWLEDGE_BASE_DIR").unwrap_or_else(|| "knowledge_base".to_string()),
            ),
            default_lookback_months,
            search_max_results: get("SEARCH_MAX_RESULTS")
                .unwrap_or_else(|| "4".to_string())
                .trim()
                .parse::<usize>()
                .context("SEARCH_MAX_RESULTS must be a non-negative integer")?,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_required_key() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.anthropic_api_key, "sk-test");
        assert_eq!(config.maps_api_key, None);
        assert_eq!(config.search_api_key, None);
        assert_eq!(config.search_api_url, DEFAULT_SEARCH_API_URL);
        assert_eq!(config.knowledge_base_dir, PathBuf::from("knowledge_base"));
        assert_eq!(config.default_lookback_months, 6);
        assert_eq!(config.search_max_results, 4);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_llm_key_fails_fast() {
        let err = Config::from_lookup(lookup(&[("MAPS_API_KEY", "m")])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_blank_optional_key_is_absent() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), ("SEARCH_API_KEY", "  ")])).unwrap();
        assert_eq!(config.search_api_key, None);
    }

    #[test]
    fn test_bad_numbers_abort() {
        assert!(Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "eighty")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), ("DEFAULT_LOOKBACK_MONTHS", "0")])).is_err()
        );
        assert!(
            Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), ("SEARCH_MAX_RESULTS", "-1")])).is_err()
        );
    }
}
