//! Process-wide configuration
//!
//! Everything is read from environment variables (optionally seeded from a
//! `.env` file). These values are the defaults every tenant starts from.

use crate::classifier::{DEFAULT_ROMANIZED_STOPWORDS, FilterConfig};
use crate::settings::{ProviderKind, ProviderSettings, SettingsError};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("DEFAULT_PROVIDER: {0}")]
    InvalidProvider(#[from] SettingsError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime configuration for the translation relay
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Where the tenant document lives
    pub config_path: PathBuf,
    /// Process defaults; tenant settings are layered on top
    pub defaults: ProviderSettings,
    pub filter: FilterConfig,
    pub enable_dms: bool,
    pub show_source_lang: bool,
    pub only_when_mentioned: bool,
    /// Upper-cased codes skipped for every tenant
    pub blacklist: BTreeSet<String>,
    pub apply_blacklist_to_commands: bool,
    pub target_language: String,
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            defaults: ProviderSettings {
                provider: Some(ProviderKind::DeepL),
                ..Default::default()
            },
            filter: FilterConfig::default(),
            enable_dms: false,
            show_source_lang: true,
            only_when_mentioned: false,
            blacklist: BTreeSet::new(),
            apply_blacklist_to_commands: true,
            target_language: "EN-US".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Split a comma list, trimming entries and dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl BotConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> ConfigResult<Self> {
        // A missing .env file is the normal case in production
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let flag = |key: &str, default: bool| text(key).map(|v| parse_bool(&v)).unwrap_or(default);
        let number = |key: &'static str, default: usize| -> ConfigResult<usize> {
            match text(key) {
                None => Ok(default),
                Some(v) if v.is_empty() => Ok(default),
                Some(v) => v.parse().map_err(|_| ConfigError::InvalidNumber { name: key, value: v }),
            }
        };

        let mut config = BotConfig::default();

        if let Some(path) = text("CONFIG_PATH").filter(|p| !p.is_empty()) {
            config.config_path = PathBuf::from(path);
        }
        if let Some(provider) = text("DEFAULT_PROVIDER").filter(|p| !p.is_empty()) {
            config.defaults.provider = Some(provider.parse()?);
        }
        let non_empty = |key: &str| text(key).filter(|v| !v.is_empty());
        config.defaults.deepl_api_key = non_empty("DEEPL_API_KEY");
        config.defaults.libre_url = non_empty("LIBRE_URL");
        config.defaults.libre_api_key = non_empty("LIBRE_API_KEY");
        config.defaults.lingva_url = non_empty("LINGVA_URL");
        config.defaults.simply_url = non_empty("SIMPLY_URL");

        config.enable_dms = flag("ENABLE_DMS", false);
        config.show_source_lang = flag("SHOW_SOURCE_LANG", true);
        config.only_when_mentioned = flag("ONLY_WHEN_MENTIONED", false);
        config.apply_blacklist_to_commands = flag("APPLY_BLACKLIST_TO_COMMANDS", true);
        config.blacklist = text("BLACKLIST_LANGS")
            .map(|raw| parse_list(&raw).into_iter().map(|c| c.to_uppercase()).collect())
            .unwrap_or_default();

        config.filter.max_input_chars = number("MAX_INPUT_CHARS", 1800)?;
        config.filter.ignore_numeric_like = flag("IGNORE_NUMERIC_LIKE", true);
        config.filter.auto_min_words = number("AUTO_MIN_WORDS", 2)?;
        config.filter.skip_romanized = flag("SKIP_ROMAN_HINDI", true);
        config.filter.romanized_stopwords = match text("ROMAN_HINDI_STOPWORDS") {
            Some(raw) => parse_list(&raw.to_lowercase()),
            None => DEFAULT_ROMANIZED_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        };
        config.filter.romanized_min_matches = number("ROMAN_HINDI_MIN_MATCHES", 2)?;

        if let Some(target) = non_empty("TARGET_LANG") {
            config.target_language = target.to_uppercase();
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ConfigResult<BotConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.config_path, PathBuf::from("config.json"));
        assert_eq!(config.defaults.selected(), ProviderKind::DeepL);
        assert_eq!(config.filter, FilterConfig::default());
        assert!(!config.enable_dms);
        assert!(config.show_source_lang);
        assert!(config.apply_blacklist_to_commands);
        assert!(config.blacklist.is_empty());
        assert_eq!(config.target_language, "EN-US");
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("DEFAULT_PROVIDER", "Lingva"),
            ("LINGVA_URL", " https://lingva.example "),
            ("DEEPL_API_KEY", ""),
            ("ENABLE_DMS", "YES"),
            ("SHOW_SOURCE_LANG", "off"),
            ("BLACKLIST_LANGS", "id, et ,,"),
            ("MAX_INPUT_CHARS", "500"),
            ("AUTO_MIN_WORDS", "3"),
            ("ROMAN_HINDI_STOPWORDS", "Kya, Hai"),
            ("ROMAN_HINDI_MIN_MATCHES", "1"),
        ])
        .unwrap();
        assert_eq!(config.defaults.provider, Some(ProviderKind::Lingva));
        assert_eq!(config.defaults.lingva_url.as_deref(), Some("https://lingva.example"));
        assert_eq!(config.defaults.deepl_api_key, None);
        assert!(config.enable_dms);
        assert!(!config.show_source_lang);
        assert_eq!(
            config.blacklist.into_iter().collect::<Vec<_>>(),
            vec!["ET".to_string(), "ID".to_string()]
        );
        assert_eq!(config.filter.max_input_chars, 500);
        assert_eq!(config.filter.auto_min_words, 3);
        assert_eq!(config.filter.romanized_stopwords, vec!["kya", "hai"]);
        assert_eq!(config.filter.romanized_min_matches, 1);
    }

    #[test]
    fn test_invalid_number() {
        match from_pairs(&[("AUTO_MIN_WORDS", "two")]) {
            Err(ConfigError::InvalidNumber { name, value }) => {
                assert_eq!(name, "AUTO_MIN_WORDS");
                assert_eq!(value, "two");
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_provider() {
        assert!(matches!(
            from_pairs(&[("DEFAULT_PROVIDER", "babelfish")]),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
