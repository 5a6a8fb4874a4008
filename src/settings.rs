//! Provider selection and credentials
//!
//! `ProviderSettings` is stored per tenant and also built from the process
//! environment. Tenant values override defaults field-by-field, and only
//! when they are non-empty.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of translation back-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    DeepL,
    Libre,
    Lingva,
    Simply,
}

impl ProviderKind {
    /// Canonical fallback order used after the selected provider
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::DeepL,
        ProviderKind::Libre,
        ProviderKind::Lingva,
        ProviderKind::Simply,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepL => "deepl",
            ProviderKind::Libre => "libre",
            ProviderKind::Lingva => "lingva",
            ProviderKind::Simply => "simply",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown provider '{0}' (expected deepl|libre|lingva|simply)")]
    UnknownProvider(String),
}

impl FromStr for ProviderKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| SettingsError::UnknownProvider(s.trim().to_string()))
    }
}

/// Provider selection plus every credential or URL a provider may need
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_provider"
    )]
    pub provider: Option<ProviderKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepl_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libre_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libre_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lingva_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simply_url: Option<String>,
}

/// A partial settings change; `None` and blank fields leave the stored value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub provider: Option<ProviderKind>,
    pub deepl_api_key: Option<String>,
    pub libre_url: Option<String>,
    pub libre_api_key: Option<String>,
    pub lingva_url: Option<String>,
    pub simply_url: Option<String>,
}

/// Unknown provider names in a stored document are dropped rather than
/// failing the whole load.
fn lenient_provider<'de, D>(deserializer: D) -> Result<Option<ProviderKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn overlay(target: &mut Option<String>, source: &Option<String>) {
    if let Some(value) = non_empty(source) {
        *target = Some(value.to_string());
    }
}

/// Shortest secret whose first characters may be shown
const MASK_REVEAL_MIN_LEN: usize = 8;

/// Render a secret as its first four characters, an ellipsis and its length
///
/// Secrets shorter than eight characters show only the ellipsis and length.
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len == 0 {
        return String::new();
    }
    let reveal = if len >= MASK_REVEAL_MIN_LEN { 4 } else { 0 };
    let prefix: String = secret.chars().take(reveal).collect();
    format!("{}…{}", prefix, len)
}

impl ProviderSettings {
    /// The selected provider, falling back to DeepL when none is set
    pub fn selected(&self) -> ProviderKind {
        self.provider.unwrap_or(ProviderKind::DeepL)
    }

    /// Return `self` overlaid with every non-empty field of `tenant`
    pub fn merged_with(&self, tenant: &ProviderSettings) -> ProviderSettings {
        let mut merged = self.clone();
        if tenant.provider.is_some() {
            merged.provider = tenant.provider;
        }
        overlay(&mut merged.deepl_api_key, &tenant.deepl_api_key);
        overlay(&mut merged.libre_url, &tenant.libre_url);
        overlay(&mut merged.libre_api_key, &tenant.libre_api_key);
        overlay(&mut merged.lingva_url, &tenant.lingva_url);
        overlay(&mut merged.simply_url, &tenant.simply_url);
        merged
    }

    /// Apply a partial update, ignoring absent and blank fields
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if update.provider.is_some() {
            self.provider = update.provider;
        }
        overlay(&mut self.deepl_api_key, &update.deepl_api_key);
        overlay(&mut self.libre_url, &update.libre_url);
        overlay(&mut self.libre_api_key, &update.libre_api_key);
        overlay(&mut self.lingva_url, &update.lingva_url);
        overlay(&mut self.simply_url, &update.simply_url);
    }

    pub fn is_empty(&self) -> bool {
        self == &ProviderSettings::default()
    }

    /// Copy with secret-bearing fields masked for display
    pub fn masked(&self) -> ProviderSettings {
        ProviderSettings {
            deepl_api_key: self.deepl_api_key.as_deref().map(mask_secret),
            libre_api_key: self.libre_api_key.as_deref().map(mask_secret),
            ..self.clone()
        }
    }

    /// `key=value` lines for the fields that are set, secrets masked
    pub fn display_lines(&self) -> Vec<String> {
        let masked = self.masked();
        let mut lines = Vec::new();
        if let Some(provider) = masked.provider {
            lines.push(format!("provider={}", provider));
        }
        let fields = [
            ("deepl_api_key", &masked.deepl_api_key),
            ("libre_url", &masked.libre_url),
            ("libre_api_key", &masked.libre_api_key),
            ("lingva_url", &masked.lingva_url),
            ("simply_url", &masked.simply_url),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                lines.push(format!("{}={}", name, value));
            }
        }
        lines
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = self.masked();
        f.debug_struct("ProviderSettings")
            .field("provider", &masked.provider)
            .field("deepl_api_key", &masked.deepl_api_key)
            .field("libre_url", &masked.libre_url)
            .field("libre_api_key", &masked.libre_api_key)
            .field("lingva_url", &masked.lingva_url)
            .field("simply_url", &masked.simply_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Provider Kind Tests ==========

    #[test]
    fn test_parse_provider_kind() {
        assert_eq!("deepl".parse::<ProviderKind>().unwrap(), ProviderKind::DeepL);
        assert_eq!(" Lingva ".parse::<ProviderKind>().unwrap(), ProviderKind::Lingva);
        assert_eq!(
            "google".parse::<ProviderKind>(),
            Err(SettingsError::UnknownProvider("google".to_string()))
        );
    }

    #[test]
    fn test_unknown_stored_provider_is_dropped() {
        let st: ProviderSettings =
            serde_json::from_str(r#"{"provider":"bing","libre_url":"http://x"}"#).unwrap();
        assert_eq!(st.provider, None);
        assert_eq!(st.libre_url.as_deref(), Some("http://x"));
    }

    // ========== Merge & Update Tests ==========

    #[test]
    fn test_tenant_wins_only_when_non_empty() {
        let defaults = ProviderSettings {
            provider: Some(ProviderKind::DeepL),
            deepl_api_key: Some("env-key".to_string()),
            lingva_url: Some("https://lingva.example".to_string()),
            ..Default::default()
        };
        let tenant = ProviderSettings {
            provider: Some(ProviderKind::Simply),
            deepl_api_key: Some("   ".to_string()),
            simply_url: Some("https://simply.example".to_string()),
            ..Default::default()
        };
        let merged = defaults.merged_with(&tenant);
        assert_eq!(merged.provider, Some(ProviderKind::Simply));
        assert_eq!(merged.deepl_api_key.as_deref(), Some("env-key"));
        assert_eq!(merged.lingva_url.as_deref(), Some("https://lingva.example"));
        assert_eq!(merged.simply_url.as_deref(), Some("https://simply.example"));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut st = ProviderSettings {
            provider: Some(ProviderKind::DeepL),
            libre_url: Some("X".to_string()),
            ..Default::default()
        };
        st.apply(&SettingsUpdate {
            provider: Some(ProviderKind::Lingva),
            ..Default::default()
        });
        assert_eq!(st.provider, Some(ProviderKind::Lingva));
        assert_eq!(st.libre_url.as_deref(), Some("X"));
    }

    // ========== Masking Tests ==========

    #[test]
    fn test_mask_secret() {
        let secret = "sk-abcdefghijklmno";
        assert_eq!(secret.len(), 18);
        let masked = mask_secret(secret);
        assert_eq!(masked, "sk-a…18");
        assert!(!masked.contains(secret));
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_short_secrets_are_never_shown() {
        for (secret, expected) in [("a", "…1"), ("abc", "…3"), ("abcd", "…4"), ("abcdefg", "…7")] {
            let masked = mask_secret(secret);
            assert_eq!(masked, expected);
            assert!(!masked.contains(secret));
        }
        assert_eq!(mask_secret("abcdefgh"), "abcd…8");
    }

    #[test]
    fn test_masked_settings_only_touch_secrets() {
        let st = ProviderSettings {
            deepl_api_key: Some("0123456789abcdef:fx".to_string()),
            libre_url: Some("https://libre.example".to_string()),
            libre_api_key: Some("".to_string()),
            ..Default::default()
        };
        let masked = st.masked();
        assert_eq!(masked.deepl_api_key.as_deref(), Some("0123…19"));
        assert_eq!(masked.libre_url.as_deref(), Some("https://libre.example"));
        assert_eq!(masked.libre_api_key.as_deref(), Some(""));
    }

    #[test]
    fn test_debug_never_shows_secret() {
        let st = ProviderSettings {
            deepl_api_key: Some("super-secret-key".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", st);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("supe…16"));
    }

    #[test]
    fn test_display_lines() {
        let st = ProviderSettings {
            provider: Some(ProviderKind::Libre),
            libre_url: Some("http://libre".to_string()),
            ..Default::default()
        };
        assert_eq!(st.display_lines(), vec!["provider=libre", "libre_url=http://libre"]);
        assert!(ProviderSettings::default().is_empty());
    }
}
