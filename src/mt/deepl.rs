//! DeepL API provider
//!
//! The primary, key-based back-end. Requests ask for informal output where
//! the target language supports it and preserve the original formatting.
//!
//! Keys ending in `:fx` belong to the free plan and are served from
//! `api-free.deepl.com`; every other key goes to `api.deepl.com`.

use crate::mt::error::{ProviderError, ProviderResult};
use crate::mt::translator::{RawTranslation, TranslationProvider, clean, require};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;

/// DeepL v2 provider
#[derive(Clone)]
pub struct DeepLProvider {
    /// API key; empty when unconfigured
    api_key: String,
    /// Shared HTTP client
    client: reqwest::Client,
    /// Scheme and host, without the `/v2/translate` path
    endpoint: String,
    timeout: Duration,
}

impl DeepLProvider {
    const TIMEOUT: Duration = Duration::from_secs(10);
    const FREE_ENDPOINT: &'static str = "https://api-free.deepl.com";
    const PRO_ENDPOINT: &'static str = "https://api.deepl.com";

    /// Build from an optional key; a missing or blank key leaves the provider unconfigured
    pub fn new(client: reqwest::Client, api_key: Option<&str>) -> Self {
        let api_key = clean(api_key);
        let endpoint = Self::endpoint_for(&api_key).to_string();
        Self {
            api_key,
            client,
            endpoint,
            timeout: Self::TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the provider at a different host (self-hosted proxies, tests)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        self
    }

    fn endpoint_for(api_key: &str) -> &'static str {
        if api_key.ends_with(":fx") {
            Self::FREE_ENDPOINT
        } else {
            Self::PRO_ENDPOINT
        }
    }

    fn form<'a>(text: &'a str, target_language: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("text", text),
            ("target_lang", target_language),
            ("formality", "prefer_less"),
            ("preserve_formatting", "1"),
        ]
    }

    /// Read `translations[0]` out of a `/v2/translate` response
    fn parse_response(json: &Value) -> ProviderResult<RawTranslation> {
        let first = json["translations"]
            .as_array()
            .and_then(|translations| translations.first())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing 'translations' array".to_string())
            })?;
        let text = first["text"].as_str().ok_or_else(|| {
            ProviderError::MalformedResponse("missing 'text' field".to_string())
        })?;
        let detected = first["detected_source_language"].as_str().unwrap_or_default();
        Ok(RawTranslation::new(detected, text))
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepL
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> ProviderResult<RawTranslation> {
        let api_key = require(&self.api_key, "deepl api key")?;
        let target = target_language.trim().to_uppercase();

        let response = self
            .client
            .post(format!("{}/v2/translate", self.endpoint))
            .header(AUTHORIZATION, format!("DeepL-Auth-Key {}", api_key))
            .form(&Self::form(text, &target))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response(response, 200).await);
        }

        let json: Value = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("failed to parse DeepL response: {}", e))
        })?;
        Self::parse_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== Configuration Tests ==========

    #[test]
    fn test_configured_only_with_key() {
        let client = reqwest::Client::new();
        assert!(!DeepLProvider::new(client.clone(), None).is_configured());
        assert!(!DeepLProvider::new(client.clone(), Some("   ")).is_configured());
        assert!(DeepLProvider::new(client, Some("abc:fx")).is_configured());
    }

    #[test]
    fn test_endpoint_follows_key_plan() {
        let client = reqwest::Client::new();
        let free = DeepLProvider::new(client.clone(), Some("abc:fx"));
        assert_eq!(free.endpoint, "https://api-free.deepl.com");
        let pro = DeepLProvider::new(client, Some("abc"));
        assert_eq!(pro.endpoint, "https://api.deepl.com");
    }

    #[test]
    fn test_form_asks_for_informal_preserved_output() {
        let form = DeepLProvider::form("Hallo", "EN-US");
        assert!(form.contains(&("formality", "prefer_less")));
        assert!(form.contains(&("preserve_formatting", "1")));
        assert!(form.contains(&("target_lang", "EN-US")));
    }

    #[test]
    fn test_debug_output_masks_key() {
        let provider = DeepLProvider::new(reqwest::Client::new(), Some("secret-key:fx"));
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("secret-key"));
    }

    // ========== Response Parsing Tests ==========

    #[test]
    fn test_parse_response() {
        let json = json!({
            "translations": [{"detected_source_language": "de", "text": "Hello"}]
        });
        let raw = DeepLProvider::parse_response(&json).unwrap();
        assert_eq!(raw, RawTranslation::new("DE", "Hello"));
    }

    #[test]
    fn test_parse_response_without_translations() {
        let json = json!({"message": "Quota exceeded"});
        match DeepLProvider::parse_response(&json) {
            Err(ProviderError::MalformedResponse(msg)) => assert!(msg.contains("translations")),
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }

    // ========== Failure Tests ==========

    #[tokio::test]
    async fn test_unconfigured_yields_none() {
        let provider = DeepLProvider::new(reqwest::Client::new(), None);
        assert!(provider.translate("Hallo Welt", "EN-US").await.is_none());
        assert!(matches!(
            provider.try_translate("Hallo Welt", "EN-US").await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_none() {
        let provider = DeepLProvider::new(reqwest::Client::new(), Some("key"))
            .with_endpoint("http://127.0.0.1:9");
        assert!(provider.translate("Hallo Welt", "EN-US").await.is_none());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_api_translation() {
        let Ok(key) = std::env::var("DEEPL_API_KEY") else {
            eprintln!("Skipping: DEEPL_API_KEY not set");
            return;
        };
        let provider = DeepLProvider::new(reqwest::Client::new(), Some(&key));
        let raw = provider.translate("Guten Morgen zusammen", "EN-US").await.unwrap();
        assert_eq!(raw.detected_language, "DE");
        assert!(!raw.text.is_empty());
    }
}
