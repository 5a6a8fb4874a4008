//! LibreTranslate provider
//!
//! Self-hosted back-end. Translation is two independent calls: a best-effort
//! `/detect` whose failure only leaves the detected language empty, then
//! `/translate` with `source=auto`. The optional API key rides along on both.

use crate::mt::error::{ProviderError, ProviderResult};
use crate::mt::translator::{
    RawTranslation, TranslationProvider, clean, clean_base_url, normalize_locale, require,
};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct LibreProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl LibreProvider {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(client: reqwest::Client, base_url: Option<&str>, api_key: Option<&str>) -> Self {
        Self {
            base_url: clean_base_url(base_url),
            api_key: clean(api_key),
            client,
            timeout: Self::TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn with_key<'a>(&'a self, mut form: Vec<(&'static str, &'a str)>) -> Vec<(&'static str, &'a str)> {
        if !self.api_key.is_empty() {
            form.push(("api_key", self.api_key.as_str()));
        }
        form
    }

    /// `[{"language": "fr", "confidence": 90.0}, ...]` → `FR`
    fn parse_detect(json: &Value) -> String {
        json.as_array()
            .and_then(|candidates| candidates.first())
            .and_then(|best| best["language"].as_str())
            .unwrap_or_default()
            .to_uppercase()
    }

    async fn detect(&self, base_url: &str, text: &str) -> ProviderResult<String> {
        let response = self
            .client
            .post(format!("{}/detect", base_url))
            .form(&self.with_key(vec![("q", text)]))
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_response(response, 160).await);
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        Ok(Self::parse_detect(&json))
    }
}

impl std::fmt::Debug for LibreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for LibreProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Libre
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> ProviderResult<RawTranslation> {
        let base_url = require(&self.base_url, "libre url")?;
        let target = normalize_locale(target_language);

        let detected = match self.detect(base_url, text).await {
            Ok(language) => language,
            Err(e) => {
                debug!("libre detect failed: {}", e);
                String::new()
            }
        };

        let form = self.with_key(vec![
            ("q", text),
            ("source", "auto"),
            ("target", target.as_str()),
            ("format", "text"),
        ]);
        let response = self
            .client
            .post(format!("{}/translate", base_url))
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_response(response, 200).await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let translated = json["translatedText"].as_str().unwrap_or_default();
        Ok(RawTranslation::new(detected, translated))
    }
}
