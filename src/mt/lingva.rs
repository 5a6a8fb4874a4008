//! Lingva provider
//!
//! `GET {base}/api/v1/auto/{target}/{text}`. The detected language sits in an
//! `info` object whose key differs between deployments.

use crate::mt::error::{ProviderError, ProviderResult};
use crate::mt::response::{LINGVA_DETECTED_KEYS, LINGVA_TRANSLATION_KEYS, string_or_empty};
use crate::mt::translator::{
    RawTranslation, TranslationProvider, clean_base_url, normalize_locale, require,
};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use std::time::Duration;

/// Everything but unreserved characters is escaped, including `/`
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct LingvaProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl LingvaProvider {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(client: reqwest::Client, base_url: Option<&str>) -> Self {
        Self {
            base_url: clean_base_url(base_url),
            client,
            timeout: Self::TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_url(base_url: &str, text: &str, target_language: &str) -> String {
        format!(
            "{}/api/v1/auto/{}/{}",
            base_url,
            normalize_locale(target_language),
            utf8_percent_encode(text, PATH_SEGMENT)
        )
    }

    fn parse_response(json: &Value) -> RawTranslation {
        let translated = string_or_empty(json, LINGVA_TRANSLATION_KEYS);
        let detected = string_or_empty(&json["info"], LINGVA_DETECTED_KEYS);
        RawTranslation::new(detected, translated)
    }
}

#[async_trait]
impl TranslationProvider for LingvaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Lingva
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> ProviderResult<RawTranslation> {
        let base_url = require(&self.base_url, "lingva url")?;
        let response = self
            .client
            .get(Self::request_url(base_url, text, target_language))
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
        Ok(Self::parse_response(&json))
    }
}
