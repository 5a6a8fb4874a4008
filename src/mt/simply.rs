//! SimplyTranslate provider
//!
//! `POST {base}/api/translate` with `{"from": "auto", "to": <short>, "text": ...}`.
//! Response field names vary by deployment; see `mt::response`.

use crate::mt::error::{ProviderError, ProviderResult};
use crate::mt::response::{SIMPLY_DETECTED_KEYS, SIMPLY_TRANSLATION_KEYS, string_or_empty};
use crate::mt::translator::{
    RawTranslation, TranslationProvider, clean_base_url, normalize_locale, require,
};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SimplyProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SimplyProvider {
    const TIMEOUT: Duration = Duration::from_secs(12);

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

    fn request_body(text: &str, target_language: &str) -> Value {
        json!({
            "from": "auto",
            "to": normalize_locale(target_language),
            "text": text,
        })
    }

    fn parse_response(json: &Value) -> RawTranslation {
        RawTranslation::new(
            string_or_empty(json, SIMPLY_DETECTED_KEYS),
            string_or_empty(json, SIMPLY_TRANSLATION_KEYS),
        )
    }
}

#[async_trait]
impl TranslationProvider for SimplyProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Simply
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> ProviderResult<RawTranslation> {
        let base_url = require(&self.base_url, "simply url")?;
        let response = self
            .client
            .post(format!("{}/api/translate", base_url))
            .json(&Self::request_body(text, target_language))
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
