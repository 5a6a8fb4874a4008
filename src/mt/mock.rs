//! Mock translation provider for testing
//!
//! A deterministic, network-free provider for exercising chains and the
//! pipeline without API keys.
//!
//! # Example
//!
//! ```ignore
//! use reply_translate::mt::{MockMode, MockProvider, TranslationProvider};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockProvider::new("mock", MockMode::fixed("FR", "hello"));
//!     let raw = mock.translate("bonjour", "EN-US").await.unwrap();
//!     assert_eq!(raw.text, "hello");
//! }
//! ```

use crate::mt::error::{ProviderError, ProviderResult};
use crate::mt::translator::{RawTranslation, TranslationProvider};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Always answer with this detected language and text
    Fixed { detected: String, text: String },

    /// Look up the input text; unknown input yields an empty translation
    Mappings(HashMap<String, RawTranslation>),

    /// Return the input unchanged, reporting the given detected language
    Echo(String),

    /// Succeed with an empty translation
    Empty,

    /// Fail with a provider fault
    Error(String),
}

impl MockMode {
    pub fn fixed(detected: &str, text: &str) -> Self {
        MockMode::Fixed {
            detected: detected.to_string(),
            text: text.to_string(),
        }
    }
}

/// Mock provider that records how often it was called
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    kind: ProviderKind,
    configured: bool,
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(name: &str, mode: MockMode) -> Self {
        Self {
            name: name.to_string(),
            kind: ProviderKind::DeepL,
            configured: true,
            mode,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report a specific provider kind
    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Simulate a provider without credentials
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Number of `try_translate` calls so far, shared between clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_translation(&self, text: &str) -> ProviderResult<RawTranslation> {
        match &self.mode {
            MockMode::Fixed { detected, text } => {
                Ok(RawTranslation::new(detected.as_str(), text.as_str()))
            }
            MockMode::Mappings(map) => Ok(map
                .get(text)
                .cloned()
                .unwrap_or_else(|| RawTranslation::new("", ""))),
            MockMode::Echo(detected) => Ok(RawTranslation::new(detected.as_str(), text)),
            MockMode::Empty => Ok(RawTranslation::new("", "")),
            MockMode::Error(msg) => Err(ProviderError::MalformedResponse(msg.clone())),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn try_translate(
        &self,
        text: &str,
        _target_language: &str,
    ) -> ProviderResult<RawTranslation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.apply_translation(text)
    }
}
