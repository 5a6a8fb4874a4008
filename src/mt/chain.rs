//! Provider chains: ordering and fallback dispatch
//!
//! A chain is built per request from the merged tenant and default settings.
//! The selected provider goes first, then every other configured provider in
//! canonical order. Dispatch walks the chain sequentially and stops at the
//! first non-empty translation, so paid back-ends are only hit when needed.

use crate::mt::deepl::DeepLProvider;
use crate::mt::libre::LibreProvider;
use crate::mt::lingva::LingvaProvider;
use crate::mt::simply::SimplyProvider;
use crate::mt::translator::TranslationProvider;
use crate::settings::{ProviderKind, ProviderSettings};
use tracing::{debug, warn};

/// Outcome of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub provider: String,
    /// Upper-cased, empty when the provider did not report one
    pub detected_language: String,
    pub translated_text: String,
}

/// An ordered list of providers tried one after another
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: Box<dyn TranslationProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in dispatch order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Try each provider in order; the first non-blank translation wins
    pub async fn dispatch(&self, text: &str, target_language: &str) -> Option<TranslationResult> {
        for provider in &self.providers {
            let Some(raw) = provider.translate(text, target_language).await else {
                continue;
            };
            if raw.text.trim().is_empty() {
                debug!(provider = provider.provider_name(), "empty translation, falling through");
                continue;
            }
            return Some(TranslationResult {
                provider: provider.provider_name().to_string(),
                detected_language: raw.detected_language,
                translated_text: raw.text,
            });
        }
        warn!(chain = ?self.names(), "every provider in the chain failed");
        None
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Selected provider first, then the rest in canonical order
pub fn priority_order(selected: ProviderKind) -> Vec<ProviderKind> {
    std::iter::once(selected)
        .chain(ProviderKind::ALL.into_iter().filter(|kind| *kind != selected))
        .collect()
}

fn build_provider(
    kind: ProviderKind,
    settings: &ProviderSettings,
    client: &reqwest::Client,
) -> Box<dyn TranslationProvider> {
    let client = client.clone();
    match kind {
        ProviderKind::DeepL => Box::new(DeepLProvider::new(client, settings.deepl_api_key.as_deref())),
        ProviderKind::Libre => Box::new(LibreProvider::new(
            client,
            settings.libre_url.as_deref(),
            settings.libre_api_key.as_deref(),
        )),
        ProviderKind::Lingva => Box::new(LingvaProvider::new(client, settings.lingva_url.as_deref())),
        ProviderKind::Simply => Box::new(SimplyProvider::new(client, settings.simply_url.as_deref())),
    }
}

/// Build the chain for one request
///
/// Only configured providers are kept. When none is configured the chain
/// still holds the selected provider, so the failure is reported against it.
pub fn build_provider_chain(settings: &ProviderSettings, client: &reqwest::Client) -> ProviderChain {
    let selected = settings.selected();
    let mut candidates: Vec<Box<dyn TranslationProvider>> = priority_order(selected)
        .into_iter()
        .map(|kind| build_provider(kind, settings, client))
        .collect();

    if candidates.iter().any(|p| p.is_configured()) {
        candidates.retain(|p| p.is_configured());
    } else {
        warn!(provider = %selected, "no translation provider is configured");
        candidates.truncate(1);
    }
    ProviderChain::new(candidates)
}

/// Seam through which the pipeline obtains a chain for merged settings
pub trait ChainFactory: Send + Sync {
    fn build(&self, settings: &ProviderSettings) -> ProviderChain;
}

/// Production factory: real HTTP providers sharing one client
#[derive(Debug, Clone, Default)]
pub struct HttpChainFactory {
    client: reqwest::Client,
}

impl HttpChainFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ChainFactory for HttpChainFactory {
    fn build(&self, settings: &ProviderSettings) -> ProviderChain {
        build_provider_chain(settings, &self.client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockProvider};
    use std::time::Duration;

    /// Accepts connections and never answers
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    // ========== Ordering Tests ==========

    #[test]
    fn test_priority_order() {
        assert_eq!(
            priority_order(ProviderKind::Lingva),
            vec![
                ProviderKind::Lingva,
                ProviderKind::DeepL,
                ProviderKind::Libre,
                ProviderKind::Simply
            ]
        );
        assert_eq!(priority_order(ProviderKind::DeepL), ProviderKind::ALL.to_vec());
    }

    #[test]
    fn test_chain_keeps_configured_in_priority_order() {
        let settings = ProviderSettings {
            provider: Some(ProviderKind::Simply),
            deepl_api_key: Some("key:fx".to_string()),
            lingva_url: Some("https://lingva.example".to_string()),
            simply_url: Some("https://simply.example".to_string()),
            ..Default::default()
        };
        let chain = build_provider_chain(&settings, &reqwest::Client::new());
        assert_eq!(chain.names(), vec!["simply", "deepl", "lingva"]);
    }

    #[test]
    fn test_unconfigured_selected_provider_is_skipped() {
        let settings = ProviderSettings {
            provider: Some(ProviderKind::DeepL),
            libre_url: Some("http://libre".to_string()),
            ..Default::default()
        };
        let chain = build_provider_chain(&settings, &reqwest::Client::new());
        assert_eq!(chain.names(), vec!["libre"]);
    }

    #[test]
    fn test_nothing_configured_keeps_selected() {
        let settings = ProviderSettings {
            provider: Some(ProviderKind::Lingva),
            ..Default::default()
        };
        let chain = build_provider_chain(&settings, &reqwest::Client::new());
        assert_eq!(chain.names(), vec!["lingva"]);

        let chain = build_provider_chain(&ProviderSettings::default(), &reqwest::Client::new());
        assert_eq!(chain.names(), vec!["deepl"]);
    }

    // ========== Dispatch Tests ==========

    #[tokio::test]
    async fn test_falls_back_past_faulting_provider() {
        let broken = MockProvider::new("x", MockMode::Error("connection reset".to_string()));
        let working = MockProvider::new("y", MockMode::fixed("FR", "Bonjour traduit"));
        let chain = ProviderChain::new(vec![Box::new(broken.clone()), Box::new(working)]);

        let result = chain.dispatch("Bonjour", "EN-US").await.unwrap();
        assert_eq!(
            result,
            TranslationResult {
                provider: "y".to_string(),
                detected_language: "FR".to_string(),
                translated_text: "Bonjour traduit".to_string(),
            }
        );
        assert_eq!(broken.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_translation_is_not_success() {
        let blank = MockProvider::new("blank", MockMode::fixed("DE", "   "));
        let empty = MockProvider::new("empty", MockMode::Empty);
        let good = MockProvider::new("good", MockMode::fixed("DE", "good evening"));
        let chain = ProviderChain::new(vec![Box::new(blank), Box::new(empty), Box::new(good)]);
        assert_eq!(chain.dispatch("Guten Abend", "EN-US").await.unwrap().provider, "good");
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let first = MockProvider::new("first", MockMode::fixed("ES", "hello"));
        let second = MockProvider::new("second", MockMode::fixed("ES", "hi"));
        let chain = ProviderChain::new(vec![Box::new(first), Box::new(second.clone())]);
        assert_eq!(chain.dispatch("hola", "EN-US").await.unwrap().provider, "first");
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_none() {
        let chain = ProviderChain::new(vec![
            Box::new(MockProvider::new("a", MockMode::Error("down".to_string()))),
            Box::new(MockProvider::new("b", MockMode::Empty)),
        ]);
        assert!(chain.dispatch("hola", "EN-US").await.is_none());
        assert!(ProviderChain::default().dispatch("hola", "EN-US").await.is_none());
    }

    #[tokio::test]
    async fn test_timed_out_provider_falls_through() {
        let url = silent_server().await;
        let slow = LingvaProvider::new(reqwest::Client::new(), Some(&url))
            .with_timeout(Duration::from_millis(200));
        let err = slow.try_translate("hola", "EN-US").await.unwrap_err();
        assert!(err.is_timeout(), "{:?}", err);
        assert!(slow.translate("hola", "EN-US").await.is_none());

        let backup = MockProvider::new("backup", MockMode::fixed("ES", "hello"));
        let chain = ProviderChain::new(vec![Box::new(slow), Box::new(backup.clone())]);
        let result = chain.dispatch("hola", "EN-US").await.unwrap();
        assert_eq!(result.provider, "backup");
        assert_eq!(result.translated_text, "hello");
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_in_chain_is_skipped() {
        let off = MockProvider::new("off", MockMode::fixed("FR", "nope")).unconfigured();
        let on = MockProvider::new("on", MockMode::fixed("FR", "yes"));
        let mut chain = ProviderChain::default();
        chain.push(Box::new(off.clone()));
        chain.push(Box::new(on));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.dispatch("oui", "EN-US").await.unwrap().provider, "on");
        assert_eq!(off.calls(), 0);
    }
}
