/// Machine Translation Module
///
/// Interchangeable translation back-ends behind one trait, and the chain that
/// tries them in priority order.
///
/// # Overview
///
/// 1. **Provider trait** - `TranslationProvider`, infallible at the call site
/// 2. **Providers** - DeepL, LibreTranslate, Lingva and SimplyTranslate adapters
/// 3. **Response readers** - tolerant field lookup for mirror deployments
/// 4. **Chain** - priority ordering and sequential fallback dispatch
///
/// # Example
///
/// ```ignore
/// use reply_translate::mt::build_provider_chain;
/// use reply_translate::settings::ProviderSettings;
///
/// #[tokio::main]
/// async fn main() {
///     let settings = ProviderSettings {
///         lingva_url: Some("https://lingva.ml".to_string()),
///         ..Default::default()
///     };
///     let chain = build_provider_chain(&settings, &reqwest::Client::new());
///     if let Some(result) = chain.dispatch("bonjour tout le monde", "EN-US").await {
///         println!("{} via {}", result.translated_text, result.provider);
///     }
/// }
/// ```
pub mod chain;
pub mod deepl;
pub mod error;
pub mod libre;
pub mod lingva;
pub mod mock;
pub mod response;
pub mod simply;
pub mod translator;

pub use chain::{
    ChainFactory, HttpChainFactory, ProviderChain, TranslationResult, build_provider_chain,
    priority_order,
};
pub use deepl::DeepLProvider;
pub use error::{ProviderError, ProviderResult};
pub use libre::LibreProvider;
pub use lingva::LingvaProvider;
pub use mock::{MockMode, MockProvider};
pub use simply::SimplyProvider;
pub use translator::{RawTranslation, TranslationProvider, normalize_locale};
