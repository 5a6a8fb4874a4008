//! Best-effort chat message translation
//!
//! Inbound chat text is screened by cheap heuristics, sent through a chain of
//! interchangeable machine translation back-ends, filtered again and turned
//! into a reply. Per-tenant channel allow-lists, language blacklists and
//! provider credentials live in a JSON document managed by [`ConfigStore`].

pub mod classifier;
pub mod config;
pub mod mt;
pub mod pipeline;
pub mod settings;
pub mod store;


pub use classifier::{FilterConfig, SkipReason, Verdict, classify, normalize};
pub use config::{BotConfig, ConfigError, ConfigResult};
pub use pipeline::{
    InboundMessage, NOTHING_TO_TRANSLATE, StatusReport, Translated, TranslationPipeline,
    strip_mentions,
};
pub use settings::{ProviderKind, ProviderSettings, SettingsUpdate};
pub use store::{ChannelId, ConfigDocument, ConfigStore, StoreError, StoreResult, TenantId};
