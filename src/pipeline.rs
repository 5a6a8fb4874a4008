//! Translation pipeline
//!
//! classify → merge settings → build chain → dispatch → post-filter → compose
//!
//! The chat platform hands inbound events to `handle_message` (automatic
//! mode) or `handle_command` (forced mode) and sends whatever reply comes
//! back. Nothing here fails outward: every rejection is an absent result.

use crate::classifier::{Verdict, classify, normalize};
use crate::config::BotConfig;
use crate::mt::chain::{ChainFactory, HttpChainFactory};
use crate::settings::ProviderSettings;
use crate::store::{ChannelId, ConfigStore, TenantId};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Reply shown when a forced translation produced nothing
pub const NOTHING_TO_TRANSLATE: &str = "Nothing to translate (filtered or identical).";

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?\d+>").unwrap());

/// Remove `<@id>` / `<@!id>` mention tokens and trim
pub fn strip_mentions(text: &str) -> String {
    MENTION.replace_all(text, "").trim().to_string()
}

/// A translation that passed every filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub provider: String,
    /// Upper-cased; may be empty
    pub detected_language: String,
    /// Final reply text, header included when enabled
    pub text: String,
}

/// What the chat platform tells us about an inbound message
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub tenant_id: Option<TenantId>,
    pub channel_id: ChannelId,
    pub author_is_bot: bool,
    pub is_direct: bool,
    pub mentions_bot: bool,
    pub content: String,
}

pub struct TranslationPipeline {
    config: BotConfig,
    store: Arc<ConfigStore>,
    chains: Box<dyn ChainFactory>,
}

impl TranslationPipeline {
    /// Pipeline backed by real HTTP providers
    pub fn new(config: BotConfig, store: Arc<ConfigStore>) -> Self {
        Self::with_chain_factory(config, store, Box::new(HttpChainFactory::default()))
    }

    pub fn with_chain_factory(
        config: BotConfig,
        store: Arc<ConfigStore>,
        chains: Box<dyn ChainFactory>,
    ) -> Self {
        Self {
            config,
            store,
            chains,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Process defaults overlaid with the tenant's stored settings
    pub async fn effective_settings(&self, tenant: Option<TenantId>) -> ProviderSettings {
        match tenant {
            Some(tenant) => {
                let stored = self.store.get_settings(tenant).await;
                self.config.defaults.merged_with(&stored)
            }
            None => self.config.defaults.clone(),
        }
    }

    /// Process blacklist plus the tenant's own
    pub async fn effective_blacklist(&self, tenant: Option<TenantId>) -> BTreeSet<String> {
        let mut codes = self.config.blacklist.clone();
        if let Some(tenant) = tenant {
            codes.extend(self.store.list_blacklist(tenant).await);
        }
        codes
    }

    /// Run the full pipeline for one text
    pub async fn translate(
        &self,
        tenant: Option<TenantId>,
        text: &str,
        force: bool,
        apply_blacklist: bool,
    ) -> Option<Translated> {
        if let Verdict::Ineligible(reason) = classify(text, force, &self.config.filter) {
            debug!("skip ({}): {:?}", reason, text);
            return None;
        }

        let settings = self.effective_settings(tenant).await;
        let chain = self.chains.build(&settings);
        let result = chain.dispatch(text, &self.config.target_language).await?;
        let detected = result.detected_language.to_uppercase();

        if apply_blacklist
            && !detected.is_empty()
            && self.effective_blacklist(tenant).await.contains(&detected)
        {
            debug!("skip (blacklist:{})", detected);
            return None;
        }
        if detected.starts_with("EN") {
            debug!("skip (already english:{})", detected);
            return None;
        }
        if normalize(&result.translated_text) == normalize(text) {
            debug!("skip (no_change)");
            return None;
        }

        let text = if self.config.show_source_lang && !detected.is_empty() {
            format!(
                "Translated from {} via {}:\n{}",
                detected, result.provider, result.translated_text
            )
        } else {
            result.translated_text
        };
        Some(Translated {
            provider: result.provider,
            detected_language: detected,
            text,
        })
    }

    /// Automatic translation of a message posted in a channel
    pub async fn handle_message(&self, message: &InboundMessage) -> Option<String> {
        if message.author_is_bot {
            return None;
        }
        if message.is_direct && !self.config.enable_dms {
            return None;
        }
        let tenant = message.tenant_id?;
        if !self.store.has_channel(tenant, message.channel_id).await {
            return None;
        }
        let content = if self.config.only_when_mentioned {
            if !message.mentions_bot {
                return None;
            }
            strip_mentions(&message.content)
        } else {
            message.content.clone()
        };
        self.translate(Some(tenant), &content, false, true)
            .await
            .map(|translated| translated.text)
    }

    /// Explicit translation request; always answers
    pub async fn handle_command(&self, tenant: Option<TenantId>, text: &str) -> String {
        self.translate(tenant, text, true, self.config.apply_blacklist_to_commands)
            .await
            .map(|translated| translated.text)
            .unwrap_or_else(|| NOTHING_TO_TRANSLATE.to_string())
    }

    /// Everything an administrator needs to see for one tenant
    pub async fn status(&self, tenant: TenantId) -> StatusReport {
        let stored = self.store.tenant(tenant).await;
        StatusReport {
            channels: stored.channels.into_iter().collect(),
            process_blacklist: self.config.blacklist.clone(),
            tenant_blacklist: stored.blacklist,
            only_when_mentioned: self.config.only_when_mentioned,
            ignore_numeric_like: self.config.filter.ignore_numeric_like,
            auto_min_words: self.config.filter.auto_min_words,
            skip_romanized: self.config.filter.skip_romanized,
            settings: stored.settings.masked(),
        }
    }
}

/// Tenant status, secrets already masked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub channels: Vec<ChannelId>,
    pub process_blacklist: BTreeSet<String>,
    pub tenant_blacklist: BTreeSet<String>,
    pub only_when_mentioned: bool,
    pub ignore_numeric_like: bool,
    pub auto_min_words: usize,
    pub skip_romanized: bool,
    pub settings: ProviderSettings,
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self
            .channels
            .iter()
            .map(|id| format!("<#{}>", id))
            .collect::<Vec<_>>();
        writeln!(f, "Translation Status")?;
        writeln!(f, "Auto Channels: {}", join_or_none(channels.iter()))?;
        writeln!(f, "Env Blacklist: {}", join_or_none(self.process_blacklist.iter()))?;
        writeln!(f, "Guild Blacklist: {}", join_or_none(self.tenant_blacklist.iter()))?;
        writeln!(f, "Heuristics:")?;
        writeln!(f, "  ONLY_WHEN_MENTIONED={}", self.only_when_mentioned)?;
        writeln!(f, "  IGNORE_NUMERIC_LIKE={}", self.ignore_numeric_like)?;
        writeln!(f, "  AUTO_MIN_WORDS={}", self.auto_min_words)?;
        writeln!(f, "  SKIP_ROMAN_HINDI={}", self.skip_romanized)?;
        match self.settings.provider {
            Some(provider) => writeln!(f, "Provider: {}", provider)?,
            None => writeln!(f, "Provider: (default)")?,
        }
        // Already masked; display_lines() would mask a second time
        let fields = [
            ("deepl_api_key", &self.settings.deepl_api_key),
            ("libre_url", &self.settings.libre_url),
            ("libre_api_key", &self.settings.libre_api_key),
            ("lingva_url", &self.settings.lingva_url),
            ("simply_url", &self.settings.simply_url),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                writeln!(f, "  {}={}", name, value)?;
            }
        }
        Ok(())
    }
}
