//! Tenant configuration store
//!
//! One JSON document keyed by tenant id:
//!
//! ```json
//! {
//!   "guilds":    { "<tenant>": ["<channel>", ...] },
//!   "blacklist": { "<tenant>": ["ID", "ET"] },
//!   "settings":  { "<tenant>": { "provider": "deepl", "deepl_api_key": "..." } }
//! }
//! ```
//!
//! Reads go against the in-memory document. Every mutation persists the full
//! document through a temp file in the destination directory followed by an
//! atomic rename; saves are serialized by a mutex owned by the store.

use crate::settings::{ProviderSettings, SettingsUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Chat community (guild) id
pub type TenantId = u64;

/// Channel id within a tenant
pub type ChannelId = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize config document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("save task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Channel ids are written as strings so 64-bit ids survive JSON tooling;
/// plain numbers are accepted on load.
mod snowflakes {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(ids: &BTreeSet<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(ids.iter().map(|id| id.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<u64>, D::Error> {
        Vec::<Raw>::deserialize(deserializer)?
            .into_iter()
            .map(|raw| match raw {
                Raw::Number(id) => Ok(id),
                Raw::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| serde::de::Error::custom(format!("invalid channel id '{}'", s))),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ChannelSet(#[serde(with = "snowflakes")] BTreeSet<ChannelId>);

/// The durable document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDocument {
    guilds: BTreeMap<TenantId, ChannelSet>,
    blacklist: BTreeMap<TenantId, BTreeSet<String>>,
    settings: BTreeMap<TenantId, ProviderSettings>,
}

/// Read one top-level map, keeping every well-formed tenant entry
///
/// A missing, null or non-object section reads as empty without touching the
/// other sections.
fn read_section<T: DeserializeOwned>(root: &Value, key: &str) -> BTreeMap<TenantId, T> {
    let entries = match root.get(key) {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            warn!("config section '{}' is not an object; treating it as empty", key);
            return BTreeMap::new();
        }
    };
    entries
        .iter()
        .filter_map(|(tenant, raw)| {
            let Ok(id) = tenant.trim().parse::<TenantId>() else {
                warn!("dropping {} entry with invalid tenant id '{}'", key, tenant);
                return None;
            };
            match serde_json::from_value::<T>(raw.clone()) {
                Ok(entry) => Some((id, entry)),
                Err(e) => {
                    warn!("dropping malformed {} entry for tenant {}: {}", key, id, e);
                    None
                }
            }
        })
        .collect()
}

impl ConfigDocument {
    /// Build from parsed JSON, section by section
    ///
    /// Returns `None` only when the top level is not an object.
    pub fn from_value(root: &Value) -> Option<Self> {
        if !root.is_object() {
            return None;
        }
        let document = ConfigDocument {
            guilds: read_section(root, "guilds"),
            blacklist: read_section(root, "blacklist"),
            settings: read_section(root, "settings"),
        };
        Some(document.normalized())
    }

    /// Parse a whole file; fails only on invalid JSON or a non-object top level
    fn parse(raw: &str) -> Result<Self, String> {
        let root: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        Self::from_value(&root).ok_or_else(|| "top level is not an object".to_string())
    }

    /// Upper-case blacklist codes and drop blanks
    fn normalized(mut self) -> Self {
        for codes in self.blacklist.values_mut() {
            *codes = codes
                .iter()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect();
        }
        self
    }

    pub fn tenant_count(&self) -> usize {
        let mut tenants: BTreeSet<&TenantId> = self.guilds.keys().collect();
        tenants.extend(self.blacklist.keys());
        tenants.extend(self.settings.keys());
        tenants.len()
    }
}

/// Everything stored for one tenant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantConfig {
    pub channels: BTreeSet<ChannelId>,
    pub blacklist: BTreeSet<String>,
    pub settings: ProviderSettings,
}

fn language_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Which step of an atomic write failed
#[derive(Debug)]
enum WriteFailure {
    /// Creating, writing or syncing the temp file; the destination is untouched
    Stage(io::Error),
    /// Renaming the synced temp file over the destination
    Rename(io::Error),
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write to a unique temp file in `staging_dir`, fsync, then rename over `path`
fn write_atomically(path: &Path, staging_dir: &Path, bytes: &[u8]) -> Result<(), WriteFailure> {
    let stage = || -> io::Result<tempfile::NamedTempFile> {
        std::fs::create_dir_all(staging_dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".cfg-")
            .suffix(".json.tmp")
            .tempfile_in(staging_dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    };
    let tmp = stage().map_err(WriteFailure::Stage)?;
    // On failure the temp file is handed back inside the error and removed on drop
    tmp.persist(path).map_err(|e| WriteFailure::Rename(e.error))?;
    Ok(())
}

fn save_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Save {
        path: path.to_path_buf(),
        source,
    }
}

/// Atomic write; only a failed rename falls back to a direct overwrite
fn write_document(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    write_document_via(path, parent_dir(path), bytes)
}

fn write_document_via(path: &Path, staging_dir: &Path, bytes: &[u8]) -> StoreResult<()> {
    match write_atomically(path, staging_dir, bytes) {
        Ok(()) => Ok(()),
        Err(WriteFailure::Stage(e)) => {
            error!("failed to stage config for {}: {}", path.display(), e);
            Err(save_error(path, e))
        }
        Err(WriteFailure::Rename(e)) => {
            error!("failed to save config to {} atomically: {}", path.display(), e);
            std::fs::write(path, bytes).map_err(|source| {
                error!("fallback save failed for {}: {}", path.display(), source);
                save_error(path, source)
            })
        }
    }
}

/// Per-tenant channels, blacklist and provider settings backed by a JSON file
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<ConfigDocument>,
    save_lock: Mutex<()>,
}

impl ConfigStore {
    /// Wrap an existing document without touching the disk
    pub fn with_document(path: impl Into<PathBuf>, document: ConfigDocument) -> Self {
        Self {
            path: path.into(),
            data: RwLock::new(document.normalized()),
            save_lock: Mutex::new(()),
        }
    }

    /// Read the document at `path`
    ///
    /// A missing, unreadable or corrupt file yields an empty document; this
    /// never fails.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match ConfigDocument::parse(&raw) {
                Ok(document) => {
                    info!(
                        "loaded config from {} ({} tenants)",
                        path.display(),
                        document.tenant_count()
                    );
                    document
                }
                Err(e) => {
                    error!("failed to parse {}: {}; starting empty", path.display(), e);
                    ConfigDocument::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no config at {}; starting empty", path.display());
                ConfigDocument::default()
            }
            Err(e) => {
                error!("failed to load {}: {}; starting empty", path.display(), e);
                ConfigDocument::default()
            }
        };
        Self::with_document(path, document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the in-memory document
    pub async fn document(&self) -> ConfigDocument {
        self.data.read().await.clone()
    }

    /// Persist the full document
    pub async fn save(&self) -> StoreResult<()> {
        let _guard = self.save_lock.lock().await;
        let json = serde_json::to_string_pretty(&*self.data.read().await)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_document(&path, json.as_bytes())).await??;
        debug!("saved config to {}", self.path.display());
        Ok(())
    }

    // Auto-translate channels

    pub async fn list_channels(&self, tenant: TenantId) -> Vec<ChannelId> {
        self.data
            .read()
            .await
            .guilds
            .get(&tenant)
            .map(|set| set.0.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn has_channel(&self, tenant: TenantId, channel: ChannelId) -> bool {
        self.data
            .read()
            .await
            .guilds
            .get(&tenant)
            .is_some_and(|set| set.0.contains(&channel))
    }

    /// Returns whether the channel was newly added
    pub async fn add_channel(&self, tenant: TenantId, channel: ChannelId) -> StoreResult<bool> {
        let added = self
            .data
            .write()
            .await
            .guilds
            .entry(tenant)
            .or_default()
            .0
            .insert(channel);
        self.save().await?;
        Ok(added)
    }

    /// Returns whether the channel was present
    pub async fn remove_channel(&self, tenant: TenantId, channel: ChannelId) -> StoreResult<bool> {
        let removed = {
            let mut data = self.data.write().await;
            let removed = data
                .guilds
                .get_mut(&tenant)
                .is_some_and(|set| set.0.remove(&channel));
            if data.guilds.get(&tenant).is_some_and(|set| set.0.is_empty()) {
                data.guilds.remove(&tenant);
            }
            removed
        };
        self.save().await?;
        Ok(removed)
    }

    // Language blacklist

    pub async fn list_blacklist(&self, tenant: TenantId) -> Vec<String> {
        self.data
            .read()
            .await
            .blacklist
            .get(&tenant)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Blank codes are ignored and not persisted
    pub async fn add_blacklist(&self, tenant: TenantId, code: &str) -> StoreResult<bool> {
        let code = language_code(code);
        if code.is_empty() {
            return Ok(false);
        }
        let added = self
            .data
            .write()
            .await
            .blacklist
            .entry(tenant)
            .or_default()
            .insert(code);
        self.save().await?;
        Ok(added)
    }

    pub async fn remove_blacklist(&self, tenant: TenantId, code: &str) -> StoreResult<bool> {
        let code = language_code(code);
        let removed = {
            let mut data = self.data.write().await;
            let removed = data
                .blacklist
                .get_mut(&tenant)
                .is_some_and(|codes| codes.remove(&code));
            if data.blacklist.get(&tenant).is_some_and(BTreeSet::is_empty) {
                data.blacklist.remove(&tenant);
            }
            removed
        };
        self.save().await?;
        Ok(removed)
    }

    // Provider settings

    /// Stored settings for `tenant`; unseen tenants get empty settings
    pub async fn get_settings(&self, tenant: TenantId) -> ProviderSettings {
        self.data
            .read()
            .await
            .settings
            .get(&tenant)
            .cloned()
            .unwrap_or_default()
    }

    /// Merge the present, non-blank fields of `update` and persist
    pub async fn update_settings(
        &self,
        tenant: TenantId,
        update: &SettingsUpdate,
    ) -> StoreResult<ProviderSettings> {
        let updated = {
            let mut data = self.data.write().await;
            let settings = data.settings.entry(tenant).or_default();
            settings.apply(update);
            settings.clone()
        };
        self.save().await?;
        Ok(updated)
    }

    /// Display copy with secrets reduced to `abcd…<len>`
    pub fn masked_settings(settings: &ProviderSettings) -> ProviderSettings {
        settings.masked()
    }

    pub async fn tenant(&self, tenant: TenantId) -> TenantConfig {
        let data = self.data.read().await;
        TenantConfig {
            channels: data
                .guilds
                .get(&tenant)
                .map(|set| set.0.clone())
                .unwrap_or_default(),
            blacklist: data.blacklist.get(&tenant).cloned().unwrap_or_default(),
            settings: data.settings.get(&tenant).cloned().unwrap_or_default(),
        }
    }
}
