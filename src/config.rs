//! Configuration management for aniwatch
//!
//! Handles config file loading/saving and turns it into resolver settings.
//! Config is stored at ~/.config/aniwatch/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::SourceKind;
use crate::resolver::{BackupPolicy, OverrideTable, ResolverPolicy, DEFAULT_FALLBACK_EPISODES};

/// Base URLs for every service (override for mirrors or self-hosted Jikan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub jikan: String,
    pub anilist: String,
    pub kitsu: String,
    pub malsync: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            jikan: "https://api.jikan.moe/v4".to_string(),
            anilist: "https://graphql.anilist.co".to_string(),
            kitsu: "https://kitsu.io/api/edge".to_string(),
            malsync: "https://api.malsync.moe".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
    /// Answer for an airing show nobody could count
    pub fallback_episodes: u32,
    /// How backup counts are combined (minimum, maximum, first)
    pub backup_policy: BackupPolicy,
    /// Cap airing estimates at the planned total
    pub clamp_to_planned: bool,
    /// Metadata sources, in priority order
    pub metadata: Vec<String>,
    /// Backup count sources, in priority order
    pub backups: Vec<String>,
    /// Shows resolved in parallel by `episodes` and `search --resolve`.
    ///
    /// Jikan allows about 3 requests per second and an airing show can cost
    /// it 11 calls; raising this mostly trades answers for HTTP 429s that
    /// fall through to backups or the fallback count.
    pub concurrency: usize,
    /// Extra overrides: MAL id -> episode count
    pub overrides: BTreeMap<String, u32>,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            fallback_episodes: DEFAULT_FALLBACK_EPISODES,
            backup_policy: BackupPolicy::Minimum,
            clamp_to_planned: true,
            metadata: vec!["jikan".to_string(), "anilist".to_string()],
            backups: vec!["jikan".to_string(), "kitsu".to_string()],
            concurrency: 1,
            overrides: BTreeMap::new(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/aniwatch/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aniwatch").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_or_default(&path),
            _ => Self::default(),
        }
    }

    /// Load from an explicit path, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            backup: self.backup_policy,
            fallback_episodes: self.fallback_episodes,
            clamp_to_planned: self.clamp_to_planned,
        }
    }

    /// Built-in overrides plus the ones from this config (config wins)
    pub fn override_table(&self) -> OverrideTable {
        let extra = self.overrides.iter().filter_map(|(id, &count)| {
            match id.trim().parse::<u64>() {
                Ok(id) => Some((id, count)),
                Err(_) => {
                    tracing::warn!("Ignoring override with non-numeric id {:?}", id);
                    None
                }
            }
        });
        OverrideTable::builtin().extend(extra)
    }

    pub fn metadata_sources(&self) -> Vec<SourceKind> {
        parse_sources(&self.metadata)
    }

    pub fn backup_sources(&self) -> Vec<SourceKind> {
        parse_sources(&self.backups)
    }
}

/// Known source names in order, duplicates dropped
fn parse_sources(names: &[String]) -> Vec<SourceKind> {
    let mut kinds = Vec::new();
    for name in names {
        match SourceKind::from_name(name) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => tracing::warn!("Unknown source {:?} in config", name),
        }
    }
    kinds
}
