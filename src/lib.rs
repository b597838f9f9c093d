//! aniwatch - anime episode availability resolver
//!
//! Works out how many episodes of a show can be watched right now by
//! reconciling Jikan (MyAnimeList), AniList, Kitsu and MAL-Sync, which
//! rarely agree about shows that are still airing.
//!
//! # Modules
//!
//! - `models` - Queries, signals, estimates and search results
//! - `api` - API clients and the source traits the resolver consumes
//! - `resolver` - Override table, policy and the reconciliation itself
//! - `config` - TOML config file
//! - `cli` / `commands` - Command-line surface

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use models::{
    AiringSignal, AiringState, AnimeSummary, Provenance, ResolvedAvailability, ScheduledEpisode,
    ShowQuery, SourceEstimate, SourceKind,
};

pub use api::{
    AniListClient, EpisodeCountSource, JikanClient, KitsuClient, MalSyncClient, MetadataSource,
    SourceError,
};
pub use config::Config;
pub use resolver::{BackupPolicy, OverrideTable, Resolver, ResolverPolicy};
