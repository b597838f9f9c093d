//! Episode availability resolver
//!
//! Answers "how many episodes of this show can be watched right now?" by
//! reconciling sources that disagree and rarely separate the planned total
//! from what has actually aired.
//!
//! Resolution order:
//! 1. Override table (no network)
//! 2. Completed / unknown status: planned total, else 0
//! 3. Currently airing: next airing episode - 1, then the airing schedule,
//!    then backup counts combined by [`BackupPolicy`], then a fixed fallback
//!
//! Every source call is independent and fault-tolerant; a failure only
//! means that source has nothing to say. Resolution itself never fails.

pub mod overrides;
pub mod policy;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::api::{
    AniListClient, EpisodeCountSource, JikanClient, KitsuClient, MalSyncClient, MetadataSource,
    SourceError,
};
use crate::config::Config;
use crate::models::{
    AiringSignal, AiringState, Provenance, ResolvedAvailability, ScheduledEpisode, ShowQuery,
    SourceEstimate, SourceKind,
};

pub use overrides::OverrideTable;
pub use policy::{BackupPolicy, ResolverPolicy, DEFAULT_FALLBACK_EPISODES};

/// Episode availability resolver.
///
/// Holds only immutable configuration, so one instance can serve many
/// concurrent resolutions.
pub struct Resolver {
    overrides: OverrideTable,
    metadata: Vec<Box<dyn MetadataSource>>,
    backups: Vec<Box<dyn EpisodeCountSource>>,
    policy: ResolverPolicy,
}

impl Resolver {
    /// Resolver with no sources and the default policy
    pub fn new(overrides: OverrideTable) -> Self {
        Self {
            overrides,
            metadata: Vec::new(),
            backups: Vec::new(),
            policy: ResolverPolicy::default(),
        }
    }

    /// Wire up the sources named in the config
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.timeout();
        let endpoints = &config.endpoints;
        let mut resolver = Self::new(config.override_table()).with_policy(config.policy());

        for kind in config.metadata_sources() {
            resolver = match kind {
                SourceKind::Jikan => resolver
                    .with_metadata(JikanClient::with_base_url(&endpoints.jikan).with_timeout(timeout)),
                SourceKind::AniList => resolver.with_metadata(
                    AniListClient::with_endpoint(&endpoints.anilist).with_timeout(timeout),
                ),
                other => {
                    warn!("{} does not provide airing metadata, ignoring", other);
                    resolver
                }
            };
        }

        for kind in config.backup_sources() {
            resolver = match kind {
                SourceKind::Jikan => resolver
                    .with_backup(JikanClient::with_base_url(&endpoints.jikan).with_timeout(timeout)),
                SourceKind::Kitsu => resolver
                    .with_backup(KitsuClient::with_base_url(&endpoints.kitsu).with_timeout(timeout)),
                SourceKind::MalSync => resolver.with_backup(
                    MalSyncClient::with_base_url(&endpoints.malsync).with_timeout(timeout),
                ),
                other => {
                    warn!("{} does not provide backup episode counts, ignoring", other);
                    resolver
                }
            };
        }

        resolver
    }

    /// Append a metadata source (earlier sources win)
    pub fn with_metadata(mut self, source: impl MetadataSource + 'static) -> Self {
        self.metadata.push(Box::new(source));
        self
    }

    /// Append a backup count source (earlier sources win ties)
    pub fn with_backup(mut self, source: impl EpisodeCountSource + 'static) -> Self {
        self.backups.push(Box::new(source));
        self
    }

    pub fn with_policy(mut self, policy: ResolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Resolve available episodes as of now
    pub async fn resolve(&self, query: &ShowQuery) -> ResolvedAvailability {
        self.resolve_at(query, Utc::now().timestamp()).await
    }

    /// Resolve available episodes as of `now` (unix seconds)
    pub async fn resolve_at(&self, query: &ShowQuery, now: i64) -> ResolvedAvailability {
        if let Some(episodes) = self.overrides.get(query.id) {
            info!(mal_id = query.id, episodes, "Using override table");
            return ResolvedAvailability::new(episodes, Provenance::Override);
        }

        let signals = if needs_signals(query) {
            self.gather_signals(query).await
        } else {
            Vec::new()
        };

        let state = query
            .airing_state
            .or_else(|| first_known_status(&signals))
            .unwrap_or(AiringState::Unknown);
        let planned_total = query
            .planned_total
            .or_else(|| signals.iter().find_map(|(_, s)| s.planned_total));

        debug!(mal_id = query.id, %state, planned_total = ?planned_total, "Reconciling");

        let resolved = match state {
            AiringState::Completed | AiringState::Unknown => {
                ResolvedAvailability::from_planned(planned_total)
            }
            AiringState::CurrentlyAiring => {
                let estimate = self.resolve_airing(query, &signals, now).await;
                self.policy.clamp(estimate, planned_total)
            }
        };

        info!(
            mal_id = query.id,
            episodes = resolved.episodes,
            provenance = %resolved.provenance,
            clamped = resolved.clamped,
            "Resolved available episodes"
        );
        resolved
    }

    /// Resolve several shows, at most `concurrency` at a time, in input order
    pub async fn resolve_many(
        &self,
        queries: &[ShowQuery],
        concurrency: usize,
    ) -> Vec<ResolvedAvailability> {
        stream::iter(queries)
            .map(|query| self.resolve(query))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Steps 3a-3e for a currently-airing show
    async fn resolve_airing(
        &self,
        query: &ShowQuery,
        signals: &[(SourceKind, AiringSignal)],
        now: i64,
    ) -> ResolvedAvailability {
        if let Some((source, next)) = signals
            .iter()
            .find_map(|(kind, s)| s.next_episode.map(|n| (*kind, n)))
        {
            debug!(%source, next, "Next airing episode");
            return ResolvedAvailability::new(
                estimate_from_next_episode(next),
                Provenance::NextEpisode(source),
            );
        }

        if let Some((source, aired)) = signals
            .iter()
            .find_map(|(kind, s)| estimate_from_schedule(&s.schedule, now).map(|n| (*kind, n)))
        {
            debug!(%source, aired, "Counted aired episodes from schedule");
            return ResolvedAvailability::new(aired, Provenance::AiringSchedule(source));
        }

        let lookup = with_reported_title(query, signals);
        let estimates = self.gather_estimates(&lookup).await;

        match self.policy.backup.combine(&estimates) {
            Some(picked) => {
                debug!(
                    estimates = ?estimates,
                    policy = ?self.policy.backup,
                    picked = picked.episodes,
                    "Combined backup counts"
                );
                ResolvedAvailability::new(picked.episodes, Provenance::BackupSources(picked.source))
            }
            None => {
                debug!(
                    fallback = self.policy.fallback_episodes,
                    "No source could count episodes, using fallback"
                );
                ResolvedAvailability::new(self.policy.fallback_episodes, Provenance::Fallback)
            }
        }
    }

    /// Ask every metadata source in order; failures are skipped
    async fn gather_signals(&self, query: &ShowQuery) -> Vec<(SourceKind, AiringSignal)> {
        let mut signals = Vec::with_capacity(self.metadata.len());

        for source in &self.metadata {
            let kind = source.kind();
            match source.airing_signal(query).await {
                Ok(signal) if !signal.is_empty() => signals.push((kind, signal)),
                Ok(_) => debug!(%kind, mal_id = query.id, "Empty airing signal"),
                Err(e) => log_source_error(kind, query.id, &e),
            }
        }

        signals
    }

    /// Ask every backup source in order, keeping positive counts
    async fn gather_estimates(&self, query: &ShowQuery) -> Vec<SourceEstimate> {
        let mut estimates = Vec::with_capacity(self.backups.len());

        for source in &self.backups {
            let kind = source.kind();
            match source.episode_count(query).await {
                Ok(Some(count)) if count > 0 => estimates.push(SourceEstimate::new(kind, count)),
                Ok(_) => debug!(%kind, mal_id = query.id, "No backup count"),
                Err(e) => log_source_error(kind, query.id, &e),
            }
        }

        estimates
    }
}

/// Available count implied by the next episode still to air
pub fn estimate_from_next_episode(next_episode: u32) -> u32 {
    next_episode.saturating_sub(1)
}

/// Highest episode number that aired at or before `now`, if positive
pub fn estimate_from_schedule(schedule: &[ScheduledEpisode], now: i64) -> Option<u32> {
    schedule
        .iter()
        .filter(|e| e.airing_at <= now)
        .map(|e| e.episode)
        .max()
        .filter(|&n| n > 0)
}

/// Metadata is only skipped when the caller already settled the branch
fn needs_signals(query: &ShowQuery) -> bool {
    match query.airing_state {
        Some(AiringState::CurrentlyAiring) | None => true,
        Some(_) => query.planned_total.is_none(),
    }
}

fn first_known_status(signals: &[(SourceKind, AiringSignal)]) -> Option<AiringState> {
    let mut statuses = signals.iter().filter_map(|(_, s)| s.status);
    let first = statuses.clone().find(|s| *s != AiringState::Unknown);
    first.or_else(|| statuses.next())
}

/// Backup lookups need a title; borrow one from the metadata if the caller had none
fn with_reported_title(query: &ShowQuery, signals: &[(SourceKind, AiringSignal)]) -> ShowQuery {
    let mut lookup = query.clone();
    if lookup.search_title().is_none() {
        lookup.title = signals
            .iter()
            .find_map(|(_, s)| s.title.clone())
            .filter(|t| !t.trim().is_empty() && t != "Unknown");
    }
    lookup
}

fn log_source_error(kind: SourceKind, mal_id: u64, error: &SourceError) {
    match error {
        SourceError::NoSignal => debug!(%kind, mal_id, "No signal"),
        e => warn!(%kind, mal_id, error = %e, "Source failed, skipping"),
    }
}
