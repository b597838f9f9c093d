//! Data structures shared across aniwatch
//!
//! Organized by domain:
//! - **Query**: what the caller asks about (`ShowQuery`, `AiringState`)
//! - **Signals**: what metadata sources report (`AiringSignal`, `ScheduledEpisode`)
//! - **Estimates**: candidate counts and the final answer (`SourceEstimate`, `ResolvedAvailability`)
//! - **Search**: Jikan search results (`AnimeSummary`)

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Query Models
// =============================================================================

/// Airing status as far as availability is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiringState {
    Completed,
    CurrentlyAiring,
    Unknown,
}

impl fmt::Display for AiringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiringState::Completed => write!(f, "Completed"),
            AiringState::CurrentlyAiring => write!(f, "Currently Airing"),
            AiringState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// External service an estimate or signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Jikan,
    AniList,
    Kitsu,
    MalSync,
}

impl SourceKind {
    /// Parse a config/CLI name ("jikan", "anilist", "kitsu", "malsync")
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jikan" | "mal" | "myanimelist" => Some(SourceKind::Jikan),
            "anilist" => Some(SourceKind::AniList),
            "kitsu" => Some(SourceKind::Kitsu),
            "malsync" | "mal-sync" => Some(SourceKind::MalSync),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Jikan => write!(f, "Jikan"),
            SourceKind::AniList => write!(f, "AniList"),
            SourceKind::Kitsu => write!(f, "Kitsu"),
            SourceKind::MalSync => write!(f, "MAL-Sync"),
        }
    }
}

/// A single availability lookup.
///
/// `id` is the MyAnimeList id, which every supported source can key on.
/// `planned_total` and `airing_state` are optional caller hints; when set
/// they take precedence over whatever the metadata sources report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShowQuery {
    pub id: u64,
    pub title: Option<String>,
    pub planned_total: Option<u32>,
    pub airing_state: Option<AiringState>,
}

impl ShowQuery {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = Some(title);
        }
        self
    }

    pub fn with_planned_total(mut self, total: u32) -> Self {
        self.planned_total = Some(total);
        self
    }

    pub fn with_airing_state(mut self, state: AiringState) -> Self {
        self.airing_state = Some(state);
        self
    }

    /// Title to search by, if the caller gave one
    pub fn search_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Signal Models
// =============================================================================

/// One entry of an airing schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEpisode {
    pub episode: u32,
    /// Unix timestamp (seconds)
    pub airing_at: i64,
}

/// What a metadata source knows about a show's airing progress.
///
/// Every field is optional: sources fill in what they have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiringSignal {
    pub status: Option<AiringState>,
    pub planned_total: Option<u32>,
    /// Number of the next episode still to air
    pub next_episode: Option<u32>,
    pub schedule: Vec<ScheduledEpisode>,
    pub title: Option<String>,
}

impl AiringSignal {
    /// True if the source reported nothing usable
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.planned_total.is_none()
            && self.next_episode.is_none()
            && self.schedule.is_empty()
            && self.title.is_none()
    }
}

// =============================================================================
// Estimate Models
// =============================================================================

/// A candidate episode count from a backup source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEstimate {
    pub source: SourceKind,
    pub episodes: u32,
}

impl SourceEstimate {
    pub fn new(source: SourceKind, episodes: u32) -> Self {
        Self { source, episodes }
    }
}

/// Which step of the resolution produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Hand-maintained override table
    Override,
    /// Planned total of a completed (or unknown-status) show
    PlannedTotal,
    /// Next airing episode minus one
    NextEpisode(SourceKind),
    /// Latest aired entry of an airing schedule
    AiringSchedule(SourceKind),
    /// Backup count sources combined by policy
    BackupSources(SourceKind),
    /// Nothing answered; last-resort constant
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Override => write!(f, "override table"),
            Provenance::PlannedTotal => write!(f, "planned total"),
            Provenance::NextEpisode(s) => write!(f, "next airing episode ({})", s),
            Provenance::AiringSchedule(s) => write!(f, "airing schedule ({})", s),
            Provenance::BackupSources(s) => write!(f, "backup sources ({})", s),
            Provenance::Fallback => write!(f, "fallback estimate"),
        }
    }
}

/// Final answer of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAvailability {
    pub episodes: u32,
    #[serde(flatten)]
    pub provenance: Provenance,
    /// Lowered to the planned total by the clamp policy
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clamped: bool,
}

impl ResolvedAvailability {
    pub fn new(episodes: u32, provenance: Provenance) -> Self {
        Self {
            episodes,
            provenance,
            clamped: false,
        }
    }

    /// Planned total if known, else zero
    pub fn from_planned(planned_total: Option<u32>) -> Self {
        Self::new(planned_total.unwrap_or(0), Provenance::PlannedTotal)
    }
}

impl fmt::Display for ResolvedAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} episodes via {}", self.episodes, self.provenance)?;
        if self.clamped {
            write!(f, " (clamped to planned total)")?;
        }
        Ok(())
    }
}

// =============================================================================
// Search Models (Jikan)
// =============================================================================

/// Search result from the Jikan anime search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u64,
    pub title: String,
    pub episodes: Option<u32>,
    pub score: Option<f32>,
    pub year: Option<u16>,
    pub image_url: Option<String>,
    pub status: AiringState,
}

impl AnimeSummary {
    /// Turn a search hit into a resolver query, carrying what we already know
    pub fn to_query(&self) -> ShowQuery {
        let mut query = ShowQuery::new(self.mal_id).with_title(self.title.clone());
        query.planned_total = self.episodes;
        if self.status != AiringState::Unknown {
            query.airing_state = Some(self.status);
        }
        query
    }
}

impl fmt::Display for AnimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year.map(|y| format!(" ({})", y)).unwrap_or_default();
        let eps = self
            .episodes
            .map(|e| format!("{} eps", e))
            .unwrap_or_else(|| "? eps".to_string());
        write!(
            f,
            "[{}] {}{} - {}, {}",
            self.mal_id, self.title, year_str, eps, self.status
        )
    }
}
