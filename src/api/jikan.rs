//! Jikan (unofficial MyAnimeList) API client
//!
//! Provides search, per-show status/planned totals and aired-episode pages.
//! API docs: https://docs.api.jikan.moe

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use super::{get_json, http_client, EpisodeCountSource, MetadataSource, SourceError, DEFAULT_TIMEOUT};
use crate::models::{AiringSignal, AiringState, AnimeSummary, ShowQuery, SourceKind};

/// Episode pages are 100 entries each; stop after this many
const MAX_EPISODE_PAGES: u32 = 10;

/// Jikan API client
pub struct JikanClient {
    base_url: String,
    client: reqwest::Client,
}

impl JikanClient {
    /// Create a new Jikan client with default settings
    pub fn new() -> Self {
        Self::with_base_url("https://api.jikan.moe/v4")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(DEFAULT_TIMEOUT),
        }
    }

    /// Replace the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Search TV anime by title
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<AnimeSummary>, SourceError> {
        let url = format!(
            "{}/anime?q={}&limit={}&type=tv",
            self.base_url,
            urlencoding::encode(query),
            limit
        );
        let response: SearchResponse = get_json(&self.client, &url).await?;
        Ok(response
            .data
            .into_iter()
            .map(AnimeRaw::into_summary)
            .collect())
    }

    /// Status, planned total and title of a single show
    pub async fn anime(&self, mal_id: u64) -> Result<AiringSignal, SourceError> {
        let url = format!("{}/anime/{}", self.base_url, mal_id);
        let response: AnimeResponse = get_json(&self.client, &url).await?;
        let anime = response.data;
        tracing::debug!(
            mal_id,
            title = %anime.title,
            status = ?anime.status,
            episodes = ?anime.episodes,
            "Jikan anime"
        );
        Ok(AiringSignal {
            status: Some(map_status(anime.status.as_deref())),
            planned_total: anime.episodes.filter(|&e| e > 0),
            next_episode: None,
            schedule: Vec::new(),
            title: Some(anime.title),
        })
    }

    /// Count episode entries across the paginated episodes endpoint
    pub async fn aired_episode_count(&self, mal_id: u64) -> Result<u32, SourceError> {
        let mut total = 0u32;

        for page in 1..=MAX_EPISODE_PAGES {
            let url = format!("{}/anime/{}/episodes?page={}", self.base_url, mal_id, page);
            let response: EpisodesResponse = get_json(&self.client, &url).await?;

            if response.data.is_empty() {
                break;
            }
            total += response.data.len() as u32;

            let has_next = response
                .pagination
                .map(|p| p.has_next_page)
                .unwrap_or(false);
            if !has_next {
                break;
            }
        }

        if total == 0 {
            return Err(SourceError::NoSignal);
        }
        Ok(total)
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for JikanClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Jikan
    }

    fn airing_signal<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<AiringSignal, SourceError>> {
        self.anime(query.id).boxed()
    }
}

impl EpisodeCountSource for JikanClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Jikan
    }

    fn episode_count<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<Option<u32>, SourceError>> {
        async move {
            match self.aired_episode_count(query.id).await {
                Ok(count) => Ok(Some(count)),
                Err(SourceError::NoSignal) => Ok(None),
                Err(e) => Err(e),
            }
        }
        .boxed()
    }
}

/// Map Jikan's human-readable status onto [`AiringState`]
pub fn map_status(status: Option<&str>) -> AiringState {
    match status {
        Some("Currently Airing") => AiringState::CurrentlyAiring,
        Some("Finished Airing") => AiringState::Completed,
        _ => AiringState::Unknown,
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<AnimeRaw>,
}

#[derive(Debug, Deserialize)]
struct AnimeResponse {
    data: AnimeRaw,
}

#[derive(Debug, Deserialize)]
struct AnimeRaw {
    mal_id: u64,
    #[serde(default)]
    title: String,
    episodes: Option<u32>,
    score: Option<f32>,
    year: Option<u16>,
    status: Option<String>,
    images: Option<Images>,
}

impl AnimeRaw {
    fn into_summary(self) -> AnimeSummary {
        let status = map_status(self.status.as_deref());
        let title = if self.title.is_empty() {
            "Unknown".to_string()
        } else {
            self.title
        };
        AnimeSummary {
            mal_id: self.mal_id,
            title,
            episodes: self.episodes,
            score: self.score,
            year: self.year,
            image_url: self.images.and_then(|i| i.jpg).and_then(|j| j.image_url),
            status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Images {
    jpg: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
struct ImageSet {
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EpisodesResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_next_page: bool,
}
