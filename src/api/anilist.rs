//! AniList GraphQL client
//!
//! Looks shows up by MyAnimeList id and reports airing progress:
//! status, planned episodes, the next episode to air and the recent
//! airing schedule.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::json;

use super::{http_client, read_json, MetadataSource, SourceError, DEFAULT_TIMEOUT};
use crate::models::{AiringSignal, AiringState, ScheduledEpisode, ShowQuery, SourceKind};

const API_URL: &str = "https://graphql.anilist.co";

const MEDIA_BY_MAL_ID_QUERY: &str = r#"
query ($malId: Int) {
    Media(idMal: $malId, type: ANIME) {
        id
        episodes
        status
        nextAiringEpisode { episode airingAt }
        title { romaji english }
        airingSchedule(page: 1, perPage: 50, notYetAired: false) {
            edges { node { episode airingAt } }
        }
    }
}
"#;

/// AniList GraphQL API client (anonymous, read-only)
pub struct AniListClient {
    endpoint: String,
    client: reqwest::Client,
}

impl AniListClient {
    pub fn new() -> Self {
        Self::with_endpoint(API_URL)
    }

    /// Create a client against a custom endpoint (for testing)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: http_client(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Airing progress for the show with the given MAL id
    pub async fn media_by_mal_id(&self, mal_id: u64) -> Result<AiringSignal, SourceError> {
        tracing::debug!(mal_id, "AniList GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&json!({
                "query": MEDIA_BY_MAL_ID_QUERY,
                "variables": { "malId": mal_id },
            }))
            .send()
            .await?;

        let parsed: GraphQlResponse = read_json(response).await?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let msg = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            // AniList answers unknown ids with a "Not Found." error and null data
            if parsed
                .data
                .as_ref()
                .map(|d| d.media.is_none())
                .unwrap_or(true)
                && msg.contains("Not Found")
            {
                return Err(SourceError::NoSignal);
            }
            return Err(SourceError::Malformed(format!("GraphQL error: {}", msg)));
        }

        let media = parsed
            .data
            .and_then(|d| d.media)
            .ok_or(SourceError::NoSignal)?;

        tracing::debug!(
            mal_id,
            status = ?media.status,
            episodes = ?media.episodes,
            next = ?media.next_airing_episode.as_ref().and_then(|n| n.episode),
            "AniList media"
        );
        Ok(media.into_signal())
    }
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for AniListClient {
    fn kind(&self) -> SourceKind {
        SourceKind::AniList
    }

    fn airing_signal<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<AiringSignal, SourceError>> {
        self.media_by_mal_id(query.id).boxed()
    }
}

/// Map AniList's `MediaStatus` onto [`AiringState`]
pub fn map_status(status: Option<&str>) -> AiringState {
    match status {
        Some("RELEASING") => AiringState::CurrentlyAiring,
        Some("FINISHED") => AiringState::Completed,
        _ => AiringState::Unknown,
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Data>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Media {
    episodes: Option<u32>,
    status: Option<String>,
    next_airing_episode: Option<AiringNode>,
    title: Option<MediaTitle>,
    airing_schedule: Option<AiringScheduleConnection>,
}

#[derive(Debug, Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiringScheduleConnection {
    #[serde(default)]
    edges: Vec<AiringEdge>,
}

#[derive(Debug, Deserialize)]
struct AiringEdge {
    node: Option<AiringNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiringNode {
    episode: Option<u32>,
    airing_at: Option<i64>,
}

impl Media {
    fn into_signal(self) -> AiringSignal {
        let schedule = self
            .airing_schedule
            .map(|s| s.edges)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| edge.node)
            .filter_map(|node| {
                Some(ScheduledEpisode {
                    episode: node.episode?,
                    airing_at: node.airing_at?,
                })
            })
            .collect();

        let title = self.title.and_then(|t| t.romaji.or(t.english));

        AiringSignal {
            status: Some(map_status(self.status.as_deref())),
            planned_total: self.episodes.filter(|&e| e > 0),
            next_episode: self.next_airing_episode.and_then(|n| n.episode),
            schedule,
            title,
        }
    }
}
