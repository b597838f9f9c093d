//! MAL-Sync client
//!
//! Lists the episodes streaming sites actually link for a MyAnimeList id.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use super::{get_json, http_client, EpisodeCountSource, SourceError, DEFAULT_TIMEOUT};
use crate::models::{ShowQuery, SourceKind};

pub struct MalSyncClient {
    base_url: String,
    client: reqwest::Client,
}

impl MalSyncClient {
    pub fn new() -> Self {
        Self::with_base_url("https://api.malsync.moe")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Sorted episode numbers with a streaming URL on at least one site
    pub async fn available_episodes(&self, mal_id: u64) -> Result<Vec<u32>, SourceError> {
        let url = format!("{}/mal/anime/{}", self.base_url, mal_id);
        let response: MalSyncResponse = get_json(&self.client, &url).await?;
        let episodes = response.available_episodes();
        tracing::debug!(mal_id, count = episodes.len(), "MAL-Sync episodes");
        Ok(episodes)
    }
}

impl Default for MalSyncClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeCountSource for MalSyncClient {
    fn kind(&self) -> SourceKind {
        SourceKind::MalSync
    }

    fn episode_count<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<Option<u32>, SourceError>> {
        async move {
            let episodes = self.available_episodes(query.id).await?;
            Ok(Some(episodes.len() as u32).filter(|&c| c > 0))
        }
        .boxed()
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct MalSyncResponse {
    /// site name -> entries; entry shapes vary per site
    #[serde(rename = "Sites", default)]
    sites: HashMap<String, serde_json::Value>,
}

impl MalSyncResponse {
    fn available_episodes(&self) -> Vec<u32> {
        let mut available = BTreeSet::new();

        for site in self.sites.values() {
            let Some(episodes) = site.get("episodes").and_then(|e| e.as_object()) else {
                continue;
            };
            for (number, entry) in episodes {
                let has_url = entry
                    .get("url")
                    .and_then(|u| u.as_str())
                    .map(|u| !u.is_empty())
                    .unwrap_or(false);
                if !has_url {
                    continue;
                }
                if let Ok(n) = number.trim().parse::<u32>() {
                    available.insert(n);
                }
            }
        }

        available.into_iter().collect()
    }
}
