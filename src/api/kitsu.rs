//! Kitsu JSON:API client
//!
//! Backup episode counts. Looks the show up through Kitsu's
//! MyAnimeList mapping first, then by title search.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use super::{http_client, read_json, EpisodeCountSource, SourceError, DEFAULT_TIMEOUT};
use crate::models::{ShowQuery, SourceKind};

/// Kitsu API client
pub struct KitsuClient {
    base_url: String,
    client: reqwest::Client,
}

impl KitsuClient {
    pub fn new() -> Self {
        Self::with_base_url("https://kitsu.io/api/edge")
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

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.api+json")
            .send()
            .await?;
        read_json(response).await
    }

    /// Episode count of the anime mapped to a MyAnimeList id
    pub async fn episode_count_by_mal_id(&self, mal_id: u64) -> Result<Option<u32>, SourceError> {
        let url = format!(
            "{}/mappings?filter[externalSite]=myanimelist/anime&filter[externalId]={}&include=item",
            self.base_url, mal_id
        );
        let response: MappingResponse = self.get(&url).await?;

        let count = response
            .included
            .into_iter()
            .filter(|r| r.kind == "anime")
            .find_map(|r| r.attributes.episode_count)
            .filter(|&c| c > 0);

        tracing::debug!(mal_id, count = ?count, "Kitsu mapping lookup");
        Ok(count)
    }

    /// Episode count of the best title match
    pub async fn episode_count_by_title(&self, title: &str) -> Result<Option<u32>, SourceError> {
        let url = format!(
            "{}/anime?filter[text]={}&page[limit]=1",
            self.base_url,
            urlencoding::encode(title)
        );
        let response: AnimeListResponse = self.get(&url).await?;

        let Some(anime) = response.data.into_iter().next() else {
            return Ok(None);
        };
        tracing::debug!(
            title,
            count = ?anime.attributes.episode_count,
            status = ?anime.attributes.status,
            "Kitsu title lookup"
        );
        Ok(anime.attributes.episode_count.filter(|&c| c > 0))
    }
}

impl Default for KitsuClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeCountSource for KitsuClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Kitsu
    }

    fn episode_count<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<Option<u32>, SourceError>> {
        async move {
            let by_id = match self.episode_count_by_mal_id(query.id).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::debug!(mal_id = query.id, error = %e, "Kitsu mapping lookup failed");
                    None
                }
            };
            if by_id.is_some() {
                return Ok(by_id);
            }

            match query.search_title() {
                Some(title) => self.episode_count_by_title(title).await,
                None => Ok(None),
            }
        }
        .boxed()
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct MappingResponse {
    #[serde(default)]
    included: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct AnimeListResponse {
    #[serde(default)]
    data: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: AnimeAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimeAttributes {
    episode_count: Option<u32>,
    status: Option<String>,
}
