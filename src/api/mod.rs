//! API clients for external metadata services
//!
//! - Jikan: MyAnimeList search, status and aired-episode pages
//! - AniList: next airing episode and airing schedule (GraphQL)
//! - Kitsu: backup episode counts by MAL mapping or title
//! - MAL-Sync: episodes actually linked on streaming sites
//!
//! Clients plug into the resolver through [`MetadataSource`] and
//! [`EpisodeCountSource`].

pub mod anilist;
pub mod jikan;
pub mod kitsu;
pub mod malsync;

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{AiringSignal, ShowQuery, SourceKind};

pub use anilist::AniListClient;
pub use jikan::JikanClient;
pub use kitsu::KitsuClient;
pub use malsync::MalSyncClient;

/// Default per-call deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single source call.
///
/// The resolver treats every variant as "no information".
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No usable data")]
    NoSignal,
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Malformed(e.to_string())
        } else if e.is_timeout() {
            SourceError::Unavailable("request timed out".to_string())
        } else {
            SourceError::Unavailable(e.to_string())
        }
    }
}

/// A source of airing status, planned totals and schedule data
pub trait MetadataSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn airing_signal<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<AiringSignal, SourceError>>;
}

/// A backup source that only reports an episode count.
///
/// Implementations look up by id first and fall back to the query title
/// when they can search by name. `Ok(None)` means the source had no count.
pub trait EpisodeCountSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn episode_count<'a>(
        &'a self,
        query: &'a ShowQuery,
    ) -> BoxFuture<'a, Result<Option<u32>, SourceError>>;
}

/// Build the shared HTTP client with a per-call deadline
pub fn http_client(timeout: Duration) -> reqwest::Client {
    finish_client(
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aniwatch/", env!("CARGO_PKG_VERSION"))),
    )
}

/// Build, or fall back to a plain client without deadline or user agent
fn finish_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "HTTP client setup failed, requests have no timeout");
            reqwest::Client::new()
        }
    }
}

/// GET a JSON document and map HTTP failures onto [`SourceError`]
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, SourceError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;
    read_json(response).await
}

/// Decode a response body, classifying the status code first
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SourceError> {
    match response.status() {
        status if status.is_success() => {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| SourceError::Malformed(format!("JSON parse error: {}", e)))
        }
        StatusCode::NOT_FOUND => Err(SourceError::NoSignal),
        StatusCode::TOO_MANY_REQUESTS => {
            Err(SourceError::Unavailable("rate limited (429)".to_string()))
        }
        status => Err(SourceError::Unavailable(format!("HTTP {}", status.as_u16()))),
    }
}
