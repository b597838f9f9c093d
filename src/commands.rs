//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the appropriate backend services.
//! Each handler takes CLI args, the loaded config and Output, returns ExitCode.

use serde::Serialize;

use crate::api::{JikanClient, MalSyncClient, SourceError};
use crate::cli::{AvailableCmd, EpisodesCmd, ExitCode, Output, OverridesCmd, SearchCmd};
use crate::config::Config;
use crate::models::{AnimeSummary, ResolvedAvailability, ShowQuery};
use crate::resolver::Resolver;

// =============================================================================
// Search Command
// =============================================================================

#[derive(Serialize)]
struct SearchRow {
    #[serde(flatten)]
    summary: AnimeSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<ResolvedAvailability>,
}

impl std::fmt::Display for SearchRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.available {
            Some(resolved) => write!(f, "{} -> {}", self.summary, resolved),
            None => write!(f, "{}", self.summary),
        }
    }
}

pub async fn search_cmd(cmd: SearchCmd, config: &Config, output: &Output) -> ExitCode {
    if cmd.query.trim().is_empty() {
        return output.error("Search query is empty", ExitCode::InvalidArgs);
    }

    let client = JikanClient::with_base_url(&config.endpoints.jikan).with_timeout(config.timeout());
    output.info(format!("Searching for: {}", cmd.query));

    match client.search(&cmd.query, cmd.limit).await {
        Ok(mut results) => {
            results.truncate(cmd.limit);
            if results.is_empty() {
                return output.error("No results found", ExitCode::NoResults);
            }

            let rows = if cmd.resolve {
                let queries: Vec<ShowQuery> = results.iter().map(AnimeSummary::to_query).collect();
                let resolver = Resolver::from_config(config);
                output.info(format!("Resolving {} show(s)...", queries.len()));
                let resolved = resolver.resolve_many(&queries, config.concurrency).await;
                results
                    .into_iter()
                    .zip(resolved)
                    .map(|(summary, resolved)| SearchRow {
                        summary,
                        available: Some(resolved),
                    })
                    .collect::<Vec<_>>()
            } else {
                results
                    .into_iter()
                    .map(|summary| SearchRow {
                        summary,
                        available: None,
                    })
                    .collect()
            };

            let lines = || rows.iter().map(|r| r.to_string()).collect();
            if let Err(e) = output.print(&rows, lines) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Search failed: {}", e), ExitCode::NetworkError),
    }
}

// =============================================================================
// Episodes Command
// =============================================================================

#[derive(Serialize)]
struct ShowAvailability {
    mal_id: u64,
    #[serde(flatten)]
    resolved: ResolvedAvailability,
}

pub async fn episodes_cmd(cmd: EpisodesCmd, config: &Config, output: &Output) -> ExitCode {
    let has_hints = cmd.title.is_some() || cmd.status.is_some() || cmd.planned.is_some();
    if has_hints && cmd.ids.len() > 1 {
        return output.error(
            "--title, --status and --planned describe a single show; pass one id",
            ExitCode::InvalidArgs,
        );
    }

    let queries: Vec<ShowQuery> = cmd
        .ids
        .iter()
        .map(|&id| {
            let mut query = ShowQuery::new(id);
            if let Some(title) = &cmd.title {
                query = query.with_title(title.clone());
            }
            query.planned_total = cmd.planned;
            query.airing_state = cmd.status.map(Into::into);
            query
        })
        .collect();

    let resolver = Resolver::from_config(config);
    let concurrency = cmd.concurrency.unwrap_or(config.concurrency);
    output.info(format!("Resolving {} show(s)...", queries.len()));

    let resolved = resolver.resolve_many(&queries, concurrency).await;
    let rows: Vec<ShowAvailability> = queries
        .iter()
        .zip(resolved)
        .map(|(q, resolved)| ShowAvailability {
            mal_id: q.id,
            resolved,
        })
        .collect();

    let lines = || {
        rows.iter()
            .map(|r| format!("[{}] {}", r.mal_id, r.resolved))
            .collect()
    };
    if let Err(e) = output.print(&rows, lines) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Available Command
// =============================================================================

#[derive(Serialize)]
struct AvailableEpisodes {
    mal_id: u64,
    count: usize,
    episodes: Vec<u32>,
}

pub async fn available_cmd(cmd: AvailableCmd, config: &Config, output: &Output) -> ExitCode {
    let client =
        MalSyncClient::with_base_url(&config.endpoints.malsync).with_timeout(config.timeout());
    output.info(format!("Fetching MAL-Sync episodes for: {}", cmd.id));

    match client.available_episodes(cmd.id).await {
        Ok(episodes) if episodes.is_empty() => {
            output.error("No linked episodes found", ExitCode::NoResults)
        }
        Ok(episodes) => {
            let available = AvailableEpisodes {
                mal_id: cmd.id,
                count: episodes.len(),
                episodes,
            };
            let lines = || {
                vec![format!(
                    "[{}] {} episodes: {}",
                    available.mal_id,
                    available.count,
                    format_ranges(&available.episodes)
                )]
            };
            if let Err(e) = output.print(&available, lines) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(SourceError::NoSignal) => output.error("Unknown MAL id", ExitCode::NoResults),
        Err(e) => output.error(
            format!("MAL-Sync fetch failed: {}", e),
            ExitCode::NetworkError,
        ),
    }
}

/// Compress sorted episode numbers into "1-3, 5, 7-8"
pub fn format_ranges(episodes: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = episodes.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(&next) = iter.peek() {
            if next != end + 1 {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(", ")
}

// =============================================================================
// Overrides Command
// =============================================================================

#[derive(Serialize)]
struct OverrideEntry {
    mal_id: u64,
    episodes: u32,
}

pub async fn overrides_cmd(_cmd: OverridesCmd, config: &Config, output: &Output) -> ExitCode {
    let entries: Vec<OverrideEntry> = config
        .override_table()
        .iter()
        .map(|(mal_id, episodes)| OverrideEntry { mal_id, episodes })
        .collect();

    let lines = || {
        entries
            .iter()
            .map(|e| format!("[{}] {} episodes", e.mal_id, e.episodes))
            .collect()
    };
    if let Err(e) = output.print(&entries, lines) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}
