//! End-to-end resolution tests
//!
//! Wires a resolver from config against mock Jikan, AniList and Kitsu
//! servers: Config -> Resolver -> HTTP -> ResolvedAvailability.

use aniwatch::config::{Config, Endpoints};
use aniwatch::models::{AiringState, Provenance, ShowQuery, SourceKind};
use aniwatch::resolver::Resolver;
use mockito::{Matcher, Server, ServerGuard};

struct Services {
    jikan: ServerGuard,
    anilist: ServerGuard,
    kitsu: ServerGuard,
}

impl Services {
    async fn start() -> Self {
        Self {
            jikan: Server::new_async().await,
            anilist: Server::new_async().await,
            kitsu: Server::new_async().await,
        }
    }

    fn config(&self) -> Config {
        Config {
            timeout_secs: 5,
            endpoints: Endpoints {
                jikan: self.jikan.url(),
                anilist: self.anilist.url(),
                kitsu: self.kitsu.url(),
                malsync: "http://127.0.0.1:9".to_string(),
            },
            ..Default::default()
        }
    }
}

const JIKAN_AIRING: &str = r#"{ "data": {
    "mal_id": 52991,
    "title": "Sousou no Frieren",
    "episodes": 28,
    "status": "Currently Airing"
} }"#;

#[tokio::test]
async fn test_airing_show_uses_anilist_next_episode() {
    let mut services = Services::start().await;

    let jikan = services
        .jikan
        .mock("GET", "/anime/52991")
        .with_status(200)
        .with_body(JIKAN_AIRING)
        .create_async()
        .await;

    let anilist = services
        .anilist
        .mock("POST", "/")
        .with_status(200)
        .with_body(
            r#"{ "data": { "Media": {
                "episodes": 28,
                "status": "RELEASING",
                "nextAiringEpisode": { "episode": 9, "airingAt": 1698415200 },
                "title": { "romaji": "Sousou no Frieren" },
                "airingSchedule": { "edges": [] }
            } } }"#,
        )
        .create_async()
        .await;

    let kitsu = services
        .kitsu
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resolver = Resolver::from_config(&services.config());
    let resolved = resolver.resolve(&ShowQuery::new(52991)).await;

    jikan.assert_async().await;
    anilist.assert_async().await;
    kitsu.assert_async().await;

    assert_eq!(resolved.episodes, 8);
    assert_eq!(resolved.provenance, Provenance::NextEpisode(SourceKind::AniList));
}

#[tokio::test]
async fn test_anilist_down_falls_back_to_minimum_backup() {
    let mut services = Services::start().await;

    services
        .jikan
        .mock("GET", "/anime/52991")
        .with_status(200)
        .with_body(JIKAN_AIRING)
        .create_async()
        .await;

    let episodes: Vec<String> = (1..=10)
        .map(|n| format!(r#"{{ "mal_id": {} }}"#, n))
        .collect();
    services
        .jikan
        .mock("GET", "/anime/52991/episodes")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(format!(
            r#"{{ "pagination": {{ "has_next_page": false }}, "data": [{}] }}"#,
            episodes.join(",")
        ))
        .create_async()
        .await;

    services
        .anilist
        .mock("POST", "/")
        .with_status(500)
        .create_async()
        .await;

    services
        .kitsu
        .mock("GET", "/mappings")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{ "data": [], "included": [
                { "id": "46474", "type": "anime", "attributes": { "episodeCount": 28 } }
            ] }"#,
        )
        .create_async()
        .await;

    let resolver = Resolver::from_config(&services.config());
    let resolved = resolver.resolve(&ShowQuery::new(52991)).await;

    assert_eq!(resolved.episodes, 10);
    assert_eq!(resolved.provenance, Provenance::BackupSources(SourceKind::Jikan));
    assert!(!resolved.clamped);
}

#[tokio::test]
async fn test_everything_down_still_answers() {
    let mut services = Services::start().await;

    services
        .jikan
        .mock("GET", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    services
        .anilist
        .mock("POST", "/")
        .with_status(503)
        .create_async()
        .await;
    services
        .kitsu
        .mock("GET", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let resolver = Resolver::from_config(&services.config());

    // No status from anywhere: unknown branch, no planned total
    let unknown = resolver.resolve(&ShowQuery::new(52991)).await;
    assert_eq!(unknown.episodes, 0);

    // Caller knows it is airing: last-resort constant
    let query = ShowQuery::new(52991)
        .with_title("Sousou no Frieren")
        .with_airing_state(AiringState::CurrentlyAiring);
    let airing = resolver.resolve(&query).await;
    assert_eq!(airing.episodes, 6);
    assert_eq!(airing.provenance, Provenance::Fallback);
}

#[tokio::test]
async fn test_config_overrides_reach_resolver() {
    let services = Services::start().await;

    let mut config = services.config();
    config.overrides.insert("52991".into(), 12);

    let resolver = Resolver::from_config(&config);
    let resolved = resolver.resolve(&ShowQuery::new(52991)).await;

    assert_eq!(resolved.episodes, 12);
    assert_eq!(resolved.provenance, Provenance::Override);
}
