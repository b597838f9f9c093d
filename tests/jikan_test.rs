//! Jikan API client tests
//!
//! Tests search, per-show signals, episode paging and error mapping.

use aniwatch::api::{EpisodeCountSource, JikanClient, MetadataSource, SourceError};
use aniwatch::models::{AiringState, ShowQuery};
use mockito::{Matcher, Server};

// =============================================================================
// Search Tests
// =============================================================================

#[tokio::test]
async fn test_search_parses_results() {
    let mut server = Server::new_async().await;

    let body = r#"{
        "pagination": { "last_visible_page": 1, "has_next_page": false },
        "data": [
            {
                "mal_id": 52991,
                "title": "Sousou no Frieren",
                "episodes": 28,
                "score": 9.31,
                "year": 2023,
                "status": "Finished Airing",
                "images": { "jpg": { "image_url": "https://cdn.myanimelist.net/images/anime/1015/138006.jpg" } }
            },
            {
                "mal_id": 59978,
                "title": "Sousou no Frieren 2nd Season",
                "episodes": null,
                "score": null,
                "year": null,
                "status": "Not yet aired",
                "images": { "jpg": { "image_url": null } }
            }
        ]
    }"#;

    let mock = server
        .mock("GET", "/anime")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "frieren".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("type".into(), "tv".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let results = client.search("frieren", 10).await.unwrap();

    mock.assert_async().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].mal_id, 52991);
    assert_eq!(results[0].title, "Sousou no Frieren");
    assert_eq!(results[0].episodes, Some(28));
    assert_eq!(results[0].year, Some(2023));
    assert_eq!(results[0].status, AiringState::Completed);
    assert!(results[0].image_url.is_some());

    assert_eq!(results[1].episodes, None);
    assert_eq!(results[1].status, AiringState::Unknown);
    assert!(results[1].image_url.is_none());
}

#[tokio::test]
async fn test_search_encodes_query() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/anime")
        .match_query(Matcher::UrlEncoded("q".into(), "one piece & friends".into()))
        .with_status(200)
        .with_body(r#"{ "data": [] }"#)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let results = client.search("one piece & friends", 5).await.unwrap();

    mock.assert_async().await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_server_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/anime")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let err = client.search("frieren", 10).await.unwrap_err();
    assert!(matches!(err, SourceError::Unavailable(_)));
}

#[tokio::test]
async fn test_search_rate_limited_is_not_retried() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/anime")
        .match_query(Matcher::Any)
        .with_status(429)
        .expect(1)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let err = client.search("frieren", 10).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, SourceError::Unavailable(_)));
}

// =============================================================================
// Anime Signal Tests
// =============================================================================

#[tokio::test]
async fn test_anime_signal_currently_airing() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/anime/52991")
        .with_status(200)
        .with_body(
            r#"{ "data": {
                "mal_id": 52991,
                "title": "Sousou no Frieren",
                "episodes": 28,
                "status": "Currently Airing"
            } }"#,
        )
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let signal = client.airing_signal(&ShowQuery::new(52991)).await.unwrap();

    mock.assert_async().await;

    assert_eq!(signal.status, Some(AiringState::CurrentlyAiring));
    assert_eq!(signal.planned_total, Some(28));
    assert_eq!(signal.title.as_deref(), Some("Sousou no Frieren"));
    assert!(signal.next_episode.is_none());
    assert!(signal.schedule.is_empty());
}

#[tokio::test]
async fn test_anime_zero_episodes_means_unknown_total() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/anime/1")
        .with_status(200)
        .with_body(r#"{ "data": { "mal_id": 1, "title": "X", "episodes": 0, "status": "Currently Airing" } }"#)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let signal = client.anime(1).await.unwrap();
    assert_eq!(signal.planned_total, None);
}

#[tokio::test]
async fn test_anime_not_found_is_no_signal() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/anime/999999")
        .with_status(404)
        .with_body(r#"{ "status": 404, "type": "BadResponseException" }"#)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let err = client.anime(999999).await.unwrap_err();
    assert!(matches!(err, SourceError::NoSignal));
}

#[tokio::test]
async fn test_anime_malformed_body() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/anime/5")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let err = client.anime(5).await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)));
}

// =============================================================================
// Episode Paging Tests
// =============================================================================

fn episodes_page(range: std::ops::RangeInclusive<u32>, has_next: bool) -> String {
    let entries: Vec<String> = range
        .map(|n| format!(r#"{{ "mal_id": {}, "title": "Episode {}" }}"#, n, n))
        .collect();
    format!(
        r#"{{ "pagination": {{ "last_visible_page": 2, "has_next_page": {} }}, "data": [{}] }}"#,
        has_next,
        entries.join(",")
    )
}

#[tokio::test]
async fn test_aired_episode_count_follows_pages() {
    let mut server = Server::new_async().await;

    let page1 = server
        .mock("GET", "/anime/40748/episodes")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(episodes_page(1..=100, true))
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/anime/40748/episodes")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(episodes_page(101..=112, false))
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let count = client.aired_episode_count(40748).await.unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    assert_eq!(count, 112);
}

#[tokio::test]
async fn test_aired_episode_count_stops_at_page_limit() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/anime/21/episodes")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(episodes_page(1..=100, true))
        .expect(10)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let count = client.aired_episode_count(21).await.unwrap();

    mock.assert_async().await;
    assert_eq!(count, 1000);
}

#[tokio::test]
async fn test_episode_count_source_empty_is_none() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/anime/7/episodes")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{ "pagination": { "has_next_page": false }, "data": [] }"#)
        .create_async()
        .await;

    let client = JikanClient::with_base_url(server.url());
    let count = client.episode_count(&ShowQuery::new(7)).await.unwrap();
    assert_eq!(count, None);
}
