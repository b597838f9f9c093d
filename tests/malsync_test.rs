//! MAL-Sync client tests

use aniwatch::api::{EpisodeCountSource, MalSyncClient, SourceError};
use aniwatch::models::ShowQuery;
use mockito::Server;

const FRIEREN: &str = r#"{
    "id": 52991,
    "type": "anime",
    "title": "Sousou no Frieren",
    "total": 28,
    "Sites": {
        "Crunchyroll": {
            "episodes": {
                "1": { "url": "https://www.crunchyroll.com/watch/1" },
                "2": { "url": "https://www.crunchyroll.com/watch/2" },
                "4": { "url": "https://www.crunchyroll.com/watch/4" }
            }
        },
        "Netflix": {
            "episodes": {
                "3": { "url": "https://www.netflix.com/watch/3" },
                "5": { "url": null }
            }
        }
    }
}"#;

#[tokio::test]
async fn test_available_episodes() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/mal/anime/52991")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FRIEREN)
        .create_async()
        .await;

    let client = MalSyncClient::with_base_url(server.url());
    let episodes = client.available_episodes(52991).await.unwrap();

    mock.assert_async().await;
    assert_eq!(episodes, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_episode_count_source() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/mal/anime/52991")
        .with_status(200)
        .with_body(FRIEREN)
        .create_async()
        .await;

    let client = MalSyncClient::with_base_url(server.url());
    let count = client.episode_count(&ShowQuery::new(52991)).await.unwrap();
    assert_eq!(count, Some(4));
}

#[tokio::test]
async fn test_no_sites_is_none() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/mal/anime/1")
        .with_status(200)
        .with_body(r#"{ "id": 1, "Sites": {} }"#)
        .create_async()
        .await;

    let client = MalSyncClient::with_base_url(server.url());
    let count = client.episode_count(&ShowQuery::new(1)).await.unwrap();
    assert_eq!(count, None);
}

#[tokio::test]
async fn test_unknown_id() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/mal/anime/404")
        .with_status(404)
        .create_async()
        .await;

    let client = MalSyncClient::with_base_url(server.url());
    let err = client.available_episodes(404).await.unwrap_err();
    assert!(matches!(err, SourceError::NoSignal));
}
