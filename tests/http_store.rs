//! End-to-end tests: repositories talking to a live server through `HttpStore`.

use chrono::NaiveDate;
use futures::StreamExt;
use nutrilog::server::{router, ApiKeyEntry, ApiKeyStore, AppState};
use nutrilog_core::repo::{TeamRepository, WaterRepository};
use nutrilog_core::{FileStore, HttpStore, SharedStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct TestServer {
    base_url: String,
    _temp_dir: TempDir,
}

async fn start_server() -> TestServer {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path().join("tree.json")).unwrap();
    let keys = ApiKeyStore::from_entries(vec![
        ApiKeyEntry {
            key: "key-ana".to_string(),
            user_id: "ana".to_string(),
        },
        ApiKeyEntry {
            key: "key-ben".to_string(),
            user_id: "ben".to_string(),
        },
    ]);
    let app = router(AppState::new(store, keys));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        _temp_dir: temp_dir,
    }
}

fn client(server: &TestServer, key: &str) -> SharedStore {
    Arc::new(HttpStore::new(&server.base_url, Some(key.to_string())))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_water_adds_over_http() {
    let server = start_server().await;
    let water = WaterRepository::new(client(&server, "key-ana"));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let water = water.clone();
        handles.push(tokio::spawn(async move {
            water.add("ana", day(), 125).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(water.get("ana", day()).await.unwrap().amount_ml, 1000);
}

#[tokio::test]
async fn test_other_users_water_is_refused() {
    let server = start_server().await;
    let water = WaterRepository::new(client(&server, "key-ben"));

    let err = water.add("ana", day(), 250).await.unwrap_err();
    assert!(err.to_string().contains("403"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_watch_receives_updates() {
    let server = start_server().await;
    let water = WaterRepository::new(client(&server, "key-ana"));

    let mut updates = water.watch("ana", day()).unwrap();
    let first = updates.next().await.unwrap().unwrap();
    assert_eq!(first.amount_ml, 0);

    water.add("ana", day(), 300).await.unwrap();
    let next = tokio::time::timeout(Duration::from_secs(5), updates.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(next.amount_ml, 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_team_likes_from_two_clients() {
    let server = start_server().await;
    let ana = TeamRepository::new(client(&server, "key-ana"));
    let ben = TeamRepository::new(client(&server, "key-ben"));

    let team = ana.create_team("Runners", "ana").await.unwrap();
    ben.join(&team.id, "ben").await.unwrap();
    let post = ana.post(&team.id, "ana", "Ana", "10k done").await.unwrap();

    let (a, b) = tokio::join!(
        ana.toggle_like(&team.id, &post.id, "ana"),
        ben.toggle_like(&team.id, &post.id, "ben"),
    );
    assert!(a.unwrap());
    assert!(b.unwrap());

    let stored = ana.get_post(&team.id, &post.id).await.unwrap().unwrap();
    assert_eq!(stored.likes.len(), 2);
}

#[tokio::test]
async fn test_websocket_to_foreign_path_is_rejected() {
    let server = start_server().await;
    let url = format!(
        "{}/ws/registros_agua/ana/20240301?key=key-ben",
        server.base_url.replacen("http://", "ws://", 1)
    );
    assert!(tokio_tungstenite::connect_async(url.as_str()).await.is_err());

    let url = format!(
        "{}/ws/registros_agua/ana/20240301?key=key-ana",
        server.base_url.replacen("http://", "ws://", 1)
    );
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let frame = socket.next().await.unwrap().unwrap();
    assert_eq!(frame.into_text().unwrap().as_str(), "null");
}
