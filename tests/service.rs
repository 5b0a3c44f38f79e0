//! End-to-end tests for the tip service protocol.
//!
//! Runs the real server loop over loopback TCP with the in-memory
//! store, and a canned local HTTP endpoint standing in for bookmarked
//! pages, then drives everything through the client adapter.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tipboard::client::TipClient;
use tipboard::error::AppError;
use tipboard::models::{ClientConfig, PreviewConfig, ServerConfig};
use tipboard::preview::PreviewExtractor;
use tipboard::server;
use tipboard::service::TipService;
use tipboard::store::{MemoryTipStore, TipStore};

const PAGE: &str = r#"<html><head>
<title>Golang Tips</title>
<meta name="description" content="A collection of tips">
<meta property="og:image" content="https://cdn.example.com/cover.png">
</head><body></body></html>"#;

/// Serve a canned HTML page over loopback, returning its URL.
async fn spawn_page_server(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });
    format!("http://{addr}/")
}

/// Spin up the tip service on loopback and a client dialing it.
async fn spawn_stack() -> TipClient {
    let store = Arc::new(MemoryTipStore::new());
    let extractor = PreviewExtractor::new(&PreviewConfig::default()).unwrap();
    let service = Arc::new(TipService::new(
        store as Arc<dyn TipStore>,
        extractor,
        &ServerConfig::default(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, None, service));

    let mut config = ClientConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = addr.port();
    config.debug = true;
    TipClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_create_then_list_contains_the_tip() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;

    let created = client.create_tip(&page).await.unwrap();
    assert_eq!(created.id.len(), 24);
    assert_eq!(created.title, "Golang Tips");
    assert_eq!(created.description, "A collection of tips");
    assert_eq!(created.image, "https://cdn.example.com/cover.png");
    assert_eq!(created.url, page);

    let tips = client.all_tips().await.unwrap();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].id, created.id);
    assert_eq!(tips[0].url, page);
}

#[tokio::test]
async fn test_list_is_newest_first_and_idempotent() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;

    let a = client.create_tip(&page).await.unwrap();
    let b = client.create_tip(&page).await.unwrap();
    let c = client.create_tip(&page).await.unwrap();

    let tips = client.all_tips().await.unwrap();
    let ids: Vec<&str> = tips.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, [c.id.as_str(), b.id.as_str(), a.id.as_str()]);

    // No intervening writes: identical content and order.
    let again = client.all_tips().await.unwrap();
    assert_eq!(tips, again);
}

#[tokio::test]
async fn test_search_matches_case_insensitively() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;
    client.create_tip(&page).await.unwrap();

    let hits = client.search_tips("golang").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Golang Tips");

    let misses = client.search_tips("rust").await.unwrap();
    assert!(misses.is_empty());
}

#[tokio::test]
async fn test_blank_search_returns_the_full_set() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;
    client.create_tip(&page).await.unwrap();
    client.create_tip(&page).await.unwrap();

    let all = client.all_tips().await.unwrap();
    let blank = client.search_tips("").await.unwrap();
    assert_eq!(all.len(), blank.len());

    // Same set; list is reversed, blank search is in scan order.
    let mut all_ids: Vec<String> = all.iter().map(|t| t.id.clone()).collect();
    let mut blank_ids: Vec<String> = blank.iter().map(|t| t.id.clone()).collect();
    all_ids.sort();
    blank_ids.sort();
    assert_eq!(all_ids, blank_ids);
}

#[tokio::test]
async fn test_delete_succeeds_exactly_once() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;
    let tip = client.create_tip(&page).await.unwrap();

    assert_eq!(client.delete_tip(&tip.id).await.unwrap(), tip.id);
    assert!(client.all_tips().await.unwrap().is_empty());

    // Deleted tips never reappear, and the id is spent.
    assert!(matches!(
        client.delete_tip(&tip.id).await,
        Err(AppError::Internal(_))
    ));
}

#[tokio::test]
async fn test_delete_malformed_id_mutates_nothing() {
    let client = spawn_stack().await;
    let page = spawn_page_server(PAGE).await;
    client.create_tip(&page).await.unwrap();

    let before = client.all_tips().await.unwrap();
    assert!(matches!(
        client.delete_tip("not-a-valid-id").await,
        Err(AppError::InvalidArgument(_))
    ));
    let after = client.all_tips().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_unreachable_page_aborts_creation() {
    let client = spawn_stack().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    });

    let result = client.create_tip(&format!("http://{addr}/missing")).await;
    assert!(result.is_err());
    assert!(client.all_tips().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_long_title_truncated_for_display() {
    let client = spawn_stack().await;
    // 60-character title; the stored record keeps it intact, the display
    // shape cuts it to 50 characters plus the ellipsis marker.
    static LONG_PAGE: &str = "<html><head><title>abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyzabcdefgh</title></head><body></body></html>";
    let page = spawn_page_server(LONG_PAGE).await;

    let created = client.create_tip(&page).await.unwrap();
    assert_eq!(created.title.chars().count(), 60);

    let tips = client.all_tips().await.unwrap();
    assert_eq!(tips[0].title.chars().count(), 51);
    assert!(tips[0].title.ends_with('…'));
}

#[tokio::test]
async fn test_wait_ready_fails_fast_without_a_server() {
    let mut config = ClientConfig::default();
    config.host = "127.0.0.1".to_string();
    config.debug = true;
    // Reserve a port and close it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    config.port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = TipClient::new(&config).unwrap();
    let result = client.wait_ready(2, Duration::from_millis(10)).await;
    assert!(result.is_err());
}
