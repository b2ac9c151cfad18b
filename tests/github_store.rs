//! GitHub contents API client against a mock server

mod common;

use common::{make_creds, memory_state, two_sum};
use leetsync::error::Error;
use leetsync::store::{ContentStore, GitHubContentStore, PutFileRequest, RemoteEntry};
use leetsync::sync::{SyncEngine, SyncOutcome};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

const FILE_PATH: &str = "/repos/octocat/solutions/contents/easy/1-TwoSum.py";

fn store_for(server: &mockito::ServerGuard) -> GitHubContentStore {
    GitHubContentStore::new(&server.url()).unwrap()
}

#[tokio::test]
async fn test_lookup_missing_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", FILE_PATH)
        .match_header("authorization", "Bearer ghp_test")
        .match_header("accept", "application/vnd.github.v3+json")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let entry = store_for(&server)
        .lookup(&make_creds(), "easy/1-TwoSum.py")
        .await
        .unwrap();

    assert_eq!(entry, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_lookup_existing_file_returns_sha() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FILE_PATH)
        .with_status(200)
        .with_body(json!({"path": "easy/1-TwoSum.py", "sha": "abc", "type": "file"}).to_string())
        .create_async()
        .await;

    let entry = store_for(&server)
        .lookup(&make_creds(), "easy/1-TwoSum.py")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.sha(), Some("abc"));
}

#[tokio::test]
async fn test_lookup_directory_listing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octocat/solutions/contents/easy")
        .with_status(200)
        .with_body(json!([{"path": "easy/README.md", "sha": "r1", "type": "file"}]).to_string())
        .create_async()
        .await;

    let entry = store_for(&server).lookup(&make_creds(), "easy").await.unwrap();
    assert_eq!(entry, Some(RemoteEntry::Directory));
}

#[tokio::test]
async fn test_lookup_bad_token_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", FILE_PATH)
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let err = store_for(&server)
        .lookup(&make_creds(), "easy/1-TwoSum.py")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(ref m) if m.contains("Bad credentials")));
}

#[tokio::test]
async fn test_put_new_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", FILE_PATH)
        .match_body(Matcher::Json(json!({
            "message": "Add solution: 1 - 1. Two Sum",
            "content": "aMOpbGxv",
            "branch": "main"
        })))
        .with_status(201)
        .with_body(json!({"content": {"path": "easy/1-TwoSum.py", "sha": "new1"}}).to_string())
        .create_async()
        .await;

    let request = PutFileRequest::new("Add solution: 1 - 1. Two Sum", "héllo", None, "main");
    let result = store_for(&server)
        .put_file(&make_creds(), "easy/1-TwoSum.py", &request)
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.sha.as_deref(), Some("new1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_update_sends_sha() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", FILE_PATH)
        .match_body(Matcher::PartialJson(json!({"sha": "abc", "message": "Updated Code"})))
        .with_status(200)
        .with_body(json!({"content": {"path": "easy/1-TwoSum.py", "sha": "def"}}).to_string())
        .create_async()
        .await;

    let request = PutFileRequest::new("Updated Code", "print(1)", Some("abc".to_string()), "main");
    let result = store_for(&server)
        .put_file(&make_creds(), "easy/1-TwoSum.py", &request)
        .await
        .unwrap();

    assert!(!result.created);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_error_mapping() {
    let cases = [
        (409, "conflict"),
        (422, "conflict"),
        (404, "not_found"),
        (403, "auth"),
        (500, "api"),
    ];
    for (status, expected) in cases {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", FILE_PATH)
            .with_status(status)
            .with_body(r#"{"message":"nope"}"#)
            .create_async()
            .await;

        let request = PutFileRequest::new("m", "print(1)", None, "main");
        let err = store_for(&server)
            .put_file(&make_creds(), "easy/1-TwoSum.py", &request)
            .await
            .unwrap_err();
        let kind = match err {
            Error::Conflict { .. } => "conflict",
            Error::NotFound { .. } => "not_found",
            Error::Auth(_) => "auth",
            Error::GitHubApi(_) => "api",
            other => panic!("unexpected error for {status}: {other}"),
        };
        assert_eq!(kind, expected, "status {status}");
    }
}

#[tokio::test]
async fn test_engine_creates_file_over_http() {
    let mut server = mockito::Server::new_async().await;
    let dirs = server
        .mock("GET", Matcher::Regex(r"^/repos/octocat/solutions/contents/(easy|medium|hard)$".to_string()))
        .with_status(200)
        .with_body("[]")
        .expect(3)
        .create_async()
        .await;
    let lookup = server
        .mock("GET", FILE_PATH)
        .with_status(404)
        .create_async()
        .await;
    let put = server
        .mock("PUT", FILE_PATH)
        .match_body(Matcher::PartialJson(json!({
            "message": "Add solution: 1 - 1. TwoSum",
            "branch": "main"
        })))
        .with_status(201)
        .with_body(json!({"content": {"path": "easy/1-TwoSum.py", "sha": "s1"}}).to_string())
        .create_async()
        .await;

    let store = Arc::new(store_for(&server));
    let engine = SyncEngine::new(store, memory_state(), "main");
    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Created {
            path: "easy/1-TwoSum.py".to_string()
        }
    );
    dirs.assert_async().await;
    lookup.assert_async().await;
    put.assert_async().await;
}
