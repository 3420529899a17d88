//! Tests for DriveClient with mocked HTTP responses.

use std::time::{SystemTime, UNIX_EPOCH};

use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

use drive_archiver::models::{InstalledClientSecrets, StoredToken};
use drive_archiver::{ArchiverError, Authenticator, DriveClient};

fn secrets(token_uri: &str) -> InstalledClientSecrets {
    InstalledClientSecrets {
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: token_uri.to_string(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// An authenticator backed by a stored token that is valid for another hour,
/// so no token endpoint traffic happens during the test.
fn authenticator_with_valid_token(dir: &TempDir, token_uri: &str) -> Authenticator {
    let token = StoredToken {
        access_token: "test-token".to_string(),
        refresh_token: Some("refresh-token".to_string()),
        expires_at: unix_now() + 3600,
    };
    let token_path = dir.path().join("token.json");
    std::fs::write(&token_path, serde_json::to_string(&token).unwrap()).unwrap();
    Authenticator::new(secrets(token_uri), token_path)
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn test_list_all_follows_pagination() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let auth = authenticator_with_valid_token(&dir, &format!("{}/token", server.url()));

        let page1 = server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded("q".into(), "trashed=false".into()))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "files": [
                        {"id": "1", "name": "Root", "mimeType": "application/vnd.google-apps.folder"}
                    ],
                    "nextPageToken": "page-2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        // Registered after page1, so it wins whenever pageToken is present.
        let page2 = server
            .mock("GET", "/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "trashed=false".into()),
                Matcher::UrlEncoded("pageToken".into(), "page-2".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "files": [
                        {
                            "id": "2",
                            "name": "Doc",
                            "mimeType": "application/vnd.google-apps.document",
                            "parents": ["1"]
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = DriveClient::with_base_url(auth, server.url());
        let files = client.list_all().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "Root");
        assert_eq!(files[1].name, "Doc");
        assert_eq!(files[1].parents, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_list_all_surfaces_api_error() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let auth = authenticator_with_valid_token(&dir, &format!("{}/token", server.url()));

        server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"error": {"code": 403, "message": "Rate limit exceeded"}}).to_string(),
            )
            .create_async()
            .await;

        let client = DriveClient::with_base_url(auth, server.url());
        let err = client.list_all().await.unwrap_err();

        match err {
            ArchiverError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn test_export_file_writes_destination() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let auth = authenticator_with_valid_token(&dir, &format!("{}/token", server.url()));

        let export = server
            .mock("GET", "/files/doc-1/export")
            .match_query(Matcher::UrlEncoded("mimeType".into(), "text/plain".into()))
            .with_body("exported body")
            .create_async()
            .await;

        let client = DriveClient::with_base_url(auth, server.url());
        let destination = dir.path().join("Doc1.txt");
        client
            .export_file("doc-1", "text/plain", &destination)
            .await
            .unwrap();

        export.assert_async().await;
        assert_eq!(
            std::fs::read_to_string(&destination).unwrap(),
            "exported body"
        );
    }

    #[tokio::test]
    async fn test_export_failure_reports_status() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let auth = authenticator_with_valid_token(&dir, &format!("{}/token", server.url()));

        server
            .mock("GET", "/files/doc-1/export")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = DriveClient::with_base_url(auth, server.url());
        let destination = dir.path().join("Doc1.txt");
        let err = client
            .export_file("doc-1", "text/plain", &destination)
            .await
            .unwrap_err();

        match err {
            ArchiverError::ApiError { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other}"),
        }
    }
}
