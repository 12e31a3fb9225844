//! Integration tests for file content operations
//!
//! Covers GET/PUT/DELETE against the WebDAV-style namespace, ancestor
//! collection creation before uploads, path encoding, and the 404
//! allow-list on delete.

use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, ResponseTemplate};

use vaultsync_remote::TransportError;

use crate::common;

#[tokio::test]
async fn test_get_file_returns_bytes() {
    let (server, client) = common::setup().await;
    common::mount_file(&server, "tasks/today.md", b"- [ ] water the plants").await;

    let bytes = client.get_file("tasks/today.md").await.expect("download failed");
    assert_eq!(bytes, b"- [ ] water the plants");
}

#[tokio::test]
async fn test_get_file_encodes_path_segments() {
    let (server, client) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/files/notes/meeting notes.md"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"agenda".to_vec()))
        .mount(&server)
        .await;

    // wiremock matches against the decoded path, so a hit proves the
    // request URL carried an encoded space.
    let bytes = client.get_file("notes/meeting notes.md").await.unwrap();
    assert_eq!(bytes, b"agenda");
}

#[tokio::test]
async fn test_get_file_missing_is_status_error() {
    let (server, client) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/files/gone.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_file("gone.md").await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_put_file_creates_ancestor_collections_first() {
    let (server, client) = common::setup().await;

    Mock::given(method("MKCOL"))
        .and(path("/files/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .and(path("/files/tasks/archive"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/tasks/archive/old.md"))
        .and(body_bytes(b"done".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .put_file("tasks/archive/old.md", b"done")
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_put_file_tolerates_existing_collections() {
    let (server, client) = common::setup().await;

    // 405 Method Not Allowed is WebDAV for "collection already exists".
    Mock::given(method("MKCOL"))
        .and(path("/files/tasks"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/tasks/today.md"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client
        .put_file("tasks/today.md", b"content")
        .await
        .expect("405 on MKCOL must not fail the upload");
}

#[tokio::test]
async fn test_put_file_tolerates_missing_parent_conflict() {
    let (server, client) = common::setup().await;

    // 409 Conflict: parent not there yet. The deeper MKCOL or the PUT
    // itself resolves it; the upload must proceed.
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/a/b/c.md"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    client.put_file("a/b/c.md", b"x").await.expect("upload failed");
}

#[tokio::test]
async fn test_put_root_level_file_skips_mkcol() {
    let (server, client) = common::setup().await;

    // No MKCOL mock mounted: any MKCOL would 404 and fail the upload.
    Mock::given(method("PUT"))
        .and(path("/files/inbox.md"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    client.put_file("inbox.md", b"hello").await.expect("upload failed");
}

#[tokio::test]
async fn test_put_file_server_error_propagates() {
    let (server, client) = common::setup().await;
    common::mount_mkcol_created(&server).await;

    Mock::given(method("PUT"))
        .and(path("/files/tasks/today.md"))
        .respond_with(ResponseTemplate::new(507))
        .mount(&server)
        .await;

    let err = client.put_file("tasks/today.md", b"x").await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 507, .. }));
}

#[tokio::test]
async fn test_delete_file_success() {
    let (server, client) = common::setup().await;

    Mock::given(method("DELETE"))
        .and(path("/files/tasks/today.md"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.delete_file("tasks/today.md").await.expect("delete failed");
}

#[tokio::test]
async fn test_delete_file_already_absent_is_success() {
    let (server, client) = common::setup().await;

    Mock::given(method("DELETE"))
        .and(path("/files/gone.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    client
        .delete_file("gone.md")
        .await
        .expect("404 on delete means already absent, which is success");
}

#[tokio::test]
async fn test_delete_file_forbidden_is_error() {
    let (server, client) = common::setup().await;

    Mock::given(method("DELETE"))
        .and(path("/files/locked.md"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.delete_file("locked.md").await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 403, .. }));
}
