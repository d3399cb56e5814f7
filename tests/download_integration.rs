//! Integration tests for streamed downloads.
//!
//! These tests verify the full download flow with mock HTTP servers.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use restclient_core::client::{ClientConfig, ClientError, HttpClient};
use restclient_core::reachability::FixedProbe;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn client_for(server: &MockServer) -> HttpClient {
    let config = ClientConfig::new(format!("{}/api/v1", server.uri()));
    HttpClient::with_probe(config, Box::new(FixedProbe(true))).unwrap()
}

/// Helper to mount a file endpoint.
async fn mount_file(server: &MockServer, path_str: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Deterministic pseudo-random payload.
fn payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from((i * 31 + i / 7) % 251).unwrap())
        .collect()
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_large_download_matches_source_byte_for_byte() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = payload(8 * 1024 * 1024 + 13);
    mount_file(
        &server,
        "/api/v1/dump.bin",
        ResponseTemplate::new(200).set_body_bytes(content.clone()),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("dump.bin", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(file.path(), temp_dir.path().join("dump.bin"));
    assert_eq!(file.bytes_written(), content.len() as u64);
    assert_eq!(std::fs::read(file.path()).unwrap(), content);
}

#[tokio::test]
async fn test_content_disposition_names_the_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/export",
        ResponseTemplate::new(200)
            .insert_header("Content-Disposition", r#"attachment; filename="report.pdf""#)
            .set_body_bytes(b"%PDF-1.7".to_vec()),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("export", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(file.filename(), "report.pdf");
    assert_eq!(file.path(), temp_dir.path().join("report.pdf"));
}

#[tokio::test]
async fn test_filename_falls_back_to_url_segment() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/export.csv",
        ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("export.csv", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(file.filename(), "export.csv");
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "a,b\n1,2\n");
}

#[tokio::test]
async fn test_explicit_file_destination_is_used_verbatim() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/export.csv",
        ResponseTemplate::new(200)
            .insert_header("Content-Disposition", r#"attachment; filename="server.csv""#)
            .set_body_string("x"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("mine.csv");

    let file = client_for(&server)
        .download("export.csv", &[], &target)
        .await
        .unwrap();

    assert_eq!(file.path(), target);
    assert_eq!(file.filename(), "server.csv", "reported name still comes from the server");
    assert_eq!(dir_entries(&temp_dir), ["mine.csv"]);
}

#[tokio::test]
async fn test_gzip_download_is_inflated_on_disk() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = payload(512 * 1024);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&content).unwrap();
    mount_file(
        &server,
        "/api/v1/catalog.po",
        ResponseTemplate::new(200)
            .insert_header("Content-Encoding", "gzip")
            .set_body_bytes(encoder.finish().unwrap()),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("catalog.po", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(file.path()).unwrap(), content);
    assert_eq!(file.bytes_written(), content.len() as u64);
}

#[tokio::test]
async fn test_download_sends_standard_headers() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/private.zip"))
        .and(header("authorization", "Bearer dl"))
        .and(header("accept-encoding", "gzip"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let client = client_for(&server);
    client.set_authorization("Bearer dl");
    client
        .download("private.zip", &[], temp_dir.path())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_error_leaves_no_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/missing.pdf",
        ResponseTemplate::new(404).set_body_string("nope"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("missing.pdf");

    let error = client_for(&server)
        .download("missing.pdf", &[], &target)
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert!(!target.exists());
    assert!(dir_entries(&temp_dir).is_empty());
}

#[tokio::test]
async fn test_corrupt_gzip_download_removes_partial_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/bad.gz",
        ResponseTemplate::new(200)
            .insert_header("Content-Encoding", "gzip")
            .set_body_bytes(b"this is not a gzip stream at all".to_vec()),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let error = client_for(&server)
        .download("bad.gz", &[], temp_dir.path())
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Decompress { .. }), "got {error:?}");
    assert!(dir_entries(&temp_dir).is_empty(), "partial file left behind");
}

#[tokio::test]
async fn test_unwritable_destination_is_io_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/file.txt",
        ResponseTemplate::new(200).set_body_string("data"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("no-such-dir").join("file.txt");

    let error = client_for(&server)
        .download("file.txt", &[], &target)
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Io { .. }), "got {error:?}");
    assert!(!error.is_http());
}

#[cfg(unix)]
#[tokio::test]
async fn test_uncreatable_destination_is_left_untouched() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/file.txt",
        ResponseTemplate::new(200).set_body_string("data"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let link = temp_dir.path().join("caller-link.txt");
    std::os::unix::fs::symlink(temp_dir.path().join("gone").join("file.txt"), &link).unwrap();

    let error = client_for(&server)
        .download("file.txt", &[], &link)
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Io { .. }), "got {error:?}");
    assert!(
        std::fs::symlink_metadata(&link).is_ok(),
        "caller's symlink was removed"
    );
}

#[tokio::test]
async fn test_multi_member_gzip_download_is_fully_inflated() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let first = payload(300 * 1024);
    let second = payload(1024);
    let mut body = Vec::new();
    for part in [&first, &second] {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(part).unwrap();
        body.extend(encoder.finish().unwrap());
    }
    mount_file(
        &server,
        "/api/v1/joined.log",
        ResponseTemplate::new(200)
            .insert_header("Content-Encoding", "gzip")
            .set_body_bytes(body),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("joined.log", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(file.path()).unwrap(), [first, second].concat());
}

#[tokio::test]
async fn test_empty_gzip_download_writes_empty_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/empty.txt",
        ResponseTemplate::new(200).insert_header("Content-Encoding", "gzip"),
    )
    .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("empty.txt", &[], temp_dir.path())
        .await
        .unwrap();

    assert_eq!(file.bytes_written(), 0);
    assert!(std::fs::read(file.path()).unwrap().is_empty());
}

#[tokio::test]
async fn test_download_from_anywhere_uses_url_origin() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/cdn/assets/logo.png"))
        .and(header("accept-language", "ja"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    // The configured prefix points elsewhere; only the other settings carry over.
    let config = ClientConfig::new("https://unused.invalid/api").with_ui_language("ja");
    let url = format!("{}/cdn/assets/logo.png", server.uri());
    let file = HttpClient::download_from_anywhere(&config, &url, &[], temp_dir.path())
        .unwrap()
        .await
        .unwrap();

    assert_eq!(file.filename(), "logo.png");
    assert_eq!(std::fs::read(file.path()).unwrap(), [0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_downloaded_file_can_be_moved() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(
        &server,
        "/api/v1/notes.txt",
        ResponseTemplate::new(200).set_body_string("hello"),
    )
    .await;
    let download_dir = TempDir::new().expect("failed to create temp dir");
    let final_dir = TempDir::new().expect("failed to create temp dir");

    let file = client_for(&server)
        .download("notes.txt", &[], download_dir.path())
        .await
        .unwrap();
    let moved = file
        .move_to(final_dir.path().join("kept.txt"))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(moved.path()).unwrap(), "hello");
    assert!(dir_entries(&download_dir).is_empty());
}
