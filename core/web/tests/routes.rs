use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use drivedesk_common::{ParentRef, SPREADSHEET_MIME_TYPE};
use drivedesk_storage::{FileManager, MemoryStore, RemoteStore};
use drivedesk_web::{build_router, AppState, ServerConfig};

const BOUNDARY: &str = "drivedesk-test-boundary";

fn setup() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(FileManager::new(store.clone()));
    (store, build_router(state, &ServerConfig::default()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn multipart_body(folder: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n"
        )
        .as_bytes(),
    );
    for (name, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(folder: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(folder, files)))
        .unwrap()
}

/// Upload parts the way a browser does for unknown types.
fn upload_request(folder: &str, files: &[(&str, &[u8])]) -> Request<Body> {
    let parts: Vec<(&str, &str, &[u8])> = files
        .iter()
        .map(|(name, data)| (*name, "application/octet-stream", *data))
        .collect();
    multipart_request(folder, &parts)
}

fn delete_request(file_name: &str, folder: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/delete")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("file_name={file_name}&folder={folder}")))
        .unwrap()
}

#[tokio::test]
async fn upload_then_update_keeps_id() {
    let (store, app) = setup();

    let (status, _, body) = send(app.clone(), upload_request("", &[("report.csv", b"v1")])).await;
    assert_eq!(status, StatusCode::OK);
    let first = json(&body);
    assert_eq!(first["files"][0]["status"], "created");
    assert_eq!(first["files"][0]["location"], "root");

    let (_, _, body) = send(app, upload_request("", &[("report.csv", b"v2")])).await;
    let second = json(&body);
    assert_eq!(second["files"][0]["status"], "updated");
    assert_eq!(second["files"][0]["id"], first["files"][0]["id"]);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn upload_records_file_type() {
    let (store, app) = setup();

    let request = multipart_request(
        "",
        &[
            ("report.csv", "application/octet-stream", b"a,b\n"),
            ("notes", "text/markdown", b"# hi"),
        ],
    );
    let (status, _, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len().await, 2);

    let (_, _, body) = get(app.clone(), "/api/files").await;
    let listing = json(&body);
    assert_eq!(listing["files"][0]["title"], "report.csv");
    assert_eq!(listing["files"][0]["mime_type"], "text/csv");
    assert_eq!(listing["files"][1]["mime_type"], "text/markdown");

    let (_, _, body) = get(app, "/api/files/export").await;
    let mut workbook = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    let mut strings = String::new();
    workbook
        .by_name("xl/sharedStrings.xml")
        .unwrap()
        .read_to_string(&mut strings)
        .unwrap();
    assert!(strings.contains("text/csv"));
    assert!(!strings.contains("application/octet-stream"));
}

#[tokio::test]
async fn actions_run_one_at_a_time() {
    let store = Arc::new(MemoryStore::new());
    store.insert("a.txt", "text/plain", ParentRef::Root, "a").await;
    let state = AppState::new(FileManager::new(store.clone()));
    let app = build_router(state.clone(), &ServerConfig::default());

    let running = state.begin_action().await;
    let waiting = tokio::spawn(get(app.clone(), "/api/files"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    // Health checks are not actions.
    let (status, _, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    drop(running);
    let (status, _, body) = tokio::time::timeout(Duration::from_secs(5), waiting)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["count"], 1);
}

#[tokio::test]
async fn upload_multiple_into_folder() {
    let (store, app) = setup();
    store.insert_folder("reports", ParentRef::Root).await;

    let (status, _, body) = send(
        app.clone(),
        upload_request("reports", &[("a.txt", b"alpha"), ("b.txt", b"beta")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["uploaded"], 2);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["files"][1]["location"], "reports");

    let (_, _, body) = get(app, "/api/files?folder=reports").await;
    let listing = json(&body);
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["files"][0]["title"], "a.txt");
}

#[tokio::test]
async fn upload_to_unknown_folder_lands_in_root() {
    let (_store, app) = setup();

    let (_, _, body) = send(app, upload_request("missing", &[("x.txt", b"x")])).await;
    let report = json(&body);
    assert_eq!(report["files"][0]["status"], "created");
    assert_eq!(report["files"][0]["location"], "root");
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let (_store, app) = setup();
    let (status, _, body) = send(app, upload_request("", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("No files"));
}

#[tokio::test]
async fn upload_failure_is_reported_per_file() {
    let (store, app) = setup();
    store.set_unavailable(true);

    let (status, _, body) = send(app, upload_request("", &[("a.txt", b"a")])).await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["files"][0]["status"], "failed");
    assert!(report["files"][0]["error"].as_str().unwrap().contains("Network"));
}

#[tokio::test]
async fn list_root_and_unknown_folder() {
    let (store, app) = setup();
    store.insert("a.txt", "text/plain", ParentRef::Root, "a").await;
    let gone = store.insert("gone.txt", "text/plain", ParentRef::Root, "g").await;
    store.trash(&gone).await.unwrap();

    let (status, _, body) = get(app.clone(), "/api/files?folder=").await;
    assert_eq!(status, StatusCode::OK);
    let listing = json(&body);
    assert_eq!(listing["folder"], "root");
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["files"][0]["mime_type"], "text/plain");

    let (status, _, body) = get(app, "/api/files?folder=nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn list_failure_is_server_error() {
    let (store, app) = setup();
    store.set_unavailable(true);
    let (status, _, _) = get(app, "/api/files").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn export_is_a_workbook() {
    let (store, app) = setup();
    store.insert("a.txt", "text/plain", ParentRef::Root, "a").await;

    let (status, headers, body) = get(app, "/api/files/export").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("google_drive_files.xlsx"));

    let mut workbook = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    let mut strings = String::new();
    workbook
        .by_name("xl/sharedStrings.xml")
        .unwrap()
        .read_to_string(&mut strings)
        .unwrap();
    assert!(strings.contains("File Name"));
    assert!(strings.contains("a.txt"));
}

#[tokio::test]
async fn archive_skips_native_entries() {
    let (store, app) = setup();
    store.insert("a.txt", "text/plain", ParentRef::Root, "alpha").await;
    store
        .insert("budget", SPREADSHEET_MIME_TYPE, ParentRef::Root, "")
        .await;

    let (status, headers, body) = get(app, "/api/archive").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("google_drive_files.zip"));

    let mut archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    assert_eq!(archive.len(), 1);
    let mut file = archive.by_index(0).unwrap();
    assert_eq!(file.name(), "a.txt");
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"alpha");
}

#[tokio::test]
async fn archive_of_unknown_folder_is_not_found() {
    let (_store, app) = setup();
    let (status, _, _) = get(app, "/api/archive?folder=nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_trashes_then_reports_not_found() {
    let (store, app) = setup();
    let id = store.insert("old.txt", "text/plain", ParentRef::Root, "o").await;

    let (status, _, body) = send(app.clone(), delete_request("old.txt", "")).await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["status"], "trashed");
    assert_eq!(report["id"], id.to_string());
    assert!(store.get(&id).await.unwrap().trashed);

    let (status, _, body) = send(app, delete_request("old.txt", "docs")).await;
    assert_eq!(status, StatusCode::OK);
    let report = json(&body);
    assert_eq!(report["status"], "not_found");
    assert_eq!(report["folder"], "docs");
}

#[tokio::test]
async fn delete_requires_file_name() {
    let (_store, app) = setup();
    let (status, _, _) = send(app, delete_request("", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
