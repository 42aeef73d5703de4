use anhl_api_types::{ErrorResponse, HealthCheckResponse};
use anhl_core::Entry;
use anhl_filesystem::{Environment, FilesystemFacade};
use anhl_search::SearchConfig;
use anhl_server::{AppState, router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let fs = FilesystemFacade::detect(Environment::host(Vec::new()));
    router(AppState::new(fs, SearchConfig::default()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, body.to_vec())
}

async fn post<T: DeserializeOwned>(app: &Router, uri: &str, payload: Value) -> (StatusCode, T) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");
    let (status, body) = send(app, request).await;
    let parsed = serde_json::from_slice(&body).expect("json body");
    (status, parsed)
}

async fn open(app: &Router, path: &std::path::Path) -> Entry {
    let uri = format!(
        "/api/fs/open?path={}",
        urlencoding::encode(&path.to_string_lossy())
    );
    let request = Request::get(uri).body(Body::empty()).expect("build request");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).expect("entry body")
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = app();
    let request = Request::get("/health").body(Body::empty()).expect("build request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthCheckResponse = serde_json::from_slice(&body).expect("health body");
    assert_eq!(health, HealthCheckResponse::ok("host"));
}

#[tokio::test]
async fn test_support_route() {
    let app = app();
    let request = Request::get("/api/fs/support")
        .body(Body::empty())
        .expect("build request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).expect("report body");
    assert_eq!(report["supported"], true);
}

#[tokio::test]
async fn test_write_list_read_over_http() {
    let temp = tempfile::tempdir().expect("temp dir");
    let app = app();
    let root = open(&app, temp.path()).await;

    let (status, written): (_, Entry) = post(
        &app,
        "/api/fs/write",
        json!({ "targetDir": root, "name": "hello.md", "content": "# hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written.name, "hello.md");

    let (_, docs): (_, Entry) = post(
        &app,
        "/api/fs/mkdir",
        json!({ "targetDir": root, "name": "docs" }),
    )
    .await;

    let (status, entries): (_, Vec<Entry>) =
        post(&app, "/api/fs/list", json!({ "entry": root })).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["docs", "hello.md"]);

    let (_, text): (_, Value) = post(&app, "/api/fs/read", json!({ "entry": written })).await;
    assert_eq!(text["content"], "# hi");

    let (status, copied): (_, Entry) = post(
        &app,
        "/api/fs/copy",
        json!({ "entry": written, "targetDir": docs }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(temp.path().join("docs/hello.md").exists());

    let (_, tree): (_, Value) = post(&app, "/api/fs/tree", json!({ "entry": root })).await;
    assert_eq!(tree[0]["name"], "docs");
    assert_eq!(tree[0]["children"][0]["name"], "hello.md");

    let request = Request::post("/api/fs/remove")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "entry": copied }).to_string()))
        .expect("build request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!temp.path().join("docs/hello.md").exists());
}

#[tokio::test]
async fn test_blob_uses_mime_from_name() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp.path().join("pixel.png"), [0x89, b'P', b'N', b'G']).expect("write png");
    let app = app();
    let root = open(&app, temp.path()).await;
    let (_, entries): (_, Vec<Entry>) = post(&app, "/api/fs/list", json!({ "entry": root })).await;

    let request = Request::post("/api/fs/blob")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "entry": entries[0] }).to_string()))
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("respond");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"image/png"[..])
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(body.as_ref(), &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_errors_map_to_status_and_body() {
    let temp = tempfile::tempdir().expect("temp dir");
    let app = app();
    let root = open(&app, temp.path()).await;

    let missing = json!({
        "kind": "file",
        "name": "gone.md",
        "path": format!("{}/gone.md", root.path),
        "capability": { "kind": "path" }
    });
    let (status, body): (_, ErrorResponse) =
        post(&app, "/api/fs/stat", json!({ "entry": missing })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.code, "NOT_FOUND");

    let foreign = json!({
        "kind": "directory",
        "name": "docs",
        "path": "docs",
        "capability": { "kind": "scoped", "scope": "DOCUMENTS", "relativePath": "docs" }
    });
    let (status, body): (_, ErrorResponse) =
        post(&app, "/api/fs/list", json!({ "entry": foreign })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "INVALID_HANDLE");
}
