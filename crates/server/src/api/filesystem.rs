//! 文件系统 API 路由。
//!
//! 把统一文件系统门面的操作以 JSON 形式暴露给前端。

use std::sync::Arc;

use anhl_api_types::ErrorResponse;
use anhl_core::{Entry, FsError, Stat, TreeEntry};
use anhl_filesystem::{CopyOptions, MoveOptions, SupportReport, mime_from_name};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::AppState;

/// 创建文件系统 API 路由。
pub fn create_filesystem_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fs/support", get(support))
        .route("/api/fs/open", get(open_path))
        .route("/api/fs/list", post(list))
        .route("/api/fs/stat", post(stat))
        .route("/api/fs/read", post(read_text))
        .route("/api/fs/blob", post(get_blob))
        .route("/api/fs/write", post(write_text))
        .route("/api/fs/mkdir", post(mkdir))
        .route("/api/fs/remove", post(remove))
        .route("/api/fs/copy", post(copy))
        .route("/api/fs/move", post(move_entry))
        .route("/api/fs/tree", post(build_tree))
}

#[derive(Debug, Deserialize)]
struct OpenQuery {
    path: String,
}

#[derive(Debug, Deserialize)]
struct EntryRequest {
    entry: Entry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteRequest {
    target_dir: Entry,
    name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MkdirRequest {
    target_dir: Entry,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RemoveRequest {
    entry: Entry,
    #[serde(default)]
    parent: Option<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CopyRequest {
    entry: Entry,
    target_dir: Entry,
    #[serde(default)]
    options: CopyOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    entry: Entry,
    target_dir: Entry,
    #[serde(default)]
    options: MoveOptions,
}

#[derive(Debug, Serialize)]
struct TextResponse {
    content: String,
}

async fn support(State(state): State<Arc<AppState>>) -> Json<SupportReport> {
    Json(state.fs.check_file_system_support())
}

/// 把宿主路径解析为条目。
async fn open_path(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OpenQuery>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(state.fs.open_path(&query.path).await?))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryRequest>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(state.fs.list(&req.entry).await?))
}

async fn stat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryRequest>,
) -> Result<Json<Stat>, ApiError> {
    Ok(Json(state.fs.stat(&req.entry).await?))
}

async fn read_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryRequest>,
) -> Result<Json<TextResponse>, ApiError> {
    let content = state.fs.read_text(&req.entry).await?;
    Ok(Json(TextResponse { content }))
}

/// 原始字节，`Content-Type` 由文件名推断。
async fn get_blob(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryRequest>,
) -> Result<Response, ApiError> {
    let data = state.fs.get_blob(&req.entry).await?;
    let mime = mime_from_name(&req.entry.name);
    Ok(([(header::CONTENT_TYPE, mime)], data).into_response())
}

async fn write_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<Entry>, ApiError> {
    let entry = state
        .fs
        .write_text(&req.target_dir, &req.name, &req.content)
        .await?;
    Ok(Json(entry))
}

async fn mkdir(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MkdirRequest>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(state.fs.mkdir(&req.target_dir, &req.name).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoveRequest>,
) -> Result<StatusCode, ApiError> {
    state.fs.remove(&req.entry, req.parent.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn copy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CopyRequest>,
) -> Result<Json<Entry>, ApiError> {
    let entry = state
        .fs
        .copy(&req.entry, &req.target_dir, &req.options)
        .await?;
    Ok(Json(entry))
}

async fn move_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Entry>, ApiError> {
    let entry = state
        .fs
        .move_entry(&req.entry, &req.target_dir, &req.options)
        .await?;
    Ok(Json(entry))
}

async fn build_tree(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EntryRequest>,
) -> Result<Json<Vec<TreeEntry>>, ApiError> {
    Ok(Json(state.fs.build_tree(&req.entry).await?))
}

/// API 错误类型。
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FsError> for ApiError {
    fn from(err: FsError) -> Self {
        let status = match &err {
            FsError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            FsError::UnsupportedOperation { .. } => StatusCode::NOT_IMPLEMENTED,
            FsError::InvalidHandle(_) | FsError::Pattern(_) => StatusCode::BAD_REQUEST,
            FsError::NotFound(_) => StatusCode::NOT_FOUND,
            FsError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %err, "filesystem request failed");
        }
        let body = ErrorResponse::new(err.code(), err.to_string())
            .with_remedy(err.remedy().map(str::to_string));
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
