//! API 路由模块。
//!
//! 文件系统 JSON 路由与搜索 WebSocket。

pub mod filesystem;
pub mod state;
pub mod ws;

use std::sync::Arc;

use anhl_api_types::HealthCheckResponse;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use filesystem::{ApiError, create_filesystem_router};
pub use state::AppState;
pub use ws::websocket_handler;

/// 组装完整的应用路由。
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws/search", get(websocket_handler))
        .merge(create_filesystem_router())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::ok(state.fs.backend().to_string()))
}
