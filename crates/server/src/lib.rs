//! HTTP 与 WebSocket 服务：把文件系统门面与搜索引擎暴露给前端。

pub mod api;
pub mod config;

pub use api::{AppState, router};
pub use config::ServerConfig;
