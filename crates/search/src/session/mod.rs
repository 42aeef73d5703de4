//! 搜索会话模型与会话宿主。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::SearchOutcome;

/// 会话宿主实现。
pub mod host;
pub use host::{SearchHandle, SearchHost};

/// 会话运行状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Searching,
    Done,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn is_active(self) -> bool {
        self == SessionStatus::Searching
    }
}

impl From<SearchOutcome> for SessionStatus {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Completed { .. } => SessionStatus::Done,
            SearchOutcome::Cancelled => SessionStatus::Cancelled,
            SearchOutcome::Failed => SessionStatus::Failed,
        }
    }
}

/// 会话元数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    pub id: String,
    pub query: String,
    /// 搜索根目录的路径。
    pub root: String,
    pub status: SessionStatus,
    /// 是否因累计上限提前结束。
    pub limited: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}
