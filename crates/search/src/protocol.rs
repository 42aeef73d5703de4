use anhl_core::Entry;
use serde::{Deserialize, Serialize};

/// 调用方发给搜索宿主的消息。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// 在 `root` 下启动一次搜索。
    Search {
        id: String,
        root: Entry,
        query: String,
        #[serde(default)]
        options: SearchOptions,
    },
    /// 取消指定搜索；省略 `id` 时取消全部。
    Cancel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

/// 搜索宿主发回的消息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// 一个文件的全部命中。
    FileResult {
        id: String,
        entry: Entry,
        relative_path: String,
        matches: Vec<SearchMatch>,
    },
    /// 周期性进度，`elapsed` 为毫秒。
    Progress { id: String, scanned: u64, elapsed: u64 },
    /// 终止消息。`matched` 为命中文件数。
    Done {
        id: String,
        scanned: u64,
        matched: u64,
        duration: u64,
        cancelled: bool,
        limited: bool,
    },
    /// 致命错误，不会再有 `done`。
    Error { id: String, message: String },
}

impl ServerMessage {
    pub fn id(&self) -> &str {
        match self {
            ServerMessage::FileResult { id, .. }
            | ServerMessage::Progress { id, .. }
            | ServerMessage::Done { id, .. }
            | ServerMessage::Error { id, .. } => id,
        }
    }

    /// 是否为会话的最后一条消息。
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerMessage::Done { .. } | ServerMessage::Error { .. })
    }
}

/// 单次搜索的选项，缺省字段取默认值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub match_case: bool,
    pub use_regex: bool,
    pub whole_word: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per_file: Option<usize>,
}

/// 单条命中。
///
/// `line` 从 1 开始；`start` 是匹配在 `preview` 中的字符偏移，`length` 为字符数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub line: usize,
    pub start: usize,
    pub length: usize,
    pub preview: String,
}
