//! 可取消的流式全文搜索。
//!
//! 调用方通过消息与 [`SearchHost`] 交互：发送 `search`/`cancel`，
//! 接收 `file-result`、`progress` 以及终止的 `done` 或 `error`。

pub mod config;
pub mod engine;
pub mod error;
pub mod glob;
pub mod matcher;
pub mod protocol;
pub mod session;
pub mod text;

pub use config::SearchConfig;
pub use engine::{SearchEngine, SearchOutcome, SearchRequest};
pub use error::{Result, SearchError};
pub use glob::{DEFAULT_EXCLUDES, GlobSet, PathRules};
pub use matcher::Matcher;
pub use protocol::{ClientMessage, SearchMatch, SearchOptions, ServerMessage};
pub use session::{SearchHandle, SearchHost, SearchSession, SessionStatus};
