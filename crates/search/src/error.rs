use anhl_core::FsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("搜索关键词不能为空")]
    EmptyQuery,

    #[error("无效的搜索表达式: {0}")]
    Pattern(#[from] regex::Error),

    #[error("无效的 glob 规则: {0}")]
    Glob(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("搜索宿主已停止")]
    HostClosed,
}

impl SearchError {
    /// 查询或规则编译失败属于调用方输入错误。
    pub fn is_pattern_error(&self) -> bool {
        matches!(
            self,
            SearchError::EmptyQuery | SearchError::Pattern(_) | SearchError::Glob(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
