use thiserror::Error;

use super::Backend;

/// 文件系统抽象层统一错误类型。
#[derive(Debug, Error)]
pub enum FsError {
    #[error("permission denied: {message}{}", remedy_suffix(.remedy))]
    PermissionDenied {
        message: String,
        remedy: Option<String>,
    },

    #[error("{operation} is not supported on the {backend} backend{}", hint_suffix(.hint))]
    UnsupportedOperation {
        operation: &'static str,
        backend: Backend,
        hint: Option<String>,
    },

    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type FsResult<T> = std::result::Result<T, FsError>;

fn remedy_suffix(remedy: &Option<String>) -> String {
    match remedy {
        Some(remedy) => format!(" ({remedy})"),
        None => String::new(),
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(": {hint}"),
        None => String::new(),
    }
}

impl FsError {
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
            remedy: None,
        }
    }

    pub fn permission_denied_with_remedy(
        message: impl Into<String>,
        remedy: impl Into<String>,
    ) -> Self {
        Self::PermissionDenied {
            message: message.into(),
            remedy: Some(remedy.into()),
        }
    }

    pub fn unsupported(operation: &'static str, backend: Backend) -> Self {
        Self::UnsupportedOperation {
            operation,
            backend,
            hint: None,
        }
    }

    pub fn unsupported_with_hint(
        operation: &'static str,
        backend: Backend,
        hint: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            operation,
            backend,
            hint: Some(hint.into()),
        }
    }

    /// 包装底层 I/O 错误，附带 `适配器.操作 路径` 上下文。
    ///
    /// `NotFound` 类 I/O 错误会被提升为 [`FsError::NotFound`]。
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        let context = context.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(context);
        }
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                message: format!("{context}: {source}"),
                remedy: Some("grant file access to this application".to_string()),
            };
        }
        Self::Io { context, source }
    }

    /// 稳定的错误码，供 HTTP 层使用。
    pub fn code(&self) -> &'static str {
        match self {
            FsError::PermissionDenied { .. } => "PERMISSION_DENIED",
            FsError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            FsError::InvalidHandle(_) => "INVALID_HANDLE",
            FsError::NotFound(_) => "NOT_FOUND",
            FsError::Pattern(_) => "PATTERN_ERROR",
            FsError::Io { .. } => "IO_ERROR",
        }
    }

    /// 面向用户的补救建议（如有）。
    pub fn remedy(&self) -> Option<&str> {
        match self {
            FsError::PermissionDenied { remedy, .. } => remedy.as_deref(),
            FsError::UnsupportedOperation { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}
