//! 平台原生能力桥接。
//!
//! 浏览器句柄 API 与移动端文件插件都不在本进程内，适配器只通过这里的
//! trait 与它们交互。宿主嵌入方（WebView 外壳、测试替身）负责实现。

use anhl_core::{EntryKind, FsError, HandleId, SandboxScope};
use async_trait::async_trait;
use thiserror::Error;

use crate::permission::{AccessMode, PermissionState};

/// 原生层错误分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeErrorKind {
    NotFound,
    NotAllowed,
    TypeMismatch,
    AlreadyExists,
    NotSupported,
    Other,
}

/// 原生层返回的错误。
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct NativeError {
    pub kind: NativeErrorKind,
    pub message: String,
}

pub type NativeResult<T> = std::result::Result<T, NativeError>;

impl NativeError {
    pub fn new(kind: NativeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::NotFound, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::NotSupported, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::Other, message)
    }

    /// 转换为统一错误，`context` 形如 `browser.list docs/notes`。
    pub fn into_fs_error(self, context: impl Into<String>) -> FsError {
        let context = context.into();
        let detail = format!("{context}: {}", self.message);
        match self.kind {
            NativeErrorKind::NotFound => FsError::NotFound(detail),
            NativeErrorKind::NotAllowed => FsError::permission_denied(detail),
            NativeErrorKind::TypeMismatch => FsError::InvalidHandle(detail),
            NativeErrorKind::AlreadyExists => FsError::Io {
                context,
                source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, self.message),
            },
            NativeErrorKind::NotSupported => FsError::Io {
                context,
                source: std::io::Error::new(std::io::ErrorKind::Unsupported, self.message),
            },
            NativeErrorKind::Other => FsError::Io {
                context,
                source: std::io::Error::other(self.message),
            },
        }
    }
}

/// 浏览器侧的一个文件或目录句柄。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeHandle {
    pub id: HandleId,
    pub name: String,
    pub kind: EntryKind,
}

/// 浏览器 `File` 对象的元数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeFileMetadata {
    pub size: u64,
    /// Unix 毫秒时间戳。
    pub last_modified: i64,
}

/// 浏览器 File System Access API。
///
/// 句柄对象保存在桥接实现内部，通过 [`HandleId`] 引用。
#[async_trait]
pub trait BrowserBridge: Send + Sync {
    /// 运行环境是否提供 `showDirectoryPicker`。
    fn picker_available(&self) -> bool;

    fn user_agent(&self) -> String;

    async fn show_directory_picker(&self) -> NativeResult<NativeHandle>;

    async fn entries(&self, dir: HandleId) -> NativeResult<Vec<NativeHandle>>;

    async fn file_metadata(&self, file: HandleId) -> NativeResult<NativeFileMetadata>;

    async fn read_file(&self, file: HandleId) -> NativeResult<Vec<u8>>;

    async fn get_file_handle(&self, dir: HandleId, name: &str, create: bool)
    -> NativeResult<HandleId>;

    async fn get_directory_handle(
        &self,
        dir: HandleId,
        name: &str,
        create: bool,
    ) -> NativeResult<HandleId>;

    /// 通过可写流整体覆盖文件内容。
    async fn write_file(&self, file: HandleId, data: &[u8]) -> NativeResult<()>;

    async fn remove_entry(&self, dir: HandleId, name: &str, recursive: bool) -> NativeResult<()>;

    async fn query_permission(&self, handle: HandleId, mode: AccessMode)
    -> NativeResult<PermissionState>;

    async fn request_permission(
        &self,
        handle: HandleId,
        mode: AccessMode,
    ) -> NativeResult<PermissionState>;

    /// 原生 `handle.move()`，多数浏览器尚未提供。
    async fn move_handle(
        &self,
        _handle: HandleId,
        _dest_dir: HandleId,
        _new_name: &str,
    ) -> NativeResult<()> {
        Err(NativeError::not_supported("FileSystemHandle.move is unavailable"))
    }
}

/// 沙箱 `readdir` 返回的单项。部分平台不返回类型，需要再 `stat`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFileInfo {
    pub name: String,
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeStat {
    pub kind: EntryKind,
    pub size: u64,
    /// Unix 毫秒时间戳。
    pub mtime: i64,
}

/// 移动端文件插件（作用域 + 相对路径）。
#[async_trait]
pub trait SandboxBridge: Send + Sync {
    async fn readdir(&self, scope: SandboxScope, path: &str) -> NativeResult<Vec<NativeFileInfo>>;

    async fn stat(&self, scope: SandboxScope, path: &str) -> NativeResult<NativeStat>;

    async fn read_file(&self, scope: SandboxScope, path: &str) -> NativeResult<Vec<u8>>;

    async fn write_file(
        &self,
        scope: SandboxScope,
        path: &str,
        data: &[u8],
        recursive: bool,
    ) -> NativeResult<()>;

    async fn mkdir(&self, scope: SandboxScope, path: &str, recursive: bool) -> NativeResult<()>;

    async fn rmdir(&self, scope: SandboxScope, path: &str, recursive: bool) -> NativeResult<()>;

    async fn delete_file(&self, scope: SandboxScope, path: &str) -> NativeResult<()>;

    async fn copy(
        &self,
        from_scope: SandboxScope,
        from: &str,
        to_scope: SandboxScope,
        to: &str,
    ) -> NativeResult<()>;

    async fn rename(
        &self,
        from_scope: SandboxScope,
        from: &str,
        to_scope: SandboxScope,
        to: &str,
    ) -> NativeResult<()>;

    async fn check_storage_permission(&self) -> NativeResult<PermissionState>;

    async fn request_storage_permission(&self) -> NativeResult<PermissionState>;

    async fn check_all_files_access(&self) -> NativeResult<bool>;

    /// 跳转到系统设置页，返回时权限可能仍未生效。
    async fn request_all_files_access(&self) -> NativeResult<()>;

    /// 系统目录选择器（SAF），用户取消时返回 `None`。
    async fn pick_directory_uri(&self) -> NativeResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_not_allowed_maps_to_permission_denied() {
        let err = NativeError::new(NativeErrorKind::NotAllowed, "user dismissed prompt")
            .into_fs_error("browser.write notes/a.md");
        assert_eq!(err.code(), "PERMISSION_DENIED");
        assert!(err.to_string().contains("browser.write notes/a.md"));
    }

    #[test]
    fn native_type_mismatch_maps_to_invalid_handle() {
        let err = NativeError::new(NativeErrorKind::TypeMismatch, "expected directory")
            .into_fs_error("browser.list a.md");
        match err {
            FsError::InvalidHandle(detail) => assert!(detail.ends_with("expected directory")),
            other => panic!("expected InvalidHandle, got: {other:?}"),
        }
    }

    #[test]
    fn native_other_keeps_context() {
        let err = NativeError::other("quota exceeded").into_fs_error("sandbox.write DATA:a");
        assert_eq!(err.code(), "IO_ERROR");
        assert_eq!(err.to_string(), "sandbox.write DATA:a: quota exceeded");
    }
}
