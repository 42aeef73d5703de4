//! 文件系统抽象层。
//!
//! 在浏览器句柄存储、宿主原生路径、移动端沙箱三种后端之上提供同一套
//! 目录/文件模型。应用只与 [`FilesystemFacade`] 交互。

pub mod adapter;
pub mod bridge;
pub mod browser;
pub mod facade;
pub mod host;
pub mod permission;
pub mod platform;
pub mod sandbox;
pub mod support;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tree;

pub use adapter::{CopyOptions, MoveOptions, PlatformAdapter, mime_from_name};
pub use bridge::{
    BrowserBridge, NativeError, NativeErrorKind, NativeFileInfo, NativeFileMetadata, NativeHandle,
    NativeResult, NativeStat, SandboxBridge,
};
pub use browser::BrowserAdapter;
pub use facade::FilesystemFacade;
pub use host::HostAdapter;
pub use permission::{AccessMode, AllFilesGate, PermissionProbe, PermissionState};
pub use platform::{Environment, PlatformProbe, detect_backend};
pub use sandbox::SandboxAdapter;
pub use support::{SupportDebug, SupportReport, check_browser_support};
