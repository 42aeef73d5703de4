//! 统一文件系统门面。
//!
//! 启动时探测一次后端，之后所有操作都转发给同一个适配器。

use std::sync::Arc;

use anhl_core::{Backend, Entry, FsResult, SandboxScope, Stat, TreeEntry};
use tracing::info;

use crate::adapter::{CopyOptions, MoveOptions, PlatformAdapter};
use crate::browser::BrowserAdapter;
use crate::host::HostAdapter;
use crate::platform::{Environment, detect_backend};
use crate::sandbox::SandboxAdapter;
use crate::support::SupportReport;

/// 应用其余部分唯一使用的文件系统入口。
#[derive(Clone)]
pub struct FilesystemFacade {
    adapter: Arc<dyn PlatformAdapter>,
}

impl FilesystemFacade {
    /// 按运行环境选择后端。
    pub fn detect(env: Environment) -> Self {
        let backend = detect_backend(&env.probe());
        let adapter: Arc<dyn PlatformAdapter> = match (backend, env.browser, env.sandbox) {
            (Backend::Browser, Some(bridge), _) => Arc::new(BrowserAdapter::new(bridge)),
            (Backend::Sandbox, _, Some(bridge)) => Arc::new(SandboxAdapter::new(bridge)),
            _ => Arc::new(HostAdapter::with_allowed_roots(env.allowed_roots)),
        };
        info!(backend = %adapter.backend(), "filesystem backend selected");
        Self { adapter }
    }

    pub fn with_adapter(adapter: Arc<dyn PlatformAdapter>) -> Self {
        Self { adapter }
    }

    pub fn backend(&self) -> Backend {
        self.adapter.backend()
    }

    pub fn adapter(&self) -> &Arc<dyn PlatformAdapter> {
        &self.adapter
    }

    pub fn check_file_system_support(&self) -> SupportReport {
        self.adapter.support_report()
    }

    pub async fn pick_directory(&self, scope: Option<SandboxScope>) -> FsResult<Entry> {
        self.adapter.pick_directory(scope).await
    }

    pub async fn ensure_mobile_permissions(&self) -> FsResult<()> {
        self.adapter.ensure_mobile_permissions().await
    }

    pub async fn private_workspace_root(&self) -> FsResult<Entry> {
        self.adapter.private_workspace_root().await
    }

    pub async fn open_path(&self, path: &str) -> FsResult<Entry> {
        self.adapter.open_path(path).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %dir.path))]
    pub async fn list(&self, dir: &Entry) -> FsResult<Vec<Entry>> {
        self.adapter.list(dir).await
    }

    pub async fn stat(&self, entry: &Entry) -> FsResult<Stat> {
        self.adapter.stat(entry).await
    }

    pub async fn read_text(&self, entry: &Entry) -> FsResult<String> {
        self.adapter.read_text(entry).await
    }

    pub async fn get_blob(&self, entry: &Entry) -> FsResult<Vec<u8>> {
        self.adapter.get_blob(entry).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(dir = %target_dir.path, name = %name))]
    pub async fn write_text(&self, target_dir: &Entry, name: &str, content: &str) -> FsResult<Entry> {
        self.adapter.write_text(target_dir, name, content).await
    }

    pub async fn write_blob(&self, target_dir: &Entry, name: &str, data: &[u8]) -> FsResult<Entry> {
        self.adapter.write_blob(target_dir, name, data).await
    }

    pub async fn mkdir(&self, target_dir: &Entry, name: &str) -> FsResult<Entry> {
        self.adapter.mkdir(target_dir, name).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %entry.path))]
    pub async fn remove(&self, entry: &Entry, parent: Option<&Entry>) -> FsResult<()> {
        self.adapter.remove(entry, parent).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(from = %entry.path, to = %target_dir.path))]
    pub async fn copy(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &CopyOptions,
    ) -> FsResult<Entry> {
        self.adapter.copy(entry, target_dir, options).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(from = %entry.path, to = %target_dir.path))]
    pub async fn move_entry(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &MoveOptions,
    ) -> FsResult<Entry> {
        self.adapter.move_entry(entry, target_dir, options).await
    }

    pub async fn build_tree(&self, dir: &Entry) -> FsResult<Vec<TreeEntry>> {
        self.adapter.build_tree(dir).await
    }
}

impl std::fmt::Debug for FilesystemFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemFacade")
            .field("backend", &self.backend())
            .finish()
    }
}
