//! 浏览器句柄适配器（File System Access API）。
//!
//! 能力引用为 [`CapabilityRef::Handle`]。每次写操作前都重新协商读写权限，
//! 浏览器可能在任意时刻收回授权。

use std::sync::Arc;

use anhl_core::{
    Backend, CapabilityRef, Entry, EntryKind, FsError, FsResult, HandleId, SandboxScope, Stat,
    sort_entries,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::adapter::{CopyOptions, MoveOptions, PlatformAdapter, target_name, validate_name};
use crate::bridge::{BrowserBridge, NativeErrorKind};
use crate::permission::{AccessMode, HandlePermission, require};
use crate::support::{SupportReport, check_browser_support};
use crate::tree::{copy_tree, ensure_not_nested, move_by_copy};

pub struct BrowserAdapter {
    bridge: Arc<dyn BrowserBridge>,
}

impl BrowserAdapter {
    pub fn new(bridge: Arc<dyn BrowserBridge>) -> Self {
        Self { bridge }
    }

    fn handle_of(entry: &Entry, op: &str) -> FsResult<HandleId> {
        match &entry.capability {
            CapabilityRef::Handle { handle } => Ok(*handle),
            other => Err(FsError::InvalidHandle(format!(
                "browser.{op} {}: entry carries a {} capability",
                entry.path,
                other.backend()
            ))),
        }
    }

    fn dir_handle_of(entry: &Entry, op: &str) -> FsResult<HandleId> {
        let handle = Self::handle_of(entry, op)?;
        if !entry.is_dir() {
            return Err(FsError::InvalidHandle(format!(
                "browser.{op} {}: not a directory handle",
                entry.path
            )));
        }
        Ok(handle)
    }

    fn file_handle_of(entry: &Entry, op: &str) -> FsResult<HandleId> {
        let handle = Self::handle_of(entry, op)?;
        if entry.is_dir() {
            return Err(FsError::InvalidHandle(format!(
                "browser.{op} {}: not a file handle",
                entry.path
            )));
        }
        Ok(handle)
    }

    async fn require_write(&self, dir: &Entry, handle: HandleId) -> FsResult<()> {
        let probe = HandlePermission::new(self.bridge.as_ref(), handle, &dir.path);
        require(&probe, AccessMode::ReadWrite).await
    }
}

#[async_trait]
impl PlatformAdapter for BrowserAdapter {
    fn backend(&self) -> Backend {
        Backend::Browser
    }

    fn support_report(&self) -> SupportReport {
        check_browser_support(&self.bridge.user_agent(), self.bridge.picker_available())
    }

    async fn list(&self, dir: &Entry) -> FsResult<Vec<Entry>> {
        let handle = Self::dir_handle_of(dir, "list")?;
        let children = self
            .bridge
            .entries(handle)
            .await
            .map_err(|e| e.into_fs_error(format!("browser.list {}", dir.path)))?;

        let mut entries: Vec<Entry> = children
            .into_iter()
            .map(|child| {
                Entry::child_of(
                    dir,
                    child.kind,
                    &child.name,
                    CapabilityRef::Handle { handle: child.id },
                )
            })
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn stat(&self, entry: &Entry) -> FsResult<Stat> {
        let handle = Self::handle_of(entry, "stat")?;
        if entry.is_dir() {
            return Ok(Stat::directory());
        }
        let metadata = self
            .bridge
            .file_metadata(handle)
            .await
            .map_err(|e| e.into_fs_error(format!("browser.stat {}", entry.path)))?;
        Ok(Stat {
            kind: EntryKind::File,
            size: Some(metadata.size),
            modified: Some(metadata.last_modified),
        })
    }

    async fn get_blob(&self, entry: &Entry) -> FsResult<Vec<u8>> {
        let handle = Self::file_handle_of(entry, "read")?;
        self.bridge
            .read_file(handle)
            .await
            .map_err(|e| e.into_fs_error(format!("browser.read {}", entry.path)))
    }

    async fn write_blob(&self, target_dir: &Entry, name: &str, data: &[u8]) -> FsResult<Entry> {
        validate_name(name)?;
        let dir = Self::dir_handle_of(target_dir, "write")?;
        self.require_write(target_dir, dir).await?;

        let context = format!("browser.write {}/{name}", target_dir.path);
        let file = self
            .bridge
            .get_file_handle(dir, name, true)
            .await
            .map_err(|e| e.into_fs_error(context.clone()))?;
        self.bridge
            .write_file(file, data)
            .await
            .map_err(|e| e.into_fs_error(context))?;

        Ok(Entry::child_of(
            target_dir,
            EntryKind::File,
            name,
            CapabilityRef::Handle { handle: file },
        ))
    }

    async fn mkdir(&self, target_dir: &Entry, name: &str) -> FsResult<Entry> {
        validate_name(name)?;
        let dir = Self::dir_handle_of(target_dir, "mkdir")?;
        self.require_write(target_dir, dir).await?;

        let created = self
            .bridge
            .get_directory_handle(dir, name, true)
            .await
            .map_err(|e| e.into_fs_error(format!("browser.mkdir {}/{name}", target_dir.path)))?;
        Ok(Entry::child_of(
            target_dir,
            EntryKind::Directory,
            name,
            CapabilityRef::Handle { handle: created },
        ))
    }

    async fn remove(&self, entry: &Entry, parent: Option<&Entry>) -> FsResult<()> {
        Self::handle_of(entry, "remove")?;
        let Some(parent) = parent else {
            return Err(FsError::InvalidHandle(format!(
                "browser.remove {}: the parent directory handle is required",
                entry.path
            )));
        };
        let parent_handle = Self::dir_handle_of(parent, "remove")?;
        self.require_write(parent, parent_handle).await?;

        self.bridge
            .remove_entry(parent_handle, &entry.name, entry.is_dir())
            .await
            .map_err(|e| e.into_fs_error(format!("browser.remove {}", entry.path)))?;
        info!(path = %entry.path, "removed entry");
        Ok(())
    }

    async fn copy(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &CopyOptions,
    ) -> FsResult<Entry> {
        Self::handle_of(entry, "copy")?;
        Self::dir_handle_of(target_dir, "copy")?;
        let name = target_name(entry, options.new_name.as_deref())?;
        copy_tree(self, entry, target_dir, name).await
    }

    async fn move_entry(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &MoveOptions,
    ) -> FsResult<Entry> {
        let handle = Self::handle_of(entry, "move")?;
        let dest = Self::dir_handle_of(target_dir, "move")?;
        let name = target_name(entry, options.new_name.as_deref())?;
        ensure_not_nested(entry, target_dir)?;
        self.require_write(target_dir, dest).await?;

        match self.bridge.move_handle(handle, dest, name).await {
            Ok(()) => {
                debug!(source = %entry.path, target = %target_dir.path, "moved with native handle move");
                Ok(Entry::child_of(
                    target_dir,
                    entry.kind,
                    name,
                    entry.capability.clone(),
                ))
            }
            Err(err) if err.kind == NativeErrorKind::NotSupported => {
                // 没有原生 move 时必须能删除源，先确认父目录再开始复制
                let Some(parent) = options.source_parent.as_ref() else {
                    return Err(FsError::InvalidHandle(format!(
                        "browser.move {}: the source parent handle is required when native move is unavailable",
                        entry.path
                    )));
                };
                Self::dir_handle_of(parent, "move")?;
                debug!(source = %entry.path, "native move unavailable, copying instead");
                move_by_copy(self, entry, target_dir, name, Some(parent)).await
            }
            Err(err) => Err(err.into_fs_error(format!("browser.move {}", entry.path))),
        }
    }

    async fn pick_directory(&self, _scope: Option<SandboxScope>) -> FsResult<Entry> {
        let report = self.support_report();
        if !report.supported {
            warn!(
                browser = report.browser.as_deref().unwrap_or("unknown"),
                reason = report.reason.as_deref().unwrap_or_default(),
                "directory picker unavailable"
            );
            return Err(FsError::unsupported_with_hint(
                "pick_directory",
                Backend::Browser,
                report.summary().unwrap_or_default(),
            ));
        }

        let picked = self
            .bridge
            .show_directory_picker()
            .await
            .map_err(|e| e.into_fs_error("browser.pick_directory"))?;
        info!(name = %picked.name, "directory picked");
        Ok(Entry::new(
            EntryKind::Directory,
            &picked.name,
            CapabilityRef::Handle { handle: picked.id },
        ))
    }
}
