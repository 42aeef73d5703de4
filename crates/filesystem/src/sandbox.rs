//! 移动端沙箱适配器。
//!
//! 条目由作用域加相对路径定位（[`CapabilityRef::Scoped`]），`Entry::path`
//! 与相对路径保持一致。共享存储作用域上的写操作受"所有文件访问"权限约束。

use std::sync::Arc;

use anhl_core::{
    Backend, CapabilityRef, Entry, EntryKind, FsError, FsResult, SandboxScope, Stat, file_name,
    join_path, sort_entries, to_relative_external_path,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::adapter::{CopyOptions, MoveOptions, PlatformAdapter, target_name, validate_name};
use crate::bridge::{NativeErrorKind, SandboxBridge};
use crate::permission::{AccessMode, AllFilesGate, StoragePermission, negotiate};
use crate::tree::{copy_tree, ensure_not_nested, move_by_copy};

const PRIVATE_WORKSPACE_DIR: &str = "workspace";

pub struct SandboxAdapter {
    bridge: Arc<dyn SandboxBridge>,
    all_files: AllFilesGate,
}

impl SandboxAdapter {
    pub fn new(bridge: Arc<dyn SandboxBridge>) -> Self {
        Self {
            bridge,
            all_files: AllFilesGate::new(),
        }
    }

    /// 作用域根目录条目。
    pub fn scope_root(scope: SandboxScope) -> Entry {
        Entry::capability_root(CapabilityRef::Scoped {
            scope,
            relative_path: String::new(),
        })
    }

    fn scoped<'a>(entry: &'a Entry, op: &str) -> FsResult<(SandboxScope, &'a str)> {
        match &entry.capability {
            CapabilityRef::Scoped {
                scope,
                relative_path,
            } => Ok((*scope, relative_path.as_str())),
            other => Err(FsError::InvalidHandle(format!(
                "sandbox.{op} {}: entry carries a {} capability",
                entry.path,
                other.backend()
            ))),
        }
    }

    fn child(parent: &Entry, scope: SandboxScope, kind: EntryKind, name: &str) -> Entry {
        let relative_path = match &parent.capability {
            CapabilityRef::Scoped { relative_path, .. } => join_path(relative_path, name),
            _ => join_path(&parent.path, name),
        };
        Entry::child_of(
            parent,
            kind,
            name,
            CapabilityRef::Scoped {
                scope,
                relative_path,
            },
        )
    }

    async fn guard_write(&self, scope: SandboxScope) -> FsResult<()> {
        if scope.is_shared_storage() {
            self.all_files.ensure(self.bridge.as_ref()).await?;
        }
        Ok(())
    }
}

fn context(op: &str, scope: SandboxScope, path: &str) -> String {
    format!("sandbox.{op} {scope}:{path}")
}

#[async_trait]
impl PlatformAdapter for SandboxAdapter {
    fn backend(&self) -> Backend {
        Backend::Sandbox
    }

    async fn list(&self, dir: &Entry) -> FsResult<Vec<Entry>> {
        let (scope, base) = Self::scoped(dir, "list")?;
        let items = self
            .bridge
            .readdir(scope, base)
            .await
            .map_err(|e| e.into_fs_error(context("list", scope, base)))?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let kind = match item.kind {
                Some(kind) => kind,
                None => {
                    let child_path = join_path(base, &item.name);
                    self.bridge
                        .stat(scope, &child_path)
                        .await
                        .map_err(|e| e.into_fs_error(context("stat", scope, &child_path)))?
                        .kind
                }
            };
            entries.push(Self::child(dir, scope, kind, &item.name));
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn stat(&self, entry: &Entry) -> FsResult<Stat> {
        let (scope, path) = Self::scoped(entry, "stat")?;
        let stat = self
            .bridge
            .stat(scope, path)
            .await
            .map_err(|e| e.into_fs_error(context("stat", scope, path)))?;
        Ok(Stat {
            kind: stat.kind,
            size: if stat.kind.is_dir() {
                None
            } else {
                Some(stat.size)
            },
            modified: Some(stat.mtime),
        })
    }

    async fn get_blob(&self, entry: &Entry) -> FsResult<Vec<u8>> {
        let (scope, path) = Self::scoped(entry, "read")?;
        self.bridge
            .read_file(scope, path)
            .await
            .map_err(|e| e.into_fs_error(context("read", scope, path)))
    }

    async fn write_blob(&self, target_dir: &Entry, name: &str, data: &[u8]) -> FsResult<Entry> {
        validate_name(name)?;
        let (scope, base) = Self::scoped(target_dir, "write")?;
        self.guard_write(scope).await?;

        let path = join_path(base, name);
        self.bridge
            .write_file(scope, &path, data, true)
            .await
            .map_err(|e| e.into_fs_error(context("write", scope, &path)))?;
        Ok(Self::child(target_dir, scope, EntryKind::File, name))
    }

    async fn mkdir(&self, target_dir: &Entry, name: &str) -> FsResult<Entry> {
        validate_name(name)?;
        let (scope, base) = Self::scoped(target_dir, "mkdir")?;
        self.guard_write(scope).await?;

        let path = join_path(base, name);
        match self.bridge.mkdir(scope, &path, true).await {
            Ok(()) => {}
            Err(err) if err.kind == NativeErrorKind::AlreadyExists => {
                debug!(scope = %scope, path = %path, "directory already exists");
            }
            Err(err) => return Err(err.into_fs_error(context("mkdir", scope, &path))),
        }
        Ok(Self::child(target_dir, scope, EntryKind::Directory, name))
    }

    async fn remove(&self, entry: &Entry, _parent: Option<&Entry>) -> FsResult<()> {
        let (scope, path) = Self::scoped(entry, "remove")?;
        self.guard_write(scope).await?;

        let result = if entry.is_dir() {
            self.bridge.rmdir(scope, path, true).await
        } else {
            self.bridge.delete_file(scope, path).await
        };
        result.map_err(|e| e.into_fs_error(context("remove", scope, path)))?;
        info!(scope = %scope, path = %path, "removed entry");
        Ok(())
    }

    async fn copy(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &CopyOptions,
    ) -> FsResult<Entry> {
        let (from_scope, from) = Self::scoped(entry, "copy")?;
        let (to_scope, to_base) = Self::scoped(target_dir, "copy")?;
        let name = target_name(entry, options.new_name.as_deref())?;

        if entry.is_dir() || from_scope != to_scope {
            return copy_tree(self, entry, target_dir, name).await;
        }

        self.guard_write(to_scope).await?;
        let to = join_path(to_base, name);
        self.bridge
            .copy(from_scope, from, to_scope, &to)
            .await
            .map_err(|e| e.into_fs_error(context("copy", from_scope, from)))?;
        Ok(Self::child(target_dir, to_scope, entry.kind, name))
    }

    async fn move_entry(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &MoveOptions,
    ) -> FsResult<Entry> {
        let (from_scope, from) = Self::scoped(entry, "move")?;
        let (to_scope, to_base) = Self::scoped(target_dir, "move")?;
        let name = target_name(entry, options.new_name.as_deref())?;
        ensure_not_nested(entry, target_dir)?;

        if from_scope != to_scope {
            return move_by_copy(self, entry, target_dir, name, options.source_parent.as_ref())
                .await;
        }

        self.guard_write(to_scope).await?;
        let to = join_path(to_base, name);
        self.bridge
            .rename(from_scope, from, to_scope, &to)
            .await
            .map_err(|e| e.into_fs_error(context("move", from_scope, from)))?;
        Ok(Self::child(target_dir, to_scope, entry.kind, name))
    }

    async fn pick_directory(&self, scope: Option<SandboxScope>) -> FsResult<Entry> {
        if let Some(scope) = scope {
            return Ok(Self::scope_root(scope));
        }

        let uri = self
            .bridge
            .pick_directory_uri()
            .await
            .map_err(|e| e.into_fs_error("sandbox.pick_directory"))?;
        let Some(uri) = uri else {
            debug!("no directory picked, using documents scope");
            return Ok(Self::scope_root(SandboxScope::Documents));
        };

        let info = to_relative_external_path(&uri);
        info!(
            volume = %info.volume,
            relative_path = %info.relative_path,
            display_name = %info.display_name,
            "external directory picked"
        );
        Ok(Entry {
            kind: EntryKind::Directory,
            name: file_name(&info.relative_path),
            path: info.relative_path.clone(),
            capability: CapabilityRef::Scoped {
                scope: SandboxScope::ExternalStorage,
                relative_path: info.relative_path,
            },
        })
    }

    async fn ensure_mobile_permissions(&self) -> FsResult<()> {
        let storage = StoragePermission::new(self.bridge.as_ref());
        match negotiate(&storage, AccessMode::ReadWrite).await {
            Ok(true) => {}
            Ok(false) => warn!("storage permission not granted"),
            Err(err) => warn!(error = %err, "storage permission check failed"),
        }

        self.all_files.ensure(self.bridge.as_ref()).await
    }

    async fn private_workspace_root(&self) -> FsResult<Entry> {
        let data_root = Self::scope_root(SandboxScope::Data);
        self.mkdir(&data_root, PRIVATE_WORKSPACE_DIR).await
    }
}
