//! 宿主文件系统适配器。
//!
//! 直接使用操作系统路径，能力引用为 [`CapabilityRef::Path`]。

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anhl_core::{
    Backend, CapabilityRef, Entry, EntryKind, FsError, FsResult, Stat, normalize_path,
    sort_entries,
};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adapter::{CopyOptions, MoveOptions, PlatformAdapter, target_name, validate_name};
use crate::tree::ensure_not_nested;

/// 宿主文件系统适配器。
#[derive(Debug, Clone, Default)]
pub struct HostAdapter {
    /// 允许的根目录列表（用于安全限制），空表示不限制。
    allowed_roots: Vec<PathBuf>,
}

impl HostAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带有根目录限制的实例。
    pub fn with_allowed_roots(roots: Vec<PathBuf>) -> Self {
        let allowed_roots = roots
            .into_iter()
            .map(|root| std::fs::canonicalize(&root).unwrap_or(root))
            .collect();
        Self { allowed_roots }
    }

    /// 检查路径是否在允许范围内。不存在的路径按其父目录判断。
    async fn is_path_allowed(&self, path: &Path) -> bool {
        if self.allowed_roots.is_empty() {
            return true;
        }

        let canonical = match fs::canonicalize(path).await {
            Ok(p) => p,
            Err(_) => match path.parent() {
                Some(parent) => match fs::canonicalize(parent).await {
                    Ok(p) => p,
                    Err(_) => return false,
                },
                None => return false,
            },
        };

        self.allowed_roots
            .iter()
            .any(|root| canonical.starts_with(root))
    }

    /// 取出条目对应的系统路径，并做根目录限制检查。
    async fn checked_path(&self, entry: &Entry, op: &str) -> FsResult<PathBuf> {
        let path = match &entry.capability {
            CapabilityRef::Path => PathBuf::from(&entry.path),
            other => {
                return Err(FsError::InvalidHandle(format!(
                    "host.{op} {}: entry carries a {} capability",
                    entry.path,
                    other.backend()
                )));
            }
        };

        if !self.is_path_allowed(&path).await {
            return Err(FsError::permission_denied_with_remedy(
                format!("host.{op} {} is outside the allowed roots", path.display()),
                "add the directory to the configured roots",
            ));
        }
        Ok(path)
    }
}

fn io_context(op: &str, path: &Path) -> String {
    format!("host.{op} {}", path.display())
}

fn path_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

fn modified_millis(metadata: &std::fs::Metadata) -> Option<i64> {
    metadata.modified().ok().and_then(|t| {
        t.duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_millis()).ok())
    })
}

/// 目录项类型，不跟随目录符号链接。
///
/// 指向文件的链接视为文件；指向目录的链接与失效链接返回 `None`，
/// 遍历、复制都不会进入其中，避免链接成环。
fn link_safe_kind(file_type: std::fs::FileType, path: &Path) -> Option<EntryKind> {
    if file_type.is_dir() {
        return Some(EntryKind::Directory);
    }
    if !file_type.is_symlink() {
        return Some(EntryKind::File);
    }
    match std::fs::metadata(path) {
        Ok(target) if target.is_file() => Some(EntryKind::File),
        _ => None,
    }
}

/// 原生递归复制目录，返回复制的文件数。
fn copy_dir_blocking(from: &Path, to: &Path) -> std::io::Result<usize> {
    let mut copied = 0;
    for item in WalkDir::new(from).follow_links(false) {
        let item = item.map_err(std::io::Error::from)?;
        let relative = item
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        let dest = to.join(relative);
        match link_safe_kind(item.file_type(), item.path()) {
            Some(EntryKind::Directory) => std::fs::create_dir_all(&dest)?,
            Some(EntryKind::File) => {
                std::fs::copy(item.path(), &dest)?;
                copied += 1;
            }
            None => debug!(path = %item.path().display(), "skipping directory link"),
        }
    }
    Ok(copied)
}

#[async_trait]
impl PlatformAdapter for HostAdapter {
    fn backend(&self) -> Backend {
        Backend::Host
    }

    async fn list(&self, dir: &Entry) -> FsResult<Vec<Entry>> {
        let path = self.checked_path(dir, "list").await?;
        debug!(path = %path.display(), "listing directory");

        let mut reader = fs::read_dir(&path)
            .await
            .map_err(|e| FsError::io(io_context("list", &path), e))?;

        let mut entries = Vec::new();
        while let Some(item) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::io(io_context("list", &path), e))?
        {
            let name = item.file_name().to_string_lossy().into_owned();
            let file_type = match item.file_type().await {
                Ok(file_type) => file_type,
                Err(err) => {
                    debug!(path = %item.path().display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let item_path = item.path();
            let kind = if file_type.is_symlink() {
                let probe_path = item_path.clone();
                tokio::task::spawn_blocking(move || link_safe_kind(file_type, &probe_path))
                    .await
                    .ok()
                    .flatten()
            } else {
                link_safe_kind(file_type, &item_path)
            };
            let Some(kind) = kind else {
                debug!(path = %item_path.display(), "skipping directory link");
                continue;
            };
            entries.push(Entry::child_of(dir, kind, &name, CapabilityRef::Path));
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn stat(&self, entry: &Entry) -> FsResult<Stat> {
        let path = self.checked_path(entry, "stat").await?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| FsError::io(io_context("stat", &path), e))?;

        Ok(Stat {
            kind: if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: if metadata.is_file() {
                Some(metadata.len())
            } else {
                None
            },
            modified: modified_millis(&metadata),
        })
    }

    async fn get_blob(&self, entry: &Entry) -> FsResult<Vec<u8>> {
        let path = self.checked_path(entry, "read").await?;
        fs::read(&path)
            .await
            .map_err(|e| FsError::io(io_context("read", &path), e))
    }

    async fn write_blob(&self, target_dir: &Entry, name: &str, data: &[u8]) -> FsResult<Entry> {
        validate_name(name)?;
        let dir = self.checked_path(target_dir, "write").await?;
        let path = dir.join(name);
        fs::write(&path, data)
            .await
            .map_err(|e| FsError::io(io_context("write", &path), e))?;
        debug!(path = %path.display(), bytes = data.len(), "wrote file");
        Ok(Entry::child_of(target_dir, EntryKind::File, name, CapabilityRef::Path))
    }

    async fn mkdir(&self, target_dir: &Entry, name: &str) -> FsResult<Entry> {
        validate_name(name)?;
        let dir = self.checked_path(target_dir, "mkdir").await?;
        let path = dir.join(name);
        fs::create_dir_all(&path)
            .await
            .map_err(|e| FsError::io(io_context("mkdir", &path), e))?;
        Ok(Entry::child_of(
            target_dir,
            EntryKind::Directory,
            name,
            CapabilityRef::Path,
        ))
    }

    async fn remove(&self, entry: &Entry, _parent: Option<&Entry>) -> FsResult<()> {
        let path = self.checked_path(entry, "remove").await?;
        let metadata = fs::symlink_metadata(&path)
            .await
            .map_err(|e| FsError::io(io_context("remove", &path), e))?;

        let result = if metadata.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        result.map_err(|e| FsError::io(io_context("remove", &path), e))?;
        info!(path = %path.display(), "removed entry");
        Ok(())
    }

    async fn copy(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &CopyOptions,
    ) -> FsResult<Entry> {
        let name = target_name(entry, options.new_name.as_deref())?;
        let source = self.checked_path(entry, "copy").await?;
        let dest_dir = self.checked_path(target_dir, "copy").await?;
        let dest = dest_dir.join(name);

        if entry.is_dir() {
            ensure_not_nested(entry, target_dir)?;
            let (from, to) = (source.clone(), dest.clone());
            let copied = tokio::task::spawn_blocking(move || copy_dir_blocking(&from, &to))
                .await
                .map_err(|e| FsError::io(io_context("copy", &source), std::io::Error::other(e)))?
                .map_err(|e| FsError::io(io_context("copy", &source), e))?;
            info!(
                source = %source.display(),
                target = %dest.display(),
                files = copied,
                "copied directory"
            );
        } else {
            fs::copy(&source, &dest)
                .await
                .map_err(|e| FsError::io(io_context("copy", &source), e))?;
        }

        Ok(Entry::child_of(target_dir, entry.kind, name, CapabilityRef::Path))
    }

    async fn move_entry(
        &self,
        entry: &Entry,
        target_dir: &Entry,
        options: &MoveOptions,
    ) -> FsResult<Entry> {
        let name = target_name(entry, options.new_name.as_deref())?;
        let source = self.checked_path(entry, "move").await?;
        let dest_dir = self.checked_path(target_dir, "move").await?;
        ensure_not_nested(entry, target_dir)?;
        let dest = dest_dir.join(name);

        match fs::rename(&source, &dest).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FsError::io(io_context("move", &source), err));
            }
            Err(err) => {
                // 跨设备等情况 rename 会失败，退化为复制后删除
                warn!(
                    source = %source.display(),
                    target = %dest.display(),
                    error = %err,
                    "rename failed, falling back to copy and remove"
                );
                let copy_options = CopyOptions {
                    new_name: Some(name.to_string()),
                };
                self.copy(entry, target_dir, &copy_options).await?;
                self.remove(entry, options.source_parent.as_ref()).await?;
            }
        }

        Ok(Entry::child_of(target_dir, entry.kind, name, CapabilityRef::Path))
    }

    async fn open_path(&self, path: &str) -> FsResult<Entry> {
        let raw = PathBuf::from(path);
        let canonical = fs::canonicalize(&raw)
            .await
            .map_err(|e| FsError::io(io_context("open", &raw), e))?;
        let probe = Entry::new(EntryKind::Directory, &path_string(&canonical), CapabilityRef::Path);
        let checked = self.checked_path(&probe, "open").await?;
        let metadata = fs::metadata(&checked)
            .await
            .map_err(|e| FsError::io(io_context("open", &checked), e))?;

        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        info!(path = %checked.display(), ?kind, "opened host path");
        Ok(Entry { kind, ..probe })
    }
}
