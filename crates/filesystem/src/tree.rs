//! 后端无关的递归算法：目录树构建与逐文件复制。
//!
//! 都用显式栈实现，深层目录不会撑爆调用栈。

use anhl_core::{CapabilityRef, Entry, FsError, FsResult, TreeEntry};
use tracing::{debug, warn};

use crate::adapter::{CopyOptions, PlatformAdapter};

struct Frame {
    dir: Option<Entry>,
    pending: std::vec::IntoIter<Entry>,
    built: Vec<TreeEntry>,
}

impl Frame {
    fn new(dir: Option<Entry>, children: Vec<Entry>) -> Self {
        let built = Vec::with_capacity(children.len());
        Self {
            dir,
            pending: children.into_iter(),
            built,
        }
    }
}

pub async fn build_tree<A>(adapter: &A, dir: &Entry) -> FsResult<Vec<TreeEntry>>
where
    A: PlatformAdapter + ?Sized,
{
    let mut stack = vec![Frame::new(None, adapter.list(dir).await?)];

    while let Some(frame) = stack.last_mut() {
        match frame.pending.next() {
            Some(child) if child.is_dir() => {
                let children = adapter.list(&child).await?;
                stack.push(Frame::new(Some(child), children));
            }
            Some(child) => frame.built.push(TreeEntry::leaf(child)),
            None => {
                let Some(finished) = stack.pop() else { break };
                match (finished.dir, stack.last_mut()) {
                    (Some(entry), Some(parent)) => parent.built.push(TreeEntry {
                        entry,
                        children: Some(finished.built),
                    }),
                    _ => return Ok(finished.built),
                }
            }
        }
    }

    Ok(Vec::new())
}

/// 逐级重建目录、逐个读写文件的通用复制。
///
/// 用于没有原生递归复制的后端，以及跨作用域复制。
pub async fn copy_tree<A>(
    adapter: &A,
    source: &Entry,
    target_dir: &Entry,
    name: &str,
) -> FsResult<Entry>
where
    A: PlatformAdapter + ?Sized,
{
    if !source.is_dir() {
        let data = adapter.get_blob(source).await?;
        return adapter.write_blob(target_dir, name, &data).await;
    }

    ensure_not_nested(source, target_dir)?;

    let root = adapter.mkdir(target_dir, name).await?;
    let mut pending = vec![(source.clone(), root.clone())];
    let mut files = 0usize;

    while let Some((from, to)) = pending.pop() {
        for child in adapter.list(&from).await? {
            if child.is_dir() {
                let created = adapter.mkdir(&to, &child.name).await?;
                pending.push((child, created));
            } else {
                let data = adapter.get_blob(&child).await?;
                adapter.write_blob(&to, &child.name, &data).await?;
                files += 1;
            }
        }
    }

    debug!(source = %source.path, target = %root.path, files, "copied directory tree");
    Ok(root)
}

/// 复制成功后再删除源，删除失败时保留副本并返回错误。
pub async fn move_by_copy<A>(
    adapter: &A,
    entry: &Entry,
    target_dir: &Entry,
    name: &str,
    source_parent: Option<&Entry>,
) -> FsResult<Entry>
where
    A: PlatformAdapter + ?Sized,
{
    let options = CopyOptions {
        new_name: Some(name.to_string()),
    };
    let moved = adapter.copy(entry, target_dir, &options).await?;
    if let Err(err) = adapter.remove(entry, source_parent).await {
        warn!(
            source = %entry.path,
            copy = %moved.path,
            error = %err,
            "move copied the entry but could not remove the source"
        );
        return Err(err);
    }
    Ok(moved)
}

/// 拒绝把目录复制或移动到它自己的子树中。
pub fn ensure_not_nested(source: &Entry, target_dir: &Entry) -> FsResult<()> {
    if !source.is_dir() || !same_location_space(&source.capability, &target_dir.capability) {
        return Ok(());
    }
    let inside = target_dir.path == source.path
        || source.path.is_empty()
        || target_dir.path.starts_with(&format!("{}/", source.path.trim_end_matches('/')));
    if inside {
        return Err(FsError::Io {
            context: format!("copy {} into {}", source.path, target_dir.path),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "cannot copy a directory into its own subtree",
            ),
        });
    }
    Ok(())
}

fn same_location_space(a: &CapabilityRef, b: &CapabilityRef) -> bool {
    match (a, b) {
        (CapabilityRef::Scoped { scope: left, .. }, CapabilityRef::Scoped { scope: right, .. }) => {
            left == right
        }
        (left, right) => left.backend() == right.backend(),
    }
}

#[cfg(test)]
mod tests {
    use anhl_core::{EntryKind, SandboxScope};

    use super::*;

    fn scoped(scope: SandboxScope, kind: EntryKind, path: &str) -> Entry {
        Entry::new(
            kind,
            path,
            CapabilityRef::Scoped {
                scope,
                relative_path: path.to_string(),
            },
        )
    }

    #[test]
    fn nested_target_is_rejected() {
        let source = scoped(SandboxScope::Data, EntryKind::Directory, "notes");
        let target = scoped(SandboxScope::Data, EntryKind::Directory, "notes/archive");
        let err = ensure_not_nested(&source, &target).expect_err("nested copy should fail");
        assert_eq!(err.code(), "IO_ERROR");
        assert!(ensure_not_nested(&source, &source).is_err());
    }

    #[test]
    fn sibling_with_common_prefix_is_allowed() {
        let source = scoped(SandboxScope::Data, EntryKind::Directory, "notes");
        let target = scoped(SandboxScope::Data, EntryKind::Directory, "notes-old");
        assert!(ensure_not_nested(&source, &target).is_ok());
    }

    #[test]
    fn other_scope_is_never_nested() {
        let source = scoped(SandboxScope::Data, EntryKind::Directory, "notes");
        let target = scoped(SandboxScope::Documents, EntryKind::Directory, "notes/inner");
        assert!(ensure_not_nested(&source, &target).is_ok());
    }
}
