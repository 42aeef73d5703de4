#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anhl_core::{Entry, TreeEntry};
use anhl_filesystem::testing::{MemoryBrowserBridge, MemorySandboxBridge};
use anhl_filesystem::{BrowserAdapter, FilesystemFacade, HostAdapter, SandboxAdapter};

pub fn host_facade() -> FilesystemFacade {
    FilesystemFacade::with_adapter(Arc::new(HostAdapter::new()))
}

pub async fn open_dir(facade: &FilesystemFacade, path: &Path) -> Entry {
    facade
        .open_path(&path.to_string_lossy())
        .await
        .expect("open host directory")
}

pub fn browser_facade(bridge: &Arc<MemoryBrowserBridge>) -> FilesystemFacade {
    FilesystemFacade::with_adapter(Arc::new(BrowserAdapter::new(bridge.clone())))
}

pub fn sandbox_facade(bridge: &Arc<MemorySandboxBridge>) -> FilesystemFacade {
    FilesystemFacade::with_adapter(Arc::new(SandboxAdapter::new(bridge.clone())))
}

pub fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// 目录树压平为 `相对路径` 列表（目录以 `/` 结尾），便于比较。
pub fn flatten(tree: &[TreeEntry], prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    for node in tree {
        let path = if prefix.is_empty() {
            node.entry.name.clone()
        } else {
            format!("{prefix}/{}", node.entry.name)
        };
        match &node.children {
            Some(children) => {
                out.push(format!("{path}/"));
                out.extend(flatten(children, &path));
            }
            None => out.push(path),
        }
    }
    out
}
