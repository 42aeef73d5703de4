use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Backend, HandleId, SandboxScope, file_name, join_path, normalize_path};

/// 条目类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

/// 后端能力引用。
///
/// 每个变体只携带对应后端有效的字段，只有匹配的适配器才能解释它。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CapabilityRef {
    /// 浏览器句柄。
    Handle { handle: HandleId },
    /// 宿主路径，`Entry::path` 即可定位。
    Path,
    /// 沙箱作用域内的相对路径。
    #[serde(rename_all = "camelCase")]
    Scoped {
        scope: SandboxScope,
        relative_path: String,
    },
}

impl CapabilityRef {
    /// 能解释此引用的后端。
    pub fn backend(&self) -> Backend {
        match self {
            CapabilityRef::Handle { .. } => Backend::Browser,
            CapabilityRef::Path => Backend::Host,
            CapabilityRef::Scoped { .. } => Backend::Sandbox,
        }
    }
}

/// 文件或目录的规范描述。
///
/// `path` 始终为正斜杠、无末尾斜杠；`name` 等于路径最后一段
/// （仅由后端能力给出的根目录可以为空）。条目是一次性值对象，不做缓存。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    pub capability: CapabilityRef,
}

impl Entry {
    pub fn new(kind: EntryKind, path: &str, capability: CapabilityRef) -> Self {
        let path = normalize_path(path);
        Self {
            kind,
            name: file_name(&path),
            path,
            capability,
        }
    }

    /// 在父目录下构造子条目，路径为 `parent.path/name`。
    pub fn child_of(parent: &Entry, kind: EntryKind, name: &str, capability: CapabilityRef) -> Self {
        Self {
            kind,
            name: name.to_string(),
            path: join_path(&parent.path, name),
            capability,
        }
    }

    /// 仅有能力引用、没有名称的根目录（如沙箱作用域根）。
    pub fn capability_root(capability: CapabilityRef) -> Self {
        Self {
            kind: EntryKind::Directory,
            name: String::new(),
            path: String::new(),
            capability,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn backend(&self) -> Backend {
        self.capability.backend()
    }
}

/// `buildTree` 的节点：条目本身加上可选的子节点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
}

impl TreeEntry {
    pub fn leaf(entry: Entry) -> Self {
        Self {
            entry,
            children: None,
        }
    }
}

/// 单次 `stat` 的结果，从不缓存。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// 修改时间（Unix 毫秒时间戳）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
}

impl Stat {
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: None,
            modified: None,
        }
    }
}

/// 目录优先，然后按名称排序（忽略大小写，原名作为次序兜底）。
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}
