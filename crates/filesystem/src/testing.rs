//! 内存版原生桥，供测试与无界面演示使用。
//!
//! 两个桥都会像真实平台一样执行权限检查：未授权时写入返回 `NotAllowed`，
//! 这样适配器是否先协商权限可以被直接观察到。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use anhl_core::{CapabilityRef, Entry, EntryKind, HandleId, SandboxScope};
use async_trait::async_trait;

use crate::bridge::{
    BrowserBridge, NativeError, NativeErrorKind, NativeFileInfo, NativeFileMetadata, NativeHandle,
    NativeResult, NativeStat, SandboxBridge,
};
use crate::permission::{AccessMode, PermissionState};

const MODERN_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const CLOCK_START: i64 = 1_700_000_000_000;

struct BrowserNode {
    name: String,
    kind: EntryKind,
    parent: Option<HandleId>,
    data: Vec<u8>,
    modified: i64,
    children: BTreeMap<String, HandleId>,
}

struct BrowserState {
    nodes: HashMap<HandleId, BrowserNode>,
    permission: PermissionState,
    clock: i64,
}

impl BrowserState {
    fn node(&self, id: HandleId) -> NativeResult<&BrowserNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| NativeError::not_found(format!("handle {id} is stale")))
    }

    fn dir(&self, id: HandleId) -> NativeResult<&BrowserNode> {
        let node = self.node(id)?;
        if node.kind != EntryKind::Directory {
            return Err(NativeError::new(
                NativeErrorKind::TypeMismatch,
                format!("'{}' is not a directory", node.name),
            ));
        }
        Ok(node)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn insert(&mut self, parent: HandleId, name: &str, kind: EntryKind, data: Vec<u8>) -> HandleId {
        let id = HandleId::new();
        let modified = self.tick();
        self.nodes.insert(
            id,
            BrowserNode {
                name: name.to_string(),
                kind,
                parent: Some(parent),
                data,
                modified,
                children: BTreeMap::new(),
            },
        );
        if let Some(dir) = self.nodes.get_mut(&parent) {
            dir.children.insert(name.to_string(), id);
        }
        id
    }

    fn child_handle(
        &mut self,
        dir: HandleId,
        name: &str,
        kind: EntryKind,
        create: bool,
    ) -> NativeResult<HandleId> {
        let existing = self.dir(dir)?.children.get(name).copied();
        match existing {
            Some(id) => {
                if self.node(id)?.kind == kind {
                    Ok(id)
                } else {
                    Err(NativeError::new(
                        NativeErrorKind::TypeMismatch,
                        format!("'{name}' exists with another kind"),
                    ))
                }
            }
            None if create => {
                if self.permission != PermissionState::Granted {
                    return Err(NativeError::new(NativeErrorKind::NotAllowed, "write not allowed"));
                }
                Ok(self.insert(dir, name, kind, Vec::new()))
            }
            None => Err(NativeError::not_found(format!("'{name}' not found"))),
        }
    }

    fn drop_subtree(&mut self, id: HandleId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children.into_values());
            }
        }
    }

    fn resolve(&self, root: HandleId, path: &str) -> Option<HandleId> {
        let mut current = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = *self.nodes.get(&current)?.children.get(segment)?;
        }
        Some(current)
    }
}

/// 内存版浏览器句柄桥。
pub struct MemoryBrowserBridge {
    state: Mutex<BrowserState>,
    root: HandleId,
    root_name: String,
    picker: bool,
    native_move: bool,
    user_agent: String,
    grant_on_request: AtomicBool,
    permission_requests: AtomicUsize,
}

impl MemoryBrowserBridge {
    /// 新建一个已授权、带目录选择器的浏览器环境，根目录名为 `root_name`。
    pub fn new(root_name: &str) -> Self {
        let root = HandleId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            BrowserNode {
                name: root_name.to_string(),
                kind: EntryKind::Directory,
                parent: None,
                data: Vec::new(),
                modified: CLOCK_START,
                children: BTreeMap::new(),
            },
        );
        Self {
            state: Mutex::new(BrowserState {
                nodes,
                permission: PermissionState::Granted,
                clock: CLOCK_START,
            }),
            root,
            root_name: root_name.to_string(),
            picker: true,
            native_move: false,
            user_agent: MODERN_CHROME.to_string(),
            grant_on_request: AtomicBool::new(true),
            permission_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str, picker: bool) -> Self {
        self.user_agent = user_agent.to_string();
        self.picker = picker;
        self
    }

    /// 启用原生 `handle.move()`。
    pub fn with_native_move(mut self) -> Self {
        self.native_move = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_permission(&self, state: PermissionState) {
        self.lock().permission = state;
    }

    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    /// 选择器返回的根目录对应的条目。
    pub fn root_entry(&self) -> Entry {
        Entry::new(
            EntryKind::Directory,
            &self.root_name,
            CapabilityRef::Handle { handle: self.root },
        )
    }

    /// 按相对根目录的路径写入文件，沿途目录自动创建。
    pub fn seed_file(&self, path: &str, data: &[u8]) -> HandleId {
        let (dir, name) = self.seed_parent(path);
        let mut state = self.lock();
        match state.nodes.get(&dir).and_then(|d| d.children.get(&name)).copied() {
            Some(id) => {
                if let Some(node) = state.nodes.get_mut(&id) {
                    node.data = data.to_vec();
                }
                id
            }
            None => state.insert(dir, &name, EntryKind::File, data.to_vec()),
        }
    }

    pub fn seed_dir(&self, path: &str) -> HandleId {
        let mut current = self.root;
        let mut state = self.lock();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let existing = state
                .nodes
                .get(&current)
                .and_then(|d| d.children.get(segment))
                .copied();
            current = match existing {
                Some(id) => id,
                None => state.insert(current, segment, EntryKind::Directory, Vec::new()),
            };
        }
        current
    }

    fn seed_parent(&self, path: &str) -> (HandleId, String) {
        match path.rsplit_once('/') {
            Some((dir, name)) => (self.seed_dir(dir), name.to_string()),
            None => (self.root, path.to_string()),
        }
    }

    /// 读取相对根目录的文件内容，不存在时为 `None`。
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        let id = state.resolve(self.root, path)?;
        let node = state.nodes.get(&id)?;
        (node.kind == EntryKind::File).then(|| node.data.clone())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().resolve(self.root, path).is_some()
    }
}

#[async_trait]
impl BrowserBridge for MemoryBrowserBridge {
    fn picker_available(&self) -> bool {
        self.picker
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    async fn show_directory_picker(&self) -> NativeResult<NativeHandle> {
        if !self.picker {
            return Err(NativeError::not_supported("showDirectoryPicker is unavailable"));
        }
        Ok(NativeHandle {
            id: self.root,
            name: self.root_name.clone(),
            kind: EntryKind::Directory,
        })
    }

    async fn entries(&self, dir: HandleId) -> NativeResult<Vec<NativeHandle>> {
        let state = self.lock();
        let node = state.dir(dir)?;
        node.children
            .iter()
            .map(|(name, id)| {
                Ok(NativeHandle {
                    id: *id,
                    name: name.clone(),
                    kind: state.node(*id)?.kind,
                })
            })
            .collect()
    }

    async fn file_metadata(&self, file: HandleId) -> NativeResult<NativeFileMetadata> {
        let state = self.lock();
        let node = state.node(file)?;
        Ok(NativeFileMetadata {
            size: node.data.len() as u64,
            last_modified: node.modified,
        })
    }

    async fn read_file(&self, file: HandleId) -> NativeResult<Vec<u8>> {
        let state = self.lock();
        let node = state.node(file)?;
        if node.kind != EntryKind::File {
            return Err(NativeError::new(NativeErrorKind::TypeMismatch, "not a file"));
        }
        Ok(node.data.clone())
    }

    async fn get_file_handle(
        &self,
        dir: HandleId,
        name: &str,
        create: bool,
    ) -> NativeResult<HandleId> {
        self.lock().child_handle(dir, name, EntryKind::File, create)
    }

    async fn get_directory_handle(
        &self,
        dir: HandleId,
        name: &str,
        create: bool,
    ) -> NativeResult<HandleId> {
        self.lock().child_handle(dir, name, EntryKind::Directory, create)
    }

    async fn write_file(&self, file: HandleId, data: &[u8]) -> NativeResult<()> {
        let mut state = self.lock();
        if state.permission != PermissionState::Granted {
            return Err(NativeError::new(NativeErrorKind::NotAllowed, "write not allowed"));
        }
        let modified = state.tick();
        let node = state
            .nodes
            .get_mut(&file)
            .ok_or_else(|| NativeError::not_found("file handle is stale"))?;
        node.data = data.to_vec();
        node.modified = modified;
        Ok(())
    }

    async fn remove_entry(&self, dir: HandleId, name: &str, recursive: bool) -> NativeResult<()> {
        let mut state = self.lock();
        if state.permission != PermissionState::Granted {
            return Err(NativeError::new(NativeErrorKind::NotAllowed, "remove not allowed"));
        }
        let id = state
            .dir(dir)?
            .children
            .get(name)
            .copied()
            .ok_or_else(|| NativeError::not_found(format!("'{name}' not found")))?;
        if !recursive && !state.node(id)?.children.is_empty() {
            return Err(NativeError::other("InvalidModificationError: directory is not empty"));
        }
        if let Some(parent) = state.nodes.get_mut(&dir) {
            parent.children.remove(name);
        }
        state.drop_subtree(id);
        Ok(())
    }

    async fn query_permission(
        &self,
        _handle: HandleId,
        _mode: AccessMode,
    ) -> NativeResult<PermissionState> {
        Ok(self.lock().permission)
    }

    async fn request_permission(
        &self,
        _handle: HandleId,
        _mode: AccessMode,
    ) -> NativeResult<PermissionState> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if self.grant_on_request.load(Ordering::SeqCst) {
            state.permission = PermissionState::Granted;
        } else {
            state.permission = PermissionState::Denied;
        }
        Ok(state.permission)
    }

    async fn move_handle(
        &self,
        handle: HandleId,
        dest_dir: HandleId,
        new_name: &str,
    ) -> NativeResult<()> {
        if !self.native_move {
            return Err(NativeError::not_supported("FileSystemHandle.move is unavailable"));
        }
        let mut state = self.lock();
        state.dir(dest_dir)?;
        let (old_parent, old_name) = {
            let node = state.node(handle)?;
            (node.parent, node.name.clone())
        };
        if let Some(parent) = old_parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent.children.remove(&old_name);
        }
        if let Some(node) = state.nodes.get_mut(&handle) {
            node.name = new_name.to_string();
            node.parent = Some(dest_dir);
        }
        if let Some(dest) = state.nodes.get_mut(&dest_dir) {
            dest.children.insert(new_name.to_string(), handle);
        }
        Ok(())
    }
}

enum SandboxNode {
    Dir,
    File { data: Vec<u8>, mtime: i64 },
}

type ScopedKey = (SandboxScope, String);

struct SandboxState {
    nodes: BTreeMap<ScopedKey, SandboxNode>,
    storage: PermissionState,
    all_files: bool,
    picked_uri: Option<String>,
    clock: i64,
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn key(scope: SandboxScope, path: &str) -> ScopedKey {
    (scope, path.trim_matches('/').to_string())
}

impl SandboxState {
    fn is_dir(&self, scope: SandboxScope, path: &str) -> bool {
        path.is_empty() || matches!(self.nodes.get(&key(scope, path)), Some(SandboxNode::Dir))
    }

    fn exists(&self, scope: SandboxScope, path: &str) -> bool {
        path.is_empty() || self.nodes.contains_key(&key(scope, path))
    }

    fn create_parents(&mut self, scope: SandboxScope, path: &str) {
        let mut current = String::new();
        for segment in parent_of(path).split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            self.nodes
                .entry(key(scope, &current))
                .or_insert(SandboxNode::Dir);
        }
    }

    fn check_write(&self, scope: SandboxScope) -> NativeResult<()> {
        if scope.is_shared_storage() && !self.all_files {
            return Err(NativeError::new(
                NativeErrorKind::NotAllowed,
                "all files access is required for shared storage",
            ));
        }
        Ok(())
    }

    fn subtree_keys(&self, scope: SandboxScope, path: &str) -> Vec<ScopedKey> {
        let prefix = format!("{path}/");
        self.nodes
            .keys()
            .filter(|(s, p)| *s == scope && (p == path || p.starts_with(&prefix)))
            .cloned()
            .collect()
    }
}

/// 内存版移动端文件插件。
pub struct MemorySandboxBridge {
    state: Mutex<SandboxState>,
    kind_hints: bool,
    grant_storage_on_request: AtomicBool,
    grant_all_files_on_request: AtomicBool,
    native_copies: AtomicUsize,
    native_renames: AtomicUsize,
    all_files_requests: AtomicUsize,
    storage_requests: AtomicUsize,
}

impl Default for MemorySandboxBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySandboxBridge {
    /// 存储权限与所有文件访问均已授予。
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SandboxState {
                nodes: BTreeMap::new(),
                storage: PermissionState::Granted,
                all_files: true,
                picked_uri: None,
                clock: CLOCK_START,
            }),
            kind_hints: true,
            grant_storage_on_request: AtomicBool::new(true),
            grant_all_files_on_request: AtomicBool::new(false),
            native_copies: AtomicUsize::new(0),
            native_renames: AtomicUsize::new(0),
            all_files_requests: AtomicUsize::new(0),
            storage_requests: AtomicUsize::new(0),
        }
    }

    /// `readdir` 不返回条目类型，迫使适配器逐个 `stat`。
    pub fn without_kind_hints(mut self) -> Self {
        self.kind_hints = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_all_files_access(&self, granted: bool) {
        self.lock().all_files = granted;
    }

    pub fn set_grant_all_files_on_request(&self, grant: bool) {
        self.grant_all_files_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn set_storage_permission(&self, state: PermissionState) {
        self.lock().storage = state;
    }

    pub fn set_grant_storage_on_request(&self, grant: bool) {
        self.grant_storage_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn set_picked_uri(&self, uri: Option<&str>) {
        self.lock().picked_uri = uri.map(str::to_string);
    }

    pub fn native_copies(&self) -> usize {
        self.native_copies.load(Ordering::SeqCst)
    }

    pub fn native_renames(&self) -> usize {
        self.native_renames.load(Ordering::SeqCst)
    }

    pub fn all_files_requests(&self) -> usize {
        self.all_files_requests.load(Ordering::SeqCst)
    }

    pub fn storage_requests(&self) -> usize {
        self.storage_requests.load(Ordering::SeqCst)
    }

    /// 直接写入文件（绕过权限），沿途目录自动创建。
    pub fn seed_file(&self, scope: SandboxScope, path: &str, data: &[u8]) {
        let mut state = self.lock();
        state.create_parents(scope, path);
        let mtime = state.clock;
        state.nodes.insert(
            key(scope, path),
            SandboxNode::File {
                data: data.to_vec(),
                mtime,
            },
        );
    }

    pub fn seed_dir(&self, scope: SandboxScope, path: &str) {
        let mut state = self.lock();
        state.create_parents(scope, path);
        state.nodes.insert(key(scope, path), SandboxNode::Dir);
    }

    pub fn read(&self, scope: SandboxScope, path: &str) -> Option<Vec<u8>> {
        match self.lock().nodes.get(&key(scope, path)) {
            Some(SandboxNode::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, scope: SandboxScope, path: &str) -> bool {
        self.lock().exists(scope, path.trim_matches('/'))
    }
}

#[async_trait]
impl SandboxBridge for MemorySandboxBridge {
    async fn readdir(&self, scope: SandboxScope, path: &str) -> NativeResult<Vec<NativeFileInfo>> {
        let state = self.lock();
        let path = path.trim_matches('/');
        if !state.exists(scope, path) {
            return Err(NativeError::not_found(format!("Folder does not exist: {path}")));
        }
        if !state.is_dir(scope, path) {
            return Err(NativeError::new(NativeErrorKind::TypeMismatch, "not a directory"));
        }
        let items = state
            .nodes
            .iter()
            .filter(|((s, p), _)| *s == scope && !p.is_empty() && parent_of(p) == path)
            .map(|((_, p), node)| NativeFileInfo {
                name: p.rsplit('/').next().unwrap_or(p).to_string(),
                kind: self.kind_hints.then_some(match node {
                    SandboxNode::Dir => EntryKind::Directory,
                    SandboxNode::File { .. } => EntryKind::File,
                }),
            })
            .collect();
        Ok(items)
    }

    async fn stat(&self, scope: SandboxScope, path: &str) -> NativeResult<NativeStat> {
        let state = self.lock();
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Ok(NativeStat {
                kind: EntryKind::Directory,
                size: 0,
                mtime: CLOCK_START,
            });
        }
        match state.nodes.get(&key(scope, path)) {
            Some(SandboxNode::Dir) => Ok(NativeStat {
                kind: EntryKind::Directory,
                size: 0,
                mtime: CLOCK_START,
            }),
            Some(SandboxNode::File { data, mtime }) => Ok(NativeStat {
                kind: EntryKind::File,
                size: data.len() as u64,
                mtime: *mtime,
            }),
            None => Err(NativeError::not_found(format!("File does not exist: {path}"))),
        }
    }

    async fn read_file(&self, scope: SandboxScope, path: &str) -> NativeResult<Vec<u8>> {
        match self.lock().nodes.get(&key(scope, path)) {
            Some(SandboxNode::File { data, .. }) => Ok(data.clone()),
            Some(SandboxNode::Dir) => Err(NativeError::new(
                NativeErrorKind::TypeMismatch,
                "cannot read a directory",
            )),
            None => Err(NativeError::not_found(format!("File does not exist: {path}"))),
        }
    }

    async fn write_file(
        &self,
        scope: SandboxScope,
        path: &str,
        data: &[u8],
        recursive: bool,
    ) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(scope)?;
        let path = path.trim_matches('/');
        if state.is_dir(scope, path) {
            return Err(NativeError::new(NativeErrorKind::TypeMismatch, "path is a directory"));
        }
        if !state.is_dir(scope, parent_of(path)) {
            if !recursive {
                return Err(NativeError::not_found("parent directory does not exist"));
            }
            state.create_parents(scope, path);
        }
        state.clock += 1;
        let mtime = state.clock;
        state.nodes.insert(
            key(scope, path),
            SandboxNode::File {
                data: data.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    async fn mkdir(&self, scope: SandboxScope, path: &str, recursive: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(scope)?;
        let path = path.trim_matches('/');
        if state.exists(scope, path) {
            return Err(NativeError::new(
                NativeErrorKind::AlreadyExists,
                "Directory exists",
            ));
        }
        if !state.is_dir(scope, parent_of(path)) {
            if !recursive {
                return Err(NativeError::not_found("parent directory does not exist"));
            }
            state.create_parents(scope, path);
        }
        state.nodes.insert(key(scope, path), SandboxNode::Dir);
        Ok(())
    }

    async fn rmdir(&self, scope: SandboxScope, path: &str, recursive: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(scope)?;
        let path = path.trim_matches('/');
        if !matches!(state.nodes.get(&key(scope, path)), Some(SandboxNode::Dir)) {
            return Err(NativeError::not_found(format!("Folder does not exist: {path}")));
        }
        let keys = state.subtree_keys(scope, path);
        if !recursive && keys.len() > 1 {
            return Err(NativeError::other("Folder is not empty"));
        }
        for key in keys {
            state.nodes.remove(&key);
        }
        Ok(())
    }

    async fn delete_file(&self, scope: SandboxScope, path: &str) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(scope)?;
        match state.nodes.get(&key(scope, path)) {
            Some(SandboxNode::File { .. }) => {
                state.nodes.remove(&key(scope, path));
                Ok(())
            }
            Some(SandboxNode::Dir) => Err(NativeError::new(
                NativeErrorKind::TypeMismatch,
                "cannot delete a directory as a file",
            )),
            None => Err(NativeError::not_found(format!("File does not exist: {path}"))),
        }
    }

    async fn copy(
        &self,
        from_scope: SandboxScope,
        from: &str,
        to_scope: SandboxScope,
        to: &str,
    ) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(to_scope)?;
        let data = match state.nodes.get(&key(from_scope, from)) {
            Some(SandboxNode::File { data, .. }) => data.clone(),
            Some(SandboxNode::Dir) => {
                return Err(NativeError::not_supported("directory copy is not implemented"));
            }
            None => return Err(NativeError::not_found(format!("File does not exist: {from}"))),
        };
        state.create_parents(to_scope, to);
        state.clock += 1;
        let mtime = state.clock;
        state
            .nodes
            .insert(key(to_scope, to), SandboxNode::File { data, mtime });
        self.native_copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rename(
        &self,
        from_scope: SandboxScope,
        from: &str,
        to_scope: SandboxScope,
        to: &str,
    ) -> NativeResult<()> {
        let mut state = self.lock();
        state.check_write(to_scope)?;
        let from = from.trim_matches('/');
        let to = to.trim_matches('/');
        let keys = state.subtree_keys(from_scope, from);
        if keys.is_empty() {
            return Err(NativeError::not_found(format!("File does not exist: {from}")));
        }
        state.create_parents(to_scope, to);
        for old in keys {
            if let Some(node) = state.nodes.remove(&old) {
                let suffix = &old.1[from.len()..];
                state.nodes.insert(key(to_scope, &format!("{to}{suffix}")), node);
            }
        }
        self.native_renames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn check_storage_permission(&self) -> NativeResult<PermissionState> {
        Ok(self.lock().storage)
    }

    async fn request_storage_permission(&self) -> NativeResult<PermissionState> {
        self.storage_requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if self.grant_storage_on_request.load(Ordering::SeqCst) {
            state.storage = PermissionState::Granted;
        }
        Ok(state.storage)
    }

    async fn check_all_files_access(&self) -> NativeResult<bool> {
        Ok(self.lock().all_files)
    }

    async fn request_all_files_access(&self) -> NativeResult<()> {
        self.all_files_requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_all_files_on_request.load(Ordering::SeqCst) {
            self.lock().all_files = true;
        }
        Ok(())
    }

    async fn pick_directory_uri(&self) -> NativeResult<Option<String>> {
        Ok(self.lock().picked_uri.clone())
    }
}
