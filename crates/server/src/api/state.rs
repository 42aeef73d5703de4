//! 统一的应用状态。

use std::sync::Arc;

use anhl_filesystem::FilesystemFacade;
use anhl_search::{SearchConfig, SearchEngine};

/// 统一的应用状态，包含所有服务共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 启动时选定后端的文件系统门面。
    pub fs: FilesystemFacade,
    /// 搜索执行器，每个 WebSocket 连接各自持有会话宿主。
    pub search: Arc<SearchEngine>,
}

impl AppState {
    pub fn new(fs: FilesystemFacade, search_config: SearchConfig) -> Self {
        let search = Arc::new(SearchEngine::new(fs.clone(), Arc::new(search_config)));
        Self { fs, search }
    }
}
