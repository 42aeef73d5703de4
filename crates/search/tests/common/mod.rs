#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anhl_core::Entry;
use anhl_filesystem::testing::MemoryBrowserBridge;
use anhl_filesystem::{BrowserAdapter, FilesystemFacade, HostAdapter};
use anhl_search::{
    ClientMessage, SearchConfig, SearchEngine, SearchHandle, SearchHost, SearchMatch,
    SearchOptions, ServerMessage,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn browser_fs(bridge: &Arc<MemoryBrowserBridge>) -> FilesystemFacade {
    FilesystemFacade::with_adapter(Arc::new(BrowserAdapter::new(bridge.clone())))
}

pub fn host_fs() -> FilesystemFacade {
    FilesystemFacade::with_adapter(Arc::new(HostAdapter::new()))
}

pub fn spawn_host(fs: FilesystemFacade, config: SearchConfig) -> SearchHandle {
    SearchHost::spawn(Arc::new(SearchEngine::new(fs, Arc::new(config))))
}

pub fn search(id: &str, root: &Entry, query: &str, options: SearchOptions) -> ClientMessage {
    ClientMessage::Search {
        id: id.to_string(),
        root: root.clone(),
        query: query.to_string(),
        options,
    }
}

pub async fn next_message(handle: &mut SearchHandle) -> ServerMessage {
    tokio::time::timeout(RECV_TIMEOUT, handle.recv())
        .await
        .expect("search host should answer in time")
        .expect("search host channel closed early")
}

/// 收集消息直到 `id` 的终止消息（含）。
pub async fn collect_until_terminal(handle: &mut SearchHandle, id: &str) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    loop {
        let msg = next_message(handle).await;
        let done = msg.id() == id && msg.is_terminal();
        messages.push(msg);
        if done {
            return messages;
        }
    }
}

pub fn file_results(messages: &[ServerMessage]) -> Vec<(String, Vec<SearchMatch>)> {
    messages
        .iter()
        .filter_map(|msg| match msg {
            ServerMessage::FileResult {
                relative_path,
                matches,
                ..
            } => Some((relative_path.clone(), matches.clone())),
            _ => None,
        })
        .collect()
}

/// 终止 `done` 消息的 `(scanned, matched, cancelled, limited)`。
pub fn done_summary(messages: &[ServerMessage]) -> (u64, u64, bool, bool) {
    match messages.last() {
        Some(ServerMessage::Done {
            scanned,
            matched,
            cancelled,
            limited,
            ..
        }) => (*scanned, *matched, *cancelled, *limited),
        other => panic!("expected Done, got: {other:?}"),
    }
}
