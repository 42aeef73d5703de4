//! 目录遍历与匹配。
//!
//! 以显式栈做深度优先遍历，每个条目与每次读取前检查取消令牌。

use std::sync::Arc;
use std::time::Instant;

use anhl_core::Entry;
use anhl_filesystem::FilesystemFacade;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::glob::PathRules;
use crate::matcher::Matcher;
use crate::protocol::{SearchMatch, SearchOptions, ServerMessage};
use crate::text::{PreviewWindow, is_binary_path, looks_like_binary};

/// 一次搜索请求。
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub id: String,
    pub root: Entry,
    pub query: String,
    pub options: SearchOptions,
}

/// 会话结束方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed { limited: bool },
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    Limited,
}

struct Frame {
    entries: std::vec::IntoIter<Entry>,
    relative: String,
}

#[derive(Debug, Default)]
struct Counters {
    scanned: u64,
    matched: u64,
    hits: usize,
}

enum FileScan {
    Skipped,
    Cancelled,
    Found(Vec<SearchMatch>),
}

/// 无状态的搜索执行器，可被多个会话共享。
pub struct SearchEngine {
    fs: FilesystemFacade,
    config: Arc<SearchConfig>,
}

impl SearchEngine {
    pub fn new(fs: FilesystemFacade, config: Arc<SearchConfig>) -> Self {
        Self { fs, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 执行一次搜索，所有结果经 `out` 发出，并且总以一条 `done` 或 `error` 结束。
    ///
    /// `out` 关闭时按取消处理。
    #[tracing::instrument(skip_all, fields(id = %request.id, root = %request.root.path))]
    pub async fn run(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
        out: mpsc::Sender<ServerMessage>,
    ) -> SearchOutcome {
        let started = Instant::now();
        let SearchRequest {
            id,
            root,
            query,
            options,
        } = request;

        let prepared = Matcher::new(&query, &options).and_then(|matcher| {
            PathRules::new(&options.include, &options.exclude, &self.config.extra_excludes)
                .map(|rules| (matcher, rules))
        });
        let (matcher, rules) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(error = %err, "rejecting search request");
                let _ = out
                    .send(ServerMessage::Error {
                        id,
                        message: err.to_string(),
                    })
                    .await;
                return SearchOutcome::Failed;
            }
        };

        let max_results = options.max_results.unwrap_or(self.config.max_results);
        let max_per_file = options.max_per_file.unwrap_or(self.config.max_per_file);
        info!(pattern = matcher.as_str(), max_results, max_per_file, "search started");

        let children = match self.fs.list(&root).await {
            Ok(children) => children,
            Err(err) => {
                warn!(error = %err, "failed to list search root");
                let _ = out
                    .send(ServerMessage::Error {
                        id,
                        message: err.to_string(),
                    })
                    .await;
                return SearchOutcome::Failed;
            }
        };

        let mut stack = vec![Frame {
            entries: children.into_iter(),
            relative: String::new(),
        }];
        let mut counters = Counters::default();
        let mut stop = None;

        while let Some(frame) = stack.last_mut() {
            if cancel.is_cancelled() {
                stop = Some(StopReason::Cancelled);
                break;
            }
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let relative = if frame.relative.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", frame.relative, entry.name)
            };

            if entry.is_dir() {
                if rules.prunes_dir(&relative) {
                    debug!(path = %relative, "skipping excluded directory");
                    continue;
                }
                match self.fs.list(&entry).await {
                    Ok(children) => stack.push(Frame {
                        entries: children.into_iter(),
                        relative,
                    }),
                    Err(err) => warn!(path = %relative, error = %err, "skipping unreadable directory"),
                }
                continue;
            }

            if counters.hits >= max_results {
                stop = Some(StopReason::Limited);
                break;
            }
            counters.scanned += 1;

            let budget = max_per_file.min(max_results - counters.hits);
            let scan = self
                .scan_file(&entry, &relative, &rules, &matcher, budget, &cancel)
                .await;
            match scan {
                FileScan::Cancelled => {
                    stop = Some(StopReason::Cancelled);
                    break;
                }
                FileScan::Skipped => {}
                FileScan::Found(matches) => {
                    counters.matched += 1;
                    counters.hits += matches.len();
                    let message = ServerMessage::FileResult {
                        id: id.clone(),
                        entry,
                        relative_path: relative,
                        matches,
                    };
                    if out.send(message).await.is_err() {
                        stop = Some(StopReason::Cancelled);
                        break;
                    }
                }
            }

            if self.config.progress_interval > 0
                && counters.scanned % self.config.progress_interval == 0
            {
                let message = ServerMessage::Progress {
                    id: id.clone(),
                    scanned: counters.scanned,
                    elapsed: millis_since(started),
                };
                if out.send(message).await.is_err() {
                    stop = Some(StopReason::Cancelled);
                    break;
                }
            }

            if counters.hits >= max_results {
                stop = Some(StopReason::Limited);
                break;
            }
        }

        let cancelled = stop == Some(StopReason::Cancelled);
        let limited = stop == Some(StopReason::Limited);
        let duration = millis_since(started);
        info!(
            scanned = counters.scanned,
            matched = counters.matched,
            hits = counters.hits,
            duration_ms = duration,
            cancelled,
            limited,
            "search finished"
        );

        let _ = out
            .send(ServerMessage::Done {
                id,
                scanned: counters.scanned,
                matched: counters.matched,
                duration,
                cancelled,
                limited,
            })
            .await;

        if cancelled {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Completed { limited }
        }
    }

    async fn scan_file(
        &self,
        entry: &Entry,
        relative: &str,
        rules: &PathRules,
        matcher: &Matcher,
        budget: usize,
        cancel: &CancellationToken,
    ) -> FileScan {
        if !rules.accepts_file(relative) || is_binary_path(relative) {
            return FileScan::Skipped;
        }
        if cancel.is_cancelled() {
            return FileScan::Cancelled;
        }

        let bytes = match self.fs.get_blob(entry).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %relative, error = %err, "skipping unreadable file");
                return FileScan::Skipped;
            }
        };
        let sample = &bytes[..bytes.len().min(self.config.binary_sample_bytes)];
        if looks_like_binary(sample, self.config.control_ratio) {
            debug!(path = %relative, "skipping binary content");
            return FileScan::Skipped;
        }

        let text = String::from_utf8_lossy(&bytes);
        let window = PreviewWindow {
            width: self.config.preview_width,
            min_context: self.config.preview_context,
        };
        let matches = matcher.find_matches(&text, budget, window);
        if matches.is_empty() {
            FileScan::Skipped
        } else {
            FileScan::Found(matches)
        }
    }
}

fn millis_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
