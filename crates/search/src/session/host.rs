use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use uuid::Uuid;

use super::{SearchSession, SessionStatus};
use crate::engine::{SearchEngine, SearchOutcome, SearchRequest};
use crate::error::{Result, SearchError};
use crate::protocol::{ClientMessage, ServerMessage};

struct SessionState {
    session: SearchSession,
    run_id: Uuid,
    cancel: CancellationToken,
}

/// 搜索会话宿主。
///
/// 每个搜索 id 对应一个会话，各自持有取消令牌；启动新搜索前会取消所有活跃会话。
#[derive(Clone)]
pub struct SearchHost {
    engine: Arc<SearchEngine>,
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
    out: mpsc::Sender<ServerMessage>,
    tasks: TaskTracker,
}

impl SearchHost {
    pub fn new(engine: Arc<SearchEngine>, out: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            engine,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            out,
            tasks: TaskTracker::new(),
        }
    }

    /// 在独立任务上运行宿主，返回收发两端。
    pub fn spawn(engine: Arc<SearchEngine>) -> SearchHandle {
        let capacity = engine.config().channel_capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let host = Self::new(engine, event_tx);
        let task = tokio::spawn(host.clone().serve(command_rx));
        SearchHandle {
            commands: command_tx,
            events: event_rx,
            host,
            task,
        }
    }

    /// 处理入站消息直到通道关闭，随后取消并等待所有会话。
    pub async fn serve(self, mut inbound: mpsc::Receiver<ClientMessage>) {
        while let Some(msg) = inbound.recv().await {
            self.handle(msg).await;
        }
        debug!("search host inbound channel closed");
        self.shutdown().await;
    }

    pub async fn handle(&self, msg: ClientMessage) {
        match msg {
            ClientMessage::Search {
                id,
                root,
                query,
                options,
            } => {
                self.start_search(SearchRequest {
                    id,
                    root,
                    query,
                    options,
                })
                .await;
            }
            ClientMessage::Cancel { id } => {
                let cancelled = self.cancel(id.as_deref()).await;
                if cancelled == 0 {
                    debug!(id = ?id, "cancel matched no active search");
                }
            }
        }
    }

    /// 启动搜索。已有的活跃会话先被取消，以 `done{cancelled}` 结束。
    #[tracing::instrument(skip(self, request), fields(id = %request.id))]
    pub async fn start_search(&self, request: SearchRequest) -> SearchSession {
        let superseded = self.cancel(None).await;
        if superseded > 0 {
            info!(superseded, "cancelled active searches");
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let session = SearchSession {
            id: request.id.clone(),
            query: request.query.clone(),
            root: request.root.path.clone(),
            status: SessionStatus::Searching,
            limited: false,
            started_at: Utc::now(),
            finished_at: None,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, state| state.session.status.is_active());
        sessions.insert(
            session.id.clone(),
            SessionState {
                session: session.clone(),
                run_id,
                cancel: cancel.clone(),
            },
        );
        drop(sessions);

        let host = self.clone();
        self.tasks.spawn(async move {
            let id = request.id.clone();
            let outcome = host
                .engine
                .run(request, cancel, host.out.clone())
                .await;
            host.finish(&id, run_id, outcome).await;
        });

        session
    }

    /// 取消指定会话，`None` 取消全部。返回被取消的活跃会话数。
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: Option<&str>) -> usize {
        let sessions = self.sessions.read().await;
        let mut cancelled = 0;
        for state in sessions.values() {
            if id.is_some_and(|id| id != state.session.id) {
                continue;
            }
            if state.session.status.is_active() && !state.cancel.is_cancelled() {
                state.cancel.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    pub async fn list_sessions(&self) -> Vec<SearchSession> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .map(|state| state.session.clone())
            .collect()
    }

    pub async fn get_session(&self, id: &str) -> Option<SearchSession> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|state| state.session.clone())
    }

    /// 取消所有会话并等待它们发出终止消息。
    pub async fn shutdown(&self) {
        self.cancel(None).await;
        self.tasks.close();
        self.tasks.wait().await;
    }

    async fn finish(&self, id: &str, run_id: Uuid, outcome: SearchOutcome) {
        let mut sessions = self.sessions.write().await;
        let Some(state) = sessions.get_mut(id) else {
            return;
        };
        if state.run_id != run_id {
            return;
        }
        state.session.status = outcome.into();
        state.session.limited = matches!(outcome, SearchOutcome::Completed { limited: true });
        state.session.finished_at = Some(Utc::now());
        debug!(id, status = ?state.session.status, "search session finished");
    }
}

/// [`SearchHost::spawn`] 返回的句柄。
pub struct SearchHandle {
    commands: mpsc::Sender<ClientMessage>,
    events: mpsc::Receiver<ServerMessage>,
    host: SearchHost,
    task: JoinHandle<()>,
}

impl SearchHandle {
    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        self.commands
            .send(msg)
            .await
            .map_err(|_| SearchError::HostClosed)
    }

    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.events.recv().await
    }

    pub fn host(&self) -> &SearchHost {
        &self.host
    }

    /// 拆成入站发送端、出站接收端与宿主任务。
    ///
    /// 出站接收端在宿主任务结束且全部会话退出后关闭。
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Sender<ClientMessage>,
        mpsc::Receiver<ServerMessage>,
        JoinHandle<()>,
    ) {
        (self.commands, self.events, self.task)
    }
}
