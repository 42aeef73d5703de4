//! 搜索 WebSocket。
//!
//! 每个连接拥有独立的搜索会话宿主，消息为 JSON 文本帧。

use std::sync::Arc;

use anhl_search::{ClientMessage, SearchEngine, SearchHost, ServerMessage};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::AppState;

/// Axum WebSocket 升级 handler。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("new search WebSocket connection request");
    let engine = state.search.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, engine))
}

#[tracing::instrument(skip_all, fields(connection = %Uuid::new_v4()))]
async fn handle_socket(socket: WebSocket, engine: Arc<SearchEngine>) {
    let (mut sender, mut receiver) = socket.split();
    let capacity = engine.config().channel_capacity.max(1);
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(capacity);
    let (command_tx, command_rx) = mpsc::channel::<ClientMessage>(capacity);
    info!("search WebSocket connection established");

    let writer_task = tokio::spawn(async move {
        while let Some(server_msg) = out_rx.recv().await {
            match serde_json::to_string(&server_msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    error!(error = %err, "failed to serialize search message");
                    break;
                }
            }
        }
    });

    let host = SearchHost::new(engine, out_tx.clone());
    let host_task = tokio::spawn(host.serve(command_rx));

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if command_tx.send(client_msg).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(error = %err, "rejecting malformed search message");
                    if out_tx
                        .send(ServerMessage::Error {
                            id: String::new(),
                            message: format!("invalid message: {err}"),
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "WebSocket receive error");
                break;
            }
        }
    }

    // 关闭入站后宿主取消全部会话并等待其结束
    drop(command_tx);
    if let Err(err) = host_task.await {
        warn!(error = %err, "search host task exited with join error");
    }
    drop(out_tx);
    if let Err(err) = writer_task.await {
        warn!(error = %err, "WebSocket writer task exited with join error");
    }

    info!("search WebSocket connection closed");
}
