use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::handlers::bearer_token;
use super::state::AppState;
use crate::session::{AttachedSession, ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Fallback for clients that cannot set an Authorization header.
    pub token: Option<String>,
}

/// GET /sessions/:session_id/stream
/// Upgrade to the live session channel
pub async fn session_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(params.token)
        .unwrap_or_default();
    ws.on_upgrade(move |socket| handle_socket(state, session_id, token, socket))
}

/// Bridge one WebSocket to the session: events out, frames in. The
/// channel is authenticated after the upgrade so a rejection can be
/// delivered as an error event before closing.
async fn handle_socket(state: AppState, session_id: String, token: String, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    let attached = match state.manager.attach(&session_id, &token).await {
        Ok(attached) => attached,
        Err(e) => {
            warn!("[{}] Channel rejected: {}", session_id, e);
            if let Ok(body) = serde_json::to_string(&ServerMessage::error(e.to_string())) {
                let _ = sender.send(Message::Text(body)).await;
            }
            let _ = sender.close().await;
            return;
        }
    };
    let AttachedSession {
        session_id,
        generation,
        mut events,
    } = attached;

    // Session events out to the socket. Ends when the session retires
    // this channel or the socket fails.
    let send_id = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let body = match serde_json::to_string(&event) {
                Ok(body) => body,
                Err(e) => {
                    error!("[{}] Failed to encode event: {}", send_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(body)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Client frames in. Ends when the client goes away.
    let recv_state = state.clone();
    let recv_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(body)) => {
                    handle_client_message(&recv_state, &recv_id, &body).await;
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.manager.detach(&session_id, generation).await;
    debug!("[{}] Channel task finished", session_id);
}

/// Decode and dispatch one client frame. Failures are reported as error
/// events on the channel; the channel itself stays open.
async fn handle_client_message(state: &AppState, session_id: &str, body: &str) {
    let message: ClientMessage = match serde_json::from_str(body) {
        Ok(message) => message,
        Err(e) => {
            warn!("[{}] Unrecognized client message: {}", session_id, e);
            send_error(state, session_id, "unrecognized message").await;
            return;
        }
    };

    let outcome = match message {
        ClientMessage::Audio { audio } => state.manager.ingest_audio(session_id, &audio).await,
        ClientMessage::Control { action, data } => {
            state
                .manager
                .set_feature(session_id, action.feature(), data.enabled())
                .await
        }
    };
    if let Err(e) = outcome {
        warn!("[{}] Client message rejected: {}", session_id, e);
        send_error(state, session_id, e.to_string()).await;
    }
}

async fn send_error(state: &AppState, session_id: &str, detail: impl Into<String>) {
    if let Some(session) = state.manager.get_live(session_id).await {
        session.send(ServerMessage::error(detail)).await;
    }
}
