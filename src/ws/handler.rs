//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::host::SessionCommand;
use crate::game::settings::{Difficulty, TurretType};
use crate::game::SessionHost;
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    pub difficulty: Option<String>,
    pub turret: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    // Unknown or missing selections fall back to the defaults
    let difficulty = query
        .difficulty
        .as_deref()
        .map(Difficulty::from_key)
        .unwrap_or_default();
    let turret_type = query
        .turret
        .as_deref()
        .map(TurretType::from_key)
        .unwrap_or_default();

    ws.on_upgrade(move |socket| handle_socket(socket, difficulty, turret_type, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    difficulty: Difficulty,
    turret_type: TurretType,
    state: AppState,
) {
    let session_id = Uuid::new_v4();
    info!(
        session_id = %session_id,
        difficulty = difficulty.as_str(),
        turret = turret_type.as_str(),
        "New WebSocket connection"
    );

    let (mut ws_sink, ws_stream) = socket.split();

    // Send welcome message
    let welcome = ServerMsg::Welcome {
        session_id,
        difficulty,
        turret: turret_type,
        server_time: unix_millis(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
        return;
    }

    let seed: u64 = rand::thread_rng().gen();
    let (host, handle) = SessionHost::new(
        session_id,
        difficulty,
        turret_type,
        seed,
        state.leaderboard_client.clone(),
    );
    let snapshot_rx = handle.snapshot_tx.subscribe();
    let input_tx = handle.input_tx.clone();
    state.sessions.insert(handle);

    let host_task = tokio::spawn(host.run());

    // Run the session with split read/write
    run_session(session_id, ws_sink, ws_stream, input_tx, snapshot_rx).await;

    // Cleanup on disconnect
    if let Err(e) = host_task.await {
        error!(session_id = %session_id, error = %e, "Session task failed");
    }
    if let Some(handle) = state.sessions.remove(&session_id) {
        info!(
            session_id = %session_id,
            difficulty = handle.difficulty.as_str(),
            turret = handle.turret_type.as_str(),
            duration_ms = unix_millis().saturating_sub(handle.started_at),
            "WebSocket connection closed"
        );
    }
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    input_tx: mpsc::Sender<SessionCommand>,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = SessionRateLimiter::new();

    // Spawn writer task: session messages -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        session_id = %session_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %session_id, "Session channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> session loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                if !client_msg.bypasses_rate_limit() && !rate_limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }

                let command = SessionCommand::Client {
                    msg: client_msg,
                    received_at: unix_millis(),
                };
                if input_tx.send(command).await.is_err() {
                    debug!(session_id = %session_id, "Input channel closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to session loop
    let _ = input_tx.send(SessionCommand::Disconnect).await;

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
