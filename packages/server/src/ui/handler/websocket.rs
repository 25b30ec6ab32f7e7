//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionContext, RoomEvent, ServerEvent},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::{Credentials, SendMessageError},
};

/// Header carrying the room of the handshake auth payload
pub const AUTH_ROOM_HEADER: &str = "x-auth-room";
/// Header carrying the token of the handshake auth payload
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub room: Option<String>,
    pub token: Option<String>,
}

impl From<HandshakeQuery> for Credentials {
    fn from(query: HandshakeQuery) -> Self {
        Credentials::new(query.room, query.token)
    }
}

fn credentials_from_headers(headers: &HeaderMap) -> Credentials {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Credentials::new(header(AUTH_ROOM_HEADER), header(AUTH_TOKEN_HEADER))
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HandshakeQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // 認証ペイロード（ヘッダー）を優先し、欠けている値はクエリ文字列で補う
    let credentials = credentials_from_headers(&headers).or(query.into());

    match state.authenticate_usecase.execute(credentials).await {
        Ok(context) => {
            tracing::info!(
                "Connection '{}' admitted ({})",
                context.connection_id,
                context
                    .decoded_room()
                    .map(|room| format!("room '{}'", room))
                    .unwrap_or_else(|| "privileged".to_string())
            );
            Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, context)))
        }
        Err(e) => {
            tracing::warn!("Rejecting WebSocket handshake: {}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames addressed to this connection
/// * `sender` - WebSocket sink to send frames to this connection
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, context: ConnectionContext) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive frames
    let (tx, rx) = mpsc::unbounded_channel();
    state.connect_participant_usecase.execute(&context, tx).await;

    let state_clone = state.clone();
    let context_clone = context.clone();

    // Spawn a task to receive frames from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch(&state_clone, &context_clone, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        context_clone.connection_id
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push frames addressed to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_participant_usecase.execute(&context.connection_id).await;
}

/// Route one inbound frame to its use case.
async fn dispatch(state: &AppState, context: &ConnectionContext, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Malformed frame from '{}': {}", context.connection_id, e);
            let error = ServerEvent::MessageError {
                message: format!("Malformed event: {}", e),
            };
            if let Err(e) = state
                .message_pusher
                .push_to(&context.connection_id, &error)
                .await
            {
                tracing::warn!("Failed to report malformed frame: {}", e);
            }
            return;
        }
    };

    match message {
        ClientMessage::ChatOpened => {
            state.join_room_usecase.execute(context).await;
        }
        ClientMessage::LeaveRoom => {
            state.leave_room_usecase.execute(context).await;
        }
        ClientMessage::RandomMatch => {
            match state.random_match_usecase.execute(context).await {
                Ok(outcome) => tracing::debug!(
                    "randomMatch from '{}': {:?}",
                    context.connection_id,
                    outcome
                ),
                Err(e) => tracing::warn!(
                    "randomMatch from '{}' failed: {}",
                    context.connection_id,
                    e
                ),
            }
        }
        ClientMessage::CancelMatch => {
            state.random_match_usecase.cancel(context).await;
        }
        other => match RoomEvent::try_from(other) {
            Ok(event) => match state.send_message_usecase.execute(context, event).await {
                Ok(delivered) => tracing::debug!(
                    "Relayed event from '{}' to {} member(s)",
                    context.connection_id,
                    delivered
                ),
                Err(SendMessageError::NoDecodedRoom(id)) => {
                    tracing::debug!("Dropping room event from '{}': no decoded room", id);
                }
                Err(e) => tracing::warn!("{}", e),
            },
            Err(unhandled) => tracing::debug!("Unhandled event: {:?}", unhandled),
        },
    }
}
