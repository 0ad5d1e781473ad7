//! WebSocket connection lifecycle.
//!
//! Each accepted socket is split into a writer task that drains the
//! session's outbound queue into the sink, and a reader loop that decodes
//! text frames into [`ClientEvent`]s for the router. Every exit path --
//! client close, receive error, stream end -- funnels into the same session
//! cleanup.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use causerie_shared::{ClientEvent, ServerEvent};

use crate::state::AppState;

/// GET /ws -- upgrade and hand the socket to the connection actor.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();

    let id = state.router.connect(tx).await;
    info!(connection = %id, "client connected");

    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => state.router.handle(id, event).await,
                    Err(e) => {
                        // Malformed payload: drop the event, keep the
                        // connection.
                        debug!(connection = %id, error = %e, "dropping malformed payload");
                    }
                }
            }
            Some(Ok(Message::Close(frame))) => {
                info!(connection = %id, reason = ?frame, "client initiated close");
                break;
            }
            Some(Ok(_)) => {
                // Binary frames are not part of the protocol; ping/pong is
                // answered by the websocket layer itself.
            }
            Some(Err(e)) => {
                warn!(connection = %id, error = %e, "websocket receive error");
                break;
            }
            None => {
                info!(connection = %id, "websocket stream ended");
                break;
            }
        }
    }

    writer_handle.abort();
    state.router.disconnect(id).await;
    info!(connection = %id, "client disconnected");
}

/// Forward queued outbound events to the socket as JSON text frames.
async fn writer_task(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode outbound event");
                continue;
            }
        };
        if ws_sender.send(Message::Text(text)).await.is_err() {
            // Connection is broken; the reader loop handles cleanup.
            break;
        }
    }
}
