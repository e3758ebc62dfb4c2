use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::signal::SignalEnvelope;
use crate::state::AppState;
use crate::ws::ServerFrame;

/// Query parameters for a live signal subscription
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    pub room_id: String,
    pub participant_id: String,
}

/// WebSocket routes
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws/signals", get(ws_upgrade))
}

/// WebSocket upgrade handler
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
) -> Result<Response, AppError> {
    if params.participant_id.trim().is_empty() {
        return Err(AppError::BadRequest("participant_id is required".to_string()));
    }

    let signals = state
        .signals
        .subscribe(&params.room_id, &params.participant_id)
        .ok_or_else(|| AppError::NotFound("Room not found or dismissed".to_string()))?;

    tracing::info!(
        room_id = %params.room_id,
        user_id = %params.participant_id,
        "Signal subscription upgrade request"
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, signals, params)))
}

/// Forward addressed signals until either side goes away
async fn handle_socket(
    socket: WebSocket,
    signals: impl Stream<Item = Arc<SignalEnvelope>> + Send + 'static,
    params: WsQueryParams,
) {
    let conn_id = Uuid::new_v4().to_string();
    let mut signals = Box::pin(signals);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    tracing::info!(
        conn_id = %conn_id,
        room_id = %params.room_id,
        user_id = %params.participant_id,
        "Signal subscriber connected"
    );

    loop {
        tokio::select! {
            next = signals.next() => {
                let frame = match next {
                    Some(envelope) => ServerFrame::Signal(envelope.as_ref().clone()),
                    None => ServerFrame::RoomClosed { room_id: params.room_id.clone() },
                };
                let closing = matches!(frame, ServerFrame::RoomClosed { .. });

                match serde_json::to_string(&frame) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode frame"),
                }

                if closing {
                    break;
                }
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(conn_id = %conn_id, "WebSocket close received");
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                // subscribers only listen; pings are answered by axum
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = ws_sender.close().await;

    tracing::info!(
        conn_id = %conn_id,
        room_id = %params.room_id,
        user_id = %params.participant_id,
        "Signal subscriber disconnected"
    );
}
