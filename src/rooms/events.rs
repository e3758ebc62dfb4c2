//! Session-end fan-out.
//!
//! Durable interview records live outside this service; they learn that a room
//! ended from the `session ended` log line emitted here. The same event closes
//! the room's signal queue so live subscribers disconnect.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::rooms::SessionEnded;
use crate::signal::SignalBus;

#[instrument(skip_all, name = "rooms.events")]
pub async fn run_session_end_listener(
    mut events: Receiver<SessionEnded>,
    signals: Arc<SignalBus>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ended) => handle_session_ended(&ended, &signals),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Session end listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            () = cancel_token.cancelled() => break,
        }
    }

    info!("Session end listener stopped");
}

fn handle_session_ended(ended: &SessionEnded, signals: &SignalBus) {
    info!(
        room_id = %ended.room_id,
        host_id = %ended.host_id,
        reason = ?ended.reason,
        duration_seconds = ended.duration_seconds,
        "Session ended"
    );
    signals.close_room(&ended.room_id, ended.epoch);
}
