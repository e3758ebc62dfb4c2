use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::rooms::RoomRegistry;
use crate::signal::{Signal, SignalEnvelope};

/// Default number of signals retained per room.
pub const DEFAULT_RETENTION: usize = 10;

const LIVE_CHANNEL_CAPACITY: usize = 32;

/// Per-room signal log plus live fan-out, owned by one incarnation of the room
struct RoomSignals {
    epoch: u64,
    queue: VecDeque<Arc<SignalEnvelope>>,
    last_timestamp: i64,
    live: broadcast::Sender<Arc<SignalEnvelope>>,
}

impl RoomSignals {
    fn new(epoch: u64) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            epoch,
            queue: VecDeque::new(),
            last_timestamp: 0,
            live,
        }
    }
}

/// Best-effort teleprompter / remote-control channel.
///
/// Only the active host of a room may push. Each room keeps the most recent
/// `retention` signals; older ones are dropped whether or not anyone read them.
/// Readers poll with their own timestamp cursor or subscribe for live delivery.
pub struct SignalBus {
    registry: Arc<RoomRegistry>,
    rooms: DashMap<String, RoomSignals>,
    retention: usize,
}

impl SignalBus {
    pub fn new(registry: Arc<RoomRegistry>, retention: usize) -> Self {
        Self {
            registry,
            rooms: DashMap::new(),
            retention: retention.max(1),
        }
    }

    /// Append a signal from `sender_id`. Returns the stamped envelope, or `None`
    /// when the room is not active or the sender is not its host.
    pub fn push(
        &self,
        room_id: &str,
        sender_id: &str,
        target_ids: Vec<String>,
        signal: Signal,
    ) -> Option<Arc<SignalEnvelope>> {
        let Some(epoch) = self.registry.active_host_epoch(room_id, sender_id) else {
            tracing::warn!(
                room_id = %room_id,
                sender_id = %sender_id,
                "Signal refused: sender is not the host of an active room"
            );
            return None;
        };

        let Some(mut room) = self.queue_for(room_id, epoch) else {
            tracing::debug!(room_id = %room_id, "Signal refused: room was re-created");
            return None;
        };

        let timestamp = Utc::now()
            .timestamp_millis()
            .max(room.last_timestamp + 1);
        room.last_timestamp = timestamp;

        let envelope = Arc::new(SignalEnvelope {
            timestamp,
            sender_id: sender_id.to_string(),
            target_ids,
            signal,
        });

        room.queue.push_back(Arc::clone(&envelope));
        while room.queue.len() > self.retention {
            room.queue.pop_front();
        }

        // no live subscribers is fine
        let _ = room.live.send(Arc::clone(&envelope));

        tracing::debug!(
            room_id = %room_id,
            timestamp = timestamp,
            targets = envelope.target_ids.len(),
            "Signal pushed"
        );

        Some(envelope)
    }

    /// Retained signals for `participant_id` newer than `since`, oldest first.
    pub fn poll(
        &self,
        room_id: &str,
        participant_id: &str,
        since: Option<i64>,
    ) -> Vec<SignalEnvelope> {
        let Some(epoch) = self.registry.active_epoch(room_id) else {
            return Vec::new();
        };

        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        if room.epoch != epoch {
            return Vec::new();
        }

        room.queue
            .iter()
            .filter(|env| since.map_or(true, |since| env.timestamp > since))
            .filter(|env| env.is_addressed_to(participant_id))
            .map(|env| env.as_ref().clone())
            .collect()
    }

    /// Live stream of signals addressed to `participant_id`.
    ///
    /// The stream ends when the room's queue is closed. A subscriber that falls
    /// behind skips the signals it missed.
    pub fn subscribe(
        &self,
        room_id: &str,
        participant_id: &str,
    ) -> Option<impl Stream<Item = Arc<SignalEnvelope>> + Send + 'static> {
        let epoch = self.registry.active_epoch(room_id)?;
        let receiver = self.queue_for(room_id, epoch)?.live.subscribe();

        let participant_id = participant_id.to_string();
        let room_id = room_id.to_string();

        Some(
            BroadcastStream::new(receiver).filter_map(move |item| match item {
                Ok(env) if env.is_addressed_to(&participant_id) => Some(env),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        room_id = %room_id,
                        user_id = %participant_id,
                        skipped = skipped,
                        "Live signal subscriber lagged"
                    );
                    None
                }
            }),
        )
    }

    /// Drop the queue of incarnation `epoch` of a room and end its live streams.
    /// A queue owned by a later incarnation is left alone.
    pub fn close_room(&self, room_id: &str, epoch: u64) {
        if self
            .rooms
            .remove_if(room_id, |_, room| room.epoch <= epoch)
            .is_some()
        {
            tracing::debug!(room_id = %room_id, epoch = epoch, "Signal queue closed");
        }
    }

    /// Drop queues whose room incarnation the registry no longer holds.
    /// Returns how many were dropped.
    pub fn purge_missing(&self) -> usize {
        let before = self.rooms.len();
        let registry = &self.registry;
        self.rooms
            .retain(|room_id, room| registry.epoch(room_id) == Some(room.epoch));
        before.saturating_sub(self.rooms.len())
    }

    pub fn queue_count(&self) -> usize {
        self.rooms.len()
    }

    /// Queue of incarnation `epoch`, replacing one left by an earlier incarnation.
    /// `None` when a later incarnation already owns the slot.
    fn queue_for(&self, room_id: &str, epoch: u64) -> Option<RefMut<'_, String, RoomSignals>> {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| RoomSignals::new(epoch));

        if room.epoch < epoch {
            *room = RoomSignals::new(epoch);
        } else if room.epoch > epoch {
            return None;
        }

        Some(room)
    }
}
