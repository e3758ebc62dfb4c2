use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::provider::RoomCloser;

/// Default delay between a dismiss and the removal of the registry entry.
pub const DEFAULT_DISMISS_GRACE: Duration = Duration::from_secs(5);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// In-memory state of one room
#[derive(Debug)]
struct RoomEntry {
    host_id: String,
    participants: HashSet<String>,
    dismissed: bool,
    created_at: DateTime<Utc>,
    last_activity: Instant,
    /// Distinguishes incarnations of the same room id
    epoch: u64,
}

impl RoomEntry {
    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        !self.dismissed
            && self.participants.is_empty()
            && now.saturating_duration_since(self.last_activity) >= idle_timeout
    }

    fn ended(&self, room_id: &str, reason: EndReason) -> SessionEnded {
        SessionEnded {
            room_id: room_id.to_string(),
            epoch: self.epoch,
            host_id: self.host_id.clone(),
            reason,
            duration_seconds: (Utc::now() - self.created_at).num_seconds(),
        }
    }
}

/// Result of a status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoomStatus {
    pub exists: bool,
    pub dismissed: bool,
    pub can_join: bool,
}

/// Point-in-time view of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub host_id: String,
    pub participants: Vec<String>,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Dismissed,
    IdleTimeout,
}

/// Emitted once per room when it stops being usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEnded {
    pub room_id: String,
    /// Incarnation of the room that ended; a later `create` gets a higher one
    pub epoch: u64,
    pub host_id: String,
    pub reason: EndReason,
    pub duration_seconds: i64,
}

/// Authoritative registry of live rooms.
///
/// Mutations of one room are serialized by the map's shard lock; rooms with
/// different ids never contend beyond sharing a shard.
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, RoomEntry>>,
    closer: Arc<dyn RoomCloser>,
    events: broadcast::Sender<SessionEnded>,
    next_epoch: AtomicU64,
    dismiss_grace: Duration,
}

impl RoomRegistry {
    pub fn new(closer: Arc<dyn RoomCloser>, dismiss_grace: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            rooms: Arc::new(DashMap::new()),
            closer,
            events,
            next_epoch: AtomicU64::new(1),
            dismiss_grace,
        }
    }

    /// Register `room_id` with `host_id` as its host. Replaces any existing entry.
    pub fn create(&self, room_id: &str, host_id: &str) {
        let entry = RoomEntry {
            host_id: host_id.to_string(),
            participants: HashSet::from([host_id.to_string()]),
            dismissed: false,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            epoch: self.next_epoch.fetch_add(1, Ordering::Relaxed),
        };

        if let Some(previous) = self.rooms.insert(room_id.to_string(), entry) {
            tracing::info!(
                room_id = %room_id,
                previous_host = %previous.host_id,
                was_dismissed = previous.dismissed,
                "Room re-created, previous entry replaced"
            );
        }

        tracing::info!(room_id = %room_id, host_id = %host_id, "Room created");
    }

    /// Add a participant. Refused for unknown or dismissed rooms.
    pub fn join(&self, room_id: &str, participant_id: &str) -> bool {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            tracing::debug!(room_id = %room_id, user_id = %participant_id, "Join refused: room not found");
            return false;
        };

        if room.dismissed {
            tracing::debug!(room_id = %room_id, user_id = %participant_id, "Join refused: room dismissed");
            return false;
        }

        room.participants.insert(participant_id.to_string());
        room.last_activity = Instant::now();

        tracing::debug!(
            room_id = %room_id,
            user_id = %participant_id,
            participants = room.participants.len(),
            "Participant joined"
        );
        true
    }

    pub fn leave(&self, room_id: &str, participant_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.participants.remove(participant_id);
            room.last_activity = Instant::now();

            tracing::debug!(
                room_id = %room_id,
                user_id = %participant_id,
                participants = room.participants.len(),
                "Participant left"
            );
        }
    }

    /// Host-only removal of another participant from an active room.
    pub fn kick(&self, room_id: &str, requester_id: &str, participant_id: &str) -> bool {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return false;
        };

        if room.dismissed || room.host_id != requester_id || participant_id == room.host_id {
            tracing::warn!(
                room_id = %room_id,
                requester_id = %requester_id,
                user_id = %participant_id,
                "Kick refused"
            );
            return false;
        }

        let removed = room.participants.remove(participant_id);
        if removed {
            room.last_activity = Instant::now();
            tracing::info!(room_id = %room_id, user_id = %participant_id, "Participant kicked");
        }
        removed
    }

    /// Dismiss a room on behalf of its host.
    ///
    /// Local state changes immediately. The provider close and the delayed
    /// entry removal run as detached tasks, so this must be called from
    /// within a tokio runtime.
    pub fn dismiss(&self, room_id: &str, requester_id: &str) -> bool {
        let (epoch, ended) = {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                tracing::debug!(room_id = %room_id, "Dismiss refused: room not found");
                return false;
            };

            if room.host_id != requester_id {
                tracing::warn!(
                    room_id = %room_id,
                    requester_id = %requester_id,
                    "Dismiss refused: requester is not the host"
                );
                return false;
            }

            if room.dismissed {
                return true;
            }

            room.dismissed = true;
            room.participants.clear();
            room.last_activity = Instant::now();

            (room.epoch, room.ended(room_id, EndReason::Dismissed))
        };

        tracing::info!(room_id = %room_id, host_id = %requester_id, "Room dismissed");
        let _ = self.events.send(ended);

        self.spawn_provider_close(room_id);
        self.schedule_removal(room_id, epoch);

        true
    }

    pub fn check_status(&self, room_id: &str) -> RoomStatus {
        match self.rooms.get(room_id) {
            Some(room) => RoomStatus {
                exists: true,
                dismissed: room.dismissed,
                can_join: !room.dismissed,
            },
            None => RoomStatus {
                exists: false,
                dismissed: false,
                can_join: false,
            },
        }
    }

    pub fn snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.rooms.get(room_id).map(|room| {
            let mut participants: Vec<String> = room.participants.iter().cloned().collect();
            participants.sort();

            RoomSnapshot {
                room_id: room_id.to_string(),
                host_id: room.host_id.clone(),
                participants,
                dismissed: room.dismissed,
                created_at: room.created_at,
            }
        })
    }

    /// Epoch of `room_id` when `user_id` hosts it and it has not been dismissed.
    pub fn active_host_epoch(&self, room_id: &str, user_id: &str) -> Option<u64> {
        self.rooms
            .get(room_id)
            .filter(|room| !room.dismissed && room.host_id == user_id)
            .map(|room| room.epoch)
    }

    /// Epoch of `room_id` while it has not been dismissed.
    pub fn active_epoch(&self, room_id: &str) -> Option<u64> {
        self.rooms
            .get(room_id)
            .filter(|room| !room.dismissed)
            .map(|room| room.epoch)
    }

    /// Epoch of `room_id`, dismissed or not.
    pub fn epoch(&self, room_id: &str) -> Option<u64> {
        self.rooms.get(room_id).map(|room| room.epoch)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEnded> {
        self.events.subscribe()
    }

    /// Remove rooms that have been empty for at least `idle_timeout` as of `now`.
    ///
    /// Candidates are re-checked under the entry lock at removal time, so a
    /// room that gained a participant after the scan survives.
    pub fn evict_idle(&self, now: Instant, idle_timeout: Duration) -> Vec<String> {
        let candidates: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().is_idle(now, idle_timeout))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::with_capacity(candidates.len());
        for room_id in candidates {
            let removed = self
                .rooms
                .remove_if(&room_id, |_, room| room.is_idle(now, idle_timeout));

            if let Some((room_id, room)) = removed {
                tracing::info!(
                    room_id = %room_id,
                    host_id = %room.host_id,
                    "Idle room evicted"
                );
                let _ = self.events.send(room.ended(&room_id, EndReason::IdleTimeout));
                evicted.push(room_id);
            }
        }

        evicted
    }

    fn spawn_provider_close(&self, room_id: &str) {
        let closer = Arc::clone(&self.closer);
        let room_id = room_id.to_string();

        tokio::spawn(async move {
            if let Err(e) = closer.close_room(&room_id).await {
                tracing::warn!(
                    room_id = %room_id,
                    error = %e,
                    "Provider close failed, local dismiss stands"
                );
            }
        });
    }

    fn schedule_removal(&self, room_id: &str, epoch: u64) {
        let rooms = Arc::clone(&self.rooms);
        let grace = self.dismiss_grace;
        let room_id = room_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if rooms
                .remove_if(&room_id, |_, room| room.epoch == epoch)
                .is_some()
            {
                tracing::debug!(room_id = %room_id, "Dismissed room removed");
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records close requests; optionally fails them.
    #[derive(Default)]
    pub(crate) struct RecordingCloser {
        pub closed: Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl RoomCloser for RecordingCloser {
        async fn close_room(&self, room_id: &str) -> Result<(), ProviderError> {
            self.closed.lock().unwrap().push(room_id.to_string());
            if self.fail {
                return Err(ProviderError::Rejected {
                    code: 1,
                    message: "room not found".to_string(),
                });
            }
            Ok(())
        }
    }

    fn registry_with(closer: Arc<RecordingCloser>) -> RoomRegistry {
        RoomRegistry::new(closer, DEFAULT_DISMISS_GRACE)
    }

    fn registry() -> RoomRegistry {
        registry_with(Arc::new(RecordingCloser::default()))
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_create_auto_joins_host() {
        let registry = registry();
        registry.create("room1", "host");

        assert!(registry.join("room1", "host"));
        let snapshot = registry.snapshot("room1").unwrap();
        assert_eq!(snapshot.participants, vec!["host".to_string()]);
        assert_eq!(
            registry.check_status("room1"),
            RoomStatus {
                exists: true,
                dismissed: false,
                can_join: true
            }
        );
    }

    #[test]
    fn test_join_unknown_room_refused() {
        let registry = registry();
        assert!(!registry.join("missing", "guest"));
        assert_eq!(
            registry.check_status("missing"),
            RoomStatus {
                exists: false,
                dismissed: false,
                can_join: false
            }
        );
    }

    #[test]
    fn test_create_replaces_existing_entry() {
        let registry = registry();
        registry.create("room1", "host");
        registry.join("room1", "guest");

        registry.create("room1", "other-host");
        let snapshot = registry.snapshot("room1").unwrap();
        assert_eq!(snapshot.host_id, "other-host");
        assert_eq!(snapshot.participants, vec!["other-host".to_string()]);
    }

    #[test]
    fn test_leave_keeps_room() {
        let registry = registry();
        registry.create("room1", "host");
        registry.leave("room1", "host");

        assert!(registry.contains("room1"));
        assert!(registry.snapshot("room1").unwrap().participants.is_empty());
        assert!(registry.check_status("room1").can_join);
    }

    #[tokio::test]
    async fn test_non_host_cannot_dismiss() {
        let closer = Arc::new(RecordingCloser::default());
        let registry = registry_with(closer.clone());
        registry.create("room1", "host");
        registry.join("room1", "guest");

        assert!(!registry.dismiss("room1", "guest"));
        assert!(registry.check_status("room1").can_join);
        assert!(registry.join("room1", "late-guest"));

        settle().await;
        assert!(closer.closed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_host_dismiss_blocks_joins() {
        let closer = Arc::new(RecordingCloser::default());
        let registry = registry_with(closer.clone());
        registry.create("room1", "host");
        registry.join("room1", "guest");

        assert!(registry.dismiss("room1", "host"));
        assert_eq!(
            registry.check_status("room1"),
            RoomStatus {
                exists: true,
                dismissed: true,
                can_join: false
            }
        );
        assert!(registry.snapshot("room1").unwrap().participants.is_empty());
        assert!(!registry.join("room1", "guest"));
        assert_eq!(registry.active_host_epoch("room1", "host"), None);
        assert!(registry.epoch("room1").is_some());

        settle().await;
        assert_eq!(*closer.closed.lock().unwrap(), vec!["room1".to_string()]);
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent_for_host() {
        let closer = Arc::new(RecordingCloser::default());
        let registry = registry_with(closer.clone());
        registry.create("room1", "host");

        assert!(registry.dismiss("room1", "host"));
        assert!(registry.dismiss("room1", "host"));

        settle().await;
        assert_eq!(closer.closed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_undo_dismiss() {
        let closer = Arc::new(RecordingCloser {
            fail: true,
            ..Default::default()
        });
        let registry = registry_with(closer.clone());
        registry.create("room1", "host");

        assert!(registry.dismiss("room1", "host"));
        settle().await;

        assert_eq!(closer.closed.lock().unwrap().len(), 1);
        assert!(registry.check_status("room1").dismissed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_room_removed_after_grace() {
        let registry = registry();
        registry.create("room1", "host");
        registry.dismiss("room1", "host");

        tokio::time::advance(Duration::from_secs(4)).await;
        settle().await;
        assert!(registry.check_status("room1").dismissed);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(!registry.check_status("room1").exists);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recreated_room_survives_stale_removal() {
        let registry = registry();
        registry.create("room1", "host");
        registry.dismiss("room1", "host");
        registry.create("room1", "host");

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;

        assert_eq!(
            registry.check_status("room1"),
            RoomStatus {
                exists: true,
                dismissed: false,
                can_join: true
            }
        );
    }

    #[tokio::test]
    async fn test_recreate_bumps_epoch() {
        let registry = registry();
        registry.create("room1", "host");
        let first = registry.active_host_epoch("room1", "host").unwrap();
        assert_eq!(registry.active_host_epoch("room1", "guest"), None);

        registry.dismiss("room1", "host");
        assert_eq!(registry.active_epoch("room1"), None);

        registry.create("room1", "host");
        let second = registry.active_epoch("room1").unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_kick_requires_host() {
        let registry = registry();
        registry.create("room1", "host");
        registry.join("room1", "guest");

        assert!(!registry.kick("room1", "guest", "host"));
        assert!(!registry.kick("room1", "host", "host"));
        assert!(registry.kick("room1", "host", "guest"));
        assert!(!registry.kick("room1", "host", "guest"));
        assert_eq!(
            registry.snapshot("room1").unwrap().participants,
            vec!["host".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_rechecks_participants() {
        let registry = registry();
        registry.create("empty", "host-a");
        registry.leave("empty", "host-a");
        registry.create("busy", "host-b");
        registry.create("rejoined", "host-c");
        registry.leave("rejoined", "host-c");

        tokio::time::advance(Duration::from_secs(601)).await;
        registry.join("rejoined", "guest");

        let evicted = registry.evict_idle(Instant::now(), Duration::from_secs(600));
        assert_eq!(evicted, vec!["empty".to_string()]);
        assert!(!registry.contains("empty"));
        assert!(registry.contains("busy"));
        assert!(registry.contains("rejoined"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_activity_prevents_eviction() {
        let registry = registry();
        registry.create("room1", "host");
        tokio::time::advance(Duration::from_secs(500)).await;
        registry.leave("room1", "host");
        tokio::time::advance(Duration::from_secs(200)).await;

        assert!(registry
            .evict_idle(Instant::now(), Duration::from_secs(600))
            .is_empty());
    }

    #[tokio::test]
    async fn test_session_end_events() {
        let registry = registry();
        let mut events = registry.subscribe_events();

        registry.create("room1", "host");
        let epoch = registry.epoch("room1").unwrap();
        registry.dismiss("room1", "host");

        let event = events.recv().await.unwrap();
        assert_eq!(event.room_id, "room1");
        assert_eq!(event.epoch, epoch);
        assert_eq!(event.host_id, "host");
        assert_eq!(event.reason, EndReason::Dismissed);
    }
}
