//! Idle room cleanup background task.
//!
//! Every `interval` the sweep evicts rooms whose participant set has been empty
//! for longer than `idle_timeout`, then drops signal queues of rooms that no
//! longer exist. Explicitly dismissed rooms are removed by the registry itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::rooms::RoomRegistry;
use crate::signal::SignalBus;

/// Shortest sweep period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl From<&Config> for CleanupConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.cleanup_interval(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Run the sweep loop until `cancel_token` is cancelled.
#[instrument(skip_all, name = "rooms.cleanup")]
pub async fn run_room_cleanup(
    registry: Arc<RoomRegistry>,
    signals: Arc<SignalBus>,
    config: CleanupConfig,
    cancel_token: CancellationToken,
) {
    info!(
        interval_seconds = config.interval.as_secs(),
        idle_timeout_seconds = config.idle_timeout.as_secs(),
        "Starting room cleanup task"
    );

    if config.interval < MIN_INTERVAL {
        warn!(
            interval_ms = config.interval.as_millis() as u64,
            "Cleanup interval below minimum, using 1s"
        );
    }

    let mut ticker = tokio::time::interval(config.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep(&registry, &signals, config.idle_timeout, Instant::now());
            }
            () = cancel_token.cancelled() => {
                info!("Room cleanup task received shutdown signal, exiting");
                break;
            }
        }
    }
}

/// One sweep pass. Returns the evicted room ids.
pub fn sweep(
    registry: &RoomRegistry,
    signals: &SignalBus,
    idle_timeout: Duration,
    now: Instant,
) -> Vec<String> {
    let evicted = registry.evict_idle(now, idle_timeout);
    let purged = signals.purge_missing();

    if !evicted.is_empty() || purged > 0 {
        info!(
            evicted = evicted.len(),
            purged_signal_queues = purged,
            remaining = registry.room_count(),
            "Room cleanup completed"
        );
    }

    evicted
}
