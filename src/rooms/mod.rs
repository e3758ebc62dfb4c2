pub mod cleanup;
pub mod events;
pub mod registry;

pub use cleanup::{run_room_cleanup, CleanupConfig};
pub use events::run_session_end_listener;
pub use registry::{
    EndReason, RoomRegistry, RoomSnapshot, RoomStatus, SessionEnded, DEFAULT_DISMISS_GRACE,
};
