pub mod bus;
pub mod messages;

pub use bus::{SignalBus, DEFAULT_RETENTION};
pub use messages::{
    Device, DeviceAction, PlaybackAction, Signal, SignalEnvelope, ALL_TARGETS,
};
