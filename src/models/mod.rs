pub mod room;
pub mod signal;
pub mod token;

pub use room::{
    CreateRoomRequest,
    CreateRoomResponse,
    DismissRoomRequest,
    DismissRoomResponse,
    JoinRoomRequest,
    JoinRoomResponse,
    KickRequest,
    KickResponse,
    LeaveRoomRequest,
};

pub use signal::{PollSignalsQuery, PollSignalsResponse, PushSignalRequest, PushSignalResponse};

pub use token::{IssueTokenRequest, IssueTokenResponse};
