pub mod handler;
pub mod messages;

pub use handler::ws_routes;
pub use messages::ServerFrame;
