//! WebSocket transport for game sessions

pub mod handler;
pub mod protocol;

pub use handler::ws_handler;
