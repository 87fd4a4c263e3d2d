//! Realtime voice interviews: a WebSocket bridge between the browser and the
//! provider's realtime audio API.

pub mod audio;
pub mod bridge;
pub mod handlers;
pub mod protocol;
pub mod recorder;
