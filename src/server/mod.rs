//! Intercom server module

pub mod guard;
pub mod handlers;
pub mod server;
pub mod websocket;

pub use guard::{ControlLock, LaneLease};
pub use server::{AppState, WebServer};
