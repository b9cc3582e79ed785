//! Infrastructure adapters: notification hubs that drive sessions.

pub mod hub;

pub use hub::{InProcessHub, NotifierGate};
