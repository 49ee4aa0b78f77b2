/// HTTP handlers for the notification intake API
pub mod send;

pub use send::{register_routes, SendPayload};
