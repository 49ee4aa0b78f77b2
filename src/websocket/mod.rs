//! WebSocket fan-out: connection registry, broadcast dispatch, and the
//! session actor serving the duplex surface.

pub mod dispatch;
pub mod messages;
pub mod registry;
pub mod session;

pub use dispatch::{BroadcastDispatcher, BroadcastReport};
pub use messages::NotificationFrame;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use session::WsSession;
