use crate::{config::Config, services::NotificationService, websocket::ConnectionRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub notifier: Arc<NotificationService>,
    pub config: Arc<Config>,
}
