use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::models::Notification;
use crate::services::RelayOutcome;
use crate::state::AppState;

/// Incoming notification body. Missing `title`/`body` deserialize to empty
/// strings so the lenient endpoint accepts them and `/send` can reject them
/// with a 400 instead of a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub icon: Option<String>,
}

impl From<SendPayload> for Notification {
    fn from(payload: SendPayload) -> Self {
        Notification::new(payload.title, payload.body, payload.icon)
    }
}

/// POST /send
///
/// Full pipeline: validate, look up device tokens, relay through the push
/// gateway, fan out to live connections. Both delivery reports are returned.
pub async fn send(
    state: web::Data<AppState>,
    payload: web::Json<SendPayload>,
) -> Result<HttpResponse, AppError> {
    let notification = Notification::from(payload.into_inner());
    let report = state.notifier.send(&notification).await?;

    let body = match &report.relay {
        RelayOutcome::NoRecipients => json!({
            "success": false,
            "message": "No tokens found",
            "broadcast": report.broadcast,
        }),
        RelayOutcome::Sent(multicast) => json!({
            "success": true,
            "response": multicast,
            "broadcast": report.broadcast,
        }),
    };
    Ok(HttpResponse::Ok().json(body))
}

/// POST /send-notification
///
/// Fan-out only: no validation, no token lookup, no gateway. Whatever is in
/// the payload goes to every live connection as-is.
pub async fn send_notification(
    state: web::Data<AppState>,
    payload: web::Json<SendPayload>,
) -> Result<HttpResponse, AppError> {
    let notification = Notification::from(payload.into_inner());
    let broadcast = state.notifier.broadcast_only(&notification).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "broadcast": broadcast,
    })))
}

/// GET /connections
///
/// Live connection count, read straight from the registry.
pub async fn connections(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let count = state.registry.len().await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "connections": count,
    })))
}

/// Register intake routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/send-notification", web::post().to(send_notification))
        .route("/send", web::post().to(send))
        .route("/connections", web::get().to(connections));
}
