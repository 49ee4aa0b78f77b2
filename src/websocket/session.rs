use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Actor for one client connection on the fan-out surface.
///
/// Pure lifecycle plumbing: drains the registry channel into the socket,
/// keeps the peer honest with a ping/pong heartbeat, and deregisters itself
/// when it stops. Inbound payloads are ignored; this surface is send-only
/// from server to client.
pub struct WsSession {
    id: ConnectionId,
    registry: ConnectionRegistry,
    rx: Option<UnboundedReceiver<String>>,
    hb: Instant,
}

impl WsSession {
    fn new(id: ConnectionId, registry: ConnectionRegistry, rx: UnboundedReceiver<String>) -> Self {
        Self {
            id,
            registry,
            rx: Some(rx),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!("heartbeat timed out for connection {}, disconnecting", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("client connected: {}", self.id);

        self.hb(ctx);

        // Adopt the registry channel; every queued payload becomes a text
        // frame via the StreamHandler below.
        if let Some(rx) = self.rx.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("client disconnected: {}", self.id);

        let registry = self.registry.clone();
        let id = self.id;
        actix::spawn(async move {
            registry.deregister(id).await;
        });
    }
}

/// Broadcast payloads queued by the dispatcher.
impl StreamHandler<String> for WsSession {
    fn handle(&mut self, payload: String, ctx: &mut Self::Context) {
        ctx.text(payload);
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // Sender side gone: the registry pruned this connection.
        tracing::debug!("delivery channel closed for {}", self.id);
        ctx.stop();
    }
}

/// WebSocket protocol frames from the peer.
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                tracing::debug!("ignoring inbound payload on connection {}", self.id);
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!("close frame from {}: {:?}", self.id, reason);
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!("protocol error on connection {}: {:?}", self.id, e);
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// HTTP handler performing the WebSocket upgrade.
pub async fn connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (conn, rx) = ConnectionHandle::open();
    let id = conn.id();
    state.registry.register(conn).await;

    let session = WsSession::new(id, state.registry.clone(), rx);
    match ws::start(session, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            // Handshake failed before the session could own the connection.
            state.registry.deregister(id).await;
            Err(e)
        }
    }
}

/// Routes for the fan-out listener. Upgrades are served at the root and at
/// /ws so plain WebSocket clients need no path.
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(connect))
        .route("/ws", web::get().to(connect));
}
