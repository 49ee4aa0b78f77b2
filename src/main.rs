use actix_web::{middleware, web, App, HttpServer};
use fanout_service::{
    config, error, handlers, logging, metrics,
    services::{FcmClient, NotificationService, PushGateway, PushRelay, RedisTokenStore},
    state::AppState,
    websocket::{session, BroadcastDispatcher, ConnectionRegistry},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let token_store = RedisTokenStore::connect(&cfg.redis_url, &cfg.tokens_key)
        .await
        .map_err(|e| error::AppError::StartServer(format!("redis: {e}")))?;

    let gateway: Option<Arc<dyn PushGateway>> = match cfg.fcm_credentials_path.as_deref() {
        Some(path) => {
            let client = FcmClient::from_credentials_file(path)
                .map_err(|e| error::AppError::StartServer(format!("fcm credentials: {e}")))?;
            tracing::info!(
                "push gateway configured for project {}",
                client.project_id()
            );
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("FCM_CREDENTIALS_PATH not set, push relay disabled");
            None
        }
    };

    let registry = ConnectionRegistry::new();
    let dispatcher = BroadcastDispatcher::new(registry.clone());
    let relay = PushRelay::new(gateway, cfg.gateway_timeout());
    let notifier = Arc::new(NotificationService::new(
        Arc::new(token_store),
        relay,
        dispatcher,
        cfg.token_store_timeout(),
    ));

    let state = AppState {
        registry,
        notifier,
        config: cfg.clone(),
    };

    let intake_addr = format!("0.0.0.0:{}", cfg.port);
    let ws_addr = format!("0.0.0.0:{}", cfg.ws_port);
    tracing::info!(%intake_addr, %ws_addr, "starting fanout-service");

    let intake_state = state.clone();
    let intake_server = HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .app_data(web::Data::new(intake_state.clone()))
            .configure(handlers::register_routes)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
    })
    .bind(&intake_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind intake: {e}")))?
    .run();

    let ws_state = state.clone();
    let ws_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ws_state.clone()))
            .configure(session::register_routes)
    })
    .bind(&ws_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind websocket: {e}")))?
    .run();

    tokio::select! {
        res = intake_server => {
            res.map_err(|e| error::AppError::StartServer(format!("intake server: {e}")))
        }
        res = ws_server => {
            res.map_err(|e| error::AppError::StartServer(format!("websocket server: {e}")))
        }
    }
}
