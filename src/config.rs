use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP intake port.
    pub port: u16,
    /// WebSocket fan-out port (separate listener from the intake surface).
    pub ws_port: u16,
    pub redis_url: String,
    /// Hash key under which all device tokens live (field per user).
    pub tokens_key: String,
    /// Service-account JSON for the push gateway; absent disables the relay.
    pub fcm_credentials_path: Option<String>,
    pub token_store_timeout_secs: u64,
    pub gateway_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let ws_port = env::var("WS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let tokens_key = env::var("TOKENS_KEY").unwrap_or_else(|_| "tokens".into());
        let fcm_credentials_path = env::var("FCM_CREDENTIALS_PATH").ok().filter(|p| !p.is_empty());
        let token_store_timeout_secs = env::var("TOKEN_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let gateway_timeout_secs = env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        if port == ws_port {
            return Err(crate::error::AppError::Config(
                "PORT and WS_PORT must differ (two listening surfaces)".into(),
            ));
        }

        Ok(Self {
            port,
            ws_port,
            redis_url,
            tokens_key,
            fcm_credentials_path,
            token_store_timeout_secs,
            gateway_timeout_secs,
        })
    }

    pub fn token_store_timeout(&self) -> Duration {
        Duration::from_secs(self.token_store_timeout_secs)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}
