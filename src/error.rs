use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::services::gateway::GatewayError;
use crate::services::token_store::TokenStoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    /// Client-caused request error; the message is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("push gateway error: {0}")]
    Gateway(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(json!({ "error": msg })),
            _ => HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": self.to_string(),
            })),
        }
    }
}

impl From<TokenStoreError> for AppError {
    fn from(e: TokenStoreError) -> Self {
        AppError::TokenStore(e.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Gateway(e.to_string())
    }
}

impl AppError {
    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::TokenStore(_) | AppError::Gateway(_) => 500,
            _ => 500,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}
