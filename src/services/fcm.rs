use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::gateway::{GatewayError, MulticastReport, PushGateway, PushReceipt};

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1/projects";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google service account key, as found in the credentials JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// OAuth2 token cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT claims for the Google OAuth2 bearer exchange
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// FCM HTTP v1 message envelope
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

#[derive(Debug, Serialize)]
pub struct FcmMessageContent {
    pub token: String,
    pub notification: FcmNotification,
}

#[derive(Debug, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Firebase Cloud Messaging client (HTTP v1 API).
///
/// Handles OAuth2 token generation and caching, and per-token delivery. The
/// v1 API takes one device token per request, so the multicast contract is
/// satisfied by looping the batch here and aggregating one report.
pub struct FcmClient {
    project_id: String,
    credentials: ServiceAccountKey,
    token_cache: Mutex<Option<TokenCache>>,
    http_client: reqwest::Client,
}

impl FcmClient {
    pub fn new(credentials: ServiceAccountKey) -> Self {
        Self {
            project_id: credentials.project_id.clone(),
            credentials,
            token_cache: Mutex::new(None),
            http_client: reqwest::Client::new(),
        }
    }

    /// Load credentials from a service-account JSON file.
    pub fn from_credentials_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Credentials(format!("read {}: {}", path.display(), e)))?;
        let credentials: ServiceAccountKey = serde_json::from_str(&raw)
            .map_err(|e| GatewayError::Credentials(format!("parse {}: {}", path.display(), e)))?;
        Ok(Self::new(credentials))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Get an access token for the service account, cached until shortly
    /// before expiry.
    async fn access_token(&self) -> Result<String, GatewayError> {
        {
            let cache = self.token_cache.lock().expect("token cache lock poisoned");
            if let Some(cached) = cache.as_ref() {
                // Keep a 60 second margin so a token never expires mid-send.
                if cached.expires_at > Utc::now().timestamp() + 60 {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| GatewayError::Credentials(format!("private key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| GatewayError::Jwt(e.to_string()))?;

        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::TokenExchange(format!(
                "status {}",
                response.status()
            )));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ResponseParse(e.to_string()))?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        {
            let mut cache = self.token_cache.lock().expect("token cache lock poisoned");
            *cache = Some(TokenCache {
                access_token: token_response.access_token.clone(),
                expires_at,
            });
        }

        Ok(token_response.access_token)
    }

    async fn send_single(
        &self,
        access_token: &str,
        device_token: &str,
        title: &str,
        body: &str,
    ) -> Result<PushReceipt, GatewayError> {
        let message = FcmMessage {
            message: FcmMessageContent {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
            },
        };

        let url = format!("{}/{}/messages:send", FCM_ENDPOINT, self.project_id);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&message)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let api_response: FcmApiResponse = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::ResponseParse(e.to_string()))?;
                Ok(PushReceipt::delivered(device_token, api_response.name))
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                Err(GatewayError::Api(status.to_string(), error_text))
            }
        }
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<MulticastReport, GatewayError> {
        // Auth failures abort the whole call; per-token rejections do not.
        let access_token = self.access_token().await?;

        let mut report = MulticastReport::default();
        for device_token in tokens {
            match self
                .send_single(&access_token, device_token, title, body)
                .await
            {
                Ok(receipt) => report.record(receipt),
                Err(e) => report.record(PushReceipt::rejected(device_token, e.to_string())),
            }
        }

        tracing::debug!(
            "multicast complete: {} delivered, {} failed",
            report.success_count,
            report.failure_count
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> ServiceAccountKey {
        ServiceAccountKey {
            project_id: "test-project".to_string(),
            private_key_id: "key-id".to_string(),
            private_key: "not-a-real-key".to_string(),
            client_email: "push@test-project.iam.gserviceaccount.com".to_string(),
            client_id: "123456".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[test]
    fn client_takes_project_from_credentials() {
        let client = FcmClient::new(test_key());
        assert_eq!(client.project_id(), "test-project");
    }

    #[test]
    fn credentials_load_from_json_file() {
        let path = std::env::temp_dir().join(format!("fcm-key-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::to_string(&test_key()).unwrap();
        std::fs::write(&path, json).unwrap();

        let client = FcmClient::from_credentials_file(&path).unwrap();
        assert_eq!(client.project_id(), "test-project");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_credentials_file_is_a_credentials_error() {
        let result = FcmClient::from_credentials_file("/nonexistent/key.json");
        assert!(matches!(result, Err(GatewayError::Credentials(_))));
    }

    #[test]
    fn message_envelope_matches_v1_shape() {
        let message = FcmMessage {
            message: FcmMessageContent {
                token: "device-1".to_string(),
                notification: FcmNotification {
                    title: "Hi".to_string(),
                    body: "There".to_string(),
                },
            },
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["message"]["token"], "device-1");
        assert_eq!(json["message"]["notification"]["title"], "Hi");
        assert_eq!(json["message"]["notification"]["body"], "There");
    }

    #[tokio::test]
    async fn bad_private_key_fails_before_any_network_io() {
        let client = FcmClient::new(test_key());
        let err = client
            .send_multicast(&["device-1".to_string()], "Hi", "There")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Credentials(_)));
    }
}
