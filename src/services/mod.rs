pub mod fcm;
pub mod gateway;
pub mod notification_service;
pub mod relay;
pub mod token_store;

pub use fcm::FcmClient;
pub use gateway::{GatewayError, MulticastReport, PushGateway, PushReceipt};
pub use notification_service::{NotificationService, SendReport};
pub use relay::{PushRelay, RelayOutcome};
pub use token_store::{RedisTokenStore, TokenStore, TokenStoreError};
