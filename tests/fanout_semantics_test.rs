//! Service-level delivery semantics: relay-before-broadcast ordering,
//! concurrent sends, and lazy pruning across requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use fanout_service::models::Notification;
use fanout_service::services::{
    GatewayError, MulticastReport, NotificationService, PushGateway, PushReceipt, PushRelay,
    RelayOutcome, TokenStore, TokenStoreError,
};
use fanout_service::websocket::{BroadcastDispatcher, ConnectionHandle, ConnectionRegistry};

struct FixedTokenStore {
    tokens: Vec<String>,
}

#[async_trait]
impl TokenStore for FixedTokenStore {
    async fn all_tokens(&self) -> Result<Vec<String>, TokenStoreError> {
        Ok(self.tokens.clone())
    }
}

fn service_with(
    registry: &ConnectionRegistry,
    tokens: &[&str],
    gateway: Arc<dyn PushGateway>,
) -> NotificationService {
    NotificationService::new(
        Arc::new(FixedTokenStore {
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }),
        PushRelay::new(Some(gateway), Duration::from_secs(5)),
        BroadcastDispatcher::new(registry.clone()),
        Duration::from_secs(5),
    )
}

struct AcceptAllGateway;

#[async_trait]
impl PushGateway for AcceptAllGateway {
    async fn send_multicast(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
    ) -> Result<MulticastReport, GatewayError> {
        let mut report = MulticastReport::default();
        for token in tokens {
            report.record(PushReceipt::delivered(token, None));
        }
        Ok(report)
    }
}

/// Holds one connection's receiver and checks it is still empty at the
/// moment the gateway call happens.
struct OrderProbeGateway {
    probe: Mutex<Option<UnboundedReceiver<String>>>,
    channel_empty_at_relay: AtomicBool,
}

#[async_trait]
impl PushGateway for OrderProbeGateway {
    async fn send_multicast(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
    ) -> Result<MulticastReport, GatewayError> {
        let empty = match self.probe.lock() {
            Ok(mut guard) => guard
                .as_mut()
                .map(|rx| rx.try_recv().is_err())
                .unwrap_or(false),
            Err(_) => false,
        };
        self.channel_empty_at_relay.store(empty, Ordering::SeqCst);

        let mut report = MulticastReport::default();
        for token in tokens {
            report.record(PushReceipt::delivered(token, None));
        }
        Ok(report)
    }
}

#[tokio::test]
async fn relay_completes_before_broadcast_begins() {
    let registry = ConnectionRegistry::new();
    let (handle, rx) = ConnectionHandle::open();
    registry.register(handle).await;

    let gateway = Arc::new(OrderProbeGateway {
        probe: Mutex::new(Some(rx)),
        channel_empty_at_relay: AtomicBool::new(false),
    });
    let service = service_with(&registry, &["tokenA"], gateway.clone());

    let report = service
        .send(&Notification::new("Hi", "There", None))
        .await
        .unwrap();

    assert!(matches!(report.relay, RelayOutcome::Sent(_)));
    assert!(gateway.channel_empty_at_relay.load(Ordering::SeqCst));

    // After send returns the frame is queued.
    let mut guard = gateway.probe.lock().unwrap();
    let rx = guard.as_mut().unwrap();
    assert_eq!(rx.try_recv().unwrap(), r#"{"title":"Hi","body":"There"}"#);
}

#[tokio::test]
async fn concurrent_sends_reach_every_connection() {
    let registry = ConnectionRegistry::new();
    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (handle, rx) = ConnectionHandle::open();
        registry.register(handle).await;
        receivers.push(rx);
    }

    let service = Arc::new(service_with(&registry, &[], Arc::new(AcceptAllGateway)));

    let first = {
        let service = service.clone();
        tokio::spawn(
            async move { service.send(&Notification::new("First", "one", None)).await },
        )
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .send(&Notification::new("Second", "two", None))
                .await
        })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Interleaving order is unspecified; both payloads arrive on every
    // connection.
    for rx in receivers.iter_mut() {
        let mut seen = vec![rx.try_recv().unwrap(), rx.try_recv().unwrap()];
        seen.sort();
        assert_eq!(
            seen,
            vec![
                r#"{"title":"First","body":"one"}"#.to_string(),
                r#"{"title":"Second","body":"two"}"#.to_string(),
            ]
        );
        assert!(rx.try_recv().is_err());
    }
}

#[tokio::test]
async fn closed_connection_is_pruned_between_sends() {
    let registry = ConnectionRegistry::new();
    let mut receivers = Vec::new();
    for _ in 0..2 {
        let (handle, rx) = ConnectionHandle::open();
        registry.register(handle).await;
        receivers.push(rx);
    }
    let (doomed, doomed_rx) = ConnectionHandle::open();
    let doomed_id = doomed.id();
    registry.register(doomed).await;
    drop(doomed_rx);

    let service = service_with(&registry, &[], Arc::new(AcceptAllGateway));

    let report = service
        .send(&Notification::new("Hi", "There", None))
        .await
        .unwrap();
    assert_eq!(report.broadcast.attempted, 3);
    assert_eq!(report.broadcast.delivered, 2);
    assert_eq!(report.broadcast.failed, 1);
    assert!(!registry.contains(doomed_id).await);

    let report = service
        .send(&Notification::new("Hi", "Again", None))
        .await
        .unwrap();
    assert_eq!(report.broadcast.attempted, 2);
    assert_eq!(report.broadcast.delivered, 2);
    assert_eq!(report.broadcast.failed, 0);
}

#[tokio::test]
async fn registration_between_sends_grows_the_fanout() {
    let registry = ConnectionRegistry::new();
    let service = service_with(&registry, &[], Arc::new(AcceptAllGateway));

    let report = service
        .broadcast_only(&Notification::new("Hi", "nobody", None))
        .await
        .unwrap();
    assert_eq!(report.attempted, 0);

    let (first, mut rx1) = ConnectionHandle::open();
    registry.register(first).await;
    let report = service
        .broadcast_only(&Notification::new("Hi", "one", None))
        .await
        .unwrap();
    assert_eq!(report.delivered, 1);

    let (second, mut rx2) = ConnectionHandle::open();
    registry.register(second).await;
    let report = service
        .broadcast_only(&Notification::new("Hi", "two", None))
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);

    // The first connection saw both later payloads, the second only the last.
    assert_eq!(rx1.try_recv().unwrap(), r#"{"title":"Hi","body":"one"}"#);
    assert_eq!(rx1.try_recv().unwrap(), r#"{"title":"Hi","body":"two"}"#);
    assert!(rx1.try_recv().is_err());
    assert_eq!(rx2.try_recv().unwrap(), r#"{"title":"Hi","body":"two"}"#);
    assert!(rx2.try_recv().is_err());
}
