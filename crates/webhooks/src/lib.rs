//! Webhook subscriptions and best-effort order-event fan-out.
//!
//! Delivery is fire-and-forget: `notify` snapshots the subscriber list,
//! spawns one detached task per URL and returns immediately, so a slow or
//! unreachable subscriber can never delay the order response that triggered
//! it. There is no retry, no queue and no persistence; losing notifications
//! on crash is an accepted property, not an oversight.

use core_types::OrderEvent;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub mod error;

pub use error::{Error, Result};

#[derive(Debug, Clone)]
struct Subscription {
    id: Uuid,
    url: Url,
}

pub struct WebhookRegistry {
    http_client: reqwest::Client,
    delivery_timeout: Duration,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl WebhookRegistry {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            delivery_timeout,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback URL and returns its subscription id.
    ///
    /// Only absolute http(s) URLs are accepted. Duplicates are not detected
    /// and subscriptions never expire; the registry lives in memory only.
    pub fn subscribe(&self, url: &str) -> Result<Uuid> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        let id = Uuid::new_v4();
        let mut subscriptions = self.subscriptions.lock().expect("webhook lock poisoned");
        subscriptions.push(Subscription { id, url: parsed });
        Ok(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().expect("webhook lock poisoned").len()
    }

    /// Fans `event` out to every registered URL.
    ///
    /// Each delivery is independent and bounded by the per-delivery timeout;
    /// failures are logged and swallowed.
    pub fn notify(&self, event: &OrderEvent) {
        let targets: Vec<Subscription> = self
            .subscriptions
            .lock()
            .expect("webhook lock poisoned")
            .clone();

        for target in targets {
            let client = self.http_client.clone();
            let timeout = self.delivery_timeout;
            let payload = event.clone();
            tokio::spawn(async move {
                deliver(client, target, payload, timeout).await;
            });
        }
    }
}

async fn deliver(
    client: reqwest::Client,
    target: Subscription,
    payload: OrderEvent,
    timeout: Duration,
) {
    let outcome = client
        .post(target.url.clone())
        .timeout(timeout)
        .json(&payload)
        .send()
        .await;

    match outcome {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(webhook_id = %target.id, "Webhook delivered");
        }
        Ok(response) => {
            tracing::warn!(
                webhook_id = %target.id,
                status = %response.status(),
                "Webhook endpoint rejected the notification"
            );
        }
        Err(e) => {
            tracing::warn!(webhook_id = %target.id, error = %e, "Webhook delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};
    use core_types::OrderStatus;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Binds a throwaway HTTP server that counts received order events.
    async fn spawn_receiver(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/hook",
            post(move |Json(event): Json<OrderEvent>| {
                let hits = hits.clone();
                async move {
                    assert_eq!(event.status, OrderStatus::Placed);
                    hits.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/hook", addr)
    }

    async fn wait_for(hits: &AtomicUsize, expected: usize) -> bool {
        for _ in 0..100 {
            if hits.load(Ordering::SeqCst) >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        false
    }

    #[test]
    fn subscribe_rejects_non_http_urls() {
        let registry = WebhookRegistry::new(Duration::from_secs(5));
        assert!(registry.subscribe("not a url").is_err());
        assert!(registry.subscribe("ftp://example.com/hook").is_err());
        assert!(registry.subscribe("/relative/path").is_err());
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn subscriptions_get_distinct_ids() {
        let registry = WebhookRegistry::new(Duration::from_secs(5));
        let a = registry.subscribe("https://example.com/hook").unwrap();
        let b = registry.subscribe("https://example.com/hook").unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn notify_reaches_all_reachable_subscribers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = WebhookRegistry::new(Duration::from_secs(2));
        registry.subscribe(&spawn_receiver(hits.clone()).await).unwrap();
        registry.subscribe(&spawn_receiver(hits.clone()).await).unwrap();

        registry.notify(&OrderEvent {
            order_id: "240101000000001".to_string(),
            status: OrderStatus::Placed,
        });

        assert!(wait_for(&hits, 2).await, "both subscribers should be hit");
    }

    #[tokio::test]
    async fn one_dead_subscriber_does_not_block_the_other() {
        let hits = Arc::new(AtomicUsize::new(0));
        let registry = WebhookRegistry::new(Duration::from_millis(500));
        // Nothing listens on this port; the delivery task fails on its own.
        registry.subscribe("http://127.0.0.1:9/hook").unwrap();
        registry.subscribe(&spawn_receiver(hits.clone()).await).unwrap();

        registry.notify(&OrderEvent {
            order_id: "240101000000002".to_string(),
            status: OrderStatus::Placed,
        });

        assert!(wait_for(&hits, 1).await, "live subscriber should be hit");
    }
}
