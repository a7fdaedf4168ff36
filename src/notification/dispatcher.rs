//! Fan-out of one message to every destination.

use crate::core::{
    Destination, DispatchResult, ExchangeDetail, PublishRequest, Transport, DEFAULT_BASE_URL,
};
use crate::error::{DispatchError, NotifierError, Result};
use crate::notification::message::{Message, MessageOptions};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sends a message to a set of destinations through a `Transport`.
///
/// Every destination gets its own request. Requests run concurrently and a
/// failure on one destination never affects the others. There are no retries.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    debug: bool,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            debug: false,
        }
    }

    /// In debug mode every exchange is logged and attached to its result.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Publishes `text` with the already merged `fields` to each destination.
    ///
    /// Only message-level problems (no destination, unusable attachment) are
    /// returned as errors. Per-destination failures are reported in the results.
    #[instrument(skip_all, fields(destinations = destinations.len()))]
    pub async fn send(
        &self,
        text: &str,
        fields: &MessageOptions,
        destinations: &[Destination],
        base_url: Option<&str>,
    ) -> Result<Vec<DispatchResult>> {
        if destinations.is_empty() {
            return Err(NotifierError::NoDestination);
        }
        let message = Message::compose(text, fields).await?;
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL);

        let deliveries = destinations.iter().map(|destination| {
            let request = message.request_for(destination, base_url);
            self.deliver(destination.clone(), request)
        });
        let results = join_all(deliveries).await;

        let delivered = results.iter().filter(|r| r.success).count();
        info!(
            delivered,
            failed = results.len() - delivered,
            "Dispatched notification"
        );
        Ok(results)
    }

    async fn deliver(&self, destination: Destination, request: PublishRequest) -> DispatchResult {
        if self.debug {
            debug!(
                method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body_len = request.body.len(),
                "Sending request"
            );
        }

        let outcome = self.transport.execute(&request).await;

        let (success, status, status_detail, response_body) = match outcome {
            Ok(response) if (200..300).contains(&response.status) => {
                (true, Some(response.status), "delivered".to_string(), Some(response.body))
            }
            Ok(response) => {
                let error = DispatchError::Status {
                    status: response.status,
                    body: response.body.trim().to_string(),
                };
                warn!(%destination, %error, "Notification rejected");
                (false, Some(response.status), error.to_string(), Some(response.body))
            }
            Err(error) => {
                warn!(%destination, %error, "Notification could not be sent");
                (false, None, error.to_string(), None)
            }
        };

        let exchange = self.debug.then(|| {
            debug!(%destination, ?status, body = ?response_body, "Received response");
            ExchangeDetail {
                method: request.method,
                url: request.url,
                request_headers: request.headers,
                response_body,
            }
        });

        DispatchResult {
            destination,
            success,
            status,
            status_detail,
            exchange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::test_utils::FakeTransport;

    const BASE: &str = "http://ntfy.test";

    #[tokio::test]
    async fn single_topic_success() {
        let transport = Arc::new(FakeTransport::new());
        let dispatcher = Dispatcher::new(transport.clone());

        let results = dispatcher
            .send("hello", &MessageOptions::new(), &[Destination::topic("abc")], Some(BASE))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].status, Some(200));
        assert!(results[0].exchange.is_none());
        assert_eq!(transport.get_call_count("http://ntfy.test/abc"), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_other_destination() {
        let transport = Arc::new(FakeTransport::new());
        transport.add_error_response("http://ntfy.test/down", "connection refused");
        let dispatcher = Dispatcher::new(transport.clone());

        let results = dispatcher
            .send(
                "hello",
                &MessageOptions::new(),
                &[Destination::topic("down"), Destination::topic("up")],
                Some(BASE),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].status, None);
        assert!(results[0].status_detail.contains("connection refused"));
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let transport = Arc::new(FakeTransport::new());
        transport.add_status_response("http://ntfy.test/limited", 429, "rate limited");
        let dispatcher = Dispatcher::new(transport);

        let results = dispatcher
            .send("x", &MessageOptions::new(), &[Destination::topic("limited")], Some(BASE))
            .await
            .unwrap();

        assert!(!results[0].success);
        assert_eq!(results[0].status, Some(429));
        assert!(results[0].status_detail.contains("rate limited"));
    }

    #[tokio::test]
    async fn debug_mode_attaches_the_exchange() {
        let transport = Arc::new(FakeTransport::new());
        transport.add_status_response("http://ntfy.test/alerts", 200, "{\"id\":\"1\"}");
        let dispatcher = Dispatcher::new(transport).with_debug(true);

        let results = dispatcher
            .send(
                "x",
                &MessageOptions::new().title("T"),
                &[Destination::email("me@example.com")],
                Some(BASE),
            )
            .await
            .unwrap();

        let exchange = results[0].exchange.as_ref().unwrap();
        assert_eq!(exchange.url, "http://ntfy.test/alerts");
        assert!(exchange
            .request_headers
            .contains(&("Email".to_string(), "me@example.com".to_string())));
        assert_eq!(exchange.response_body.as_deref(), Some("{\"id\":\"1\"}"));
    }

    #[tokio::test]
    async fn no_destination_is_an_error() {
        let dispatcher = Dispatcher::new(Arc::new(FakeTransport::new()));
        let result = dispatcher.send("x", &MessageOptions::new(), &[], None).await;
        assert!(matches!(result, Err(NotifierError::NoDestination)));
    }

    #[tokio::test]
    async fn default_base_url_is_the_public_instance() {
        let transport = Arc::new(FakeTransport::new());
        let dispatcher = Dispatcher::new(transport.clone());

        dispatcher
            .send("x", &MessageOptions::new(), &[Destination::topic("t")], None)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].url, format!("{DEFAULT_BASE_URL}/t"));
    }
}
