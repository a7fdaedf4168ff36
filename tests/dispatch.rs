//! Integration tests for sending notifications.

mod helpers;

use helpers::write_conf;
use ntfy_wrapper::notification::test_utils::FakeTransport;
use ntfy_wrapper::{Destination, MessageOptions, Notifier, NotifierError};
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_topic_with_successful_transport() {
    let dir = tempdir().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let notifier = Notifier::builder(dir.path())
        .topics(["abc"])
        .write(false)
        .transport_override(transport.clone())
        .build()
        .unwrap();

    let results = notifier.notify("hello").await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].destination, Destination::topic("abc"));
    assert_eq!(transport.requests()[0].body, b"hello");
}

#[tokio::test]
async fn test_failures_are_isolated_per_destination() {
    let dir = tempdir().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.add_error_response("http://ntfy.test/broken", "connection reset");
    let notifier = Notifier::builder(dir.path())
        .topics(["broken", "fine"])
        .base_url("http://ntfy.test")
        .write(false)
        .transport_override(transport.clone())
        .build()
        .unwrap();

    let results = notifier.notify("hello").await.unwrap();

    assert_eq!(results.len(), 2);
    let broken = results
        .iter()
        .find(|r| r.destination == Destination::topic("broken"))
        .unwrap();
    let fine = results
        .iter()
        .find(|r| r.destination == Destination::topic("fine"))
        .unwrap();
    assert!(!broken.success);
    assert!(fine.success);
    assert_eq!(transport.get_call_count("http://ntfy.test/fine"), 1);
}

#[tokio::test]
async fn test_file_defaults_reach_the_server() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/builds"))
        .and(header("Title", "CI"))
        .and(header("Tags", "hammer"))
        .and(header("Priority", "4"))
        .and(header("X-Markdown", "yes"))
        .and(body_string("build #42 passed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/alerts"))
        .and(header("Email", "ops@example.com"))
        .and(header("Title", "CI"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    write_conf(
        dir.path(),
        &format!(
            "[notifier_init]\ntopics = builds\nemails = ops@example.com\nbase_url = {}\n\n\
             [notify_defaults]\ntitle = CI\ntags = hammer\npriority = 4\nx-markdown = yes\n",
            server.uri()
        ),
    );
    let notifier = Notifier::builder(dir.path()).write(false).build().unwrap();

    // Act
    let results = notifier.notify("build #42 passed").await.unwrap();

    // Assert
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success), "{results:?}");
}

#[tokio::test]
async fn test_server_error_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let notifier = Notifier::builder(dir.path())
        .topics(["down", "up"])
        .base_url(server.uri())
        .write(false)
        .debug(true)
        .build()
        .unwrap();

    let results = notifier
        .notify_with("x", &MessageOptions::new().title("override"))
        .await
        .unwrap();

    assert!(!results[0].success);
    assert_eq!(results[0].status, Some(500));
    let exchange = results[0].exchange.as_ref().unwrap();
    assert_eq!(exchange.response_body.as_deref(), Some("internal error"));
    assert!(exchange
        .request_headers
        .contains(&("Title".to_string(), "override".to_string())));
    assert!(results[1].success);
}

#[tokio::test]
async fn test_call_time_destinations_override_configured_ones() {
    let dir = tempdir().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let notifier = Notifier::builder(dir.path())
        .topics(["configured"])
        .base_url("http://ntfy.test")
        .write(false)
        .transport_override(transport.clone())
        .build()
        .unwrap();

    notifier
        .notify_to("x", &MessageOptions::new(), &[Destination::topic("adhoc")])
        .await
        .unwrap();

    assert_eq!(transport.get_call_count("http://ntfy.test/adhoc"), 1);
    assert_eq!(transport.get_call_count("http://ntfy.test/configured"), 0);
}

#[tokio::test]
async fn test_local_attachment_with_message_is_rejected_before_sending() {
    let dir = tempdir().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let notifier = Notifier::builder(dir.path())
        .topics(["t"])
        .write(false)
        .transport_override(transport.clone())
        .build()
        .unwrap();

    let result = notifier
        .notify_with("text", &MessageOptions::new().attach("./report.pdf"))
        .await;

    assert!(matches!(result, Err(NotifierError::AttachmentConflict)));
    assert!(transport.requests().is_empty());
}
