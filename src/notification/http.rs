//! A `Transport` that talks to an ntfy server over HTTP.

use crate::core::{Method, PublishRequest, Transport, TransportResponse};
use crate::error::{DispatchError, NotifierError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{error, instrument, trace, warn};

/// Sends publish requests with `reqwest`.
///
/// No request timeout is configured: a call waits as long as the server does.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ntfy-wrapper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, DispatchError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DispatchError::Transport(format!("invalid header name {name:?}: {e}")))?;
            let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| {
                DispatchError::Transport(format!("invalid value for header {name}: {e}"))
            })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: &PublishRequest) -> Result<TransportResponse, DispatchError> {
        let headers = Self::header_map(&request.headers)?;
        let builder = match request.method {
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
        };

        let response = builder
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to ntfy failed");
                DispatchError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status, error = %e, "Failed to read ntfy response body");
                format!("<failed to read response body: {e}>")
            }
        };
        trace!(status, %body, "Received response");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod http_transport_tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String) -> PublishRequest {
        PublishRequest {
            method: Method::Post,
            url,
            headers: vec![
                ("Title".to_string(), "Backup done".to_string()),
                ("Tags".to_string(), "tada".to_string()),
            ],
            body: b"all good".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_execute_sends_headers_and_body() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/backups"))
            .and(header("Title", "Backup done"))
            .and(header("Tags", "tada"))
            .and(body_string("all good"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":\"x\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();

        // Act
        let response = transport
            .execute(&request(format!("{}/backups", server.uri())))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{\"id\":\"x\"}");
    }

    #[tokio::test]
    async fn test_execute_returns_error_statuses_as_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport
            .execute(&request(format!("{}/t", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn test_execute_put_for_uploads() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/files"))
            .and(header("Filename", "report.txt"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let upload = PublishRequest {
            method: Method::Put,
            url: format!("{}/files", server.uri()),
            headers: vec![("Filename".to_string(), "report.txt".to_string())],
            body: b"contents".to_vec(),
        };

        assert_eq!(transport.execute(&upload).await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let transport = HttpTransport::new().unwrap();
        let result = transport
            .execute(&request("http://127.0.0.1:1/topic".to_string()))
            .await;

        assert!(matches!(result, Err(DispatchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_truncated_response_body_is_reported() {
        // A server that promises more body than it sends, then hangs up.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            while !received.ends_with(b"all good") {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before sending the body");
                received.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let transport = HttpTransport::new().unwrap();
        let response = transport
            .execute(&request(format!("http://{addr}/topic")))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 200);
        assert!(
            response.body.starts_with("<failed to read response body"),
            "{}",
            response.body
        );
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let result = HttpTransport::header_map(&[("Bad Header".to_string(), "v".to_string())]);
        assert!(matches!(result, Err(DispatchError::Transport(_))));
    }
}
