use crate::core::{PublishRequest, Transport, TransportResponse};
use crate::error::DispatchError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Fake transport for testing
///
/// Responses are queued per URL. A URL with nothing queued answers `200`.
#[derive(Clone, Default)]
pub struct FakeTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<TransportResponse, DispatchError>>>>>,
    requests: Arc<Mutex<Vec<PublishRequest>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status for a URL
    pub fn add_status_response(&self, url: &str, status: u16, body: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(TransportResponse {
                status,
                body: body.to_string(),
            }));
    }

    /// Queue a connection-level failure for a URL
    pub fn add_error_response(&self, url: &str, error: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(url.to_string())
            .or_default()
            .push_back(Err(DispatchError::Transport(error.to_string())));
    }

    /// All requests executed so far, in completion order
    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the number of requests sent to a URL
    pub fn get_call_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &PublishRequest) -> Result<TransportResponse, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(&request.url).and_then(VecDeque::pop_front) {
            Some(response) => response,
            None => Ok(TransportResponse {
                status: 200,
                body: String::new(),
            }),
        }
    }
}
