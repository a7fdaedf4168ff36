//! Publishing notifications to the push service.
//!
//! `message` merges per-call fields with the configured defaults and turns
//! them into requests, `dispatcher` fans a message out to every destination,
//! and `http` is the production `Transport`.
pub mod dispatcher;
pub mod http;
pub mod message;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use dispatcher::Dispatcher;
pub use http::HttpTransport;
pub use message::{Message, MessageOptions};
