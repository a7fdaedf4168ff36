//! Error types for configuration handling and dispatch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the caller by the library.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The configuration file exists but its content is not valid INI.
    #[error("failed to parse configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The configuration file could not be read or written.
    #[error("I/O error accessing configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// There is nothing to publish to.
    #[error("no topic or email is configured")]
    NoDestination,

    /// A local file is uploaded as the request body, so it cannot carry a message too.
    #[error("a local file attachment cannot be sent together with a message")]
    AttachmentConflict,

    /// The local file to attach could not be read.
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl NotifierError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NotifierError::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for library operations.
pub type Result<T, E = NotifierError> = std::result::Result<T, E>;

/// Why a single destination could not be notified.
///
/// These never abort a batch; they end up in the destination's `DispatchResult`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The request could not be sent or no response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
}
