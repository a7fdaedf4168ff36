//! ntfy-wrapper - a configuration-file driven client for ntfy
//!
//! This library resolves where notifications go (topics, emails, server) from
//! constructor arguments and an INI file, keeps that file up to date, and
//! publishes messages to every destination through the ntfy HTTP API.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod notification;
pub mod notifier;
pub mod resolver;
pub mod store;
pub mod topic;

// Re-export core types for convenience
pub use crate::core::*;
pub use error::{DispatchError, NotifierError, Result};
pub use notification::{Dispatcher, HttpTransport, MessageOptions};
pub use notifier::{Notifier, NotifierBuilder};
pub use resolver::{ConfigResolver, DestinationSource, Resolution, ResolveRequest};
pub use store::{ConfigFile, Mutation};
