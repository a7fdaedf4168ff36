//! Resolution of the effective configuration.
//!
//! Destinations come from exactly one source, in this order of precedence:
//!
//! 1. explicit topics or emails passed by the caller,
//! 2. the destinations listed in the configuration file,
//! 3. a single freshly generated topic.
//!
//! Default message fields are layered instead: stock defaults (only when no
//! file exists), then the file's `notify_defaults`, then caller defaults.

use crate::core::{Configuration, Destinations, NotifyDefaults};
use crate::error::{NotifierError, Result};
use crate::store::ConfigFile;
use crate::topic::generate_topic;
use std::path::Path;
use tracing::{instrument, warn};

/// Where the resolved destinations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationSource {
    Explicit,
    File,
    Generated,
}

/// Caller-supplied inputs to resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub topics: Vec<String>,
    pub emails: Vec<String>,
    pub defaults: NotifyDefaults,
    pub base_url: Option<String>,
    /// Persist the resolved state to the configuration file.
    pub write: bool,
    /// Log the version-control warning when writing.
    pub warnings: bool,
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            emails: Vec::new(),
            defaults: NotifyDefaults::new(),
            base_url: None,
            write: true,
            warnings: true,
        }
    }
}

/// The result of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: Configuration,
    pub file: ConfigFile,
    pub source: DestinationSource,
    /// The topic generated during this resolution, if any.
    pub generated: Option<String>,
}

/// Produces a `Configuration` from caller input and the configuration file.
pub struct ConfigResolver {
    file: ConfigFile,
    generator: fn() -> String,
}

impl ConfigResolver {
    pub fn new(conf_path: impl AsRef<Path>) -> Self {
        Self {
            file: ConfigFile::locate(conf_path),
            generator: generate_topic,
        }
    }

    /// Overrides the topic generator.
    pub fn with_generator(mut self, generator: fn() -> String) -> Self {
        self.generator = generator;
        self
    }

    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    #[instrument(skip_all, fields(path = %self.file.path().display()))]
    pub fn resolve(&self, request: ResolveRequest) -> Result<Resolution> {
        let on_disk = self.file.load()?;

        let (file_destinations, file_defaults, file_base_url) = match on_disk {
            Some(config) => (config.destinations, config.defaults, config.base_url),
            None => (Destinations::new(), NotifyDefaults::stock(), None),
        };

        let mut defaults = file_defaults;
        defaults.extend(request.defaults);
        let base_url = request.base_url.or(file_base_url);

        let explicit = Destinations::from_parts(request.topics, request.emails);
        let (destinations, source, generated) = if !explicit.is_empty() {
            (explicit, DestinationSource::Explicit, None)
        } else if !file_destinations.is_empty() {
            (file_destinations, DestinationSource::File, None)
        } else {
            let topic = (self.generator)();
            // Logged before any write so the topic is not lost if persisting fails.
            warn!(%topic, "No topic or email configured, generated a new topic");
            (
                Destinations::from_parts([topic.clone()], Vec::<String>::new()),
                DestinationSource::Generated,
                Some(topic),
            )
        };

        if destinations.is_empty() {
            return Err(NotifierError::NoDestination);
        }

        let config = Configuration {
            destinations,
            defaults,
            base_url,
        };

        if request.write {
            if request.warnings {
                warn!(
                    path = %self.file.path().display(),
                    "The configuration file may contain secret topics, keep it out of version control"
                );
            }
            self.file.save(&config)?;
        }

        Ok(Resolution {
            config,
            file: self.file.clone(),
            source,
            generated,
        })
    }
}
