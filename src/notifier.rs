//! The client object tying configuration resolution and dispatch together.

use crate::core::{Configuration, Destination, DispatchResult, NotifyDefaults, Transport};
use crate::error::{NotifierError, Result};
use crate::notification::{Dispatcher, HttpTransport, MessageOptions};
use crate::resolver::{ConfigResolver, DestinationSource, ResolveRequest};
use crate::store::{ConfigFile, Mutation};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// A configured notification client.
///
/// ```no_run
/// # async fn run() -> ntfy_wrapper::Result<()> {
/// use ntfy_wrapper::Notifier;
///
/// let notifier = Notifier::builder(".").build()?;
/// notifier.notify("Training finished").await?;
/// # Ok(())
/// # }
/// ```
pub struct Notifier {
    config: Configuration,
    file: ConfigFile,
    source: DestinationSource,
    generated: Option<String>,
    dispatcher: Dispatcher,
}

impl Notifier {
    /// Creates a builder reading and writing its configuration at `conf_path`,
    /// either a file or a directory holding `.ntfy.conf`.
    pub fn builder(conf_path: impl Into<PathBuf>) -> NotifierBuilder {
        NotifierBuilder::new(conf_path)
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn conf_path(&self) -> &Path {
        self.file.path()
    }

    pub fn destinations(&self) -> &[Destination] {
        self.config.destinations.as_slice()
    }

    pub fn source(&self) -> DestinationSource {
        self.source
    }

    /// The topic generated while building this notifier, if none was configured.
    pub fn generated_topic(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    /// Sends `message` with the default fields to every configured destination.
    pub async fn notify(&self, message: &str) -> Result<Vec<DispatchResult>> {
        self.notify_with(message, &MessageOptions::default()).await
    }

    /// Sends `message` with per-call fields layered over the defaults.
    pub async fn notify_with(
        &self,
        message: &str,
        options: &MessageOptions,
    ) -> Result<Vec<DispatchResult>> {
        self.notify_to(message, options, self.destinations()).await
    }

    /// Like `notify_with`, but to the given destinations instead of the configured ones.
    #[instrument(skip_all)]
    pub async fn notify_to(
        &self,
        message: &str,
        options: &MessageOptions,
        destinations: &[Destination],
    ) -> Result<Vec<DispatchResult>> {
        let fields = options.clone().with_defaults(&self.config.defaults);
        self.dispatcher
            .send(message, &fields, destinations, Some(self.config.base_url()))
            .await
    }

    /// Adds a destination and persists the configuration.
    pub fn add_destination(&mut self, destination: Destination) -> Result<Mutation> {
        if !self.config.destinations.insert(destination) {
            return Ok(Mutation::AlreadyPresent);
        }
        self.write_to_conf()?;
        Ok(Mutation::Added)
    }

    /// Removes a destination and persists the configuration.
    ///
    /// Removing an unknown destination is a no-op reporting `NotFound`.
    pub fn remove_destination(&mut self, destination: &Destination) -> Result<Mutation> {
        if !self.config.destinations.remove(destination) {
            return Ok(Mutation::NotFound);
        }
        self.write_to_conf()?;
        Ok(Mutation::Removed { previous: None })
    }

    pub fn clear_topics(&mut self) -> Result<()> {
        self.config.destinations.clear_topics();
        self.write_to_conf()
    }

    pub fn clear_emails(&mut self) -> Result<()> {
        self.config.destinations.clear_emails();
        self.write_to_conf()
    }

    pub fn add_default(&mut self, key: &str, value: &str) -> Result<Mutation> {
        if self.config.defaults.get(key) == Some(value.trim()) {
            return Ok(Mutation::AlreadyPresent);
        }
        let previous = self.config.defaults.set(key, value);
        self.write_to_conf()?;
        Ok(match previous {
            Some(previous) => Mutation::Updated { previous },
            None => Mutation::Added,
        })
    }

    pub fn remove_default(&mut self, key: &str) -> Result<Mutation> {
        match self.config.defaults.remove(key) {
            Some(previous) => {
                self.write_to_conf()?;
                Ok(Mutation::Removed {
                    previous: Some(previous),
                })
            }
            None => Ok(Mutation::NotFound),
        }
    }

    /// Writes the current configuration to the configuration file.
    pub fn write_to_conf(&self) -> Result<()> {
        self.file.save(&self.config)
    }
}

impl fmt::Display for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<&str> = self.config.destinations.topics().collect();
        if !topics.is_empty() {
            writeln!(f, "Notifier will push to topics: {}", topics.join(", "))?;
        }
        let emails: Vec<&str> = self.config.destinations.emails().collect();
        if !emails.is_empty() {
            writeln!(f, "Notifier will send emails to: {}", emails.join(", "))?;
        }
        writeln!(f, "Server: {}", self.config.base_url())?;
        write!(f, "Configuration file: {}", self.file.path().display())
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("config", &self.config)
            .field("file", &self.file)
            .field("source", &self.source)
            .field("debug", &self.dispatcher.is_debug())
            .finish()
    }
}

/// Builder for `Notifier`.
///
/// Also allows overriding the transport and the topic generator for testing.
pub struct NotifierBuilder {
    conf_path: PathBuf,
    request: ResolveRequest,
    verbose: bool,
    debug: bool,
    transport_override: Option<Arc<dyn Transport>>,
    generator_override: Option<fn() -> String>,
}

impl NotifierBuilder {
    pub fn new(conf_path: impl Into<PathBuf>) -> Self {
        Self {
            conf_path: conf_path.into(),
            request: ResolveRequest::default(),
            verbose: false,
            debug: false,
            transport_override: None,
            generator_override: None,
        }
    }

    /// Topics to publish to. Non-empty topics or emails replace the file's destinations.
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.emails = emails.into_iter().map(Into::into).collect();
        self
    }

    /// Default message fields, layered over the file's.
    pub fn defaults(mut self, defaults: NotifyDefaults) -> Self {
        self.request.defaults = defaults;
        self
    }

    pub fn default_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.request.defaults.set(key, value);
        self
    }

    /// Server to publish to, overriding the file's `base_url`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.request.base_url = Some(base_url.into());
        self
    }

    /// Whether to persist the resolved configuration. Defaults to `true`.
    pub fn write(mut self, write: bool) -> Self {
        self.request.write = write;
        self
    }

    /// Whether to log the version-control warning when writing. Defaults to `true`.
    pub fn warnings(mut self, warnings: bool) -> Self {
        self.request.warnings = warnings;
        self
    }

    /// Log a description of the notifier once built.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Capture full request and response detail in dispatch results.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the HTTP transport for testing.
    pub fn transport_override(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    /// Overrides the topic generator for testing.
    pub fn generator_override(mut self, generator: fn() -> String) -> Self {
        self.generator_override = Some(generator);
        self
    }

    /// Resolves the configuration, persists it if requested, and returns the notifier.
    #[instrument(skip_all, fields(conf_path = %self.conf_path.display()))]
    pub fn build(self) -> Result<Notifier> {
        let mut resolver = ConfigResolver::new(&self.conf_path);
        if let Some(generator) = self.generator_override {
            resolver = resolver.with_generator(generator);
        }
        let resolution = resolver.resolve(self.request)?;

        let transport = match self.transport_override {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?) as Arc<dyn Transport>,
        };

        if resolution.config.destinations.is_empty() {
            return Err(NotifierError::NoDestination);
        }

        let notifier = Notifier {
            config: resolution.config,
            file: resolution.file,
            source: resolution.source,
            generated: resolution.generated,
            dispatcher: Dispatcher::new(transport).with_debug(self.debug),
        };

        if self.verbose {
            info!("{notifier}");
        }
        Ok(notifier)
    }
}
