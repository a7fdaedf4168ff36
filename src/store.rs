//! On-disk INI configuration file.
//!
//! The file has two sections:
//!
//! ```ini
//! [notifier_init]
//! topics = my-secret-topic-1,mysecrettopic2
//! emails = you@foo.bar
//! base_url = https://ntfy.sh
//!
//! [notify_defaults]
//! title = Message from ntfy-wrapper
//! tags = fire
//! ```
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, so a reader never observes a partially written file. There is no
//! locking between concurrent writers.

use crate::core::{split_list, Configuration, Destination, Destinations, NotifyDefaults};
use crate::error::{NotifierError, Result};
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// File name used when the configured path is a directory.
pub const CONF_FILE_NAME: &str = ".ntfy.conf";
/// Section holding destinations and the base URL.
pub const INIT_SECTION: &str = "notifier_init";
/// Section holding default message fields.
pub const DEFAULTS_SECTION: &str = "notify_defaults";

const HEADER: &str = "\
# ntfy-wrapper configuration.
#
# [notifier_init] lists the destinations: comma separated topics and emails,
# and optionally the base_url of a self-hosted ntfy server.
# [notify_defaults] holds default message fields (title, priority, tags, click,
# attach, actions, icon). See https://ntfy.sh/docs/publish/ for their meaning.
#
# A topic is like a password: anyone who knows it can read your notifications.
# Keep this file out of version control.
";

/// The outcome of a mutation on the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Added,
    AlreadyPresent,
    /// A default was overwritten.
    Updated { previous: String },
    /// An entry was removed. Holds the removed value for defaults.
    Removed { previous: Option<String> },
    /// Nothing to remove. The file was left untouched.
    NotFound,
}

/// A handle to the configuration file at a resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Resolves `conf_path`: a directory maps to `<dir>/.ntfy.conf`, anything
    /// else is taken as the file path itself.
    pub fn locate(conf_path: impl AsRef<Path>) -> Self {
        let conf_path = conf_path.as_ref();
        let path = if conf_path.is_dir() {
            conf_path.join(CONF_FILE_NAME)
        } else {
            conf_path.to_path_buf()
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the file. Returns `None` if it does not exist.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Option<Configuration>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Configuration file does not exist");
                return Ok(None);
            }
            Err(e) => return Err(NotifierError::io(&self.path, e)),
        };
        let config = parse(&self.path, &text)?;
        debug!(
            destinations = config.destinations.len(),
            defaults = config.defaults.len(),
            "Loaded configuration file"
        );
        Ok(Some(config))
    }

    /// Atomically replaces the file with `config`, creating it if needed.
    #[instrument(skip(self, config), fields(path = %self.path.display()))]
    pub fn save(&self, config: &Configuration) -> Result<()> {
        let rendered = render(config);
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| NotifierError::io(&self.path, e))?;
        tmp.write_all(rendered.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| NotifierError::io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| NotifierError::io(&self.path, e.error))?;
        debug!("Wrote configuration file");
        Ok(())
    }

    /// Deletes the file. Returns `false` if there was nothing to delete.
    pub fn delete(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(NotifierError::io(&self.path, e)),
        }
    }

    /// Adds a destination, creating the file with stock defaults if absent.
    pub fn add_destination(&self, destination: Destination) -> Result<Mutation> {
        let mut config = self.load_or_stock()?;
        if !config.destinations.insert(destination) {
            return Ok(Mutation::AlreadyPresent);
        }
        self.save(&config)?;
        Ok(Mutation::Added)
    }

    pub fn remove_destination(&self, destination: &Destination) -> Result<Mutation> {
        let Some(mut config) = self.load()? else {
            return Ok(Mutation::NotFound);
        };
        if !config.destinations.remove(destination) {
            return Ok(Mutation::NotFound);
        }
        self.save(&config)?;
        Ok(Mutation::Removed { previous: None })
    }

    /// Sets a default, creating the file with stock defaults if absent.
    pub fn add_default(&self, key: &str, value: &str) -> Result<Mutation> {
        let mut config = self.load_or_stock()?;
        if config.defaults.get(key) == Some(value.trim()) {
            return Ok(Mutation::AlreadyPresent);
        }
        let previous = config.defaults.set(key, value);
        self.save(&config)?;
        Ok(match previous {
            Some(previous) => Mutation::Updated { previous },
            None => Mutation::Added,
        })
    }

    pub fn remove_default(&self, key: &str) -> Result<Mutation> {
        let Some(mut config) = self.load()? else {
            return Ok(Mutation::NotFound);
        };
        match config.defaults.remove(key) {
            Some(previous) => {
                self.save(&config)?;
                Ok(Mutation::Removed {
                    previous: Some(previous),
                })
            }
            None => Ok(Mutation::NotFound),
        }
    }

    fn load_or_stock(&self) -> Result<Configuration> {
        Ok(self.load()?.unwrap_or_else(|| Configuration {
            defaults: NotifyDefaults::stock(),
            ..Default::default()
        }))
    }
}

/// Parses the INI text of a configuration file.
///
/// Values are taken literally: quotes are kept and backslashes are not
/// escape sequences, so Windows paths survive. `path` is only used for error
/// reporting.
pub fn parse(path: &Path, text: &str) -> Result<Configuration> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, options).map_err(|e| NotifierError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut config = Configuration::default();
    if let Some(init) = ini.section(Some(INIT_SECTION)) {
        config.destinations = Destinations::from_parts(
            split_list(init.get("topics"), ','),
            split_list(init.get("emails"), ','),
        );
        config.base_url = init
            .get("base_url")
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from);
    }
    if let Some(defaults) = ini.section(Some(DEFAULTS_SECTION)) {
        for (key, value) in defaults.iter() {
            config.defaults.set(key, value);
        }
    }
    Ok(config)
}

/// Renders a configuration as INI text, preceded by a comment header.
pub fn render(config: &Configuration) -> String {
    let mut ini = Ini::new();
    let topics: Vec<&str> = config.destinations.topics().collect();
    if !topics.is_empty() {
        ini.with_section(Some(INIT_SECTION))
            .set("topics", topics.join(","));
    }
    let emails: Vec<&str> = config.destinations.emails().collect();
    if !emails.is_empty() {
        ini.with_section(Some(INIT_SECTION))
            .set("emails", emails.join(","));
    }
    if let Some(base_url) = &config.base_url {
        ini.with_section(Some(INIT_SECTION))
            .set("base_url", base_url.as_str());
    }
    for (key, value) in config.defaults.iter() {
        ini.with_section(Some(DEFAULTS_SECTION)).set(key, value);
    }

    let options = WriteOption {
        escape_policy: EscapePolicy::Nothing,
        ..WriteOption::default()
    };
    let mut body = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = ini.write_to_opt(&mut body, options);
    format!("{HEADER}\n{}", String::from_utf8_lossy(&body))
}
