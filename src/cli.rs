//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments using the `clap` crate.
//! Global options are also exposed as a `figment` provider so they can be
//! layered over environment variables when building `Settings`.

use clap::{Args, Parser, Subcommand};
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Send push notifications through ntfy, configured from an INI file.
#[derive(Parser, Debug, Default, Clone, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file, or a directory holding `.ntfy.conf`. Defaults to `.`.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub conf_path: Option<PathBuf>,

    /// Base URL of the ntfy server, overriding the configuration file.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Logging filter, e.g. `info` or `ntfy_wrapper=debug`.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Show full request and response detail when sending.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Default, Clone, PartialEq)]
pub enum Command {
    /// Create the configuration file with a freshly generated topic.
    ///
    /// The file should not be tracked by version control: it holds your topic.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },
    /// Delete the configuration file.
    Clean {
        /// Do not ask for confirmation.
        #[arg(long)]
        force: bool,
    },
    /// Add a topic, an email or a default notification value.
    #[command(subcommand)]
    Add(AddCommand),
    /// Remove a topic, an email or a default notification value.
    #[command(subcommand)]
    Remove(RemoveCommand),
    /// Send a notification to the configured (or given) destinations.
    Send(SendArgs),
    /// Generate a random topic name.
    NewTopic {
        /// Append the topic to the configuration file.
        #[arg(long)]
        save: bool,
    },
    /// Describe the configuration file.
    #[default]
    Show,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AddCommand {
    /// Add a topic to publish to.
    Topic { topic: String },
    /// Add an email address to relay notifications to.
    Email { email: String },
    /// Set a default notification value (title, priority, tags, ...).
    Default { key: String, value: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RemoveCommand {
    Topic { topic: String },
    Email { email: String },
    Default { key: String },
}

/// Options of the `send` command. Unset options fall back to the defaults
/// from the configuration file. See https://ntfy.sh/docs/publish/.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct SendArgs {
    /// The message to send. Leave empty when attaching a local file.
    pub message: Option<String>,

    /// Comma-separated topics, replacing the configured destinations.
    #[arg(long, value_delimiter = ',')]
    pub topics: Vec<String>,

    /// Comma-separated emails, replacing the configured destinations.
    #[arg(long, value_delimiter = ',')]
    pub emails: Vec<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// 1 (min) to 5 (max).
    #[arg(long)]
    pub priority: Option<String>,

    /// Comma-separated tags or emoji short codes.
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// URL to open when the notification is clicked.
    #[arg(long)]
    pub click: Option<String>,

    /// URL or local file to attach.
    #[arg(long)]
    pub attach: Option<String>,

    /// An action button, e.g. `view, Open, https://example.com`. Repeatable.
    #[arg(long = "action")]
    pub actions: Vec<String>,

    /// URL of the notification icon.
    #[arg(long)]
    pub icon: Option<String>,

    /// Print the dispatch results as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(path) = &self.conf_path {
            dict.insert(
                "conf_path".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }

        if let Some(url) = &self.base_url {
            dict.insert("base_url".into(), Value::from(url.clone()));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        // Only an explicit flag overrides the environment.
        if self.debug {
            dict.insert("debug".into(), Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_lists() {
        let cli = Cli::try_parse_from([
            "ntfy-wrapper",
            "send",
            "hello",
            "--topics",
            "a,b",
            "--tags",
            "fire,tada",
            "--action",
            "view, Open, https://example.com",
            "--conf-path",
            "/tmp/x.conf",
        ])
        .unwrap();

        assert_eq!(cli.conf_path, Some(PathBuf::from("/tmp/x.conf")));
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.message.as_deref(), Some("hello"));
        assert_eq!(args.topics, vec!["a", "b"]);
        assert_eq!(args.tags, vec!["fire", "tada"]);
        assert_eq!(args.actions, vec!["view, Open, https://example.com"]);
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["ntfy-wrapper", "add", "default", "priority", "4"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Add(AddCommand::Default {
                key: "priority".to_string(),
                value: "4".to_string()
            })
        );
    }

    #[test]
    fn provider_only_emits_given_options() {
        let cli = Cli {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let data = cli.data().unwrap();
        let dict = &data[&Profile::Default];
        assert_eq!(dict.len(), 1);
        assert!(dict.contains_key("log_level"));
    }
}
