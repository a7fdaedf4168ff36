//! Runtime settings for the command-line tool
//!
//! The notification configuration itself lives in the INI file handled by
//! `store`. This module holds the settings of one CLI invocation: where that
//! file is, which server to use, and how to log. They are layered with
//! `figment`: built-in defaults, then `NTFY_WRAPPER_*` environment variables,
//! then command-line arguments.

use crate::cli::Cli;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of the environment variables read by `Settings::load`.
pub const ENV_PREFIX: &str = "NTFY_WRAPPER_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// The logging filter for the process.
    pub log_level: String,
    /// Configuration file, or a directory holding `.ntfy.conf`.
    pub conf_path: PathBuf,
    /// Server override. `None` keeps the file's `base_url` or the public instance.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Capture request and response detail when sending.
    #[serde(default)]
    pub debug: bool,
}

impl Settings {
    /// Loads the settings for this invocation.
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    fn figment(cli: &Cli) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            // e.g. NTFY_WRAPPER_CONF_PATH=/etc/ntfy.conf
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(cli.clone())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            conf_path: PathBuf::from("."),
            base_url: None,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_env_or_args() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(&Cli::default())?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn arguments_override_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("NTFY_WRAPPER_LOG_LEVEL", "info");
            jail.set_env("NTFY_WRAPPER_CONF_PATH", "/from/env.conf");
            jail.set_env("NTFY_WRAPPER_DEBUG", "true");

            let cli = Cli {
                conf_path: Some(PathBuf::from("/from/cli.conf")),
                ..Default::default()
            };
            let settings = Settings::load(&cli)?;

            assert_eq!(settings.log_level, "info");
            assert_eq!(settings.conf_path, PathBuf::from("/from/cli.conf"));
            assert!(settings.debug);
            assert_eq!(settings.base_url, None);
            Ok(())
        });
    }
}
