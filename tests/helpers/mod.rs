#![allow(dead_code)]
//! Shared helpers for integration tests.

use ntfy_wrapper::store::CONF_FILE_NAME;
use std::fs;
use std::path::{Path, PathBuf};

/// A deterministic stand-in for the random topic generator.
pub fn fixed_topic() -> String {
    "test-generated-topic".to_string()
}

/// Writes `content` as the configuration file inside `dir` and returns its path.
pub fn write_conf(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(CONF_FILE_NAME);
    fs::write(&path, content).expect("failed to write test configuration");
    path
}

pub fn read_conf(dir: &Path) -> String {
    fs::read_to_string(dir.join(CONF_FILE_NAME)).expect("failed to read test configuration")
}
