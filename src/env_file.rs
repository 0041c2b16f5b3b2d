//! Reading `KEY=VALUE` environment files

use std::path::Path;

use log::debug;

use crate::config_file::StringList;
use crate::paths::{expand_path, file_exists};

/// Parses environment file contents into `KEY=VALUE` lines.
///
/// Blank lines and lines starting with `#` are dropped; everything else is
/// passed through trimmed but otherwise verbatim.
#[must_use]
pub fn parse_env_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads one environment file. A missing or unreadable file yields no lines.
#[must_use]
pub fn read_env_file(path: &Path) -> Vec<String> {
    if !file_exists(path) {
        debug!("Skipping missing env file {}", path.display());
        return Vec::new();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_env_lines(&contents),
        Err(e) => {
            debug!("Skipping unreadable env file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Reads every referenced environment file in order, resolving each against `base_dir`.
#[must_use]
pub fn read_env_files(references: &StringList, base_dir: &Path) -> Vec<String> {
    references
        .iter()
        .flat_map(|reference| read_env_file(&expand_path(reference, base_dir)))
        .collect()
}

/// Splits a `KEY=VALUE` line at the first `=`.
#[must_use]
pub fn split_env_line(line: &str) -> Option<(&str, &str)> {
    line.split_once('=').filter(|(key, _)| !key.is_empty())
}
