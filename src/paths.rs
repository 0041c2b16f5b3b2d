//! Resolution of path references found in configuration files

use std::path::{Path, PathBuf};

/// Resolve a path reference against the directory of the file that declared it.
///
/// Absolute references are returned unchanged, `~` expands to the user's home
/// directory and anything else is joined onto `base_dir`. The filesystem is
/// never consulted.
#[must_use]
pub fn expand_path(reference: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Some(remainder) = reference.strip_prefix('~') {
        return match dirs::home_dir() {
            Some(home) => home.join(remainder.trim_start_matches('/')),
            None => path.to_path_buf(),
        };
    }
    base_dir.join(path)
}

/// True if `path` exists and is not a directory.
#[must_use]
pub fn file_exists(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| !m.is_dir())
}

/// Directory that relative references inside `config_file` resolve against.
#[must_use]
pub fn config_dir(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
