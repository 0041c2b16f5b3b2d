use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config_file::FILENAME;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    ConfigExists(PathBuf),

    #[error("failed to write config file: {0}")]
    Io(#[from] std::io::Error),
}

/// The starter configuration written by `ahoy config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("example.ahoy.yml");

/// Writes the example configuration as `.ahoy.yml` into `dir`.
///
/// The file is written next to the target and renamed into place, so an
/// interrupted write never leaves a truncated config behind.
///
/// # Errors
///
/// Returns `InitError::ConfigExists` if a config already exists (unless
/// `force` is set), or `InitError::Io` on write failure.
pub fn run(dir: &Path, force: bool) -> Result<PathBuf, InitError> {
    let config_path = dir.join(FILENAME);
    if config_path.exists() && !force {
        return Err(InitError::ConfigExists(config_path));
    }

    let tmp_path = dir.join(format!("{FILENAME}.tmp"));
    std::fs::write(&tmp_path, EXAMPLE_CONFIG)?;
    if let Err(e) = std::fs::rename(&tmp_path, &config_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::Config;

    #[test]
    fn test_writes_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = run(dir.path(), false).unwrap();
        assert_eq!(path, dir.path().join(".ahoy.yml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), EXAMPLE_CONFIG);
        assert!(!dir.path().join(".ahoy.yml.tmp").exists());
    }

    #[test]
    fn test_existing_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(&path, "ahoyapi: v2\n").unwrap();

        assert!(matches!(run(dir.path(), false), Err(InitError::ConfigExists(p)) if p == path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ahoyapi: v2\n");

        run(dir.path(), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), EXAMPLE_CONFIG);
    }

    #[test]
    fn test_example_is_a_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = run(dir.path(), false).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.ahoyapi, "v2");
        assert!(config.commands.contains_key("hello"));
        assert!(config.commands["local"].optional);
    }
}
