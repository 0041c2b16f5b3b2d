//! Import resolution
//!
//! Resolving an import list happens in two separate steps: existence filtering
//! decides which referenced files participate at all (a missing file is simply
//! skipped, which is how public and private command files coexist), then an
//! ordered merge combines the commands of the participating files by name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::commands::builder::{TreeBuilder, chain_key};
use crate::commands::node::ResolvedCommand;
use crate::config_file::{Config, ConfigError};
use crate::paths::{expand_path, file_exists};

/// Resolves import references against `base_dir`, keeping only files that exist.
///
/// Empty references are ignored. Order is preserved.
#[must_use]
pub fn existing_imports(references: &[String], base_dir: &Path) -> Vec<PathBuf> {
    references
        .iter()
        .filter(|reference| !reference.is_empty())
        .map(|reference| expand_path(reference, base_dir))
        .filter(|path| {
            let exists = file_exists(path);
            if !exists {
                debug!("Skipping import {}: file not found", path.display());
            }
            exists
        })
        .collect()
}

/// The references (as written) whose files do not exist.
#[must_use]
pub fn missing_imports(references: &[String], base_dir: &Path) -> Vec<String> {
    references
        .iter()
        .filter(|reference| !reference.is_empty())
        .filter(|reference| !file_exists(&expand_path(reference, base_dir)))
        .cloned()
        .collect()
}

/// Merges command sets by name, later sets replacing earlier commands of the
/// same name wholesale. The result is sorted by name.
#[must_use]
pub fn merge_by_name<I>(sets: I) -> Vec<ResolvedCommand>
where
    I: IntoIterator<Item = Vec<ResolvedCommand>>,
{
    let mut merged = BTreeMap::new();
    for set in sets {
        for command in set {
            merged.insert(command.name.clone(), command);
        }
    }
    merged.into_values().collect()
}

impl TreeBuilder<'_> {
    /// Resolves a command's imports into the merged set of imported commands.
    ///
    /// Files that fail to load are logged and skipped; they never abort the
    /// resolution of the remaining imports.
    ///
    /// # Errors
    ///
    /// Propagates fatal build errors from an imported file, such as a schema
    /// violation or a required import of its own that yields nothing.
    pub fn resolve_imports(
        &self,
        references: &[String],
        base_dir: &Path,
    ) -> Result<Vec<ResolvedCommand>, ConfigError> {
        self.resolve_imports_in(references, base_dir, &mut Vec::new())
    }

    pub(crate) fn resolve_imports_in(
        &self,
        references: &[String],
        base_dir: &Path,
        chain: &mut Vec<PathBuf>,
    ) -> Result<Vec<ResolvedCommand>, ConfigError> {
        let mut sets = Vec::new();
        for path in existing_imports(references, base_dir) {
            let key = chain_key(&path);
            if chain.contains(&key) {
                error!(
                    "Could not load imported config '{}': import cycle detected",
                    path.display()
                );
                continue;
            }
            let config = match Config::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    error!("Could not load imported config '{}': {e}", path.display());
                    continue;
                }
            };
            chain.push(key);
            let built = self.build_in(&config, &path, chain);
            chain.pop();
            sets.push(built?);
        }
        Ok(merge_by_name(sets))
    }
}
