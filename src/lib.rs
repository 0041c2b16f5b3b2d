//! Core implementation of the Ahoy command runner
//!
//! Ahoy turns a YAML file of named shell commands into a project-specific CLI.
//! Commands can import further configuration files, which are loaded and
//! merged into one command tree. A separate read-only pass checks a
//! configuration against the running engine version and reports missing
//! files and unsupported features.

use std::path::{Path, PathBuf};

use log::debug;

use crate::commands::builder::TreeBuilder;
use crate::commands::node::ResolvedCommand;
use crate::config_file::{Config, ConfigError};
use crate::paths::config_dir;
use crate::version::Engine;

pub mod cli;
pub mod commands;
pub mod config_file;
pub mod env_file;
pub mod exec;
pub mod init;
pub mod logger;
pub mod paths;
pub mod report;
pub mod validation;
pub mod version;

/// A configuration file resolved into its invocable command tree
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The root configuration file.
    pub config_file: PathBuf,
    /// Directory commands run in.
    pub cwd: PathBuf,
    /// Root help text declared by the file.
    pub usage: String,
    pub commands: Vec<ResolvedCommand>,
}

/// Loads the configuration at `config_file` and builds its command tree.
///
/// # Errors
///
/// Returns `ConfigError` if the root file cannot be read or parsed, has an
/// unsupported API version, or if building the tree hits a fatal condition
/// such as a schema violation or a required import with no commands.
pub fn load_config(config_file: &Path, engine: &Engine) -> Result<LoadedConfig, ConfigError> {
    let cwd = config_dir(config_file);
    debug!(
        "Loading config file: {} (cwd: {}, engine: {})",
        config_file.display(),
        cwd.display(),
        engine.version()
    );
    let config = Config::from_file(config_file)?;
    let commands = TreeBuilder::new(engine).build(&config, config_file)?;
    Ok(LoadedConfig {
        config_file: config_file.to_path_buf(),
        cwd,
        usage: config.usage,
        commands,
    })
}
