//! Configuration file handling for Ahoy

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only `ahoyapi` value this engine reads.
pub const SUPPORTED_API_VERSION: &str = "v2";

/// Name of the configuration file searched for in the working directory and its parents.
pub const FILENAME: &str = ".ahoy.yml";

/// Placeholder in an entrypoint token replaced by the command string.
pub const CMD_PLACEHOLDER: &str = "{{cmd}}";

/// Placeholder in an entrypoint token replaced by the command name.
pub const NAME_PLACEHOLDER: &str = "{{name}}";

/// Entrypoint used when a configuration does not declare one.
#[must_use]
pub fn default_entrypoint() -> Vec<String> {
    vec![
        "bash".to_string(),
        "-c".to_string(),
        CMD_PLACEHOLDER.to_string(),
        NAME_PLACEHOLDER.to_string(),
    ]
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "An ahoy config file couldn't be found at {}. You can create an example one by using 'ahoy config init'",
        .0.display()
    )]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {}: {source}", .path.display())]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error(
        "Ahoy only supports API version 'v2', but '{version}' given in {}",
        .path.display()
    )]
    UnsupportedVersion { version: String, path: PathBuf },
    #[error("Command [{command}] {reason}. Check your yaml file.")]
    SchemaViolation { command: String, reason: String },
    #[error(
        "Command [{command}] has 'imports' set, but no commands were found.{}",
        missing_import_help(.missing, .optional_supported)
    )]
    MissingImport {
        command: String,
        missing: Vec<String>,
        optional_supported: bool,
    },
    #[error(
        "Command [{command}] uses 'optional: true' but this Ahoy version ({version}) doesn't support optional imports.\n\nThis feature requires Ahoy {required} or later.\n\nSolutions:\n1. Upgrade Ahoy to the latest version\n2. Remove 'optional: true' and create the missing import files\n\nFor more help, run: ahoy config validate"
    )]
    OptionalImportsUnsupported {
        command: String,
        version: String,
        required: String,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn missing_import_help(missing: &[String], optional_supported: &bool) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let mut help = format!(
        "\n\nMissing import files: {}\n\nSolutions:\n1. Create the missing files\n2. Mark imports as optional with 'optional: true'",
        missing.join(", ")
    );
    if !*optional_supported {
        help.push_str(&format!(
            "\n3. Upgrade Ahoy to {}+ for optional import support",
            crate::version::Feature::OptionalImports.required_version()
        ));
    }
    help.push_str("\n\nFor more help, run: ahoy config validate");
    help
}

/// A list of strings that may also be written as a single scalar in YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<OneOrMany>")]
pub struct StringList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<Option<OneOrMany>> for StringList {
    fn from(value: Option<OneOrMany>) -> Self {
        match value {
            Some(OneOrMany::One(s)) => StringList(vec![s]),
            Some(OneOrMany::Many(v)) => StringList(v),
            None => StringList::default(),
        }
    }
}

impl StringList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Configuration for a single command, as written in the file
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ConfigCommand {
    pub description: String,
    pub usage: String,
    pub cmd: Option<String>,
    pub env: StringList,
    pub hide: bool,
    pub optional: bool,
    pub imports: Option<StringList>,
    pub aliases: Vec<String>,
}

impl ConfigCommand {
    /// The command string, treating an empty string as unset.
    #[must_use]
    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref().filter(|c| !c.is_empty())
    }
}

/// Root configuration structure for one Ahoy file
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub usage: String,
    pub ahoyapi: String,
    /// Keyed by command name; iteration is always in lexical order.
    pub commands: BTreeMap<String, ConfigCommand>,
    pub entrypoint: Option<Vec<String>>,
    pub env: StringList,
}

impl Config {
    /// Loads a configuration file, rejecting unsupported API versions and
    /// filling in the default entrypoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read,
    /// `ConfigError::Yaml` if parsing fails, or `ConfigError::UnsupportedVersion`
    /// if `ahoyapi` is not the supported value.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let mut config = Self::parse_file(file)?;
        if config.ahoyapi != SUPPORTED_API_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                version: config.ahoyapi,
                path: file.to_path_buf(),
            });
        }
        if config.entrypoint.is_none() {
            config.entrypoint = Some(default_entrypoint());
        }
        Ok(config)
    }

    /// Reads and parses a configuration file without checking its API version.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml` if parsing fails.
    pub fn parse_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        Self::parse_str(&contents, file)
    }

    /// Parses configuration text; `file` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if the text is not a valid configuration.
    pub fn parse_str(contents: &str, file: &Path) -> Result<Config, ConfigError> {
        // An empty document deserializes as null
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Yaml {
            source: e,
            path: file.to_path_buf(),
        })
    }

    /// The declared entrypoint, or the default one.
    #[must_use]
    pub fn entrypoint(&self) -> Vec<String> {
        self.entrypoint.clone().unwrap_or_else(default_entrypoint)
    }

    /// Locates the configuration file to use.
    ///
    /// An explicit path must exist. Without one, the current directory and its
    /// parents are searched for `.ahoy.yml`; `Ok(None)` means none was found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if an explicit path does not exist,
    /// or `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined.
    pub fn find_config(explicit: Option<&str>) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(file) = explicit.filter(|f| !f.is_empty()) {
            let path = PathBuf::from(file);
            if !path.exists() {
                return Err(ConfigError::ConfigNotFound(path));
            }
            return Ok(Some(path));
        }
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        Ok(Self::find_config_from(&cwd))
    }

    /// Searches `start` and its parents for `.ahoy.yml`.
    #[must_use]
    pub fn find_config_from(start: &Path) -> Option<PathBuf> {
        debug!("Searching for config file in {}", start.display());
        let mut path = start.to_path_buf();
        loop {
            let candidate = path.join(FILENAME);
            if candidate.exists() {
                debug!("Found config file: {}", candidate.display());
                return Some(candidate);
            }
            if !path.pop() {
                debug!("Can't find an {FILENAME} file.");
                return None;
            }
        }
    }
}
