use crate::config_file::{ConfigCommand, ConfigError, StringList};

/// What a command does when invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Runs `cmd` through the configuration's entrypoint.
    Run { cmd: String },
    /// Exposes the commands of other configuration files as children.
    Imports { imports: Vec<String>, optional: bool },
}

/// A validated command definition from one configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub hidden: bool,
    pub aliases: Vec<String>,
    pub env: StringList,
    pub kind: CommandKind,
}

impl TryFrom<(&str, &ConfigCommand)> for Command {
    type Error = ConfigError;

    fn try_from((name, config): (&str, &ConfigCommand)) -> Result<Self, Self::Error> {
        let violation = |reason: &str| ConfigError::SchemaViolation {
            command: name.to_string(),
            reason: reason.to_string(),
        };
        let kind = match (config.cmd(), &config.imports) {
            (None, None) => return Err(violation("has neither 'cmd' or 'imports' set")),
            (Some(_), Some(_)) => {
                return Err(violation(
                    "has both 'cmd' and 'imports' set, but only one is allowed",
                ));
            }
            (None, Some(imports)) if imports.is_empty() => {
                return Err(violation("has 'imports' set, but it is empty"));
            }
            (Some(cmd), None) => CommandKind::Run {
                cmd: cmd.to_string(),
            },
            (None, Some(imports)) => CommandKind::Imports {
                imports: imports.0.clone(),
                optional: config.optional,
            },
        };
        Ok(Command {
            name: name.to_string(),
            description: config.description.clone(),
            usage: config.usage.clone(),
            hidden: config.hide,
            aliases: config.aliases.clone(),
            env: config.env.clone(),
            kind,
        })
    }
}

/// The schema violation for a command definition, if it has one.
#[must_use]
pub fn schema_violation(name: &str, config: &ConfigCommand) -> Option<ConfigError> {
    Command::try_from((name, config)).err()
}
