use std::path::{Path, PathBuf};

use log::debug;

use crate::commands::command::{Command, CommandKind};
use crate::commands::imports::missing_imports;
use crate::commands::node::{Action, Invocation, ResolvedCommand};
use crate::config_file::{CMD_PLACEHOLDER, Config, ConfigError, NAME_PLACEHOLDER};
use crate::env_file::read_env_files;
use crate::paths::config_dir;
use crate::version::{Engine, Feature};

/// Substitutes `{{cmd}}` and `{{name}}` tokens of an entrypoint.
#[must_use]
pub fn substitute_entrypoint(entrypoint: &[String], cmd: &str, name: &str) -> Vec<String> {
    entrypoint
        .iter()
        .map(|token| match token.as_str() {
            CMD_PLACEHOLDER => cmd.to_string(),
            NAME_PLACEHOLDER => name.to_string(),
            _ => token.clone(),
        })
        .collect()
}

/// Turns loaded configuration into the invocable command tree
pub struct TreeBuilder<'a> {
    engine: &'a Engine,
}

impl<'a> TreeBuilder<'a> {
    #[must_use]
    pub fn new(engine: &'a Engine) -> Self {
        TreeBuilder { engine }
    }

    /// Builds the command tree for `config`, which was loaded from `config_file`.
    ///
    /// Commands come out sorted by name. Relative references (env files and
    /// imports) resolve against the directory of the file declaring them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SchemaViolation` for a command with conflicting or
    /// missing `cmd`/`imports`, `ConfigError::MissingImport` if a required
    /// import yields no commands, and `ConfigError::OptionalImportsUnsupported`
    /// if an optional import yields none on an engine without that feature.
    pub fn build(
        &self,
        config: &Config,
        config_file: &Path,
    ) -> Result<Vec<ResolvedCommand>, ConfigError> {
        let mut chain = vec![chain_key(config_file)];
        self.build_in(config, config_file, &mut chain)
    }

    pub(crate) fn build_in(
        &self,
        config: &Config,
        config_file: &Path,
        chain: &mut Vec<PathBuf>,
    ) -> Result<Vec<ResolvedCommand>, ConfigError> {
        let base_dir = config_dir(config_file);
        let global_env = read_env_files(&config.env, &base_dir);
        let entrypoint = config.entrypoint();

        let mut nodes = Vec::with_capacity(config.commands.len());
        for (name, definition) in &config.commands {
            let command = Command::try_from((name.as_str(), definition))?;
            let action = match &command.kind {
                CommandKind::Run { cmd } => {
                    let mut env = global_env.clone();
                    env.extend(read_env_files(&command.env, &base_dir));
                    Action::Run(Invocation {
                        argv: substitute_entrypoint(&entrypoint, cmd, name),
                        env,
                        source: config_file.to_path_buf(),
                    })
                }
                CommandKind::Imports { imports, optional } => {
                    let children = self.resolve_imports_in(imports, &base_dir, chain)?;
                    if children.is_empty() {
                        self.check_empty_import(&command, imports, *optional, &base_dir)?;
                        debug!("Skipping optional command [{name}]: no imported commands found");
                        continue;
                    }
                    Action::Group(children)
                }
            };
            nodes.push(ResolvedCommand {
                name: command.name,
                usage: command.usage,
                description: command.description,
                aliases: command.aliases,
                hidden: command.hidden,
                action,
            });
        }
        Ok(nodes)
    }

    /// Decides whether an import command without any resolved children may be dropped.
    fn check_empty_import(
        &self,
        command: &Command,
        imports: &[String],
        optional: bool,
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        let optional_supported = self.engine.supports(Feature::OptionalImports);
        if !optional {
            return Err(ConfigError::MissingImport {
                command: command.name.clone(),
                missing: missing_imports(imports, base_dir),
                optional_supported,
            });
        }
        if !optional_supported {
            return Err(ConfigError::OptionalImportsUnsupported {
                command: command.name.clone(),
                version: self.engine.version().to_string(),
                required: Feature::OptionalImports.required_version().to_string(),
            });
        }
        Ok(())
    }
}

/// Key identifying a file in the chain of files being built.
pub(crate) fn chain_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::{ConfigCommand, StringList};

    fn run_command(cmd: &str) -> ConfigCommand {
        ConfigCommand {
            cmd: Some(cmd.to_string()),
            ..Default::default()
        }
    }

    fn config_with(commands: Vec<(&str, ConfigCommand)>) -> Config {
        Config {
            ahoyapi: "v2".to_string(),
            commands: commands
                .into_iter()
                .map(|(name, c)| (name.to_string(), c))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_substitute_entrypoint() {
        let entrypoint: Vec<String> = ["bash", "-c", "{{cmd}}", "{{name}}", "x{{cmd}}"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            substitute_entrypoint(&entrypoint, "echo hi", "greet"),
            vec!["bash", "-c", "echo hi", "greet", "x{{cmd}}"]
        );
    }

    #[test]
    fn test_commands_sorted_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut hidden = run_command("echo b");
        hidden.hide = true;
        hidden.aliases = vec!["bee".to_string()];
        hidden.usage = "Runs b".to_string();
        let config = config_with(vec![("zeta", run_command("echo z")), ("beta", hidden)]);

        let engine = Engine::current();
        let nodes = TreeBuilder::new(&engine)
            .build(&config, &dir.path().join(".ahoy.yml"))
            .unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "zeta"]);
        assert!(nodes[0].hidden);
        assert_eq!(nodes[0].aliases, vec!["bee"]);
        assert_eq!(nodes[0].usage, "Runs b");
        assert_eq!(
            nodes[0].invocation().unwrap().argv,
            vec!["bash", "-c", "echo b", "beta"]
        );
    }

    #[test]
    fn test_command_env_after_global_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=global\nB=global\n").unwrap();
        std::fs::write(dir.path().join(".env.cmd"), "B=command\n").unwrap();
        let mut command = run_command("env");
        command.env = StringList(vec![".env.cmd".to_string()]);
        let mut config = config_with(vec![("show", command), ("plain", run_command("env"))]);
        config.env = StringList(vec![".env".to_string()]);

        let engine = Engine::current();
        let nodes = TreeBuilder::new(&engine)
            .build(&config, &dir.path().join(".ahoy.yml"))
            .unwrap();
        assert_eq!(nodes[0].invocation().unwrap().env, vec!["A=global", "B=global"]);
        assert_eq!(
            nodes[1].invocation().unwrap().env,
            vec!["A=global", "B=global", "B=command"]
        );
    }

    #[test]
    fn test_schema_violation_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with(vec![("ok", run_command("true")), ("broken", ConfigCommand::default())]);
        let engine = Engine::current();
        let result = TreeBuilder::new(&engine).build(&config, &dir.path().join(".ahoy.yml"));
        match result {
            Err(ConfigError::SchemaViolation { command, .. }) => assert_eq!(command, "broken"),
            other => panic!("Expected SchemaViolation, got: {other:?}"),
        }
    }

    #[test]
    fn test_required_import_missing_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        let group = ConfigCommand {
            imports: Some(StringList(vec!["private.ahoy.yml".to_string()])),
            ..Default::default()
        };
        let config = config_with(vec![("private", group)]);
        let engine = Engine::current();
        let result = TreeBuilder::new(&engine).build(&config, &dir.path().join(".ahoy.yml"));
        match result {
            Err(ConfigError::MissingImport { command, missing, .. }) => {
                assert_eq!(command, "private");
                assert_eq!(missing, vec!["private.ahoy.yml"]);
            }
            other => panic!("Expected MissingImport, got: {other:?}"),
        }
    }

    #[test]
    fn test_optional_import_missing() {
        let dir = tempfile::tempdir().unwrap();
        let group = ConfigCommand {
            imports: Some(StringList(vec!["private.ahoy.yml".to_string()])),
            optional: true,
            ..Default::default()
        };
        let config = config_with(vec![("private", group), ("run", run_command("true"))]);
        let config_file = dir.path().join(".ahoy.yml");

        let engine = Engine::new("v2.2.0");
        let nodes = TreeBuilder::new(&engine).build(&config, &config_file).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "run");

        let old = Engine::new("v2.1.0");
        let result = TreeBuilder::new(&old).build(&config, &config_file);
        match result {
            Err(ConfigError::OptionalImportsUnsupported { command, version, .. }) => {
                assert_eq!(command, "private");
                assert_eq!(version, "v2.1.0");
            }
            other => panic!("Expected OptionalImportsUnsupported, got: {other:?}"),
        }
    }
}
