//! Compatibility validation of a configuration against an engine version
//!
//! Validation never fails and never touches the command tree: it collects
//! every problem it can find into a [`ValidationResult`].

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::commands::command::schema_violation;
use crate::config_file::{Config, ConfigCommand, ConfigError, SUPPORTED_API_VERSION};
use crate::paths::{config_dir, expand_path, file_exists};
use crate::version::{Engine, Feature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    VersionMismatch,
    MissingFile,
    SchemaError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One problem found in a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub file: PathBuf,
    pub field: String,
    pub feature: Option<Feature>,
    pub required_version: Option<String>,
    pub current_version: Option<String>,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(
        kind: IssueKind,
        severity: Severity,
        message: String,
        file: &Path,
        field: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            kind,
            severity,
            message,
            file: file.to_path_buf(),
            field: field.into(),
            feature: None,
            required_version: None,
            current_version: None,
            suggestion: None,
        }
    }

    fn gated(mut self, feature: Feature, engine: &Engine) -> Self {
        self.feature = Some(feature);
        self.required_version = Some(feature.required_version().to_string());
        self.current_version = Some(engine.version().to_string());
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// All issues found, in the order they were detected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub has_error: bool,
}

impl ValidationResult {
    fn push(&mut self, issue: ValidationIssue) {
        self.has_error |= issue.severity == Severity::Error;
        self.issues.push(issue);
    }

    fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Number of issues with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Validates `config`, loaded from `config_file`, against `engine`.
#[must_use]
pub fn validate(config: &Config, config_file: &Path, engine: &Engine) -> ValidationResult {
    let mut result = ValidationResult::default();
    let base_dir = config_dir(config_file);

    if config.ahoyapi != SUPPORTED_API_VERSION {
        result.push(ValidationIssue::new(
            IssueKind::VersionMismatch,
            Severity::Error,
            format!(
                "Unsupported API version '{}'. Only '{SUPPORTED_API_VERSION}' is currently supported.",
                config.ahoyapi
            ),
            config_file,
            "ahoyapi",
        ));
    }

    if config.env.len() > 1 && !engine.supports(Feature::MultipleEnvFiles) {
        result.push(
            ValidationIssue::new(
                IssueKind::VersionMismatch,
                Severity::Warning,
                "Multiple environment files detected. This feature requires proper support."
                    .to_string(),
                config_file,
                "env",
            )
            .gated(Feature::MultipleEnvFiles, engine)
            .suggest("Multiple env files are partially supported. Upgrade for full compatibility."),
        );
    }

    for env_path in &config.env {
        if !file_exists(&expand_path(env_path, &base_dir)) {
            result.push(
                ValidationIssue::new(
                    IssueKind::MissingFile,
                    Severity::Warning,
                    format!("Global environment file '{env_path}' not found (will be ignored)"),
                    config_file,
                    "env",
                )
                .suggest(format!(
                    "Create the file '{env_path}' or remove it from the configuration"
                )),
            );
        }
    }

    for (name, command) in &config.commands {
        result.extend(validate_command(name, command, config_file, &base_dir, engine));
    }

    result
}

fn validate_command(
    name: &str,
    command: &ConfigCommand,
    config_file: &Path,
    base_dir: &Path,
    engine: &Engine,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Some(ConfigError::SchemaViolation { reason, .. }) = schema_violation(name, command) {
        issues.push(
            ValidationIssue::new(
                IssueKind::SchemaError,
                Severity::Error,
                format!("Command '{name}' {reason}"),
                config_file,
                format!("commands.{name}"),
            )
            .suggest("Set exactly one of 'cmd' or a non-empty 'imports' list"),
        );
    }

    if command.optional && !engine.supports(Feature::OptionalImports) {
        issues.push(
            ValidationIssue::new(
                IssueKind::VersionMismatch,
                Severity::Error,
                format!(
                    "Command '{name}' uses 'optional: true' which requires Ahoy {} or later",
                    Feature::OptionalImports.required_version()
                ),
                config_file,
                format!("commands.{name}.optional"),
            )
            .gated(Feature::OptionalImports, engine)
            .suggest("Upgrade Ahoy or remove 'optional: true' from the command"),
        );
    }

    if !command.aliases.is_empty() && !engine.supports(Feature::CommandAliases) {
        issues.push(
            ValidationIssue::new(
                IssueKind::VersionMismatch,
                Severity::Warning,
                format!(
                    "Command '{name}' uses aliases which require Ahoy {} or later",
                    Feature::CommandAliases.required_version()
                ),
                config_file,
                format!("commands.{name}.aliases"),
            )
            .gated(Feature::CommandAliases, engine)
            .suggest("Upgrade Ahoy for full alias support"),
        );
    }

    for import in command.imports.iter().flatten().filter(|i| !i.is_empty()) {
        issues.extend(validate_import(
            name,
            import,
            command.optional,
            config_file,
            base_dir,
            engine,
        ));
    }

    for env_path in &command.env {
        if !file_exists(&expand_path(env_path, base_dir)) {
            issues.push(
                ValidationIssue::new(
                    IssueKind::MissingFile,
                    Severity::Warning,
                    format!(
                        "Environment file '{env_path}' not found for command '{name}' (will be ignored)"
                    ),
                    config_file,
                    format!("commands.{name}.env"),
                )
                .suggest(format!(
                    "Create the file '{env_path}' or remove it from the configuration"
                )),
            );
        }
    }

    issues
}

fn validate_import(
    name: &str,
    import: &str,
    optional: bool,
    config_file: &Path,
    base_dir: &Path,
    engine: &Engine,
) -> Option<ValidationIssue> {
    if file_exists(&expand_path(import, base_dir)) {
        return None;
    }
    let field = format!("commands.{name}.imports");
    let required = Feature::OptionalImports.required_version();
    let issue = if !optional {
        ValidationIssue::new(
            IssueKind::MissingFile,
            Severity::Warning,
            format!("Import file '{import}' not found for command '{name}' (will be skipped)"),
            config_file,
            field,
        )
        .suggest(format!(
            "Create the file '{import}' or mark the import as 'optional: true'"
        ))
    } else if engine.supports(Feature::OptionalImports) {
        ValidationIssue::new(
            IssueKind::MissingFile,
            Severity::Info,
            format!("Optional import file '{import}' not found for command '{name}' (this is OK)"),
            config_file,
            field,
        )
    } else {
        ValidationIssue::new(
            IssueKind::VersionMismatch,
            Severity::Error,
            format!(
                "Import file '{import}' not found for command '{name}'. This file is marked as optional but your Ahoy version doesn't support optional imports."
            ),
            config_file,
            field,
        )
        .gated(Feature::OptionalImports, engine)
        .suggest(format!(
            "Either upgrade Ahoy to {required}+, create the missing file '{import}', or remove 'optional: true'"
        ))
    };
    Some(issue)
}
