//! Diagnostics report for `ahoy config validate`

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anstyle::{AnsiColor, Effects, Style};
use serde::Serialize;

use crate::config_file::{Config, SUPPORTED_API_VERSION};
use crate::paths::{config_dir, expand_path, file_exists};
use crate::validation::{IssueKind, Severity, ValidationResult, validate};
use crate::version::Engine;

pub const RECOMMEND_INIT: &str = "Create a .ahoy.yml file using 'ahoy config init'";
pub const RECOMMEND_UPGRADE: &str = "Upgrade Ahoy to the latest version for full feature support";
pub const RECOMMEND_IMPORTS: &str = "Create missing import files or mark them as optional";
pub const RECOMMEND_ENV_FILES: &str =
    "Consider creating missing environment files or removing them from configuration";
pub const RECOMMEND_NEWER: &str =
    "Consider upgrading to a newer Ahoy version for better support of advanced features";
pub const RECOMMEND_NOTHING: &str = "Configuration looks good! No issues found.";

/// Status of one referenced environment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvFileStatus {
    pub path: String,
    pub exists: bool,
    pub global: bool,
    /// Owning command, `None` for global files.
    pub command: Option<String>,
}

/// Status of one referenced import file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFileStatus {
    pub path: String,
    pub exists: bool,
    pub optional: bool,
    pub command: String,
}

/// Everything `config validate` found out about one configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub config_file: PathBuf,
    pub config_exists: bool,
    pub config_valid: bool,
    pub parse_error: Option<String>,
    pub api_version: String,
    pub ahoy_version: String,
    pub validation: ValidationResult,
    pub env_files: Vec<EnvFileStatus>,
    pub import_files: Vec<ImportFileStatus>,
    pub recommendations: Vec<String>,
}

impl ConfigReport {
    fn empty(config_file: &Path, engine: &Engine) -> Self {
        ConfigReport {
            config_file: config_file.to_path_buf(),
            config_exists: false,
            config_valid: false,
            parse_error: None,
            api_version: String::new(),
            ahoy_version: engine.version().to_string(),
            validation: ValidationResult::default(),
            env_files: Vec::new(),
            import_files: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// True if the configuration could not be read or has an error-severity issue.
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.config_valid || self.validation.has_error
    }
}

/// Diagnoses the configuration file at `config_file` against `engine`.
#[must_use]
pub fn run(config_file: &Path, engine: &Engine) -> ConfigReport {
    let mut report = ConfigReport::empty(config_file, engine);

    report.config_exists = file_exists(config_file);
    if !report.config_exists {
        report.recommendations.push(RECOMMEND_INIT.to_string());
        return report;
    }

    // The API version is reported as an issue rather than refusing the file
    let config = match Config::parse_file(config_file) {
        Ok(config) => config,
        Err(e) => {
            let message = e.to_string();
            report
                .recommendations
                .push(format!("Fix YAML syntax error: {message}"));
            report.parse_error = Some(message);
            return report;
        }
    };

    report.config_valid = true;
    report.api_version.clone_from(&config.ahoyapi);
    report.validation = validate(&config, config_file, engine);
    report.env_files = check_env_files(&config, config_file);
    report.import_files = check_import_files(&config, config_file);
    report.recommendations = generate_recommendations(&report);
    report
}

/// Status of every environment file referenced in `config`, global ones first.
#[must_use]
pub fn check_env_files(config: &Config, config_file: &Path) -> Vec<EnvFileStatus> {
    let base_dir = config_dir(config_file);
    let global = config.env.iter().map(|path| (path, None));
    let per_command = config
        .commands
        .iter()
        .flat_map(|(name, command)| command.env.iter().map(move |path| (path, Some(name))));
    global
        .chain(per_command)
        .map(|(path, command)| EnvFileStatus {
            path: path.clone(),
            exists: file_exists(&expand_path(path, &base_dir)),
            global: command.is_none(),
            command: command.cloned(),
        })
        .collect()
}

/// Status of every import file referenced in `config`.
#[must_use]
pub fn check_import_files(config: &Config, config_file: &Path) -> Vec<ImportFileStatus> {
    let base_dir = config_dir(config_file);
    config
        .commands
        .iter()
        .flat_map(|(name, command)| {
            command
                .imports
                .iter()
                .flatten()
                .filter(|path| !path.is_empty())
                .map(move |path| (name, command.optional, path))
        })
        .map(|(name, optional, path)| ImportFileStatus {
            path: path.clone(),
            exists: file_exists(&expand_path(path, &base_dir)),
            optional,
            command: name.clone(),
        })
        .collect()
}

/// Derives the ordered list of recommendations from a report's findings.
#[must_use]
pub fn generate_recommendations(report: &ConfigReport) -> Vec<String> {
    let issues = &report.validation.issues;
    let version_issue = |severity: Severity| {
        issues
            .iter()
            .any(|i| i.kind == IssueKind::VersionMismatch && i.severity == severity)
    };

    let mut recommendations = Vec::new();
    let version_error = version_issue(Severity::Error);
    if version_error {
        recommendations.push(RECOMMEND_UPGRADE.to_string());
    }
    if report
        .import_files
        .iter()
        .any(|import| !import.exists && !import.optional)
    {
        recommendations.push(RECOMMEND_IMPORTS.to_string());
    }
    if report.env_files.iter().any(|env| !env.exists) {
        recommendations.push(RECOMMEND_ENV_FILES.to_string());
    }
    if !version_error && version_issue(Severity::Warning) {
        recommendations.push(RECOMMEND_NEWER.to_string());
    }
    if issues.is_empty() && recommendations.is_empty() {
        recommendations.push(RECOMMEND_NOTHING.to_string());
    }
    recommendations
}

const TITLE: Style = Style::new().effects(Effects::BOLD);
const OK: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const BAD: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));
const WARN: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)));
const NOTE: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Blue)));
const DIM: Style = Style::new().effects(Effects::DIMMED);

/// Applies styles only when colour output is wanted.
struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, style: Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{style:#}")
        } else {
            s.to_string()
        }
    }

    fn ok(&self) -> String {
        self.paint(OK, "✓")
    }

    fn bad(&self) -> String {
        self.paint(BAD, "✘")
    }

    fn severity(&self, severity: Severity) -> String {
        match severity {
            Severity::Error => self.paint(BAD, "ERROR"),
            Severity::Warning => self.paint(WARN, "WARNING"),
            Severity::Info => self.paint(NOTE, "INFO"),
        }
    }
}

/// Renders a report as human-readable text.
#[must_use]
pub fn render(report: &ConfigReport, color: bool) -> String {
    let p = Painter { color };
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, report, &p);
    out
}

fn write_report(out: &mut String, report: &ConfigReport, p: &Painter) -> std::fmt::Result {
    writeln!(out, "{}", p.paint(TITLE, "Ahoy Configuration Validator"))?;
    writeln!(out, "============================")?;
    writeln!(out)?;

    if !report.config_exists {
        writeln!(
            out,
            "Configuration file: {} {} (not found)",
            report.config_file.display(),
            p.bad()
        )?;
        writeln!(out)?;
        writeln!(out, "Run 'ahoy config init' to create a new configuration file")?;
        return Ok(());
    }
    writeln!(
        out,
        "Configuration file: {} {} (found)",
        report.config_file.display(),
        p.ok()
    )?;

    if report.config_valid {
        if report.api_version == SUPPORTED_API_VERSION {
            writeln!(out, "API version: {} {} (supported)", report.api_version, p.ok())?;
        } else {
            writeln!(out, "API version: {} {} (unsupported)", report.api_version, p.bad())?;
        }
    }
    writeln!(out, "Ahoy version: {}", report.ahoy_version)?;
    if report.config_valid {
        writeln!(out, "Syntax: {} valid YAML", p.ok())?;
    } else {
        writeln!(out, "Syntax: {} invalid YAML", p.bad())?;
        if let Some(error) = &report.parse_error {
            writeln!(out, "   {}", p.paint(DIM, error))?;
        }
    }
    writeln!(out)?;

    let issues = &report.validation.issues;
    if report.config_valid {
        if issues.is_empty() {
            writeln!(out, "{} No validation issues found", p.ok())?;
        } else {
            writeln!(out, "{}", p.paint(TITLE, "Issues found:"))?;
            for (i, issue) in issues.iter().enumerate() {
                writeln!(out, "{}. {}: {}", i + 1, p.severity(issue.severity), issue.message)?;
                if !issue.field.is_empty() {
                    writeln!(out, "   Location: {}", issue.field)?;
                }
                if let (Some(required), Some(current)) =
                    (&issue.required_version, &issue.current_version)
                {
                    writeln!(out, "   Required version: {required} (current: {current})")?;
                }
                if let Some(suggestion) = &issue.suggestion {
                    writeln!(out, "   Fix: {suggestion}")?;
                }
            }
        }
        writeln!(out)?;
    }

    if !report.env_files.is_empty() {
        writeln!(out, "{}", p.paint(TITLE, "Environment files:"))?;
        for env in &report.env_files {
            let scope = match &env.command {
                Some(command) => format!("command: {command}"),
                None => "global".to_string(),
            };
            if env.exists {
                writeln!(out, "   {} {} ({scope})", p.ok(), env.path)?;
            } else {
                writeln!(out, "   {} {} ({scope}) - missing", p.bad(), env.path)?;
            }
        }
        writeln!(out)?;
    }

    if !report.import_files.is_empty() {
        writeln!(out, "{}", p.paint(TITLE, "Import files:"))?;
        for import in &report.import_files {
            let status = if import.optional { "optional" } else { "required" };
            let detail = format!("{} ({status}, command: {})", import.path, import.command);
            if import.exists {
                writeln!(out, "   {} {detail}", p.ok())?;
            } else if import.optional {
                writeln!(out, "   {} {detail} - missing but OK", p.paint(WARN, "!"))?;
            } else {
                writeln!(out, "   {} {detail} - missing", p.bad())?;
            }
        }
        writeln!(out)?;
    }

    if !report.recommendations.is_empty() {
        writeln!(out, "{}", p.paint(TITLE, "Recommendations:"))?;
        for (i, recommendation) in report.recommendations.iter().enumerate() {
            writeln!(out, "{}. {recommendation}", i + 1)?;
        }
        writeln!(out)?;
    }

    if report.has_error() {
        writeln!(out, "{} Configuration has errors that need to be fixed", p.bad())?;
    } else if !issues.is_empty() {
        writeln!(
            out,
            "{} Configuration has warnings but should work",
            p.paint(WARN, "!")
        )?;
    } else {
        writeln!(out, "{} Configuration looks great!", p.ok())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationIssue;
    use crate::version::Feature;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(&dir.path().join(".ahoy.yml"), &Engine::current());
        assert!(!report.config_exists);
        assert!(!report.config_valid);
        assert!(report.has_error());
        assert_eq!(report.recommendations, vec![RECOMMEND_INIT]);
        assert!(report.recommendations[0].contains("ahoy config init"));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), ".ahoy.yml", "ahoyapi: v2\ncommands: [unclosed\n");
        let report = run(&path, &Engine::current());
        assert!(report.config_exists);
        assert!(!report.config_valid);
        let parse_error = report.parse_error.clone().unwrap();
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(
            report.recommendations[0],
            format!("Fix YAML syntax error: {parse_error}")
        );
    }

    #[test]
    fn test_valid_config_looks_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            ".ahoy.yml",
            "ahoyapi: v2\ncommands:\n  hello:\n    cmd: echo hello\n",
        );
        let report = run(&path, &Engine::current());
        assert!(report.config_valid);
        assert_eq!(report.api_version, "v2");
        assert!(!report.has_error());
        assert_eq!(report.recommendations, vec![RECOMMEND_NOTHING]);
    }

    #[test]
    fn test_wrong_api_version_reported_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), ".ahoy.yml", "ahoyapi: v1\ncommands: {}\n");
        let report = run(&path, &Engine::current());
        assert!(report.config_valid);
        assert!(report.has_error());
        assert_eq!(report.api_version, "v1");
        assert_eq!(report.recommendations, vec![RECOMMEND_UPGRADE]);
    }

    #[test]
    fn test_file_statuses() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".env.test", "A=1\n");
        write(dir.path(), "present.yml", "ahoyapi: v2\n");
        let path = write(
            dir.path(),
            ".ahoy.yml",
            r"
ahoyapi: v2
env: [.env.test, .env.missing]
commands:
  test:
    cmd: env
    env: .env.command
  docker:
    imports: [present.yml, missing.yml]
    optional: true
",
        );
        let report = run(&path, &Engine::current());
        let envs: Vec<(&str, bool, bool)> = report
            .env_files
            .iter()
            .map(|e| (e.path.as_str(), e.exists, e.global))
            .collect();
        assert_eq!(
            envs,
            vec![
                (".env.test", true, true),
                (".env.missing", false, true),
                (".env.command", false, false),
            ]
        );
        assert_eq!(report.env_files[2].command.as_deref(), Some("test"));

        let imports: Vec<(&str, bool, bool, &str)> = report
            .import_files
            .iter()
            .map(|i| (i.path.as_str(), i.exists, i.optional, i.command.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("present.yml", true, true, "docker"),
                ("missing.yml", false, true, "docker"),
            ]
        );
        // the missing import is optional, so only env files are recommended
        assert_eq!(report.recommendations, vec![RECOMMEND_ENV_FILES]);
    }

    #[test]
    fn test_empty_import_reference_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "present.yml", "ahoyapi: v2\n");
        let path = write(
            dir.path(),
            ".ahoy.yml",
            "ahoyapi: v2\ncommands:\n  group:\n    imports: ['', present.yml]\n",
        );
        let report = run(&path, &Engine::current());
        let paths: Vec<&str> = report.import_files.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["present.yml"]);
        assert_eq!(report.recommendations, vec![RECOMMEND_NOTHING]);
    }

    fn report_with(issues: Vec<ValidationIssue>) -> ConfigReport {
        let mut report = ConfigReport::empty(Path::new("/project/.ahoy.yml"), &Engine::new("v2.0.0"));
        report.config_exists = true;
        report.config_valid = true;
        report.api_version = "v2".to_string();
        report.validation.has_error = issues.iter().any(|i| i.severity == Severity::Error);
        report.validation.issues = issues;
        report
    }

    fn alias_warning() -> ValidationIssue {
        ValidationIssue {
            kind: IssueKind::VersionMismatch,
            severity: Severity::Warning,
            message: "Command 'up' uses aliases which require Ahoy v2.1.0 or later".to_string(),
            file: PathBuf::from("/project/.ahoy.yml"),
            field: "commands.up.aliases".to_string(),
            feature: Some(Feature::CommandAliases),
            required_version: Some("v2.1.0".to_string()),
            current_version: Some("v2.0.0".to_string()),
            suggestion: Some("Upgrade Ahoy for full alias support".to_string()),
        }
    }

    #[test]
    fn test_recommendations_only_warnings() {
        let report = report_with(vec![alias_warning()]);
        assert_eq!(generate_recommendations(&report), vec![RECOMMEND_NEWER]);
    }

    #[test]
    fn test_recommendations_error_suppresses_generic_upgrade() {
        let mut error = alias_warning();
        error.severity = Severity::Error;
        let report = report_with(vec![error, alias_warning()]);
        assert_eq!(generate_recommendations(&report), vec![RECOMMEND_UPGRADE]);
    }

    #[test]
    fn test_recommendations_missing_required_import() {
        let mut report = report_with(vec![]);
        report.import_files.push(ImportFileStatus {
            path: "private.yml".to_string(),
            exists: false,
            optional: false,
            command: "private".to_string(),
        });
        assert_eq!(generate_recommendations(&report), vec![RECOMMEND_IMPORTS]);
    }

    #[test]
    fn test_render_warning_report() {
        let mut report = report_with(vec![alias_warning()]);
        report.import_files.push(ImportFileStatus {
            path: "private.yml".to_string(),
            exists: false,
            optional: true,
            command: "private".to_string(),
        });
        report.recommendations = generate_recommendations(&report);
        insta::assert_snapshot!(render(&report, false), @r"
        Ahoy Configuration Validator
        ============================

        Configuration file: /project/.ahoy.yml ✓ (found)
        API version: v2 ✓ (supported)
        Ahoy version: v2.0.0
        Syntax: ✓ valid YAML

        Issues found:
        1. WARNING: Command 'up' uses aliases which require Ahoy v2.1.0 or later
           Location: commands.up.aliases
           Required version: v2.1.0 (current: v2.0.0)
           Fix: Upgrade Ahoy for full alias support

        Import files:
           ! private.yml (optional, command: private) - missing but OK

        Recommendations:
        1. Consider upgrading to a newer Ahoy version for better support of advanced features

        ! Configuration has warnings but should work
        ");
    }

    #[test]
    fn test_render_missing_config() {
        let report = run(Path::new("/nonexistent/dir/.ahoy.yml"), &Engine::current());
        insta::assert_snapshot!(render(&report, false), @r"
        Ahoy Configuration Validator
        ============================

        Configuration file: /nonexistent/dir/.ahoy.yml ✘ (not found)

        Run 'ahoy config init' to create a new configuration file
        ");
    }

    #[test]
    fn test_render_color_only_when_asked() {
        let report = report_with(vec![]);
        assert!(!render(&report, false).contains('\x1b'));
        assert!(render(&report, true).contains('\x1b'));
    }
}
