//! CLI definitions using `clap`
//!
//! The subcommands are only known once the configuration has been resolved,
//! so the tree is assembled with the builder API. Global flags are shared
//! with a lenient derive parser that runs first, before any config is read.

use std::collections::HashSet;
use std::ffi::OsString;

use clap::builder::FalseyValueParser;
use clap::{Arg, ArgAction, ArgMatches, Args, Command as ClapCommand, FromArgMatches, Parser};
use log::warn;

use crate::commands::node::{Action, Invocation, ResolvedCommand};
use crate::version::Engine;

/// Root about text when the config declares no `usage`.
pub const DEFAULT_USAGE: &str = "Creates a configurable cli app for running commands.";

const ARGS: &str = "args";
const CONFIG: &str = "config";
const VALIDATE: &str = "validate";
const INIT: &str = "init";

const ROOT_AFTER_HELP: &str = "\
Use 'ahoy <command> --help' for detailed information about a command.
Run 'ahoy config validate' to check your configuration for issues.";

const ROOT_TEMPLATE: &str = "\
{name} {version} - {about}

{usage-heading} {usage}

{all-args}{after-help}
";

/// Flags accepted anywhere on the command line
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Use a specific ahoy file
    #[arg(short = 'f', long = "file", global = true, value_name = "FILE")]
    pub file: Option<String>,

    /// Output extra details like the commands to be run
    #[arg(
        short,
        long,
        global = true,
        env = "AHOY_VERBOSE",
        value_parser = FalseyValueParser::new()
    )]
    pub verbose: bool,

    /// Pretend to be another engine version when checking feature support
    #[arg(long, global = true, hide = true, value_name = "VERSION")]
    pub simulate_version: Option<String>,

    /// Print the visible top-level commands, one per line
    #[arg(long, global = true, hide = true)]
    pub generate_bash_completion: bool,
}

/// The global flags and whatever follows them, parsed before any config is read
#[derive(Parser, Debug, Default)]
#[command(name = "ahoy", disable_help_flag = true, disable_version_flag = true)]
pub struct Bootstrap {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

impl Bootstrap {
    /// Extracts the global flags without knowing the configured commands.
    ///
    /// Anything that does not parse falls back to the defaults; the full
    /// parse afterwards reports real usage errors.
    pub fn parse_lenient<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Bootstrap as clap::CommandFactory>::command()
            .ignore_errors(true)
            .try_get_matches_from(args)
            .ok()
            .and_then(|matches| Bootstrap::from_arg_matches(&matches).ok())
            .unwrap_or_default()
    }

    /// True if the command line names one of the built-in commands, which
    /// must keep working when the configuration itself is broken.
    #[must_use]
    pub fn wants_builtin(&self) -> bool {
        matches!(self.rest.first().map(String::as_str), Some(CONFIG | INIT))
    }
}

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// No subcommand given.
    Help,
    /// A subcommand that is neither configured nor built in.
    NotFound(String),
    Validate { json: bool },
    Init { force: bool, deprecated: bool },
    Run {
        name: &'a str,
        invocation: &'a Invocation,
        args: Vec<String>,
    },
}

/// Builds the complete CLI from the resolved command tree.
///
/// Built-in commands are only added where the configuration has not claimed
/// the name (or an alias) for itself.
#[must_use]
pub fn build_cli(usage: &str, commands: &[ResolvedCommand], engine: &Engine) -> ClapCommand {
    let about = if usage.is_empty() { DEFAULT_USAGE } else { usage };
    let mut cli = ClapCommand::new("ahoy")
        .version(engine.version().to_string())
        .about(about.to_string())
        .help_template(ROOT_TEMPLATE)
        .after_help(ROOT_AFTER_HELP)
        .disable_help_subcommand(true)
        .allow_external_subcommands(true);
    cli = GlobalArgs::augment_args(cli);

    for (command, aliases) in commands.iter().zip(sibling_aliases(commands)) {
        cli = cli.subcommand(node_command(command, aliases));
    }

    let taken = |name: &str| commands.iter().any(|c| c.answers_to(name));
    if !taken(CONFIG) {
        cli = cli.subcommand(cmd_config());
    }
    if !taken(INIT) {
        cli = cli.subcommand(
            cmd_init().about("Initialise a new .ahoy.yml config file (deprecated, use 'ahoy config init')"),
        );
    }
    cli
}

/// The aliases each sibling keeps. An alias that repeats a sibling's name, or
/// an alias an earlier sibling already claimed, is dropped.
fn sibling_aliases(siblings: &[ResolvedCommand]) -> Vec<Vec<String>> {
    let mut taken: HashSet<&str> = siblings.iter().map(|c| c.name.as_str()).collect();
    siblings
        .iter()
        .map(|command| {
            command
                .aliases
                .iter()
                .filter(|alias| {
                    let free = taken.insert(alias.as_str());
                    if !free {
                        warn!(
                            "Ignoring alias '{alias}' of command [{}]: the name is already in use",
                            command.name
                        );
                    }
                    free
                })
                .cloned()
                .collect()
        })
        .collect()
}

fn node_command(command: &ResolvedCommand, aliases: Vec<String>) -> ClapCommand {
    let mut cli = ClapCommand::new(command.name.clone())
        .visible_aliases(aliases)
        .hide(command.hidden);
    if !command.usage.is_empty() {
        cli = cli.about(command.usage.clone());
    }
    if !command.description.trim().is_empty() {
        cli = cli.long_about(command.description.trim().to_string());
    }

    match &command.action {
        Action::Run(_) => cli.arg(
            Arg::new(ARGS)
                .num_args(0..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .value_name("ARGS")
                .help("Arguments passed on to the command"),
        ),
        Action::Group(children) => {
            cli = cli
                .subcommand_required(true)
                .arg_required_else_help(true)
                .allow_external_subcommands(true);
            for (child, aliases) in children.iter().zip(sibling_aliases(children)) {
                cli = cli.subcommand(node_command(child, aliases));
            }
            cli
        }
    }
}

fn cmd_config() -> ClapCommand {
    ClapCommand::new(CONFIG)
        .about("Manage Ahoy configuration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            ClapCommand::new(VALIDATE)
                .about("Validate and diagnose an Ahoy configuration file")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(cmd_init())
}

fn cmd_init() -> ClapCommand {
    ClapCommand::new(INIT)
        .about("Initialise a new .ahoy.yml config file in the current directory")
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Overwrite an existing .ahoy.yml without asking"),
        )
}

/// Walks the parsed command line down to the action it selects.
#[must_use]
pub fn dispatch<'a>(commands: &'a [ResolvedCommand], matches: &ArgMatches) -> Dispatch<'a> {
    let Some((name, sub)) = matches.subcommand() else {
        return Dispatch::Help;
    };
    if let Some(command) = commands.iter().find(|c| c.name == name) {
        return dispatch_node(command, sub);
    }
    match name {
        CONFIG => match sub.subcommand() {
            Some((VALIDATE, m)) => Dispatch::Validate {
                json: m.get_flag("json"),
            },
            Some((INIT, m)) => Dispatch::Init {
                force: m.get_flag("force"),
                deprecated: false,
            },
            _ => Dispatch::Help,
        },
        INIT => Dispatch::Init {
            force: sub.get_flag("force"),
            deprecated: true,
        },
        other => Dispatch::NotFound(other.to_string()),
    }
}

fn dispatch_node<'a>(command: &'a ResolvedCommand, matches: &ArgMatches) -> Dispatch<'a> {
    match &command.action {
        Action::Run(invocation) => Dispatch::Run {
            name: &command.name,
            invocation,
            args: matches
                .get_many::<String>(ARGS)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        },
        Action::Group(children) => match matches.subcommand() {
            Some((name, sub)) => children
                .iter()
                .find(|c| c.name == name)
                .map_or_else(|| Dispatch::NotFound(name.to_string()), |c| dispatch_node(c, sub)),
            None => Dispatch::Help,
        },
    }
}

/// Names offered for shell completion: every visible top-level command.
#[must_use]
pub fn completions(cli: &ClapCommand) -> Vec<String> {
    cli.get_subcommands()
        .filter(|c| !c.is_hide_set())
        .map(|c| c.get_name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn leaf(name: &str) -> ResolvedCommand {
        ResolvedCommand {
            name: name.to_string(),
            usage: format!("Runs {name}"),
            description: String::new(),
            aliases: vec![],
            hidden: false,
            action: Action::Run(Invocation {
                argv: vec!["bash".to_string(), "-c".to_string(), "true".to_string()],
                env: vec![],
                source: PathBuf::from(".ahoy.yml"),
            }),
        }
    }

    fn tree() -> Vec<ResolvedCommand> {
        let mut hello = leaf("hello");
        hello.aliases = vec!["hi".to_string()];
        let mut secret = leaf("secret");
        secret.hidden = true;
        let docker = ResolvedCommand {
            name: "docker".to_string(),
            usage: "Docker commands".to_string(),
            description: String::new(),
            aliases: vec![],
            hidden: false,
            action: Action::Group(vec![leaf("ps"), leaf("up")]),
        };
        vec![docker, hello, secret]
    }

    fn parse<'a>(commands: &'a [ResolvedCommand], args: &[&str]) -> Dispatch<'a> {
        let cli = build_cli("", commands, &Engine::current());
        let matches = cli.try_get_matches_from(args).unwrap();
        dispatch(commands, &matches)
    }

    #[test]
    fn test_cli_is_consistent() {
        build_cli("My project", &tree(), &Engine::current()).debug_assert();
    }

    #[test]
    fn test_dispatch_leaf_with_args() {
        let commands = tree();
        match parse(&commands, &["ahoy", "hello", "--", "-x", "value"]) {
            Dispatch::Run { name, args, .. } => {
                assert_eq!(name, "hello");
                assert_eq!(args, vec!["-x", "value"]);
            }
            other => panic!("Expected Run, got: {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_alias_and_nested() {
        let commands = tree();
        assert!(matches!(
            parse(&commands, &["ahoy", "hi"]),
            Dispatch::Run { name: "hello", .. }
        ));
        assert!(matches!(
            parse(&commands, &["ahoy", "docker", "up", "-d"]),
            Dispatch::Run { name: "up", args, .. } if args == vec!["-d"]
        ));
    }

    #[test]
    fn test_dispatch_builtins_and_unknown() {
        let commands = tree();
        assert_eq!(parse(&commands, &["ahoy"]), Dispatch::Help);
        assert_eq!(
            parse(&commands, &["ahoy", "config", "validate", "--json"]),
            Dispatch::Validate { json: true }
        );
        assert_eq!(
            parse(&commands, &["ahoy", "init", "--force"]),
            Dispatch::Init {
                force: true,
                deprecated: true
            }
        );
        assert_eq!(
            parse(&commands, &["ahoy", "nope", "arg"]),
            Dispatch::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_config_command_overrides_builtin() {
        let commands = vec![leaf("config")];
        build_cli("", &commands, &Engine::current()).debug_assert();
        assert!(matches!(
            parse(&commands, &["ahoy", "config", "validate"]),
            Dispatch::Run { name: "config", args, .. } if args == vec!["validate"]
        ));
    }

    #[test]
    fn test_colliding_aliases_dropped() {
        let mut a = leaf("a");
        a.aliases = vec!["b".to_string(), "shared".to_string()];
        let mut c = leaf("c");
        c.aliases = vec!["shared".to_string(), "see".to_string()];
        let group = ResolvedCommand {
            name: "group".to_string(),
            usage: String::new(),
            description: String::new(),
            aliases: vec![],
            hidden: false,
            action: Action::Group(vec![a.clone(), leaf("b"), c.clone()]),
        };
        let commands = vec![a, leaf("b"), c, group];
        build_cli("", &commands, &Engine::current()).debug_assert();

        assert_eq!(
            sibling_aliases(&commands),
            vec![vec!["shared"], vec![], vec!["see"], vec![]]
        );
        assert!(matches!(parse(&commands, &["ahoy", "b"]), Dispatch::Run { name: "b", .. }));
        assert!(matches!(
            parse(&commands, &["ahoy", "shared"]),
            Dispatch::Run { name: "a", .. }
        ));
        assert!(matches!(
            parse(&commands, &["ahoy", "group", "see"]),
            Dispatch::Run { name: "c", .. }
        ));
    }

    #[test]
    fn test_hidden_command_still_invocable() {
        let commands = tree();
        assert!(matches!(
            parse(&commands, &["ahoy", "secret", "x"]),
            Dispatch::Run { name: "secret", args, .. } if args == vec!["x"]
        ));
    }

    #[test]
    fn test_completions_skip_hidden() {
        let cli = build_cli("", &tree(), &Engine::current());
        assert_eq!(completions(&cli), vec!["docker", "hello", "config", "init"]);
    }

    #[test]
    fn test_bootstrap_lenient() {
        let bootstrap = Bootstrap::parse_lenient([
            "ahoy",
            "-f",
            "other.yml",
            "--simulate-version",
            "v2.0.0",
            "hello",
            "--unknown",
        ]);
        assert_eq!(bootstrap.globals.file.as_deref(), Some("other.yml"));
        assert_eq!(bootstrap.globals.simulate_version.as_deref(), Some("v2.0.0"));
        assert!(!bootstrap.globals.generate_bash_completion);
        assert_eq!(bootstrap.rest, vec!["hello", "--unknown"]);
        assert!(!bootstrap.wants_builtin());
        assert!(Bootstrap::parse_lenient(["ahoy", "config", "validate"]).wants_builtin());
    }

    #[test]
    fn test_global_args_accepted_by_full_cli() {
        let commands = tree();
        let cli = build_cli("", &commands, &Engine::current());
        let matches = cli
            .try_get_matches_from(["ahoy", "-f", "x.yml", "hello"])
            .unwrap();
        let globals = GlobalArgs::from_arg_matches(&matches).unwrap();
        assert_eq!(globals.file.as_deref(), Some("x.yml"));
        assert!(matches!(dispatch(&commands, &matches), Dispatch::Run { .. }));
    }
}
