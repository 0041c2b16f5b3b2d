mod init;
mod validate;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, warn};

use ahoy::cli::{Bootstrap, Dispatch, build_cli, completions, dispatch};
use ahoy::config_file::{Config, FILENAME};
use ahoy::version::Engine;
use ahoy::{exec, load_config};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[fatal] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<OsString> = std::env::args_os().collect();
    let bootstrap = Bootstrap::parse_lenient(&args);
    ahoy::logger::init(bootstrap.globals.verbose)?;
    let engine = Engine::simulated(bootstrap.globals.simulate_version.as_deref());

    let config_file = Config::find_config(bootstrap.globals.file.as_deref())?;
    let loaded = match config_file.as_deref().map(|path| load_config(path, &engine)) {
        None => None,
        Some(Ok(loaded)) => Some(loaded),
        // Built-ins stay usable so a broken file can still be diagnosed or replaced
        Some(Err(e)) if bootstrap.wants_builtin() => {
            warn!("{e}");
            None
        }
        Some(Err(e)) => return Err(e.into()),
    };
    let (usage, commands) = loaded
        .as_ref()
        .map_or(("", &[][..]), |l| (l.usage.as_str(), l.commands.as_slice()));

    let mut cli = build_cli(usage, commands, &engine);
    if bootstrap.globals.generate_bash_completion {
        for name in completions(&cli) {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let matches = cli
        .try_get_matches_from_mut(&args)
        .unwrap_or_else(|e| e.exit());

    match dispatch(commands, &matches) {
        Dispatch::Help => {
            cli.print_help()?;
            if config_file.is_none() {
                error!("No {FILENAME} found. You can use 'ahoy config init' to create one.");
            }
            warn!("Missing flag or argument.");
            Ok(ExitCode::FAILURE)
        }
        Dispatch::NotFound(name) => Err(format!("Command not found for '{name}'").into()),
        Dispatch::Validate { json } => {
            let path = match config_file {
                Some(path) => path,
                None => std::env::current_dir()?.join(FILENAME),
            };
            validate::run(&path, &engine, json)
        }
        Dispatch::Init { force, deprecated } => {
            if deprecated {
                warn!("'ahoy init' is deprecated, use 'ahoy config init' instead.");
            }
            init::run(force)
        }
        Dispatch::Run {
            name,
            invocation,
            args,
        } => {
            let cwd = loaded
                .as_ref()
                .map_or_else(|| PathBuf::from("."), |l| l.cwd.clone());
            let status = exec::run(name, invocation, &args, &cwd)?;
            Ok(ExitCode::from(exec::exit_code(status)))
        }
    }
}
