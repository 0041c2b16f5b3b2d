use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use ahoy::report;
use ahoy::version::Engine;

/// Diagnose a configuration file and print the report.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn run(
    config_file: &Path,
    engine: &Engine,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let report = report::run(config_file, engine);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!(
            "{}",
            report::render(&report, std::io::stdout().is_terminal())
        );
    }

    if report.has_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
