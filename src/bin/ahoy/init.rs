use std::process::ExitCode;

use inquire::Confirm;

use ahoy::init::InitError;

/// Write the example `.ahoy.yml` into the current directory.
///
/// An existing file is only replaced with `force` or after confirmation.
///
/// # Errors
///
/// Returns an error if the prompt or the write fails.
pub fn run(force: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let path = match ahoy::init::run(&cwd, force) {
        Ok(path) => path,
        Err(InitError::ConfigExists(path)) => {
            println!("Warning: {} found in current directory.", path.display());
            let overwrite = Confirm::new("Are you sure you wish to overwrite it with an example file?")
                .with_default(false)
                .prompt()?;
            if !overwrite {
                println!("Abort: exiting without overwriting.");
                return Ok(ExitCode::SUCCESS);
            }
            ahoy::init::run(&cwd, true)?
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Example config written to {}. You can customize it to suit your needs!",
        path.display()
    );
    Ok(ExitCode::SUCCESS)
}
