use crate::error::{Error, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Append `suffix` to the full file name (`dali.ini` -> `dali.ini.old`)
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Display a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Display a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".bold().yellow(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("  • {message}");
}

fn describe(command: &Command) -> String {
    let mut line = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Run a prepared command and return its output
pub fn run(command: &mut Command) -> Result<Output> {
    let line = describe(command);
    log::debug!("Running command: {line}");

    let output = command.output().map_err(|source| Error::Spawn {
        command: line,
        source,
    })?;

    log::debug!("Command exit status: {}", output.status);
    if !output.stdout.is_empty() {
        log::debug!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        log::debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    Ok(output)
}

/// Run a prepared command and fail unless it exits with status 0
pub fn run_success(command: &mut Command) -> Result<Output> {
    let output = run(command)?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: describe(command),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output)
}

/// Build a `sudo <program> <args..>` command
pub fn sudo(program: &str, args: &[&str]) -> Command {
    let mut command = Command::new("sudo");
    command.arg(program).args(args);
    command
}
