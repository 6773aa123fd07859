//! Blocking shell-command execution.
//!
//! Both the repackager's external tools and the sysroot payload pipeline
//! delegate to host commands run through the platform shell. Every
//! invocation blocks until the child exits; there are no timeouts.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Build a command that runs `command` through the platform shell.
fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Run a shell command in the current directory.
///
/// Success means the command exited with status zero. Pipelines are
/// allowed; the shell reports the exit status of the last stage.
pub fn shell(command: &str) -> Result<()> {
    let status = shell_command(command)
        .status()
        .with_context(|| format!("spawning shell for '{}'", command))?;

    if !status.success() {
        bail!("command failed ({}): {}", status, command);
    }

    Ok(())
}

/// Run a shell command with the given working directory.
pub fn shell_in(command: &str, work_dir: &Path) -> Result<()> {
    let status = shell_command(command)
        .current_dir(work_dir)
        .status()
        .with_context(|| {
            format!(
                "spawning shell for '{}' in '{}'",
                command,
                work_dir.display()
            )
        })?;

    if !status.success() {
        bail!("command failed ({}): {}", status, command);
    }

    Ok(())
}

/// Seam for code that shells out to external tools.
///
/// The payload installer reports failures as booleans rather than errors,
/// so the runner contract is boolean too: `true` means the command ran and
/// exited zero. Tests substitute a recording runner to observe which
/// commands would have been executed.
pub trait CommandRunner {
    /// Run `command` through the shell, optionally in `work_dir`.
    fn run(&self, command: &str, work_dir: Option<&Path>) -> bool;
}

/// Production runner backed by [`shell`] / [`shell_in`].
#[derive(Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, work_dir: Option<&Path>) -> bool {
        let result = match work_dir {
            Some(dir) => shell_in(command, dir),
            None => shell(command),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                eprintln!("{:#}", e);
                false
            }
        }
    }
}
