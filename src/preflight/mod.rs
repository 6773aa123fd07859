//! Preflight checks for host capability validation.
//!
//! Validates that the host has the external tools and privileges the
//! payload installer needs before any work starts. This prevents cryptic
//! errors halfway through an installation.
//!
//! # Example
//!
//! ```rust
//! use unity_build_tools::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("tar") {
//!     println!("tar not installed");
//! }
//!
//! let tools = &[("7za", "p7zip"), ("tar", "tar")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// External tools the payload installer shells out to.
///
/// Each tuple is (command_name, package_name).
#[cfg(not(windows))]
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("7za", "p7zip"), ("tar", "tar")];
#[cfg(windows)]
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("7z", "7-zip")];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with the list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check that all tools the installer depends on are available.
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

/// Probe whether the host permits symlink creation without elevation.
///
/// Creates a target file in a scratch directory, attempts to link to it,
/// and cleans up. On Windows this fails unless Developer Mode (or the
/// corresponding policy) is enabled; sysroot payloads contain symlinks,
/// so installation must not proceed when the probe fails.
pub fn can_create_symlinks() -> bool {
    let scratch = std::env::temp_dir().join(format!("symlink-probe-{}", std::process::id()));
    if fs::create_dir_all(&scratch).is_err() {
        return false;
    }

    let target = scratch.join("targetfile");
    let link = scratch.join("link-to-targetfile");
    let result = fs::write(&target, b"").is_ok() && create_symlink(&target, &link);

    let _ = fs::remove_dir_all(&scratch);
    result
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> bool {
    std::os::unix::fs::symlink(target, link).is_ok()
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> bool {
    std::os::windows::fs::symlink_file(target, link).is_ok()
}

/// Whether the playback engine directory carries IL2CPP support.
///
/// The toolchain packages are useless without the `Variations/il2cpp`
/// player variation installed alongside the editor.
pub fn il2cpp_present(playback_engine_dir: &Path) -> bool {
    playback_engine_dir.join("Variations/il2cpp").is_dir()
}

/// Startup-phase check: warn when toolchain packages are installed but
/// the required IL2CPP player support is missing.
///
/// Invoked explicitly by the host pipeline's initialization sequence.
pub fn warn_if_il2cpp_missing(playback_engine_dir: &Path) {
    if !il2cpp_present(playback_engine_dir) {
        eprintln!(
            "Linux Compiler Toolchain package(s) present, but required Linux-IL2CPP is missing"
        );
    }
}
