//! Idempotent payload installation into the sysroot cache.
//!
//! An installer owns the ordered list of payloads one toolchain package
//! registers and materializes them into the per-machine cache exactly
//! once. Success and failure are memoized per instance; a failed
//! installer stays failed until a new instance retries after the
//! underlying cause is fixed.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::preflight;
use crate::process::{CommandRunner, ShellRunner};
use crate::sysroot::package::{payload_path, InitializationStatus, PayloadDescriptor, ToolchainPackage};
use crate::sysroot::platform::{HostCommands, HostPlatform};

/// Environment variable overriding the cache root for all installs.
pub const CACHE_ENV_VAR: &str = "UNITY_SYSROOT_CACHE";

/// Installs registered payloads into the sysroot cache.
pub struct PayloadInstaller {
    name: String,
    payloads: Vec<PayloadDescriptor>,
    status: InitializationStatus,
    commands: HostCommands,
    runner: Box<dyn CommandRunner>,
}

impl PayloadInstaller {
    /// Installer for the named toolchain package, using the current
    /// host's commands and the real shell.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_runner(
            name,
            HostCommands::for_current_host(),
            Box::new(ShellRunner),
        )
    }

    /// Installer for a concrete toolchain package.
    pub fn for_package(package: &dyn ToolchainPackage) -> Self {
        Self::new(package.name())
    }

    /// Installer with explicit command strategy and runner. Tests use
    /// this to record which external commands would run.
    pub fn with_runner(
        name: impl Into<String>,
        commands: HostCommands,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            payloads: Vec::new(),
            status: InitializationStatus::Uninitialized,
            commands,
            runner,
        }
    }

    /// Current initialization state.
    pub fn status(&self) -> InitializationStatus {
        self.status
    }

    /// Register a payload by package id and cache subdirectory.
    ///
    /// The tarball is expected at `Packages/<id>/data~/payload.tar.7z`
    /// relative to the project, and installs into
    /// [`resolve_install_directory`] of `install_subdir`. The source is
    /// absolutized here: the extract pipeline later runs with the
    /// destination directory as its working directory, where a relative
    /// source would no longer resolve. Registrations made after
    /// [`initialize`] are not retroactively installed; that is a
    /// documented limitation of the one-shot initialization model.
    ///
    /// [`resolve_install_directory`]: Self::resolve_install_directory
    /// [`initialize`]: Self::initialize
    pub fn register_payload(&mut self, package_id: &str, install_subdir: &str) {
        let source = payload_path(package_id);
        let source = match env::current_dir() {
            Ok(cwd) => cwd.join(source),
            Err(_) => source,
        };
        self.payloads.push(PayloadDescriptor {
            source,
            dest: self.resolve_install_directory(install_subdir),
        });
    }

    /// Ensure every registered payload is present in the cache.
    ///
    /// Memoized: after the first call the cached verdict is returned
    /// without re-running any installation step. Payloads are processed
    /// in registration order and the first failure wins; later payloads
    /// are not attempted.
    pub fn initialize(&mut self) -> bool {
        if self.status != InitializationStatus::Uninitialized {
            return self.status == InitializationStatus::Succeeded;
        }

        for i in 0..self.payloads.len() {
            let descriptor = self.payloads[i].clone();
            if descriptor.dest.is_dir() {
                continue;
            }
            if !self.preconditions_are_met() || !self.install_payload(&descriptor) {
                eprintln!("failed to initialize package: {}", self.name);
                self.status = InitializationStatus::Failed;
                return false;
            }
        }

        self.status = InitializationStatus::Succeeded;
        true
    }

    /// Directory `install_subdir` resolves to under the cache root.
    ///
    /// The `UNITY_SYSROOT_CACHE` override is read on every call rather
    /// than cached, so tests and build farms can redirect the cache per
    /// invocation.
    pub fn resolve_install_directory(&self, install_subdir: &str) -> PathBuf {
        let root = match env::var(CACHE_ENV_VAR) {
            Ok(value) if !value.is_empty() => PathBuf::from(value),
            _ => self.commands.default_cache_root(),
        };
        root.join(install_subdir)
    }

    /// Host capability checks required before any installation.
    ///
    /// Windows must permit unprivileged symlink creation; the sysroot
    /// payloads contain symlinks that cannot be materialized otherwise.
    /// A failing probe is a host configuration error, not a transient
    /// fault.
    fn preconditions_are_met(&self) -> bool {
        if self.commands.platform() == HostPlatform::Windows
            && !preflight::can_create_symlinks()
        {
            eprintln!(
                "the sysroot and toolchain packages require that Windows be configured \
                 to allow creation of symlinks without elevation of privilege"
            );
            return false;
        }
        true
    }

    /// Decompress one payload into its destination.
    ///
    /// Both shell stages must succeed. A failed extraction removes the
    /// partially-populated destination so a later idempotency check
    /// cannot mistake it for a completed install.
    fn install_payload(&self, descriptor: &PayloadDescriptor) -> bool {
        let create = self.commands.create_dir_command(&descriptor.dest);
        if !self.runner.run(&create, None) {
            return false;
        }

        let extract = self
            .commands
            .extract_command(&descriptor.source, &descriptor.dest);
        if !self.runner.run(&extract, Some(&descriptor.dest)) {
            let remove = self.commands.remove_tree_command(&descriptor.dest);
            self.runner.run(&remove, None);
            return false;
        }

        true
    }
}

/// Convenience wrapper: install a package's payloads or fail with the
/// memoized verdict. Callers that cannot proceed without the sysroot
/// check the boolean; this adapter is for pipelines that want an error.
pub fn ensure_installed(installer: &mut PayloadInstaller) -> Result<()> {
    if installer.initialize() {
        Ok(())
    } else {
        anyhow::bail!("sysroot payload installation failed")
    }
}
