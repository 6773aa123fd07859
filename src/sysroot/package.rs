//! Toolchain package descriptions.
//!
//! A sysroot or toolchain ships as a package carrying one compressed
//! tarball at a fixed relative location. The package itself is described
//! by the [`ToolchainPackage`] capability trait; payload bookkeeping
//! lives in [`PayloadDescriptor`] and [`InitializationStatus`].

use std::path::{Path, PathBuf};

/// Filename of the payload tarball inside a package's `data~` directory.
pub const PAYLOAD_FILENAME: &str = "payload.tar.7z";

/// Compute the payload tarball path for a package.
///
/// The `Packages/<id>/data~/payload.tar.7z` template is a compatibility
/// contract with existing packaged payloads and must not change.
pub fn payload_path(package_id: &str) -> PathBuf {
    Path::new("Packages")
        .join(package_id)
        .join("data~")
        .join(PAYLOAD_FILENAME)
}

/// One registered payload awaiting installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDescriptor {
    /// Path of the payload tarball.
    pub source: PathBuf,
    /// Directory the payload is to be installed into.
    pub dest: PathBuf,
}

/// Per-installer initialization state.
///
/// Terminal states are sticky: once an installer has succeeded or failed
/// it reports the memoized result and never re-runs installation. A new
/// installer instance is required to retry after fixing the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationStatus {
    Uninitialized,
    Failed,
    Succeeded,
}

/// Capabilities of a concrete sysroot or toolchain package.
///
/// Every concrete package implements this directly; there is no base
/// package type. Defaults mirror an empty capability set so a package
/// only overrides what it actually provides.
pub trait ToolchainPackage {
    /// Package name, e.g. `com.unity.sysroot.linux-x86_64`.
    fn name(&self) -> &str;

    /// Host platform the package runs on (`linux`, `win`, `macos`).
    fn host_platform(&self) -> &str {
        ""
    }

    /// Host architecture.
    fn host_arch(&self) -> &str {
        ""
    }

    /// Platform the package targets.
    fn target_platform(&self) -> &str {
        ""
    }

    /// Architecture the package targets.
    fn target_arch(&self) -> &str {
        ""
    }

    /// Extra arguments the package supplies to the IL2CPP compiler.
    fn il2cpp_arguments(&self) -> Vec<String> {
        Vec::new()
    }
}
