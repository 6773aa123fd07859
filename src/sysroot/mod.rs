//! Sysroot and toolchain payload installation.
//!
//! Cross-compilation sysroots ship as `payload.tar.7z` tarballs bundled
//! inside toolchain packages. This module materializes them into a
//! per-machine cache directory, exactly once per machine, delegating the
//! decompression to external 7-zip and tar tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use unity_build_tools::sysroot::PayloadInstaller;
//!
//! let mut installer = PayloadInstaller::new("com.unity.sysroot.linux-x86_64");
//! installer.register_payload("com.unity.sysroot.linux-x86_64", "linux-x64");
//! if !installer.initialize() {
//!     // surface to the build pipeline; do not run IL2CPP without it
//! }
//! ```

pub mod install;
pub mod package;
pub mod platform;

pub use install::{ensure_installed, PayloadInstaller, CACHE_ENV_VAR};
pub use package::{payload_path, InitializationStatus, PayloadDescriptor, ToolchainPackage};
pub use platform::{HostCommands, HostPlatform};
