//! Build repackaging and sysroot payload installation for Unity Linux builds.
//!
//! Two independent utilities consumed by an external build pipeline:
//!
//! - **Repackager** ([`repack`]) - Turns a finished Linux build directory
//!   into a distributable, self-launching `Build.zip` with a bundled
//!   Vulkan loader, without losing any build artifact even when
//!   packaging fails partway.
//! - **Payload installer** ([`sysroot`]) - Decompresses toolchain
//!   payload tarballs into a per-machine cache directory exactly once,
//!   memoizing the result per instance.
//!
//! Supporting modules: [`preflight`] validates host tools and
//! capabilities before any work starts; [`process`] runs the external
//! decompression tools through the platform shell.
//!
//! # Architecture
//!
//! ```text
//! build pipeline
//!     │
//!     ├── repack::post_process_build(build_dir)
//!     │       snapshot ─ stage ─ inject launcher + libvulkan ─ zip ─ restore
//!     │
//!     └── sysroot::PayloadInstaller
//!             register_payload ─ initialize ─ 7za | tar into cache root
//! ```
//!
//! Both components are synchronous and single-threaded: every external
//! tool invocation blocks until the child exits, and neither directory
//! (the build directory, the payload cache) is safe for concurrent
//! writers. The pipeline serializes these calls by convention.

pub mod preflight;
pub mod process;
pub mod repack;
pub mod sysroot;

pub use repack::{post_process_build, post_process_build_with, RepackOptions};
pub use sysroot::{InitializationStatus, PayloadInstaller, ToolchainPackage};
