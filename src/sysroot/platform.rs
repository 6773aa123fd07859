//! Host-platform command strategy for payload installation.
//!
//! Payload extraction is delegated to host commands whose spelling
//! differs per platform. Rather than scattering platform branches
//! through the installer, a [`HostCommands`] value is selected once and
//! supplies the command text and the default cache root.

use std::path::{Path, PathBuf};

/// Host platform the installer is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    MacOs,
    Windows,
}

impl HostPlatform {
    /// Platform of the current process.
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Linux
        }
    }
}

/// Shell command set for one host platform.
#[derive(Debug, Clone, Copy)]
pub struct HostCommands {
    platform: HostPlatform,
}

impl HostCommands {
    pub fn new(platform: HostPlatform) -> Self {
        Self { platform }
    }

    /// Commands for the current host.
    pub fn for_current_host() -> Self {
        Self::new(HostPlatform::current())
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    /// 7-zip compatible decompressor bundled with the editor tools.
    fn seven_zip(&self) -> &'static str {
        match self.platform {
            HostPlatform::Windows => "7z",
            _ => "7za",
        }
    }

    /// Command creating `dir` (and parents on Unix hosts).
    pub fn create_dir_command(&self, dir: &Path) -> String {
        match self.platform {
            HostPlatform::Windows => format!("mkdir \"{}\"", dir.display()),
            _ => format!("mkdir -p \"{}\"", dir.display()),
        }
    }

    /// Two-stage pipeline decompressing `tarball` into `dest`.
    ///
    /// The first stage streams the 7z payload as a tar stream; the
    /// second extracts it. On Windows the extraction stage relies on the
    /// working directory being `dest`.
    pub fn extract_command(&self, tarball: &Path, dest: &Path) -> String {
        match self.platform {
            HostPlatform::Windows => format!(
                "{tool} x -y \"{tarball}\" -so | {tool} x -y -aoa -ttar -si",
                tool = self.seven_zip(),
                tarball = tarball.display(),
            ),
            _ => format!(
                "{tool} x -y \"{tarball}\" -so | tar xf - --directory=\"{dest}\"",
                tool = self.seven_zip(),
                tarball = tarball.display(),
                dest = dest.display(),
            ),
        }
    }

    /// Command removing the directory tree at `dir`.
    pub fn remove_tree_command(&self, dir: &Path) -> String {
        match self.platform {
            HostPlatform::Windows => format!("rd /s /q \"{}\"", dir.display()),
            _ => format!("rm -rf \"{}\"", dir.display()),
        }
    }

    /// Per-user cache root payloads are installed under when
    /// `UNITY_SYSROOT_CACHE` is not set.
    pub fn default_cache_root(&self) -> PathBuf {
        match self.platform {
            HostPlatform::MacOs => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("Library/Unity/cache/sysroots"),
            _ => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("unity3d/cache/sysroots"),
        }
    }
}
