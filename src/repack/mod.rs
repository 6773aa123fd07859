//! Build-directory repackaging for driverless Linux environments.
//!
//! Takes a finished Linux player build and produces a single `Build.zip`
//! that is self-launching on hosts without a native Vulkan driver: the
//! original build tree is nested under `Build/`, a bundled
//! `libvulkan.so.1` is placed next to the player, and a launcher script
//! plus placeholder data directory sit at the archive root.
//!
//! The transformation stages everything inside the build directory, zips
//! the staging tree, then moves every original entry back where it came
//! from. The move-back pass runs even when compression fails, so the
//! build directory never loses artifacts to a packaging error.

mod archive;
mod launcher;

pub use archive::{Archiver, ZipArchiver};
pub use launcher::{launcher_script, LAUNCHER_DATA_DIR, LAUNCHER_NAME};

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the player executable the repackager looks for.
pub const EXECUTABLE_EXTENSION: &str = "x86_64";

/// Filename the compatibility library is installed under.
pub const VULKAN_LIB_NAME: &str = "libvulkan.so.1";

/// Name of the staging subtree created inside the build directory.
const STAGING_DIR_NAME: &str = "tmp";

/// Name of the nested directory the original build tree is moved into.
const BUILD_SUBDIR: &str = "Build";

/// Where the bundled compatibility library ships relative to the project.
const DEFAULT_VULKAN_LIB: &str =
    "Packages/com.unity.simulation.client/libvulkan~/libvulkan.so.1";

/// Repackaging options.
#[derive(Debug, Clone)]
pub struct RepackOptions {
    /// Path of the bundled `libvulkan.so.1` to copy into the build tree.
    pub vulkan_lib: PathBuf,

    /// Base name of the output archive (`<base>.zip` at the build
    /// directory's level).
    pub archive_base_name: String,
}

impl Default for RepackOptions {
    fn default() -> Self {
        Self {
            vulkan_lib: PathBuf::from(DEFAULT_VULKAN_LIB),
            archive_base_name: BUILD_SUBDIR.to_string(),
        }
    }
}

/// Repackage `build_dir` with the default options and zip archiver.
///
/// See [`post_process_build_with`].
pub fn post_process_build(build_dir: &Path) -> Result<()> {
    post_process_build_with(build_dir, &RepackOptions::default(), &ZipArchiver)
}

/// Repackage a finished build directory into a self-launching archive.
///
/// The directory must contain exactly one `*.x86_64` player executable;
/// with zero or several candidates the call logs a diagnostic and returns
/// without touching the filesystem. On success `build_dir` holds exactly
/// its original top-level entries plus the new archive. If compression
/// fails the error is logged, the original entries are still restored,
/// and no archive is guaranteed to exist.
pub fn post_process_build_with(
    build_dir: &Path,
    options: &RepackOptions,
    archiver: &dyn Archiver,
) -> Result<()> {
    let executables = find_executables(build_dir)?;
    if executables.len() != 1 {
        eprintln!(
            "cannot determine which executable to use in '{}' ({} candidates)",
            build_dir.display(),
            executables.len()
        );
        return Ok(());
    }

    let build_name = executables[0]
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    // A staging tree left behind by an interrupted run is garbage; a
    // merge would corrupt the snapshot bookkeeping below.
    let staging = build_dir.join(STAGING_DIR_NAME);
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("removing stale staging '{}'", staging.display()))?;
    }

    // Captured before any mutation and used for both move passes, so
    // entries created by the repackager itself are never moved twice.
    // An archive left by an earlier run is excluded: moving it through
    // staging would rename the stale archive back over the fresh one.
    let archive_path = build_dir.join(format!("{}.zip", options.archive_base_name));
    let archive_name = archive_path.file_name().map(|n| n.to_os_string());
    let snapshot = Snapshot::capture(build_dir, archive_name.as_deref())?;

    let build_subdir = staging.join(BUILD_SUBDIR);
    fs::create_dir_all(&build_subdir)
        .with_context(|| format!("creating staging '{}'", build_subdir.display()))?;

    snapshot.move_into(&build_subdir)?;

    fs::copy(&options.vulkan_lib, build_subdir.join(VULKAN_LIB_NAME)).with_context(|| {
        format!(
            "copying compatibility library '{}'",
            options.vulkan_lib.display()
        )
    })?;

    launcher::write_launcher(&staging, &build_name)?;
    launcher::write_placeholder_data_dir(&staging)?;

    if let Err(e) = archiver.compress(&staging, &archive_path) {
        eprintln!(
            "failed to compress '{}' to '{}': {:#}",
            staging.display(),
            archive_path.display(),
            e
        );
    }

    let failures = snapshot.move_back(&build_subdir);
    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("restoration failed: {:#}", failure);
        }
        // The staging tree still holds the unmoved entries; deleting it
        // now would lose build artifacts.
        bail!(
            "restoration of '{}' incomplete: {} entries left under '{}'",
            build_dir.display(),
            failures.len(),
            build_subdir.display()
        );
    }

    fs::remove_dir_all(&staging)
        .with_context(|| format!("removing staging '{}'", staging.display()))?;

    Ok(())
}

/// Top-level files matching `*.x86_64` in `build_dir`.
fn find_executables(build_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut executables = Vec::new();
    for entry in fs::read_dir(build_dir)
        .with_context(|| format!("reading build directory '{}'", build_dir.display()))?
    {
        let entry = entry
            .with_context(|| format!("iterating build directory '{}'", build_dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXECUTABLE_EXTENSION) {
            executables.push(path);
        }
    }
    Ok(executables)
}

/// Top-level listing of the build directory at invocation time.
///
/// Both move passes operate on this fixed listing; see the invariant on
/// [`post_process_build_with`].
struct Snapshot {
    root: PathBuf,
    files: Vec<OsString>,
    dirs: Vec<OsString>,
}

impl Snapshot {
    /// Capture the top-level listing of `root`, skipping the file named
    /// `exclude_file` (the output archive is not a build artifact).
    fn capture(root: &Path, exclude_file: Option<&std::ffi::OsStr>) -> Result<Self> {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)
            .with_context(|| format!("snapshotting '{}'", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("snapshotting '{}'", root.display()))?;
            let file_type = entry
                .file_type()
                .with_context(|| format!("snapshotting '{}'", root.display()))?;
            if file_type.is_dir() {
                dirs.push(entry.file_name());
            } else if exclude_file != Some(entry.file_name().as_os_str()) {
                files.push(entry.file_name());
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            files,
            dirs,
        })
    }

    /// Move every snapshotted entry from the root into `dest`.
    fn move_into(&self, dest: &Path) -> Result<()> {
        for name in self.files.iter().chain(self.dirs.iter()) {
            let from = self.root.join(name);
            let to = dest.join(name);
            println!("moving {} to {}", from.display(), to.display());
            fs::rename(&from, &to)
                .with_context(|| format!("moving '{}' to '{}'", from.display(), to.display()))?;
        }
        Ok(())
    }

    /// Move every snapshotted entry from `from` back to the root.
    ///
    /// Best-effort: every entry is attempted even if an earlier one
    /// fails, so a single bad move does not strand the rest in staging.
    fn move_back(&self, from: &Path) -> Vec<anyhow::Error> {
        let mut failures = Vec::new();
        for name in self.files.iter().chain(self.dirs.iter()) {
            let src = from.join(name);
            let dst = self.root.join(name);
            println!("moving {} to {}", src.display(), dst.display());
            if let Err(e) = fs::rename(&src, &dst).with_context(|| {
                format!("moving '{}' back to '{}'", src.display(), dst.display())
            }) {
                failures.push(e);
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn compress(&self, _source_dir: &Path, _dest: &Path) -> Result<()> {
            bail!("disk full")
        }
    }

    /// Build directory with `game.x86_64` and `game_Data/`, plus a
    /// stand-in vulkan library outside the build tree.
    fn sample_build() -> (TempDir, PathBuf, RepackOptions) {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("build");
        fs::create_dir_all(build_dir.join("game_Data")).unwrap();
        fs::write(build_dir.join("game.x86_64"), "ELF player").unwrap();
        fs::write(build_dir.join("game_Data/level0"), "scene data").unwrap();

        let vulkan = temp.path().join("libvulkan.so.1");
        fs::write(&vulkan, "vulkan loader").unwrap();

        let options = RepackOptions {
            vulkan_lib: vulkan,
            ..Default::default()
        };
        (temp, build_dir, options)
    }

    fn toplevel(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn archive_names(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_end_to_end_repackaging() {
        let (_temp, build_dir, options) = sample_build();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        // The build directory looks untouched, plus the archive.
        let expected: BTreeSet<String> = ["game.x86_64", "game_Data", "Build.zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(toplevel(&build_dir), expected);
        assert_eq!(
            fs::read_to_string(build_dir.join("game_Data/level0")).unwrap(),
            "scene data"
        );

        let names = archive_names(&build_dir.join("Build.zip"));
        let has = |wanted: &str| {
            names
                .iter()
                .any(|n| n.trim_end_matches('/') == wanted)
        };
        assert!(has("Launch.x86_64"));
        assert!(has("Launch_Data/placeholder.txt"));
        assert!(has("Build/game.x86_64"));
        assert!(has("Build/game_Data"));
        assert!(has("Build/game_Data/level0"));
        assert!(has("Build/libvulkan.so.1"));
    }

    #[test]
    fn test_zero_executables_makes_no_changes() {
        let (_temp, build_dir, options) = sample_build();
        fs::remove_file(build_dir.join("game.x86_64")).unwrap();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        let expected: BTreeSet<String> =
            ["game_Data"].iter().map(|s| s.to_string()).collect();
        assert_eq!(toplevel(&build_dir), expected);
    }

    #[test]
    fn test_multiple_executables_makes_no_changes() {
        let (_temp, build_dir, options) = sample_build();
        fs::write(build_dir.join("other.x86_64"), "second player").unwrap();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        let expected: BTreeSet<String> = ["game.x86_64", "other.x86_64", "game_Data"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(toplevel(&build_dir), expected);
    }

    #[test]
    fn test_stale_staging_is_replaced_not_merged() {
        let (_temp, build_dir, options) = sample_build();
        fs::create_dir_all(build_dir.join("tmp/junk")).unwrap();
        fs::write(build_dir.join("tmp/garbage.txt"), "stale").unwrap();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        assert!(!build_dir.join("tmp").exists());
        let names = archive_names(&build_dir.join("Build.zip"));
        assert!(
            !names.iter().any(|n| n.contains("garbage.txt")),
            "stale staging contents must not leak into the archive"
        );
    }

    #[test]
    fn test_compression_failure_still_restores() {
        let (_temp, build_dir, options) = sample_build();

        post_process_build_with(&build_dir, &options, &FailingArchiver).unwrap();

        let expected: BTreeSet<String> = ["game.x86_64", "game_Data"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(toplevel(&build_dir), expected);
        assert_eq!(
            fs::read_to_string(build_dir.join("game_Data/level0")).unwrap(),
            "scene data"
        );
    }

    #[test]
    fn test_build_with_only_executable() {
        let (_temp, build_dir, options) = sample_build();
        fs::remove_dir_all(build_dir.join("game_Data")).unwrap();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        let expected: BTreeSet<String> = ["game.x86_64", "Build.zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(toplevel(&build_dir), expected);

        let names = archive_names(&build_dir.join("Build.zip"));
        assert!(names
            .iter()
            .any(|n| n.trim_end_matches('/') == "Build/game.x86_64"));
    }

    #[test]
    fn test_repackaging_is_repeatable() {
        let (_temp, build_dir, options) = sample_build();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();
        // The archive from the first run is not a build artifact; it
        // stays at the top level and is overwritten by the second run.
        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        let expected: BTreeSet<String> = ["game.x86_64", "game_Data", "Build.zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(toplevel(&build_dir), expected);

        let names = archive_names(&build_dir.join("Build.zip"));
        assert!(
            !names.iter().any(|n| n.contains("Build.zip")),
            "the prior archive must not be packed into the new one"
        );
    }

    #[test]
    fn test_second_run_replaces_stale_archive() {
        let (_temp, build_dir, options) = sample_build();

        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        fs::write(build_dir.join("game_Data/level0"), "patched scene").unwrap();
        post_process_build_with(&build_dir, &options, &ZipArchiver).unwrap();

        // The delivered archive reflects the latest build, not the one
        // left over from the previous run.
        let file = fs::File::open(build_dir.join("Build.zip")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name("Build/game_Data/level0").unwrap();
        let mut content = String::new();
        std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
        assert_eq!(content, "patched scene");
    }
}
