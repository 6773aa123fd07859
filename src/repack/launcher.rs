//! Launcher script and placeholder data directory generation.
//!
//! The repackaged archive is unpacked at `/unity_build` inside the target
//! container, so every path baked into the launcher is absolute under
//! `/unity_build/Build`. The script text depends only on the build name,
//! which keeps repeated packaging runs byte-identical.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Name of the launcher script at the staging root.
pub const LAUNCHER_NAME: &str = "Launch.x86_64";

/// Name of the placeholder data directory next to the launcher.
pub const LAUNCHER_DATA_DIR: &str = "Launch_Data";

/// In-container path where the archive contents are expected to land.
const CONTAINER_BUILD_DIR: &str = "/unity_build/Build";

/// Log file the launcher writes to before handing off to the player.
const PLAYER_LOG: &str = "/tmp/Player.Log";

/// Generate the launcher script for a build named `build_name`.
///
/// The script sets `LD_LIBRARY_PATH` so the player picks up the bundled
/// `libvulkan.so.1`, logs the invocation, marks the player and the library
/// executable, then runs the player with all forwarded arguments and
/// propagates its exit code.
pub fn launcher_script(build_name: &str) -> String {
    format!(
        "export LD_LIBRARY_PATH=\"{dir}\"\n\
         echo \"Launching {dir}/{name}.x86_64\" > {log}\n\
         echo \"$@\" >> {log}\n\
         chmod +x {dir}/{name}.x86_64 >> {log}\n\
         chmod +x {dir}/libvulkan.so.1 >> {log}\n\
         {dir}/{name}.x86_64 \"$@\"\n\
         exit $?\n",
        dir = CONTAINER_BUILD_DIR,
        name = build_name,
        log = PLAYER_LOG,
    )
}

/// Write the launcher script into `staging_dir` and mark it executable.
pub fn write_launcher(staging_dir: &Path, build_name: &str) -> Result<()> {
    let path = staging_dir.join(LAUNCHER_NAME);
    fs::write(&path, launcher_script(build_name))
        .with_context(|| format!("writing launcher script '{}'", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking '{}' executable", path.display()))?;
    }

    Ok(())
}

/// Create the `Launch_Data` placeholder directory in `staging_dir`.
///
/// Platform packaging conventions expect a `<name>_Data` sibling next to
/// every player executable; a single marker file keeps the directory from
/// being dropped by archivers that skip empty directories.
pub fn write_placeholder_data_dir(staging_dir: &Path) -> Result<()> {
    let data_dir = staging_dir.join(LAUNCHER_DATA_DIR);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating '{}'", data_dir.display()))?;
    fs::write(data_dir.join("placeholder.txt"), "placeholder\n")
        .with_context(|| format!("writing placeholder in '{}'", data_dir.display()))?;
    Ok(())
}
