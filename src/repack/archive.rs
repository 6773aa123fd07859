//! Zip archive creation for repackaged builds.
//!
//! The archiver is a trait so the repackaging sequence can be exercised
//! against a failing implementation; compression failures must never skip
//! the restoration pass.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Compresses a directory's contents into a single archive file.
pub trait Archiver {
    /// Pack the contents of `source_dir` (not the directory itself) into
    /// the archive at `dest`.
    fn compress(&self, source_dir: &Path, dest: &Path) -> Result<()>;
}

/// Default archiver producing a deflate-compressed zip.
///
/// File permissions are preserved on Unix hosts so the launcher script
/// stays executable after extraction.
#[derive(Debug, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn compress(&self, source_dir: &Path, dest: &Path) -> Result<()> {
        let file = File::create(dest)
            .with_context(|| format!("creating archive '{}'", dest.display()))?;
        let mut zip = ZipWriter::new(file);
        let base_options =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(source_dir).min_depth(1) {
            let entry = entry
                .with_context(|| format!("walking '{}'", source_dir.display()))?;
            let rel = entry
                .path()
                .strip_prefix(source_dir)
                .with_context(|| format!("relativizing '{}'", entry.path().display()))?;
            let name = rel.to_string_lossy().replace('\\', "/");

            if entry.file_type().is_dir() {
                zip.add_directory(name, base_options)
                    .with_context(|| format!("adding directory '{}'", rel.display()))?;
                continue;
            }

            let mut options = base_options;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = entry
                    .metadata()
                    .with_context(|| format!("reading metadata of '{}'", rel.display()))?;
                options = options.unix_permissions(metadata.permissions().mode());
            }

            zip.start_file(name, options)
                .with_context(|| format!("adding file '{}'", rel.display()))?;
            let mut source = File::open(entry.path())
                .with_context(|| format!("opening '{}'", entry.path().display()))?;
            io::copy(&mut source, &mut zip)
                .with_context(|| format!("compressing '{}'", rel.display()))?;
        }

        zip.finish()
            .with_context(|| format!("finalizing archive '{}'", dest.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compress_packs_directory_contents() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("staging");
        fs::create_dir_all(source.join("Build/game_Data")).unwrap();
        fs::write(source.join("Launch.x86_64"), "#!/bin/sh\n").unwrap();
        fs::write(source.join("Build/game_Data/level0"), "scene").unwrap();

        let dest = temp.path().join("Build.zip");
        ZipArchiver.compress(&source, &dest).unwrap();

        let file = File::open(&dest).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();

        assert!(names.iter().any(|n| n == "Launch.x86_64"));
        assert!(names.iter().any(|n| n == "Build/game_Data/level0"));
        // The staging directory itself is not an entry.
        assert!(!names.iter().any(|n| n.starts_with("staging")));
    }

    #[test]
    fn test_compress_preserves_executable_bit() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("staging");
        fs::create_dir_all(&source).unwrap();

        let script = source.join("Launch.x86_64");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let dest = temp.path().join("Build.zip");
        ZipArchiver.compress(&source, &dest).unwrap();

        #[cfg(unix)]
        {
            let file = File::open(&dest).unwrap();
            let mut archive = zip::ZipArchive::new(file).unwrap();
            let entry = archive.by_name("Launch.x86_64").unwrap();
            let mode = entry.unix_mode().unwrap();
            assert_eq!(mode & 0o111, 0o111, "executable bit should survive");
        }
    }
}
