// Archive unpacking and install-directory normalization
//
// The downloaded archive is a source-style zip with a single top-level
// directory. Extraction renames that directory to the canonical install
// name, stamps a version marker, and consumes the archive. A missing
// archive means a prior run already finished and is success.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{InstallError, PyliftError, Result};

/// Marker file recording the installed toolchain tag.
pub const VERSION_MARKER: &str = "version.txt";

#[derive(Debug, Default)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Unpacks `archive` into the directory holding `install_dir` and
    /// normalizes the result to `install_dir`, stamped with `version`.
    /// Returns false (no-op) when the archive does not exist.
    pub async fn extract(
        &self,
        archive: &Path,
        install_dir: &Path,
        version: &str,
    ) -> Result<bool> {
        let archive = archive.to_path_buf();
        let install_dir = install_dir.to_path_buf();
        let version = version.to_string();
        tokio::task::spawn_blocking(move || unpack_archive(&archive, &install_dir, &version))
            .await
            .map_err(|e| {
                PyliftError::Io(io::Error::other(format!("extraction task failed: {e}")))
            })?
    }
}

fn unpack_archive(archive: &Path, install_dir: &Path, version: &str) -> Result<bool> {
    if !archive.exists() {
        debug!(archive = %archive.display(), "No archive present, nothing to extract");
        return Ok(false);
    }

    if install_dir.exists() {
        fs::remove_dir_all(install_dir)?;
    }

    let storage_root = install_dir.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(storage_root)?;

    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file).map_err(|e| InstallError::ArchiveRead {
        archive: archive.to_path_buf(),
        error: e.to_string(),
    })?;

    // Staging keeps a malformed archive from leaving debris in the root.
    let staging = tempfile::tempdir_in(storage_root)?;
    let mut top_level: BTreeSet<String> = BTreeSet::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| InstallError::ArchiveRead {
            archive: archive.to_path_buf(),
            error: e.to_string(),
        })?;
        let Some(relative) = entry.enclosed_name().map(PathBuf::from) else {
            continue;
        };
        if let Some(first) = relative.components().next() {
            top_level.insert(first.as_os_str().to_string_lossy().into_owned());
        }

        let target = staging.path().join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    // Source archives carry exactly one top-level directory; anything
    // else means the download is not what this system expects.
    let unpacked_root = match top_level.iter().next() {
        Some(single) if top_level.len() == 1 => staging.path().join(single),
        _ => {
            return Err(InstallError::MalformedArchive {
                archive: archive.to_path_buf(),
                top_level: top_level.into_iter().collect(),
            }
            .into());
        }
    };
    if !unpacked_root.is_dir() {
        return Err(InstallError::MalformedArchive {
            archive: archive.to_path_buf(),
            top_level: top_level.into_iter().collect(),
        }
        .into());
    }

    fs::rename(&unpacked_root, install_dir)?;
    write_version_marker(install_dir, version)?;
    fs::remove_file(archive)?;

    info!(install_dir = %install_dir.display(), version, "Toolchain extracted");
    Ok(true)
}

/// Stamp the installed tag so later runs can skip the pipeline without
/// re-reading archive metadata.
pub fn write_version_marker(install_dir: &Path, version: &str) -> Result<()> {
    fs::write(install_dir.join(VERSION_MARKER), format!("{version}\n"))?;
    Ok(())
}

/// The installed tag, if any. Unreadable markers count as not installed.
pub fn read_version_marker(install_dir: &Path) -> Option<String> {
    fs::read_to_string(install_dir.join(VERSION_MARKER))
        .ok()
        .map(|content| content.trim().to_string())
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_version_marker(dir.path()), None);

        write_version_marker(dir.path(), "2.1.0").unwrap();
        assert_eq!(read_version_marker(dir.path()), Some("2.1.0".to_string()));
    }

    #[test]
    fn test_blank_version_marker_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VERSION_MARKER), "  \n").unwrap();
        assert_eq!(read_version_marker(dir.path()), None);
    }
}
