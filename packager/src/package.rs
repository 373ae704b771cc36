//! OTA package assembly.
//!
//! Turns a validated firmware binary into `OTA_<stem>.zip`, a flat archive
//! holding the binary renamed to `system_<name>` and a `.hash` file with its
//! integrity token. The renamed copy and the token file only ever exist in a
//! hidden staging directory inside the destination, and the archive is
//! written under a temporary name and moved into place once complete. The
//! finished archive is therefore the only file a run leaves behind, whether
//! it succeeds or fails.

use crate::error::{PackagerError, Result};
use crate::locator::BinaryArtifact;
use crate::token::{IntegrityToken, compute_integrity_token};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Prefix the device updater expects on the firmware entry.
pub const SYSTEM_PREFIX: &str = "system_";

/// Name of the archive entry holding the integrity token.
pub const HASH_FILE_NAME: &str = ".hash";

const STAGING_PREFIX: &str = ".ota-staging-";

/// Output produced by [`assemble_package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    /// Path to the created archive.
    pub archive_path: Utf8PathBuf,
    /// Name of the firmware entry inside the archive.
    pub entry_name: String,
    /// Token written to the `.hash` entry.
    pub token: IntegrityToken,
}

/// Return the archive entry name for a binary called `file_name`.
///
/// The prefix is added once; names that already carry it are kept as is.
///
/// # Examples
///
/// ```
/// use ota_packager::package::system_file_name;
///
/// assert_eq!(system_file_name("blink.bin"), "system_blink.bin");
/// assert_eq!(system_file_name("system_blink.bin"), "system_blink.bin");
/// ```
#[must_use]
pub fn system_file_name(file_name: &str) -> String {
    if file_name.starts_with(SYSTEM_PREFIX) {
        file_name.to_owned()
    } else {
        format!("{SYSTEM_PREFIX}{file_name}")
    }
}

/// Return the archive file name for a binary whose stem is `stem`.
#[must_use]
pub fn archive_file_name(stem: &str) -> String {
    format!("OTA_{stem}.zip")
}

/// Package `artifact` into an OTA archive inside `destination`.
///
/// # Errors
///
/// Returns [`PackagerError::DestinationNotFound`] if `destination` is not a
/// directory, [`PackagerError::CopyFailed`] if the binary cannot be copied
/// into staging, [`PackagerError::Archive`] if the zip writer fails, and
/// [`PackagerError::Io`] for any other filesystem failure.
pub fn assemble_package(
    artifact: &BinaryArtifact,
    destination: &Utf8Path,
) -> Result<PackageOutput> {
    if !destination.is_dir() {
        return Err(PackagerError::DestinationNotFound {
            path: destination.to_owned(),
        });
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(destination)?;

    let entry_name = system_file_name(artifact.file_name());
    let staged_binary = staging.path().join(&entry_name);
    fs::copy(artifact.path(), &staged_binary).map_err(|source| PackagerError::CopyFailed {
        from: artifact.path().to_owned(),
        to: destination.join(&entry_name),
        source,
    })?;

    let token = compute_integrity_token(&staged_binary)?;
    debug!("integrity token for {entry_name}: {token}");

    let hash_file = staging.path().join(HASH_FILE_NAME);
    fs::write(&hash_file, token.as_str())?;

    let archive_path = destination.join(archive_file_name(artifact.file_stem()));
    create_archive(
        &archive_path,
        &[
            (staged_binary, entry_name.clone()),
            (hash_file, HASH_FILE_NAME.to_owned()),
        ],
    )?;
    info!("wrote {archive_path}");

    discard_staging(staging);

    Ok(PackageOutput {
        archive_path,
        entry_name,
        token,
    })
}

/// Create a deflated zip archive at `output_path`.
///
/// Each entry in `files` is a `(source_path, archive_name)` pair; only
/// `archive_name` is recorded, so no directory structure leaks into the
/// archive. The archive is assembled under a temporary name in the same
/// directory and renamed over `output_path` once complete.
///
/// # Errors
///
/// Returns [`PackagerError::Archive`] if the zip writer fails and
/// [`PackagerError::Io`] if a source file cannot be read or the archive
/// cannot be moved into place.
pub fn create_archive(
    output_path: &Utf8Path,
    files: &[(PathBuf, String)],
) -> Result<()> {
    let parent = output_path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    let mut partial = NamedTempFile::new_in(parent)?;

    write_entries(partial.as_file_mut(), files).map_err(|source| PackagerError::Archive {
        path: output_path.to_owned(),
        source,
    })?;

    partial
        .persist(output_path)
        .map_err(|err| PackagerError::Io(err.error))?;
    Ok(())
}

fn write_entries(
    file: &mut fs::File,
    entries: &[(PathBuf, String)],
) -> zip::result::ZipResult<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut writer = zip::ZipWriter::new(file);

    for (source_path, archive_name) in entries {
        writer.start_file(archive_name.as_str(), options)?;
        let mut source = fs::File::open(source_path)?;
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

fn discard_staging(staging: TempDir) {
    let shown = staging.path().display().to_string();
    if let Err(err) = staging.close() {
        warn!("failed to remove staging directory {shown}: {err}");
    }
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
