//! Binary artifact resolution.
//!
//! A firmware binary either comes straight from the user or is picked out of
//! a build output directory. Either way it must be an existing regular file
//! that fits the device's update partition.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};

/// Largest binary the device update partition accepts (16 MiB).
pub const MAX_ARTIFACT_SIZE: u64 = 16 * 1024 * 1024;

/// File extension of binaries the build toolchain produces.
pub const ARTIFACT_EXTENSION: &str = "bin";

/// A validated firmware binary on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    path: Utf8PathBuf,
    size: u64,
}

impl BinaryArtifact {
    /// Path to the binary.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Size of the binary in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Base name of the binary, e.g. `blink.bin`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    /// Base name without its extension, e.g. `blink`.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.path.file_stem().unwrap_or_else(|| self.file_name())
    }
}

/// Check that `path` names an existing regular file no larger than
/// [`MAX_ARTIFACT_SIZE`].
///
/// # Errors
///
/// Returns [`PackagerError::FileNotFound`] when the path is missing or not a
/// regular file, and [`PackagerError::ArtifactTooLarge`] when it exceeds the
/// size limit.
pub fn validate_binary(path: &Utf8Path) -> Result<BinaryArtifact> {
    let metadata = match path.metadata() {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            return Err(PackagerError::FileNotFound {
                path: path.to_owned(),
            });
        }
    };

    let size = metadata.len();
    if size > MAX_ARTIFACT_SIZE {
        return Err(PackagerError::ArtifactTooLarge {
            path: path.to_owned(),
            size,
            limit: MAX_ARTIFACT_SIZE,
        });
    }

    Ok(BinaryArtifact {
        path: path.to_owned(),
        size,
    })
}

/// Pick the build artifact most likely to belong to a sketch.
///
/// This is a heuristic: the first candidate whose file name contains the
/// sketch name wins, then the first containing the sketch directory name,
/// then the first candidate overall. Build toolchains usually name their
/// output after the sketch, but nothing guarantees it. Returns `None` only
/// when `candidates` is empty.
#[must_use]
pub fn select_artifact<'a>(
    candidates: &'a [Utf8PathBuf],
    sketch_name: &str,
    directory_name: &str,
) -> Option<&'a Utf8PathBuf> {
    let name_contains = |needle: &str| {
        candidates.iter().find(|candidate| {
            !needle.is_empty()
                && candidate
                    .file_name()
                    .is_some_and(|name| name.contains(needle))
        })
    };

    name_contains(sketch_name)
        .or_else(|| name_contains(directory_name))
        .or_else(|| candidates.first())
}
