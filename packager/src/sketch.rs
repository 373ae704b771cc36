//! Sketch discovery and the temporary main-file alias.
//!
//! The build toolchain insists that a sketch directory contains a main file
//! named after the directory (`blink/blink.ino`). Sketches that break this
//! rule are built through a hard link with the expected name, held by a
//! [`SketchAlias`] guard for exactly as long as the build runs.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;

/// File extension of sketch main files.
pub const SKETCH_EXTENSION: &str = "ino";

/// A sketch source file inside its sketch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sketch {
    path: Utf8PathBuf,
}

impl Sketch {
    /// Wrap an existing sketch file.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::NoSketchFound`] when `path` is not a file
    /// with the sketch extension.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        if path.is_file() && has_sketch_extension(path) {
            Ok(Self {
                path: path.to_owned(),
            })
        } else {
            Err(PackagerError::NoSketchFound {
                path: path.to_owned(),
            })
        }
    }

    /// Path to the sketch file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Sketch name, i.e. the file stem.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_stem().unwrap_or_default()
    }

    /// Directory containing the sketch.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."))
    }

    /// Name of the containing directory.
    ///
    /// Relative paths such as `blink.ino` are resolved against the current
    /// directory so the name is never empty when one exists.
    #[must_use]
    pub fn directory_name(&self) -> String {
        if let Some(name) = self.directory().file_name() {
            return name.to_owned();
        }
        self.directory()
            .canonicalize_utf8()
            .ok()
            .and_then(|dir| dir.file_name().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Path the toolchain expects the main file at.
    #[must_use]
    pub fn expected_main_path(&self) -> Utf8PathBuf {
        self.directory()
            .join(format!("{}.{SKETCH_EXTENSION}", self.directory_name()))
    }

    /// The same sketch addressed by an absolute path.
    ///
    /// Relative paths are joined onto the current directory; symlinks are
    /// left unresolved.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the current directory cannot be read, or
    /// [`PackagerError::NonUtf8Path`] if it is not valid UTF-8.
    pub fn absolute(&self) -> Result<Self> {
        if self.path.is_absolute() {
            return Ok(self.clone());
        }
        let path = std::path::absolute(&self.path)?;
        let path = Utf8PathBuf::from_path_buf(path)
            .map_err(|path| PackagerError::NonUtf8Path(path.display().to_string()))?;
        Ok(Self { path })
    }

    /// Whether the sketch name differs from its directory name.
    #[must_use]
    pub fn needs_alias(&self) -> bool {
        self.name() != self.directory_name()
    }
}

fn has_sketch_extension(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SKETCH_EXTENSION))
}

/// List the sketch files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`PackagerError::NoSketchFound`] when `dir` cannot be read or
/// holds no sketch files.
pub fn discover_sketches(dir: &Utf8Path) -> Result<Vec<Sketch>> {
    let not_found = || PackagerError::NoSketchFound {
        path: dir.to_owned(),
    };

    let mut sketches = Vec::new();
    for entry in dir.read_dir_utf8().map_err(|_| not_found())? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_sketch_extension(path) {
            sketches.push(Sketch {
                path: path.to_owned(),
            });
        }
    }

    if sketches.is_empty() {
        return Err(not_found());
    }

    sketches.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("found {} sketch file(s) in {dir}", sketches.len());
    Ok(sketches)
}

/// Pick the sketch named after its directory, else the first one.
#[must_use]
pub fn preferred_sketch(sketches: &[Sketch]) -> Option<&Sketch> {
    sketches
        .iter()
        .find(|s| !s.needs_alias())
        .or_else(|| sketches.first())
}

/// A temporary hard link giving a sketch the main-file name the toolchain
/// expects. The link is removed when the guard is dropped.
#[derive(Debug)]
pub struct SketchAlias {
    path: Utf8PathBuf,
}

impl SketchAlias {
    /// Create the alias for `sketch` if it needs one.
    ///
    /// Returns `Ok(None)` without touching the filesystem when the sketch is
    /// already named after its directory.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::AliasLinkFailed`] if the link cannot be
    /// created, including when a file already occupies the alias path.
    pub fn acquire(sketch: &Sketch) -> Result<Option<Self>> {
        if !sketch.needs_alias() {
            return Ok(None);
        }

        let alias = sketch.expected_main_path();
        fs::hard_link(sketch.path(), &alias).map_err(|source| {
            PackagerError::AliasLinkFailed {
                sketch: sketch.path().to_owned(),
                alias: alias.clone(),
                source,
            }
        })?;
        debug!("linked {alias} -> {}", sketch.path());

        Ok(Some(Self { path: alias }))
    }

    /// Path of the alias link.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for SketchAlias {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("removed sketch alias {}", self.path),
            Err(err) => warn!("failed to remove sketch alias {}: {err}", self.path),
        }
    }
}
