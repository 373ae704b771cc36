//! Sketch compilation through the external build toolchain.
//!
//! The builder probes the toolchain, gives the sketch its expected main-file
//! name for the duration of the build, runs the compile step under a time
//! limit, and then picks the produced binary out of the output directory.

use crate::error::{PackagerError, Result};
use crate::locator::{ARTIFACT_EXTENSION, BinaryArtifact, select_artifact, validate_binary};
use crate::runner::{CommandRunner, Invocation, RunOutcome, combined_output};
use crate::sketch::{Sketch, SketchAlias};
use crate::toolchain::{DEFAULT_TOOLCHAIN, PROBE_TIMEOUT, Toolchain};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;
use std::time::Duration;

/// Default time allowed for a compile.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Default output directory name, relative to the sketch directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Configuration for the build process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Toolchain program name or path.
    pub toolchain: String,
    /// Output directory, relative to the sketch directory unless absolute.
    pub build_dir: Utf8PathBuf,
    /// Time allowed for the toolchain version query.
    pub probe_timeout: Duration,
    /// Time allowed for the compile.
    pub build_timeout: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_owned(),
            build_dir: Utf8PathBuf::from(DEFAULT_BUILD_DIR),
            probe_timeout: PROBE_TIMEOUT,
            build_timeout: BUILD_TIMEOUT,
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The binary chosen for packaging.
    pub artifact: BinaryArtifact,
    /// Every binary found in the output directory, in scan order.
    pub candidates: Vec<Utf8PathBuf>,
    /// Directory the toolchain wrote to.
    pub output_dir: Utf8PathBuf,
}

/// Builder for compiling sketches.
pub struct Builder<'a> {
    config: BuildConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Builder<'a> {
    /// Create a new builder with the given configuration and runner.
    #[must_use]
    pub fn new(config: BuildConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Directory the toolchain writes artifacts for `sketch` into.
    #[must_use]
    pub fn output_dir(&self, sketch: &Sketch) -> Utf8PathBuf {
        sketch.directory().join(&self.config.build_dir)
    }

    /// Compile `sketch` for `board` and return the chosen binary.
    ///
    /// The toolchain runs inside the sketch directory and is handed
    /// absolute paths, so relative sketch paths resolve against the
    /// caller's working directory. Any sketch alias created for the build
    /// is removed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ToolchainUnavailable`],
    /// [`PackagerError::AliasLinkFailed`], [`PackagerError::BuildTimeout`],
    /// [`PackagerError::BuildUnexpected`], [`PackagerError::BuildFailed`],
    /// [`PackagerError::NoArtifactProduced`], or a binary validation error,
    /// according to the step that failed.
    pub fn build(&self, sketch: &Sketch, board: &str) -> Result<BuildResult> {
        let toolchain = Toolchain::probe(
            self.runner,
            &self.config.toolchain,
            self.config.probe_timeout,
        )?;

        let sketch = &sketch.absolute()?;
        let output_dir = self.output_dir(sketch);
        let _alias = SketchAlias::acquire(sketch)?;
        fs::create_dir_all(&output_dir)?;

        info!("compiling {} for {board}", sketch.path());
        self.compile(&toolchain, sketch, board, &output_dir)?;

        let candidates = find_artifacts(&output_dir)?;
        debug!("build artifacts: {candidates:?}");
        let chosen = select_artifact(&candidates, sketch.name(), &sketch.directory_name())
            .ok_or_else(|| PackagerError::NoArtifactProduced {
                output_dir: output_dir.clone(),
            })?;
        let artifact = validate_binary(chosen)?;
        info!("selected {}", artifact.path());

        Ok(BuildResult {
            artifact,
            candidates,
            output_dir,
        })
    }

    fn compile(
        &self,
        toolchain: &Toolchain,
        sketch: &Sketch,
        board: &str,
        output_dir: &Utf8Path,
    ) -> Result<()> {
        let invocation = Invocation::new(
            toolchain.program(),
            [
                "compile",
                "--fqbn",
                board,
                "--output-dir",
                output_dir.as_str(),
                sketch.directory().as_str(),
            ],
            self.config.build_timeout,
        )
        .current_dir(sketch.directory());

        let output = match self.runner.run(&invocation) {
            Ok(RunOutcome::Completed(output)) => output,
            Ok(RunOutcome::TimedOut) => {
                return Err(PackagerError::BuildTimeout {
                    seconds: self.config.build_timeout.as_secs(),
                });
            }
            Err(err) => {
                return Err(PackagerError::BuildUnexpected {
                    reason: format!("failed to run {}: {err}", toolchain.program()),
                });
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(PackagerError::BuildFailed {
                board: board.to_owned(),
                output: combined_output(&output),
            })
        }
    }
}

/// Find binary artifacts under `dir`.
///
/// Files directly inside `dir` are preferred; only when there are none is
/// the whole subtree searched. Results are sorted by path.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read.
pub fn find_artifacts(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut found = Vec::new();
    collect_artifacts(dir, false, &mut found)?;
    if found.is_empty() {
        collect_artifacts(dir, true, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect_artifacts(dir: &Utf8Path, recurse: bool, found: &mut Vec<Utf8PathBuf>) -> Result<()> {
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if recurse {
                collect_artifacts(path, true, found)?;
            }
        } else if file_type.is_file() && path.extension() == Some(ARTIFACT_EXTENSION) {
            found.push(path.to_owned());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
