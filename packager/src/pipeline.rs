//! Packaging pipeline orchestration.
//!
//! Resolves every input a run needs (binary or sketch, board, destination)
//! from the request first and from the interactive selector second, builds
//! the sketch when asked to, and hands the binary to the package assembler.

use crate::boards::find_board;
use crate::builder::{BuildConfig, Builder};
use crate::error::{PackagerError, Result};
use crate::locator::{BinaryArtifact, validate_binary};
use crate::output::{completion_banner, rule, success_message};
use crate::package::{PackageOutput, assemble_package};
use crate::prompt::{Mode, Prompter};
use crate::runner::CommandRunner;
use crate::sketch::{Sketch, discover_sketches, preferred_sketch};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::io::{BufRead, Write};

/// Inputs for one packaging run. Anything left as `None` is asked for when
/// `interactive` is set and is an error otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRequest {
    /// Existing binary to package.
    pub binary: Option<Utf8PathBuf>,
    /// Sketch file or sketch directory to build first.
    pub sketch: Option<Utf8PathBuf>,
    /// Board identifier or catalog display name.
    pub board: Option<String>,
    /// Destination directory for the archive.
    pub destination: Option<Utf8PathBuf>,
    /// Whether missing inputs may be asked for.
    pub interactive: bool,
}

/// Collaborators and settings shared by a run.
pub struct PipelineContext<'a> {
    /// Toolchain and build settings.
    pub build: BuildConfig,
    /// Runner used for toolchain processes.
    pub runner: &'a dyn CommandRunner,
    /// Suppress progress text.
    pub quiet: bool,
}

/// Run the whole pipeline and report the archive location on `output`.
///
/// # Errors
///
/// Returns the first fatal error from input resolution, the build, or
/// package assembly.
pub fn run_pipeline(
    request: &PackageRequest,
    context: &PipelineContext<'_>,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<PackageOutput> {
    let mut prompter = Prompter::new(input, output);

    let artifact = match resolve_mode(request, &mut prompter)? {
        Mode::ExistingBinary => existing_binary(request, &mut prompter)?,
        Mode::Build => build_binary(request, context, &mut prompter)?,
    };

    let destination = resolve_destination(request, &artifact, &mut prompter)?;
    let package = assemble_package(&artifact, &destination)?;
    info!(
        "packaged {} as {} (token {})",
        artifact.path(),
        package.entry_name,
        package.token
    );

    prompter.say(rule('-'))?;
    prompter.say(success_message(&package.archive_path))?;
    if !context.quiet {
        prompter.say(completion_banner())?;
    }
    Ok(package)
}

fn resolve_mode(request: &PackageRequest, prompter: &mut Prompter<'_>) -> Result<Mode> {
    if request.binary.is_some() {
        return Ok(Mode::ExistingBinary);
    }
    if request.sketch.is_some() {
        return Ok(Mode::Build);
    }
    if request.interactive {
        return prompter.mode();
    }
    Err(PackagerError::MissingInput {
        what: "binary path or sketch",
    })
}

fn existing_binary(
    request: &PackageRequest,
    prompter: &mut Prompter<'_>,
) -> Result<BinaryArtifact> {
    if request.interactive {
        return prompter.binary_path(request.binary.clone());
    }
    match &request.binary {
        Some(path) => validate_binary(path),
        None => Err(PackagerError::MissingInput {
            what: "binary path",
        }),
    }
}

fn build_binary(
    request: &PackageRequest,
    context: &PipelineContext<'_>,
    prompter: &mut Prompter<'_>,
) -> Result<BinaryArtifact> {
    let location = match &request.sketch {
        Some(path) => path.clone(),
        None if request.interactive => prompter.sketch_location()?,
        None => return Err(PackagerError::MissingInput { what: "sketch" }),
    };
    let sketch = resolve_sketch(&location, request.interactive, prompter)?;

    let board = match &request.board {
        Some(query) => resolve_board(query),
        None if request.interactive => prompter.board()?,
        None => return Err(PackagerError::MissingInput { what: "board" }),
    };

    if !context.quiet {
        prompter.say(rule('-'))?;
        prompter.say(format!("Building {} for {board}...", sketch.path()))?;
    }
    let builder = Builder::new(context.build.clone(), context.runner);
    Ok(builder.build(&sketch, &board)?.artifact)
}

/// Turn a sketch file or directory into one sketch.
fn resolve_sketch(
    location: &Utf8Path,
    interactive: bool,
    prompter: &mut Prompter<'_>,
) -> Result<Sketch> {
    if location.is_file() {
        return Sketch::from_file(location);
    }

    let sketches = discover_sketches(location)?;
    if interactive {
        return prompter.sketch(&sketches);
    }
    preferred_sketch(&sketches)
        .cloned()
        .ok_or_else(|| PackagerError::NoSketchFound {
            path: location.to_owned(),
        })
}

/// Map a catalog display name onto its identifier; anything else passes
/// through for the toolchain to judge.
fn resolve_board(query: &str) -> String {
    find_board(query).map_or_else(|| query.trim().to_owned(), |board| board.id.to_owned())
}

fn resolve_destination(
    request: &PackageRequest,
    artifact: &BinaryArtifact,
    prompter: &mut Prompter<'_>,
) -> Result<Utf8PathBuf> {
    if let Some(destination) = &request.destination {
        return Ok(destination.clone());
    }

    let proposed = artifact
        .path()
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    if request.interactive {
        prompter.destination(proposed)
    } else {
        Ok(proposed.to_owned())
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
