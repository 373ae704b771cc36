//! Error types for the OTA packager.
//!
//! Every fatal condition the tool can hit has its own variant, and each
//! variant maps onto a distinct process exit code through
//! [`PackagerError::exit_code`]. Messages carry enough context (paths, sizes,
//! captured compiler output) for the user to act without re-running with
//! extra logging.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while locating, building, or packaging firmware.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The binary path does not name an existing regular file.
    #[error("file {path} doesn't exist or cannot be accessed")]
    FileNotFound {
        /// Path that was rejected.
        path: Utf8PathBuf,
    },

    /// The destination path does not name an existing directory.
    #[error("destination directory {path} doesn't exist")]
    DestinationNotFound {
        /// Path that was rejected.
        path: Utf8PathBuf,
    },

    /// The binary exceeds the device update partition.
    #[error(
        "binary file {path} is {size} bytes, larger than the {limit} byte limit; it can't be installed on the device"
    )]
    ArtifactTooLarge {
        /// Path to the oversized binary.
        path: Utf8PathBuf,
        /// Size of the binary in bytes.
        size: u64,
        /// Maximum permitted size in bytes.
        limit: u64,
    },

    /// Copying the binary into the staging area failed.
    #[error("failed to copy {from} to {to}")]
    CopyFailed {
        /// Source of the copy.
        from: Utf8PathBuf,
        /// Intended destination of the copy.
        to: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No sketch file was found at the supplied location.
    #[error("no sketch file found in {path}")]
    NoSketchFound {
        /// Directory or file that was searched.
        path: Utf8PathBuf,
    },

    /// The build toolchain exited with a nonzero status.
    #[error("build failed for board {board}:\n{output}")]
    BuildFailed {
        /// Board identifier passed to the toolchain.
        board: String,
        /// Captured stdout and stderr of the toolchain.
        output: String,
    },

    /// The build finished but left no binary in the output directory.
    #[error("build produced no binary artifact in {output_dir}")]
    NoArtifactProduced {
        /// Directory that was scanned.
        output_dir: Utf8PathBuf,
    },

    /// The build did not finish within its time limit.
    #[error("build timed out after {seconds} seconds")]
    BuildTimeout {
        /// The limit that was exceeded.
        seconds: u64,
    },

    /// The build could not be started or awaited.
    #[error("unexpected build error: {reason}")]
    BuildUnexpected {
        /// Description of what went wrong.
        reason: String,
    },

    /// The build toolchain is missing or did not answer a version query.
    #[error("toolchain {program} unavailable: {reason}")]
    ToolchainUnavailable {
        /// Program that was probed.
        program: String,
        /// Description of why the probe failed.
        reason: String,
    },

    /// The temporary sketch alias could not be created.
    #[error("failed to create sketch alias {alias} for {sketch}")]
    AliasLinkFailed {
        /// Sketch file the alias should point at.
        sketch: Utf8PathBuf,
        /// Alias path that could not be created.
        alias: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {reason}")]
    InvalidConfig {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Writing the zip archive failed.
    #[error("failed to write archive {path}")]
    Archive {
        /// Archive being written.
        path: Utf8PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Interactive input ended before a required answer was given.
    #[error("input closed before {prompt} was answered")]
    InputClosed {
        /// The question that went unanswered.
        prompt: &'static str,
    },

    /// A required input was missing in non-interactive mode.
    #[error("missing {what}; pass it on the command line or drop --yes")]
    MissingInput {
        /// Description of the missing value.
        what: &'static str,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PackagerError {
    /// Return the process exit code reserved for this failure class.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ArtifactTooLarge { .. } => 2,
            Self::CopyFailed { .. } => 3,
            Self::NoSketchFound { .. } => 4,
            Self::BuildFailed { .. } => 5,
            Self::NoArtifactProduced { .. } => 6,
            Self::BuildTimeout { .. } => 7,
            Self::BuildUnexpected { .. } => 8,
            Self::ToolchainUnavailable { .. } => 9,
            Self::AliasLinkFailed { .. } => 10,
            _ => 1,
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
