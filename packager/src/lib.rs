//! OTA firmware packager library.
//!
//! This crate turns a compiled microcontroller firmware image into an
//! over-the-air update archive: the binary is renamed with the `system_`
//! prefix, paired with a `.hash` integrity token, and zipped as
//! `OTA_<name>.zip`. It can also compile an Arduino sketch first through an
//! external toolchain. The `ota-packager` binary drives it; the library is
//! exposed for tests and custom workflows.
//!
//! # Modules
//!
//! - [`boards`] - Built-in catalog of board identifiers
//! - [`builder`] - Sketch compilation and artifact discovery
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Configuration file loading
//! - [`error`] - Error type and process exit codes
//! - [`locator`] - Binary validation and artifact selection
//! - [`output`] - Banners and result messages
//! - [`package`] - Archive assembly
//! - [`pipeline`] - End-to-end run orchestration
//! - [`prompt`] - Interactive selection of missing inputs
//! - [`runner`] - External process execution with timeouts
//! - [`sketch`] - Sketch discovery and main-file aliasing
//! - [`token`] - Integrity token computation
//! - [`toolchain`] - Build toolchain probing

pub mod boards;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod locator;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod prompt;
pub mod runner;
pub mod sketch;
pub mod token;
pub mod toolchain;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
