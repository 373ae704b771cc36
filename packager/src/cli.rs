//! CLI argument definitions for the OTA packager.
//!
//! This module defines the command-line interface using clap and merges the
//! parsed flags with file-based configuration, so the binary itself only
//! orchestrates.

use crate::builder::BuildConfig;
use crate::config::PackagerConfig;
use crate::pipeline::PackageRequest;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Package compiled firmware into an OTA update archive.
#[derive(Parser, Debug, Clone)]
#[command(name = "ota-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package compiled firmware into an OTA update archive.\n\n",
    "The binary is renamed with a system_ prefix, paired with a .hash file ",
    "holding its integrity token, and zipped as OTA_<name>.zip in the ",
    "destination directory. Only the archive is left behind.\n\n",
    "Pass an existing binary, or use --sketch to compile an Arduino sketch ",
    "with arduino-cli first. Without either, the packager asks for what it ",
    "needs interactively.",
))]
#[command(after_help = concat!(
    "EXIT CODES:\n",
    "  1   generic failure\n",
    "  2   binary larger than 16 MiB\n",
    "  3   copying the binary failed\n",
    "  4   no sketch file found\n",
    "  5   build failed\n",
    "  6   build produced no binary\n",
    "  7   build timed out\n",
    "  8   unexpected build error\n",
    "  9   toolchain unavailable\n",
    "  10  sketch alias could not be created\n\n",
    "EXAMPLES:\n",
    "  Package an existing binary next to itself:\n",
    "    $ ota-packager -y build/blink.bin\n\n",
    "  Build a sketch for an ESP32 and package it into ./dist:\n",
    "    $ ota-packager --sketch ~/Arduino/remote -b esp32:esp32:esp32 -d dist\n\n",
    "  Show the board catalog:\n",
    "    $ ota-packager --list-boards",
))]
pub struct Cli {
    /// Compiled binary to package.
    #[arg(value_name = "BINARY", conflicts_with = "sketch")]
    pub binary: Option<Utf8PathBuf>,

    /// Directory the archive is written to [default: the binary's directory].
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<Utf8PathBuf>,

    /// Sketch file or sketch directory to build before packaging.
    #[arg(long, value_name = "PATH")]
    pub sketch: Option<Utf8PathBuf>,

    /// Board identifier or catalog name for the build.
    #[arg(short, long, value_name = "ID")]
    pub board: Option<String>,

    /// Override the build toolchain program.
    #[arg(long, value_name = "PROGRAM")]
    pub toolchain: Option<String>,

    /// Configuration file [default: ./ota-packager.toml, then the user config].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Print the board catalog and exit.
    #[arg(long)]
    pub list_boards: bool,

    /// Never prompt; missing inputs are errors.
    #[arg(short, long)]
    pub yes: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors and the archive location.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    /// Creates a `Cli` with no inputs and every flag off.
    ///
    /// # Examples
    ///
    /// ```
    /// use ota_packager::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert!(cli.binary.is_none());
    /// assert!(!cli.yes);
    /// ```
    fn default() -> Self {
        Self {
            binary: None,
            destination: None,
            sketch: None,
            board: None,
            toolchain: None,
            config: None,
            list_boards: false,
            yes: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl Cli {
    /// Log level implied by `-v` and `--quiet`.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Whether missing inputs may be asked for.
    ///
    /// Prompting is on unless `--yes` is given.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        !self.yes
    }

    /// Merge these flags over `config` into a pipeline request.
    ///
    /// # Examples
    ///
    /// ```
    /// use ota_packager::cli::Cli;
    /// use ota_packager::config::PackagerConfig;
    ///
    /// let cli = Cli { board: Some("esp32:esp32:esp32".to_owned()), ..Cli::default() };
    /// let config = PackagerConfig {
    ///     board: Some("esp8266:esp8266:generic".to_owned()),
    ///     ..PackagerConfig::default()
    /// };
    /// let request = cli.package_request(&config);
    /// assert_eq!(request.board.as_deref(), Some("esp32:esp32:esp32"));
    /// ```
    #[must_use]
    pub fn package_request(&self, config: &PackagerConfig) -> PackageRequest {
        PackageRequest {
            binary: self.binary.clone(),
            sketch: self.sketch.clone(),
            board: self.board.clone().or_else(|| config.board.clone()),
            destination: self
                .destination
                .clone()
                .or_else(|| config.destination.clone()),
            interactive: self.is_interactive(),
        }
    }

    /// Build settings from `config` with the toolchain override applied.
    #[must_use]
    pub fn build_config(&self, config: &PackagerConfig) -> BuildConfig {
        let mut build = config.build_config();
        if let Some(toolchain) = &self.toolchain {
            build.toolchain.clone_from(toolchain);
        }
        build
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
