//! Configuration file support.
//!
//! Settings live in an optional TOML file. An explicit `--config` path must
//! exist; otherwise `ota-packager.toml` in the working directory is used,
//! then `ota-packager/config.toml` under the user's configuration
//! directory, and finally the built-in defaults. Command-line flags take
//! precedence over anything read here.

use crate::builder::{BUILD_TIMEOUT, BuildConfig, DEFAULT_BUILD_DIR};
use crate::error::{PackagerError, Result};
use crate::toolchain::{DEFAULT_TOOLCHAIN, PROBE_TIMEOUT};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ota-packager.toml";

/// Packager settings read from a configuration file.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Build toolchain program name or path.
    pub toolchain: String,
    /// Board identifier used when none is given on the command line.
    pub board: Option<String>,
    /// Destination directory used when none is given on the command line.
    pub destination: Option<Utf8PathBuf>,
    /// Build output directory, relative to the sketch directory.
    pub build_dir: Utf8PathBuf,
    /// Seconds allowed for the toolchain version query.
    pub probe_timeout_secs: u64,
    /// Seconds allowed for a compile.
    pub build_timeout_secs: u64,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_owned(),
            board: None,
            destination: None,
            build_dir: Utf8PathBuf::from(DEFAULT_BUILD_DIR),
            probe_timeout_secs: PROBE_TIMEOUT.as_secs(),
            build_timeout_secs: BUILD_TIMEOUT.as_secs(),
        }
    }
}

/// Source of the user configuration directory.
pub trait ConfigDirs {
    /// Directory holding this tool's user configuration, if known.
    fn config_dir(&self) -> Option<Utf8PathBuf>;
}

/// Resolves the configuration directory through the platform conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConfigDirs;

impl ConfigDirs for SystemConfigDirs {
    fn config_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::ProjectDirs::from("", "", "ota-packager")
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok())
    }
}

impl PackagerConfig {
    /// Parse configuration from TOML text, reporting errors against `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] for malformed TOML, unknown
    /// keys, or zero timeouts.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| PackagerError::InvalidConfig {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] if the file cannot be read
    /// or parsed.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| PackagerError::InvalidConfig {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        Self::parse(path, &contents)
    }

    /// Locate and load configuration.
    ///
    /// `explicit` must exist when given. Otherwise the first existing file
    /// among `<cwd>/ota-packager.toml` and `<config dir>/config.toml` is
    /// used, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] if the selected file cannot
    /// be read or parsed.
    pub fn load(explicit: Option<&Utf8Path>, cwd: &Utf8Path, dirs: &dyn ConfigDirs) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [
            Some(cwd.join(LOCAL_CONFIG_FILE)),
            dirs.config_dir().map(|dir| dir.join("config.toml")),
        ];

        match candidates.into_iter().flatten().find(|path| path.is_file()) {
            Some(path) => {
                debug!("loading configuration from {path}");
                Self::from_file(&path)
            }
            None => {
                debug!("no configuration file found; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Build settings derived from this configuration.
    #[must_use]
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig {
            toolchain: self.toolchain.clone(),
            build_dir: self.build_dir.clone(),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            build_timeout: Duration::from_secs(self.build_timeout_secs),
        }
    }

    fn validate(&self, path: &Utf8Path) -> Result<()> {
        let invalid = |reason: &str| PackagerError::InvalidConfig {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };

        if self.toolchain.trim().is_empty() {
            return Err(invalid("toolchain must not be empty"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(invalid("probe_timeout_secs must be greater than zero"));
        }
        if self.build_timeout_secs == 0 {
            return Err(invalid("build_timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}
