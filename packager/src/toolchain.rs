//! Build toolchain detection.
//!
//! Before a build starts the toolchain must be on the path and answer a
//! version query quickly; anything else means the build would fail in a
//! less helpful way later.

use crate::error::{PackagerError, Result};
use crate::runner::{CommandRunner, Invocation, RunOutcome, combined_output};
use log::info;
use std::io;
use std::time::Duration;

/// Toolchain used when neither the command line nor configuration names one.
pub const DEFAULT_TOOLCHAIN: &str = "arduino-cli";

/// Default time allowed for the version query.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A build toolchain that answered its version query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: String,
    version: String,
}

impl Toolchain {
    /// Query `program version` and return the toolchain if it answers.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ToolchainUnavailable`] if the program cannot
    /// be started, exceeds `timeout`, or exits with a nonzero status.
    pub fn probe(runner: &dyn CommandRunner, program: &str, timeout: Duration) -> Result<Self> {
        let unavailable = |reason: String| PackagerError::ToolchainUnavailable {
            program: program.to_owned(),
            reason,
        };

        let invocation = Invocation::new(program, ["version"], timeout);
        let output = match runner.run(&invocation) {
            Ok(RunOutcome::Completed(output)) => output,
            Ok(RunOutcome::TimedOut) => {
                return Err(unavailable(format!(
                    "no answer to version query within {} seconds",
                    timeout.as_secs()
                )));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(unavailable("not found on PATH".to_owned()));
            }
            Err(err) => return Err(unavailable(err.to_string())),
        };

        if !output.status.success() {
            return Err(unavailable(combined_output(&output)));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned();
        info!("using {program}: {version}");

        Ok(Self {
            program: program.to_owned(),
            version,
        })
    }

    /// Program name or path used to invoke the toolchain.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// First line of the version query output.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockCommandRunner;
    use crate::test_utils::{completed, failed};

    fn runner_returning(
        result: impl FnOnce() -> io::Result<RunOutcome> + Send + 'static,
    ) -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| {
                inv.program == "arduino-cli" && inv.args == ["version"] && inv.timeout == PROBE_TIMEOUT
            })
            .times(1)
            .return_once(move |_| result());
        runner
    }

    #[test]
    fn probe_records_first_version_line() {
        let runner = runner_returning(|| Ok(completed("arduino-cli  Version: 1.1.1\nextra\n")));

        let toolchain =
            Toolchain::probe(&runner, DEFAULT_TOOLCHAIN, PROBE_TIMEOUT).expect("probe succeeds");
        assert_eq!(toolchain.program(), "arduino-cli");
        assert_eq!(toolchain.version(), "arduino-cli  Version: 1.1.1");
    }

    #[test]
    fn missing_program_is_unavailable() {
        let runner = runner_returning(|| Err(io::Error::from(io::ErrorKind::NotFound)));

        let err = Toolchain::probe(&runner, DEFAULT_TOOLCHAIN, PROBE_TIMEOUT).expect_err("missing");
        assert!(err.to_string().contains("not found on PATH"));
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn slow_version_query_is_unavailable() {
        let runner = runner_returning(|| Ok(RunOutcome::TimedOut));

        let err = Toolchain::probe(&runner, DEFAULT_TOOLCHAIN, PROBE_TIMEOUT).expect_err("timeout");
        assert!(matches!(err, PackagerError::ToolchainUnavailable { .. }));
        assert!(err.to_string().contains("5 seconds"));
    }

    #[test]
    fn failing_version_query_is_unavailable() {
        let runner = runner_returning(|| Ok(failed("config file corrupt")));

        let err = Toolchain::probe(&runner, DEFAULT_TOOLCHAIN, PROBE_TIMEOUT).expect_err("failure");
        assert!(err.to_string().contains("config file corrupt"));
    }
}
