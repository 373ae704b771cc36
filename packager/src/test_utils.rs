//! Shared test utilities for the packager crate.

use crate::runner::{CommandRunner, Invocation, RunOutcome};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a command `Output` with the given exit code and streams.
#[must_use]
pub fn output_with(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Creates a completed outcome with exit code zero and the given stdout.
#[must_use]
pub fn completed(stdout: &str) -> RunOutcome {
    RunOutcome::Completed(output_with(0, stdout, ""))
}

/// Creates a completed outcome with exit code one and the given stderr.
#[must_use]
pub fn failed(stderr: &str) -> RunOutcome {
    RunOutcome::Completed(output_with(1, "", stderr))
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program expected to run (e.g. "arduino-cli").
    pub program: &'static str,
    /// The first argument, identifying the toolchain subcommand.
    pub subcommand: &'static str,
    /// The result to return when this command is invoked.
    pub result: io::Result<RunOutcome>,
}

/// A stub implementation of `CommandRunner` for testing.
///
/// Records expected invocations and returns predefined results, allowing
/// tests to drive the build flow without spawning processes. Every
/// invocation it receives is kept for later inspection.
#[derive(Debug)]
pub struct StubRunner {
    expected: RefCell<VecDeque<ExpectedCall>>,
    seen: RefCell<Vec<Invocation>>,
}

impl StubRunner {
    /// Creates a new `StubRunner` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Returns a copy of every invocation received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.seen.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome> {
        self.seen.borrow_mut().push(invocation.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(io::Error::other(crate::error::PackagerError::StubMismatch {
                message: format!("unexpected invocation of {}", invocation.program),
            }));
        };

        let subcommand = invocation.args.first().map(String::as_str);
        if call.program != invocation.program || Some(call.subcommand) != subcommand {
            return Err(io::Error::other(crate::error::PackagerError::StubMismatch {
                message: format!(
                    "expected {} {}, got {} {:?}",
                    call.program, call.subcommand, invocation.program, invocation.args
                ),
            }));
        }

        call.result
    }
}
