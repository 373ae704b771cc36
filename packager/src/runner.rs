//! External process execution with a hard time limit.
//!
//! Both the toolchain probe and the build go through [`CommandRunner`], so
//! tests can substitute a stub and the rest of the crate never touches
//! `std::process` directly.

use camino::Utf8PathBuf;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Working directory, or the current one when `None`.
    pub cwd: Option<Utf8PathBuf>,
    /// Time after which the process is killed.
    pub timeout: Duration,
}

impl Invocation {
    /// Describe `program args...` with the given time limit.
    #[must_use]
    pub fn new<I, S>(program: &str, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            timeout,
        }
    }

    /// Run inside `dir` instead of the current directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Outcome of a process that was successfully spawned.
#[derive(Debug)]
pub enum RunOutcome {
    /// The process exited within its time limit.
    Completed(Output),
    /// The process exceeded its time limit and was killed.
    TimedOut,
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run the invocation, killing the process once its timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while spawning or awaiting the process.
    /// A spawn failure for a missing program has kind
    /// [`io::ErrorKind::NotFound`].
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome>;
}

/// Runs commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome> {
        // Captured into files rather than pipes so a chatty compiler cannot
        // fill a pipe buffer and stall while we wait on it.
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;

        let program = invocation.program.as_str();
        let mut cmd = Command::new(program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?));

        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir.as_std_path());
        }

        let mut child = cmd.spawn()?;

        match child.wait_timeout(invocation.timeout)? {
            Some(status) => Ok(RunOutcome::Completed(Output {
                status,
                stdout: read_capture(&mut stdout)?,
                stderr: read_capture(&mut stderr)?,
            })),
            None => {
                if let Err(err) = child.kill() {
                    log::warn!("failed to kill {program} after timeout: {err}");
                }
                if let Err(err) = child.wait() {
                    log::warn!("failed to reap {program} after timeout: {err}");
                }
                Ok(RunOutcome::TimedOut)
            }
        }
    }
}

fn read_capture(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Join trimmed stdout and stderr of `output` into one message.
///
/// Empty streams are omitted; if both are empty the result says so.
#[must_use]
pub fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let parts: Vec<&str> = [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        "no output captured".to_owned()
    } else {
        parts.join("\n")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::output_with;

    fn sh(script: &str, timeout: Duration) -> Invocation {
        Invocation::new("sh", ["-c", script], timeout)
    }

    #[test]
    fn completed_process_captures_both_streams() {
        let outcome = SystemRunner
            .run(&sh("echo out; echo err >&2", Duration::from_secs(5)))
            .expect("sh runs");

        let RunOutcome::Completed(output) = outcome else {
            panic!("expected completion");
        };
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
    }

    #[test]
    fn slow_process_is_killed_at_the_limit() {
        let started = std::time::Instant::now();
        let outcome = SystemRunner
            .run(&sh("sleep 30", Duration::from_millis(200)))
            .expect("sh runs");

        assert!(matches!(outcome, RunOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn missing_program_reports_not_found() {
        let err = SystemRunner
            .run(&Invocation::new(
                "ota-packager-no-such-program",
                Vec::<String>::new(),
                Duration::from_secs(1),
            ))
            .expect_err("spawn must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn runs_inside_the_requested_directory() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let cwd = camino::Utf8Path::from_path(dir.path()).expect("utf-8 temp dir");
        let outcome = SystemRunner
            .run(&sh("pwd -P", Duration::from_secs(5)).current_dir(cwd))
            .expect("sh runs");

        let RunOutcome::Completed(output) = outcome else {
            panic!("expected completion");
        };
        let printed = String::from_utf8_lossy(&output.stdout);
        let canonical = dir.path().canonicalize().expect("canonical");
        assert_eq!(printed.trim(), canonical.to_string_lossy());
    }

    #[test]
    fn combined_output_joins_non_empty_streams() {
        assert_eq!(combined_output(&output_with(1, "a\n", "  b ")), "a\nb");
        assert_eq!(combined_output(&output_with(1, "", "b")), "b");
        assert_eq!(combined_output(&output_with(1, "", "")), "no output captured");
    }
}
