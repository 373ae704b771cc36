//! Unit tests for the sketch builder.

use super::*;
use crate::test_utils::{ExpectedCall, StubRunner, completed, failed};
use rstest::{fixture, rstest};
use std::io;
use tempfile::TempDir;

const BOARD: &str = "esp8266:esp8266:nodemcuv2";

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

/// Create `<tmp>/<dir_name>/<file_name>` and return it as a sketch.
fn sketch_in(temp: &TempDir, dir_name: &str, file_name: &str) -> Sketch {
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8");
    let dir = root.join(dir_name);
    fs::create_dir_all(&dir).expect("mkdir sketch dir");
    let path = dir.join(file_name);
    fs::write(&path, "void setup() {}\nvoid loop() {}\n").expect("write sketch");
    Sketch::from_file(&path).expect("sketch")
}

fn probe_ok() -> ExpectedCall {
    ExpectedCall {
        program: "arduino-cli",
        subcommand: "version",
        result: Ok(completed("arduino-cli Version: 1.1.1\n")),
    }
}

fn compile_returning(result: io::Result<RunOutcome>) -> ExpectedCall {
    ExpectedCall {
        program: "arduino-cli",
        subcommand: "compile",
        result,
    }
}

fn place_artifact(dir: &Utf8Path, relative: &str) -> Utf8PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir artifact dir");
    }
    fs::write(&path, b"firmware").expect("write artifact");
    path
}

#[rstest]
fn successful_build_selects_sketch_artifact(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![probe_ok(), compile_returning(Ok(completed("")))]);
    let builder = Builder::new(BuildConfig::default(), &runner);
    let out = builder.output_dir(&sketch);
    place_artifact(&out, "remote.ino.bootloader.bin");
    place_artifact(&out, "partitions.bin");

    let result = builder.build(&sketch, BOARD).expect("build succeeds");

    runner.assert_finished();
    assert_eq!(result.output_dir, out);
    assert_eq!(result.candidates.len(), 2);
    assert_eq!(
        result.artifact.path(),
        out.join("remote.ino.bootloader.bin")
    );
}

#[rstest]
fn compile_invocation_names_board_and_directories(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![probe_ok(), compile_returning(Ok(completed("")))]);
    let builder = Builder::new(BuildConfig::default(), &runner);
    let out = builder.output_dir(&sketch);
    place_artifact(&out, "remote.ino.bin");

    builder.build(&sketch, BOARD).expect("build succeeds");

    let invocations = runner.invocations();
    let compile = &invocations[1];
    assert_eq!(
        compile.args,
        [
            "compile",
            "--fqbn",
            BOARD,
            "--output-dir",
            out.as_str(),
            sketch.directory().as_str(),
        ]
    );
    assert_eq!(compile.timeout, BUILD_TIMEOUT);
    assert_eq!(invocations[0].timeout, PROBE_TIMEOUT);
}

#[rstest]
fn nested_artifacts_are_found_as_fallback(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![probe_ok(), compile_returning(Ok(completed("")))]);
    let builder = Builder::new(BuildConfig::default(), &runner);
    let out = builder.output_dir(&sketch);
    let nested = place_artifact(&out, "esp8266.esp8266.nodemcuv2/remote.ino.bin");

    let result = builder.build(&sketch, BOARD).expect("build succeeds");
    assert_eq!(result.artifact.path(), nested);
}

#[rstest]
fn empty_output_is_no_artifact(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![probe_ok(), compile_returning(Ok(completed("")))]);
    let builder = Builder::new(BuildConfig::default(), &runner);

    let err = builder.build(&sketch, BOARD).expect_err("no artifact");
    assert!(matches!(err, PackagerError::NoArtifactProduced { .. }));
    assert_eq!(err.exit_code(), 6);
}

#[rstest]
fn nonzero_exit_is_build_failure_with_output(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![
        probe_ok(),
        compile_returning(Ok(failed("remote.ino:1:1: error: 'foo' was not declared"))),
    ]);
    let builder = Builder::new(BuildConfig::default(), &runner);

    let err = builder.build(&sketch, BOARD).expect_err("build fails");
    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("'foo' was not declared"));
}

#[rstest]
fn timeout_is_build_timeout_and_alias_is_removed(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "main.ino");
    let runner = StubRunner::new(vec![probe_ok(), compile_returning(Ok(RunOutcome::TimedOut))]);
    let builder = Builder::new(BuildConfig::default(), &runner);

    let err = builder.build(&sketch, BOARD).expect_err("times out");

    assert!(matches!(err, PackagerError::BuildTimeout { seconds: 300 }));
    assert_eq!(err.exit_code(), 7);
    assert!(!sketch.directory().join("remote.ino").exists());
}

#[rstest]
fn runner_error_is_unexpected(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "remote.ino");
    let runner = StubRunner::new(vec![
        probe_ok(),
        compile_returning(Err(io::Error::other("fork failed"))),
    ]);
    let builder = Builder::new(BuildConfig::default(), &runner);

    let err = builder.build(&sketch, BOARD).expect_err("unexpected");
    assert_eq!(err.exit_code(), 8);
    assert!(err.to_string().contains("fork failed"));
}

#[rstest]
fn unavailable_toolchain_stops_before_alias(temp_dir: TempDir) {
    let sketch = sketch_in(&temp_dir, "remote", "main.ino");
    let runner = StubRunner::new(vec![ExpectedCall {
        program: "arduino-cli",
        subcommand: "version",
        result: Err(io::Error::from(io::ErrorKind::NotFound)),
    }]);
    let builder = Builder::new(BuildConfig::default(), &runner);

    let err = builder.build(&sketch, BOARD).expect_err("no toolchain");

    assert_eq!(err.exit_code(), 9);
    runner.assert_finished();
    assert!(!builder.output_dir(&sketch).exists());
}

#[rstest]
fn find_artifacts_prefers_top_level(temp_dir: TempDir) {
    let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("utf-8");
    place_artifact(&root, "b.bin");
    place_artifact(&root, "a.bin");
    place_artifact(&root, "nested/c.bin");
    place_artifact(&root, "a.elf");

    let found = find_artifacts(&root).expect("scan");
    assert_eq!(found, [root.join("a.bin"), root.join("b.bin")]);
}

#[cfg(unix)]
mod with_fake_toolchain {
    //! Drives the real process runner against a shell script standing in for
    //! the toolchain.

    use super::*;
    use crate::runner::SystemRunner;
    use std::os::unix::fs::PermissionsExt;

    const FAKE_CLI: &str = r#"#!/bin/sh
case "$1" in
  version)
    echo "fake-cli Version: 0.0.1"
    ;;
  compile)
    out="$5"
    dir="$6"
    name=$(basename "$dir")
    if [ ! -f "$dir/$name.ino" ]; then
      echo "main file $name.ino missing" >&2
      exit 1
    fi
    mkdir -p "$out"
    printf 'firmware' > "$out/$name.ino.bin"
    ;;
  *)
    exit 2
    ;;
esac
"#;

    const SLOW_CLI: &str = r#"#!/bin/sh
if [ "$1" = "compile" ]; then
  sleep 30
fi
echo "slow-cli Version: 0.0.1"
"#;

    fn install_script(temp: &TempDir, name: &str, body: &str) -> String {
        let path = temp.path().join(name);
        fs::write(&path, body).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod");
        path.to_string_lossy().into_owned()
    }

    #[rstest]
    fn build_through_alias_produces_binary(temp_dir: TempDir) {
        let sketch = sketch_in(&temp_dir, "remote", "main.ino");
        let config = BuildConfig {
            toolchain: install_script(&temp_dir, "fake-cli", FAKE_CLI),
            ..BuildConfig::default()
        };
        let builder = Builder::new(config, &SystemRunner);

        let result = builder.build(&sketch, BOARD).expect("build succeeds");

        assert_eq!(result.artifact.file_name(), "remote.ino.bin");
        assert!(!sketch.directory().join("remote.ino").exists());
    }

    #[rstest]
    fn relative_sketch_path_builds_from_caller_directory(temp_dir: TempDir) {
        let local = tempfile::Builder::new()
            .prefix("relative-sketch")
            .tempdir_in(".")
            .expect("temp dir in working directory");
        let sketch = sketch_in(&local, "remote", "main.ino");
        assert!(sketch.path().is_relative());
        let config = BuildConfig {
            toolchain: install_script(&temp_dir, "fake-cli", FAKE_CLI),
            ..BuildConfig::default()
        };
        let builder = Builder::new(config, &SystemRunner);

        let result = builder.build(&sketch, BOARD).expect("build succeeds");

        assert_eq!(result.artifact.file_name(), "remote.ino.bin");
        assert!(result.output_dir.is_absolute());
        assert!(sketch.directory().join("build/remote.ino.bin").is_file());
        assert!(!sketch.directory().join("remote.ino").exists());
    }

    #[rstest]
    fn slow_build_is_killed_and_alias_removed(temp_dir: TempDir) {
        let sketch = sketch_in(&temp_dir, "remote", "main.ino");
        let config = BuildConfig {
            toolchain: install_script(&temp_dir, "slow-cli", SLOW_CLI),
            build_timeout: Duration::from_millis(300),
            ..BuildConfig::default()
        };
        let builder = Builder::new(config, &SystemRunner);
        let started = std::time::Instant::now();

        let err = builder.build(&sketch, BOARD).expect_err("times out");

        assert_eq!(err.exit_code(), 7);
        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(!sketch.directory().join("remote.ino").exists());
    }
}
