//! Tests for packager CLI parsing and flag merging.

use super::*;
use clap::CommandFactory;
use rstest::rstest;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["ota-packager"]);
    assert!(cli.binary.is_none());
    assert!(cli.destination.is_none());
    assert!(cli.sketch.is_none());
    assert!(cli.board.is_none());
    assert!(cli.toolchain.is_none());
    assert!(cli.config.is_none());
    assert!(!cli.list_boards);
    assert!(!cli.yes);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
    assert!(cli.is_interactive());
}

#[test]
fn cli_parses_binary_and_destination() {
    let cli = Cli::parse_from(["ota-packager", "-y", "-d", "/tmp/out", "build/blink.bin"]);
    assert_eq!(cli.binary, Some(Utf8PathBuf::from("build/blink.bin")));
    assert_eq!(cli.destination, Some(Utf8PathBuf::from("/tmp/out")));
    assert!(!cli.is_interactive());
}

#[test]
fn cli_parses_build_flags() {
    let cli = Cli::parse_from([
        "ota-packager",
        "--sketch",
        "remote",
        "-b",
        "esp32:esp32:esp32",
        "--toolchain",
        "/opt/arduino-cli",
        "-c",
        "ci.toml",
    ]);
    assert_eq!(cli.sketch, Some(Utf8PathBuf::from("remote")));
    assert_eq!(cli.board.as_deref(), Some("esp32:esp32:esp32"));
    assert_eq!(cli.toolchain.as_deref(), Some("/opt/arduino-cli"));
    assert_eq!(cli.config, Some(Utf8PathBuf::from("ci.toml")));
}

#[rstest]
#[case::binary_and_sketch(&["ota-packager", "a.bin", "--sketch", "remote"])]
#[case::verbose_and_quiet(&["ota-packager", "-v", "-q"])]
fn cli_rejects_conflicting_flags(#[case] args: &[&str]) {
    let err = Cli::try_parse_from(args).expect_err("expected a conflict");
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[rstest]
#[case::default(&["ota-packager"], LevelFilter::Warn)]
#[case::verbose(&["ota-packager", "-v"], LevelFilter::Info)]
#[case::debug(&["ota-packager", "-vv"], LevelFilter::Debug)]
#[case::trace(&["ota-packager", "-vvvv"], LevelFilter::Trace)]
#[case::quiet(&["ota-packager", "--quiet"], LevelFilter::Error)]
fn log_level_follows_flags(#[case] args: &[&str], #[case] expected: LevelFilter) {
    let cli = Cli::parse_from(args);
    assert_eq!(cli.log_level(), expected);
}

#[test]
fn flags_override_configuration() {
    let cli = Cli {
        destination: Some(Utf8PathBuf::from("cli-out")),
        toolchain: Some("/opt/arduino-cli".to_owned()),
        ..Cli::default()
    };
    let config = PackagerConfig {
        board: Some("esp8266:esp8266:generic".to_owned()),
        destination: Some(Utf8PathBuf::from("config-out")),
        toolchain: "arduino-cli-nightly".to_owned(),
        ..PackagerConfig::default()
    };

    let request = cli.package_request(&config);
    assert_eq!(request.destination, Some(Utf8PathBuf::from("cli-out")));
    assert_eq!(request.board.as_deref(), Some("esp8266:esp8266:generic"));
    assert!(request.interactive);

    let build = cli.build_config(&config);
    assert_eq!(build.toolchain, "/opt/arduino-cli");
}

#[test]
fn configuration_toolchain_used_without_override() {
    let config = PackagerConfig {
        toolchain: "arduino-cli-nightly".to_owned(),
        ..PackagerConfig::default()
    };
    assert_eq!(
        Cli::default().build_config(&config).toolchain,
        "arduino-cli-nightly"
    );
}
