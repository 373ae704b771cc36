//! OTA packager CLI entrypoint.
//!
//! This binary packages a compiled firmware image, or a sketch it builds
//! first, into an OTA update archive and reports where the archive was
//! written. Failures are printed as a framed banner on stderr and mapped to
//! a distinct exit code.

use camino::Utf8PathBuf;
use clap::Parser;
use ota_packager::boards::catalog_listing;
use ota_packager::cli::Cli;
use ota_packager::config::{PackagerConfig, SystemConfigDirs};
use ota_packager::error::{PackagerError, Result};
use ota_packager::output::error_banner;
use ota_packager::pipeline::{PipelineContext, run_pipeline};
use ota_packager::runner::SystemRunner;
use std::io::{BufRead, Write};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut input, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the logger; `RUST_LOG` takes precedence over `-v`/`--quiet`.
fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();
}

fn run(cli: &Cli, input: &mut dyn BufRead, stdout: &mut dyn Write) -> Result<()> {
    if cli.list_boards {
        write!(stdout, "{}", catalog_listing())?;
        return Ok(());
    }

    let cwd = current_dir()?;
    let config = PackagerConfig::load(cli.config.as_deref(), &cwd, &SystemConfigDirs)?;
    let runner = SystemRunner;
    let context = PipelineContext {
        build: cli.build_config(&config),
        runner: &runner,
        quiet: cli.quiet,
    };

    run_pipeline(&cli.package_request(&config), &context, input, stdout)?;
    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|path| PackagerError::NonUtf8Path(path.display().to_string()))
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, error_banner(&err));
            err.exit_code()
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Nowhere left to report to.
    }
}
