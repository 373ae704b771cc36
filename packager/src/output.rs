//! User-facing text for the packager.
//!
//! Progress, prompts, and results are framed with horizontal rules so they
//! stand out from toolchain chatter in the same terminal.

use camino::Utf8Path;
use std::fmt;

/// Width of horizontal rules.
pub const RULE_WIDTH: usize = 72;

const COMPLETE_TEXT: &str = "Operation Complete";

/// A horizontal rule made of `ch`.
#[must_use]
pub fn rule(ch: char) -> String {
    std::iter::repeat_n(ch, RULE_WIDTH).collect()
}

/// Frame an error message for display on stderr.
///
/// # Example
///
/// ```
/// use ota_packager::output::error_banner;
///
/// let text = error_banner(&"build timed out");
/// assert!(text.contains("#Error: build timed out"));
/// ```
#[must_use]
pub fn error_banner(message: &dyn fmt::Display) -> String {
    let heavy = rule('=');
    format!("\n{heavy}\n#Error: {message}\n{heavy}")
}

/// Report where the finished archive was written.
#[must_use]
pub fn success_message(archive_path: &Utf8Path) -> String {
    format!("OTA update file is located at:\n{archive_path}")
}

/// A centred closing line.
#[must_use]
pub fn completion_banner() -> String {
    let side = RULE_WIDTH.saturating_sub(COMPLETE_TEXT.len()) / 2;
    let pad: String = std::iter::repeat_n('=', side).collect();
    format!("\n{pad}{COMPLETE_TEXT}{pad}")
}
