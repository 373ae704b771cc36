//! Integrity token binding a firmware image to its file name.
//!
//! The device-side updater recomputes
//! `md5(hex(md5(bytes)) + hex(md5(file_name)))` after download and refuses
//! to flash on mismatch, so a renamed or altered image is rejected. The token
//! is stored as 32 lowercase hexadecimal characters.

use md5::{Digest, Md5};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Expected length of a hex-encoded MD5 digest.
const TOKEN_HEX_LEN: usize = 32;

/// A validated integrity token.
///
/// # Examples
///
/// ```
/// use ota_packager::token::IntegrityToken;
///
/// let token = IntegrityToken::compute(b"firmware", "system_blink.bin");
/// assert_eq!(token.as_str().len(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegrityToken(String);

/// Reasons a string is not a well-formed token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid integrity token: {reason}")]
pub struct InvalidToken {
    reason: String,
}

impl IntegrityToken {
    /// Compute the token for an image with the given content and file name.
    #[must_use]
    pub fn compute(content: &[u8], file_name: &str) -> Self {
        let content_hex = hex_md5(content);
        Self::from_content_digest(&content_hex, file_name)
    }

    fn from_content_digest(content_hex: &str, file_name: &str) -> Self {
        let name_hex = hex_md5(file_name.as_bytes());
        let mut outer = Md5::new();
        outer.update(content_hex.as_bytes());
        outer.update(name_hex.as_bytes());
        Self(format!("{:x}", outer.finalize()))
    }

    /// Return the token as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for IntegrityToken {
    type Error = InvalidToken;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_token(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for IntegrityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the token for the file at `path`, named by its base name.
///
/// The file is streamed in chunks so the whole image never needs to sit in
/// memory.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub fn compute_integrity_token(path: &Path) -> std::io::Result<IntegrityToken> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    let content_hex = format!("{:x}", hasher.finalize());
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(IntegrityToken::from_content_digest(&content_hex, &file_name))
}

fn hex_md5(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

fn validate_token(value: &str) -> Result<(), InvalidToken> {
    if value.len() != TOKEN_HEX_LEN {
        return Err(InvalidToken {
            reason: format!(
                "expected {TOKEN_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !c.is_ascii_digit() && !matches!(c, 'a'..='f'))
    {
        return Err(InvalidToken {
            reason: format!("non-lowercase-hex character '{bad}'"),
        });
    }
    Ok(())
}
