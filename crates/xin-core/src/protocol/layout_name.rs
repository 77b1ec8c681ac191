//! Validated keyboard layout names.
//!
//! The layout name travels from the wire straight into the argument list of
//! an external program (`setxkbmap` by default).  Only plain ASCII letters are
//! accepted, so names like `us`, `de` or `fi` pass and anything carrying
//! punctuation, whitespace or shell syntax (`us-2`, `; rm -rf`) is refused
//! before a process is started.

use std::fmt;

use thiserror::Error;

/// Longest accepted layout name.
///
/// The command line `"setxkbmap <name>"` must fit a 128-byte buffer including
/// its terminator, which leaves 117 bytes for the name.
pub const MAX_LAYOUT_NAME_LEN: usize = 117;

/// Reasons a layout name is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutNameError {
    #[error("layout name is empty")]
    Empty,

    #[error("layout name cannot contain special characters (found {0:?})")]
    InvalidCharacter(char),

    #[error("layout name too long ({0} characters)")]
    TooLong(usize),
}

/// A keyboard layout name made only of ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutName(String);

impl LayoutName {
    /// Validates `raw` as a layout name.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutNameError`] if `raw` is empty, longer than
    /// [`MAX_LAYOUT_NAME_LEN`], or contains anything but ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, LayoutNameError> {
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphabetic()) {
            return Err(LayoutNameError::InvalidCharacter(bad));
        }
        if raw.is_empty() {
            return Err(LayoutNameError::Empty);
        }
        if raw.len() > MAX_LAYOUT_NAME_LEN {
            return Err(LayoutNameError::TooLong(raw.len()));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LayoutName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
