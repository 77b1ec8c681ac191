//! Receiver configuration: an optional TOML file merged with command-line flags.
//!
//! Precedence is command line, then file, then built-in defaults.  The file is
//! only read when a path is given (`-c`/`--config`); there is no implicit
//! search path.
//!
//! ```toml
//! # xin.toml
//! injection = "send-event"      # or "replay" (default)
//! display = ":1"
//! layout_command = "setxkbmap"
//! layout_timeout_ms = 2000      # omit to wait forever
//! line_buffer = 64
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so an empty file is a valid
//! configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout_command::DEFAULT_LAYOUT_COMMAND;
use super::line_reader::{DEFAULT_LINE_BUFFER, MIN_LINE_BUFFER};
use crate::application::inject_input::InjectionMethod;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("line buffer of {0} bytes is too small (expected >= {min})", min = MIN_LINE_BUFFER)]
    LineBufferTooSmall(usize),

    #[error("layout timeout must be greater than zero")]
    ZeroLayoutTimeout,
}

/// Resolved receiver settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReceiverConfig {
    /// Key injection method.
    #[serde(default)]
    pub injection: InjectionMethod,
    /// X display name; `None` uses `$DISPLAY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Layout switch program, optionally with leading arguments.
    #[serde(default = "default_layout_command")]
    pub layout_command: String,
    /// Deadline for the keyboard mapping notification; `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_timeout_ms: Option<u64>,
    /// Stdin line buffer size in bytes.
    #[serde(default = "default_line_buffer")]
    pub line_buffer: usize,
}

/// Values given on the command line.  `None`/`false` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub send_event: bool,
    pub display: Option<String>,
    pub layout_command: Option<String>,
    pub layout_timeout_ms: Option<u64>,
    pub line_buffer: Option<usize>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_layout_command() -> String {
    DEFAULT_LAYOUT_COMMAND.to_string()
}
fn default_line_buffer() -> usize {
    DEFAULT_LINE_BUFFER
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            injection: InjectionMethod::default(),
            display: None,
            layout_command: default_layout_command(),
            layout_timeout_ms: None,
            line_buffer: default_line_buffer(),
        }
    }
}

impl ReceiverConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or has unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read (including when
    /// it does not exist) and [`ConfigError::Parse`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolves the final configuration: `file` (or defaults) with `overrides` on top.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range values.
    pub fn resolve(file: Option<Self>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = file.unwrap_or_default();

        if overrides.send_event {
            config.injection = InjectionMethod::DirectDelivery;
        }
        if let Some(display) = &overrides.display {
            config.display = Some(display.clone());
        }
        if let Some(command) = &overrides.layout_command {
            config.layout_command = command.clone();
        }
        if let Some(ms) = overrides.layout_timeout_ms {
            config.layout_timeout_ms = Some(ms);
        }
        if let Some(bytes) = overrides.line_buffer {
            config.line_buffer = bytes;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// See [`ConfigError::LineBufferTooSmall`] and [`ConfigError::ZeroLayoutTimeout`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_buffer < MIN_LINE_BUFFER {
            return Err(ConfigError::LineBufferTooSmall(self.line_buffer));
        }
        if self.layout_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroLayoutTimeout);
        }
        Ok(())
    }

    pub fn layout_timeout(&self) -> Option<Duration> {
        self.layout_timeout_ms.map(Duration::from_millis)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
