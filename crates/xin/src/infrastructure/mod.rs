//! Infrastructure layer for the receiver.
//!
//! Contains the OS-facing adapters: the X display session, the bounded stdin
//! line reader, the external layout command runner, and configuration loading.
//!
//! # Sub-modules
//!
//! - **`display`** – `DisplaySession` implementations.  The Xlib session is
//!   compiled only where Xlib exists; a recording mock is always available.
//!
//! - **`line_reader`** – Reads stdin one bounded line at a time and reports
//!   over-long lines as truncated.
//!
//! - **`layout_command`** – Runs `setxkbmap` (or a configured program) through
//!   `tokio::process`, plus a recording runner for tests.
//!
//! - **`config`** – TOML configuration file and command-line precedence.

pub mod config;
pub mod display;
pub mod layout_command;
pub mod line_reader;
