//! xin library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does xin do? (for beginners)
//!
//! xin is the receiving end of an input-forwarding pipe.  Something on another
//! machine captures keyboard and pointer input and writes it as text lines;
//! xin reads those lines on stdin and replays them on the local X display:
//!
//! ```text
//! sender | ssh desktop xin
//! ```
//!
//! For every line the receiver:
//!
//! 1. Reads it through a bounded buffer (over-long lines are discarded).
//! 2. Parses it with `xin_core::parse_line`.
//! 3. Injects the key, button or motion event, or switches the keyboard
//!    layout and waits until the new mapping is active.
//!
//! Problems with a single line are logged and skipped; the receiver only
//! stops at end of input or on a fatal error.

/// Application layer: use cases and the display seam.
pub mod application;

/// Infrastructure layer: X11 session, stdin reader, layout command, config.
pub mod infrastructure;
