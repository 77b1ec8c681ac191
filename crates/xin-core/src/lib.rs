//! # xin-core
//!
//! Shared library for the xin forwarded-input receiver containing the line
//! protocol grammar, the stateful injection bookkeeping, and the X11 keysym
//! constants the receiver relies on.
//!
//! This crate has zero dependencies on OS APIs, the X server, or async I/O.
//!
//! # Architecture overview
//!
//! xin is the receiving end of an input-forwarding pipe.  A sender captures
//! keyboard and pointer input somewhere else (usually on the other side of an
//! SSH tunnel) and writes one text command per line:
//!
//! ```text
//! k 65        press the key whose keysym is 65 ('A')
//! K 65        release it again
//! m 5 -3      move the pointer (subtractive deltas)
//! b 0 1       press pointer button 1
//! l us        switch the keyboard layout to "us"
//! ```
//!
//! The receiver replays those commands against the local X display.  This
//! crate defines:
//!
//! - **`protocol`** – The typed [`Command`] values and the ordered-alternative
//!   grammar that turns one input line into one command.
//!
//! - **`domain`** – The two pieces of state that live for the whole process:
//!   the [`ModifierTracker`] used by direct key delivery and the
//!   [`PointerState`] that accumulates motion deltas and clamps them to the
//!   screen.
//!
//! - **`keymap`** – X11 keysym constants and human-readable names used for
//!   logging and for the layout-switch sentinel key.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::modifiers::{ModifierMask, ModifierTracker};
pub use domain::pointer::{PointerPosition, PointerState, ScreenBounds};
pub use protocol::command::{
    ButtonCommand, Command, KeyAction, KeyCommand, LayoutCommand, MotionCommand,
};
pub use protocol::layout_name::{LayoutName, LayoutNameError};
pub use protocol::parser::{parse_line, ParseError};
