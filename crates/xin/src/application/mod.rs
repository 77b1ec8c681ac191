//! Application layer use cases for the receiver.
//!
//! # What use cases does the receiver have?
//!
//! - **`inject_input`** – Replays key, button and motion commands on the
//!   display, either through XTEST or by delivering key events straight to the
//!   focused window.  Owns the modifier tracker and the pointer state.
//!
//! - **`switch_layout`** – Runs the external layout command and blocks until
//!   the display confirms the keyboard mapping changed.
//!
//! - **`dispatch`** – Parses each input line, routes it to one of the use
//!   cases above, and runs the receive loop.
//!
//! All of them talk to the X server through the [`display::DisplaySession`]
//! trait, which is injected at construction time.

pub mod display;
pub mod dispatch;
pub mod inject_input;
pub mod switch_layout;
