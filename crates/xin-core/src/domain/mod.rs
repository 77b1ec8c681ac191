//! Domain state for the xin receiver.
//!
//! This module contains pure bookkeeping with no infrastructure dependencies.
//! Both types below live for the whole process and are owned by the input
//! injection use case in the `xin` crate, which mutates them through
//! `&mut self` as commands arrive.
//!
//! # Why keep this state outside the X server? (for beginners)
//!
//! The X server already knows which modifiers are held and where the pointer
//! is, so it may seem redundant to track them locally.  The receiver needs its
//! own copy for two reasons:
//!
//! - **Direct key delivery** (`XSendEvent`) builds the event structure by hand,
//!   including its `state` field.  The server does not fill in modifiers for
//!   synthetic events, so the receiver must remember what it has pressed.
//! - **Pointer motion** arrives as deltas, but XTEST is driven with absolute
//!   coordinates.  Accumulating locally avoids a server round trip per motion
//!   command.

/// Running bitmask of modifier keys held by direct key delivery.
pub mod modifiers;

/// Last known absolute pointer position and screen clamping.
pub mod pointer;
