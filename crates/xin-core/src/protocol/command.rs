//! Command types decoded from the line protocol.
//!
//! One input line produces at most one [`Command`].  Commands are built fresh
//! for every line, handed to the dispatcher, and dropped once the handler
//! returns; nothing here is retained between lines.

use std::fmt;

// ── Control characters ────────────────────────────────────────────────────────

/// Key press (`k`) and release (`K`).
pub const CONTROL_KEY_PRESS: char = 'k';
pub const CONTROL_KEY_RELEASE: char = 'K';
/// Pointer button press (`b`) and release (`B`).
pub const CONTROL_BUTTON_PRESS: char = 'b';
pub const CONTROL_BUTTON_RELEASE: char = 'B';
/// Pointer motion.
pub const CONTROL_MOTION: char = 'm';
/// Keyboard layout switch.
pub const CONTROL_LAYOUT: char = 'l';

/// Whether a key or button goes down or comes back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Release,
}

impl KeyAction {
    /// Lower-case control characters press, upper-case ones release.
    pub fn from_control(c: char) -> Self {
        if c.is_ascii_uppercase() {
            KeyAction::Release
        } else {
            KeyAction::Press
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self, KeyAction::Press)
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Press => f.write_str("press"),
            KeyAction::Release => f.write_str("release"),
        }
    }
}

/// `k`/`K` lines: a keyboard key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommand {
    pub action: KeyAction,
    /// The keysym, carried in the "state" field of the wire form.
    pub keysym: i32,
    /// Explicit keycode, or `0` to derive it from `keysym`.
    pub keycode: i32,
}

impl KeyCommand {
    /// Returns `true` when the keycode must be looked up from the keysym.
    pub fn derives_keycode(&self) -> bool {
        self.keycode == 0
    }
}

/// `b`/`B` lines: a pointer button press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonCommand {
    pub action: KeyAction,
    /// First integer of the wire form.  Accepted by the grammar, never used.
    pub unused: i32,
    pub button: i32,
}

/// `m` lines: pointer motion deltas (subtracted from the current position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCommand {
    pub dx: i32,
    pub dy: i32,
}

/// `l` lines: switch to the named keyboard layout.
///
/// The name is raw text from the wire; it is validated into a
/// [`LayoutName`](crate::LayoutName) by the layout coordinator, not the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCommand {
    pub name: String,
}

/// A decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Key(KeyCommand),
    Button(ButtonCommand),
    Motion(MotionCommand),
    Layout(LayoutCommand),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Key(k) if k.derives_keycode() => {
                write!(f, "key {} keysym={}", k.action, k.keysym)
            }
            Command::Key(k) => write!(
                f,
                "key {} keysym={} keycode={}",
                k.action, k.keysym, k.keycode
            ),
            Command::Button(b) => write!(f, "button {} {}", b.action, b.button),
            Command::Motion(m) => write!(f, "motion dx={} dy={}", m.dx, m.dy),
            Command::Layout(l) => write!(f, "layout {:?}", l.name),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
