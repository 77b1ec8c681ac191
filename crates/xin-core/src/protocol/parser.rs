//! Line grammar for the forwarding protocol.
//!
//! Each line is one command.  The grammar is a fixed, ordered list of
//! alternatives; the first one that matches wins:
//!
//! ```text
//! 1. "l " <name>              layout switch (name = rest of the line)
//! 2. <c> <int>                c in {k, K}: key with keycode derived from keysym
//! 3. <c> <int> <int>          m: motion, b/B: button, k/K: key with keycode
//!                             anything else: unknown control
//! 4. otherwise                invalid or incomplete format
//! ```
//!
//! Alternatives 2 and 3 overlap on `k`/`K` and are told apart purely by how
//! many integers follow the control character.
//!
//! # Field scanning
//!
//! Fields are scanned the way C's `scanf("%c %d %d")` scans them, because the
//! senders in the wild were written against that:
//!
//! - the control character is the very first character of the line, even if
//!   it is whitespace;
//! - whitespace before each integer is optional and skipped;
//! - an integer is an optional sign followed by decimal digits;
//! - anything after the last integer that scanned is ignored.
//!
//! An integer that does not fit in `i32` stops the scan at that field.

use thiserror::Error;
use tracing::trace;

use super::command::{
    ButtonCommand, Command, KeyAction, KeyCommand, LayoutCommand, MotionCommand,
    CONTROL_BUTTON_PRESS, CONTROL_BUTTON_RELEASE, CONTROL_KEY_PRESS, CONTROL_KEY_RELEASE,
    CONTROL_LAYOUT, CONTROL_MOTION,
};

/// Why a line did not produce a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// No alternative of the grammar matched.
    #[error("parse error; invalid or incomplete format")]
    InvalidFormat,

    /// Two integers were present but the control character is not one of
    /// `m`, `b`, `B`, `k`, `K`.
    #[error("parse error; unknown control {0:?}")]
    UnknownControl(char),
}

/// Parses one protocol line (without its line terminator) into a [`Command`].
///
/// # Errors
///
/// Returns [`ParseError`] when no grammar alternative matches.
///
/// # Examples
///
/// ```rust
/// use xin_core::protocol::parse_line;
/// use xin_core::protocol::command::{Command, KeyAction, KeyCommand};
///
/// let cmd = parse_line("K 65").unwrap();
/// assert_eq!(
///     cmd,
///     Command::Key(KeyCommand { action: KeyAction::Release, keysym: 65, keycode: 0 })
/// );
/// ```
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    if let Some(name) = layout_name(line) {
        trace!(name, "layout line");
        return Ok(Command::Layout(LayoutCommand { name: name.to_owned() }));
    }

    let mut chars = line.chars();
    let control = chars.next().ok_or(ParseError::InvalidFormat)?;
    let fields = scan_ints(chars.as_str());
    trace!(?control, ?fields, "scanned line");

    match fields {
        Fields::One(keysym) if is_key_control(control) => Ok(Command::Key(KeyCommand {
            action: KeyAction::from_control(control),
            keysym,
            keycode: 0,
        })),
        Fields::Two(first, second) => decode_three_field(control, first, second),
        _ => Err(ParseError::InvalidFormat),
    }
}

/// Alternative 1: `l` followed by a space and at least one more character.
fn layout_name(line: &str) -> Option<&str> {
    line.strip_prefix(CONTROL_LAYOUT)?
        .strip_prefix(' ')
        .filter(|rest| !rest.is_empty())
}

fn is_key_control(c: char) -> bool {
    c == CONTROL_KEY_PRESS || c == CONTROL_KEY_RELEASE
}

/// Alternative 3: `<c> <int> <int>`, switched on the control character.
fn decode_three_field(control: char, state: i32, value: i32) -> Result<Command, ParseError> {
    match control {
        CONTROL_MOTION => Ok(Command::Motion(MotionCommand { dx: state, dy: value })),
        CONTROL_BUTTON_PRESS | CONTROL_BUTTON_RELEASE => Ok(Command::Button(ButtonCommand {
            action: KeyAction::from_control(control),
            unused: state,
            button: value,
        })),
        CONTROL_KEY_PRESS | CONTROL_KEY_RELEASE => Ok(Command::Key(KeyCommand {
            action: KeyAction::from_control(control),
            keysym: state,
            keycode: value,
        })),
        other => Err(ParseError::UnknownControl(other)),
    }
}

// ── Field scanning ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fields {
    None,
    One(i32),
    Two(i32, i32),
}

/// Scans up to two integers from `input`.
fn scan_ints(input: &str) -> Fields {
    let Some((first, rest)) = scan_int(input) else {
        return Fields::None;
    };
    match scan_int(rest) {
        Some((second, _)) => Fields::Two(first, second),
        None => Fields::One(first),
    }
}

/// Scans one `%d` field: optional whitespace, optional sign, digits.
///
/// Returns the value and the unconsumed remainder.
fn scan_int(input: &str) -> Option<(i32, &str)> {
    let trimmed = input.trim_start_matches(is_c_space);
    let bytes = trimmed.as_bytes();

    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digit_len = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digit_len == 0 {
        return None;
    }

    let end = sign_len + digit_len;
    let value = trimmed[..end].parse::<i32>().ok()?;
    Some((value, &trimmed[end..]))
}

/// The whitespace set of C's `isspace` in the "C" locale.
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
