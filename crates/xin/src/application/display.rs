//! The display-server seam used by every use case.
//!
//! [`DisplaySession`] is the set of X server capabilities the receiver needs.
//! The application layer only ever talks to the server through this trait;
//! the Xlib implementation and a recording mock live in
//! `infrastructure::display`.
//!
//! # Threading
//!
//! An Xlib connection must not be used from more than one thread, so the
//! trait carries no `Send`/`Sync` bound and sessions are shared through `Rc`.
//! The receiver runs on a single-threaded runtime.

use thiserror::Error;
use xin_core::{KeyAction, ModifierMask, PointerPosition, ScreenBounds};

/// An X11 resource id (window).
pub type WindowId = u64;

/// An X11 keycode.  Valid keycodes are 8..=255.
pub type Keycode = u8;

/// Lowest keycode the X protocol allows.
pub const MIN_KEYCODE: i32 = 8;
/// Highest keycode the X protocol allows.
pub const MAX_KEYCODE: i32 = 255;

/// Error type for display-server requests.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The connection to the display could not be opened.
    #[error("{0}")]
    Connection(String),

    /// A required protocol extension is missing or unusable.
    #[error("{0}")]
    MissingExtension(String),

    /// A request was refused by Xlib or the server.
    #[error("{request} failed")]
    Request { request: &'static str },
}

/// Which table a mapping notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRequest {
    Modifier,
    Keyboard,
    Pointer,
}

/// An X11 `MappingNotify` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingNotify {
    pub request: MappingRequest,
    pub first_keycode: Keycode,
    pub count: i32,
}

impl MappingNotify {
    /// A keyboard-table notification covering `count` keycodes from `first_keycode`.
    pub fn keyboard(first_keycode: Keycode, count: i32) -> Self {
        Self {
            request: MappingRequest::Keyboard,
            first_keycode,
            count,
        }
    }
}

/// An event read from the display's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    Mapping(MappingNotify),
    /// Any other event, identified by its X11 event type code.
    Other(i32),
}

/// A key event built by hand for direct delivery with `XSendEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectKeyEvent {
    pub action: KeyAction,
    pub keycode: Keycode,
    /// Modifier state carried in the event.
    pub state: ModifierMask,
    pub window: WindowId,
    pub subwindow: WindowId,
}

/// The capability set of a connected display server.
///
/// Query methods never fail: Xlib reports lookup misses as zero values,
/// which map to `None` here.  Injection methods return an error when Xlib
/// refuses the request.
pub trait DisplaySession {
    /// Translates a keysym to a keycode in the current keyboard mapping.
    fn keysym_to_keycode(&self, keysym: u32) -> Option<Keycode>;

    /// Returns the modifier bits the keysym is bound to (XKB).
    fn keysym_modifiers(&self, keysym: u32) -> ModifierMask;

    /// Size of the default screen.
    fn screen_bounds(&self) -> ScreenBounds;

    /// Current absolute pointer position on the root window.
    fn query_pointer(&self) -> PointerPosition;

    /// The window holding keyboard focus, if there is a real one.
    fn input_focus(&self) -> Option<WindowId>;

    /// Root window of screen 0.
    fn root_window(&self) -> WindowId;

    /// Injects a key press or release through XTEST.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Request`] if the request is refused.
    fn fake_key(&self, keycode: Keycode, action: KeyAction) -> Result<(), DisplayError>;

    /// Injects a pointer button press or release through XTEST.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Request`] if the request is refused.
    fn fake_button(&self, button: u32, action: KeyAction) -> Result<(), DisplayError>;

    /// Injects an absolute pointer motion on screen 0 through XTEST.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Request`] if the request is refused.
    fn fake_motion(&self, position: PointerPosition) -> Result<(), DisplayError>;

    /// Delivers a hand-built key event straight to `event.window`, bypassing grabs.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Request`] if the event could not be sent.
    fn send_key_event(&self, event: &DirectKeyEvent) -> Result<(), DisplayError>;

    /// Grabs `keycode` (no modifiers) on `window`.
    fn grab_key(&self, keycode: Keycode, window: WindowId);

    /// Flushes the output buffer so queued requests reach the server.
    fn flush(&self);

    /// Flushes and waits until the server has processed every request.
    fn sync(&self);

    /// Removes and returns the next queued `MappingNotify`, leaving other
    /// events in place.  Never blocks.
    fn check_mapping_notify(&self) -> Option<MappingNotify>;

    /// Removes and returns the next queued event of any kind.  Never blocks.
    fn poll_event(&self) -> Option<DisplayEvent>;

    /// Refreshes the client-side keyboard mapping after a notification.
    fn refresh_mapping(&self, notify: &MappingNotify);
}

/// Applies a mapping notification: only keyboard-table changes require a
/// refresh of the client-side keysym/keycode table.
pub fn apply_mapping_notify(display: &dyn DisplaySession, notify: &MappingNotify) {
    if notify.request == MappingRequest::Keyboard {
        display.refresh_mapping(notify);
    }
}

/// Converts a keysym taken from the wire.  Keysyms are unsigned; a negative
/// value is rejected instead of being reinterpreted.
pub fn keysym_from_wire(raw: i32) -> Option<u32> {
    u32::try_from(raw).ok()
}

/// Checks that a keycode taken from the wire is inside the X11 range.
pub fn keycode_from_wire(raw: i32) -> Option<Keycode> {
    if (MIN_KEYCODE..=MAX_KEYCODE).contains(&raw) {
        Keycode::try_from(raw).ok()
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
