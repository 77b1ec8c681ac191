//! Xlib display session: XTEST injection, `XSendEvent` delivery and XKB lookups.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! and pointer events as if the user had physically interacted with the
//! hardware.  Those events go through the server's normal routing, so grabs
//! and window-manager shortcuts see them.
//!
//! - `XTestFakeKeyEvent(display, keycode, is_press, delay)`
//! - `XTestFakeButtonEvent(display, button, is_press, delay)`
//! - `XTestFakeMotionEvent(display, screen, x, y, delay)`
//!
//! `XSendEvent` is the other route: the client builds the `XKeyEvent` itself
//! and the server hands it straight to one window, with the `send_event` flag
//! set.  It works without XTEST but bypasses grabs.
//!
//! # Keysyms and keycodes
//!
//! `XTestFakeKeyEvent` takes a *keycode*.  Lines carry *keysyms*, so the
//! session translates with `XKeysymToKeycode`, which reads a client-side copy
//! of the keyboard mapping.  That copy goes stale when the layout changes and
//! is refreshed with `XRefreshKeyboardMapping` on `MappingNotify`.
//!
//! # Errors
//!
//! Xlib reports protocol errors asynchronously through its error handler, and
//! the default handler terminates the process.  Arguments are range-checked
//! by the application layer before they reach this module.

use std::ffi::CString;
use std::mem;
use std::os::raw::{c_int, c_uint};
use std::ptr::{self, NonNull};

use tracing::debug;
use x11::{xlib, xtest};
use xin_core::{KeyAction, ModifierMask, PointerPosition, ScreenBounds};

use crate::application::display::{
    DirectKeyEvent, DisplayError, DisplayEvent, DisplaySession, Keycode, MappingNotify,
    MappingRequest, WindowId,
};

// ── X11 constants ─────────────────────────────────────────────────────────────

/// XKB version this program is written against (`XkbMajorVersion.XkbMinorVersion`).
const XKB_MAJOR_VERSION: c_int = 1;
const XKB_MINOR_VERSION: c_int = 0;

/// `CurrentTime`: let the server pick the timestamp.
const CURRENT_TIME: xlib::Time = 0;

/// Focus values that are not real windows.
const FOCUS_NONE: xlib::Window = 0;
const FOCUS_POINTER_ROOT: xlib::Window = 1;

const GRAB_MODE_SYNC: c_int = 0;
const GRAB_MODE_ASYNC: c_int = 1;

/// An open connection to an X display.
pub struct XlibSession {
    display: NonNull<xlib::Display>,
    screen: c_int,
    root: xlib::Window,
}

impl XlibSession {
    /// Connects to `name` (or `$DISPLAY` when `None`) and checks for XKB.
    ///
    /// # Errors
    ///
    /// - [`DisplayError::Connection`] if the display cannot be opened.
    /// - [`DisplayError::MissingExtension`] if XKB is missing or too old.
    pub fn open(name: Option<&str>) -> Result<Self, DisplayError> {
        let c_name = name
            .map(CString::new)
            .transpose()
            .map_err(|_| DisplayError::Connection("display name contains a NUL byte".into()))?;
        let name_ptr = c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());

        // SAFETY: name_ptr is null or a valid NUL-terminated string that
        // outlives the call.
        let raw = unsafe { xlib::XOpenDisplay(name_ptr) };
        let display = NonNull::new(raw).ok_or_else(|| {
            DisplayError::Connection(match name {
                Some(n) => format!("failed X11 connection to '{n}'"),
                None => "X11 connection failed; DISPLAY environment variable not set?".into(),
            })
        })?;

        // SAFETY: display is a live connection.
        let (screen, root) = unsafe {
            let screen = xlib::XDefaultScreen(display.as_ptr());
            (screen, xlib::XRootWindow(display.as_ptr(), 0))
        };
        let session = Self { display, screen, root };
        session.check_xkb()?;
        debug!(screen, root, "display opened");
        Ok(session)
    }

    /// Returns `true` if the server supports the XTEST extension.
    pub fn has_xtest(&self) -> bool {
        let (mut event_base, mut error_base, mut major, mut minor) = (0, 0, 0, 0);
        // SAFETY: the out-pointers reference live locals.
        let present = unsafe {
            xtest::XTestQueryExtension(
                self.raw(),
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if present != 0 {
            debug!(major, minor, "XTEST available");
        }
        present != 0
    }

    fn check_xkb(&self) -> Result<(), DisplayError> {
        let (mut major, mut minor) = (XKB_MAJOR_VERSION, XKB_MINOR_VERSION);
        // SAFETY: the out-pointers reference live locals.
        if unsafe { xlib::XkbLibraryVersion(&mut major, &mut minor) } == 0 {
            return Err(DisplayError::MissingExtension(format!(
                "trouble with XKB extension; needed {XKB_MAJOR_VERSION}.{XKB_MINOR_VERSION} got {major}.{minor}"
            )));
        }

        let (mut opcode, mut event_base, mut error_base) = (0, 0, 0);
        let (mut major, mut minor) = (XKB_MAJOR_VERSION, XKB_MINOR_VERSION);
        // SAFETY: the out-pointers reference live locals.
        let ok = unsafe {
            xlib::XkbQueryExtension(
                self.raw(),
                &mut opcode,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if ok == 0 {
            return Err(DisplayError::MissingExtension("trouble with XKB extension".into()));
        }
        Ok(())
    }

    fn raw(&self) -> *mut xlib::Display {
        self.display.as_ptr()
    }
}

impl Drop for XlibSession {
    fn drop(&mut self) {
        // SAFETY: the connection is open and nothing else owns it.
        unsafe {
            xlib::XCloseDisplay(self.raw());
        }
    }
}

fn xbool(value: bool) -> c_int {
    if value {
        xlib::True
    } else {
        xlib::False
    }
}

fn mapping_request(raw: c_int) -> MappingRequest {
    match raw {
        xlib::MappingModifier => MappingRequest::Modifier,
        xlib::MappingKeyboard => MappingRequest::Keyboard,
        _ => MappingRequest::Pointer,
    }
}

fn mapping_from_event(event: &xlib::XMappingEvent) -> MappingNotify {
    MappingNotify {
        request: mapping_request(event.request),
        first_keycode: Keycode::try_from(event.first_keycode).unwrap_or(0),
        count: event.count,
    }
}

impl DisplaySession for XlibSession {
    fn keysym_to_keycode(&self, keysym: u32) -> Option<Keycode> {
        // SAFETY: live connection; lookup has no side effects.
        let keycode = unsafe { xlib::XKeysymToKeycode(self.raw(), xlib::KeySym::from(keysym)) };
        (keycode != 0).then_some(keycode)
    }

    fn keysym_modifiers(&self, keysym: u32) -> ModifierMask {
        // SAFETY: live connection with XKB checked at open.
        let bits = unsafe { xlib::XkbKeysymToModifiers(self.raw(), xlib::KeySym::from(keysym)) };
        ModifierMask(bits)
    }

    fn screen_bounds(&self) -> ScreenBounds {
        // SAFETY: live connection, screen index from XDefaultScreen.
        unsafe {
            ScreenBounds::new(
                xlib::XDisplayWidth(self.raw(), self.screen),
                xlib::XDisplayHeight(self.raw(), self.screen),
            )
        }
    }

    fn query_pointer(&self) -> PointerPosition {
        let (mut root, mut child) = (0, 0);
        let (mut root_x, mut root_y, mut win_x, mut win_y) = (0, 0, 0, 0);
        let mut mask: c_uint = 0;
        // SAFETY: all out-pointers reference live locals.
        unsafe {
            xlib::XQueryPointer(
                self.raw(),
                self.root,
                &mut root,
                &mut child,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            );
        }
        PointerPosition::new(root_x, root_y)
    }

    fn input_focus(&self) -> Option<WindowId> {
        let mut focus: xlib::Window = FOCUS_NONE;
        let mut revert_to: c_int = 0;
        // SAFETY: out-pointers reference live locals.
        let ok = unsafe { xlib::XGetInputFocus(self.raw(), &mut focus, &mut revert_to) };
        if ok == 0 || focus == FOCUS_NONE || focus == FOCUS_POINTER_ROOT {
            None
        } else {
            Some(WindowId::from(focus))
        }
    }

    fn root_window(&self) -> WindowId {
        WindowId::from(self.root)
    }

    fn fake_key(&self, keycode: Keycode, action: KeyAction) -> Result<(), DisplayError> {
        // SAFETY: live connection; keycode is within 8..=255.
        let ok = unsafe {
            xtest::XTestFakeKeyEvent(self.raw(), c_uint::from(keycode), xbool(action.is_press()), 0)
        };
        if ok == 0 {
            return Err(DisplayError::Request { request: "XTestFakeKeyEvent" });
        }
        Ok(())
    }

    fn fake_button(&self, button: u32, action: KeyAction) -> Result<(), DisplayError> {
        // SAFETY: live connection; button is within 1..=255.
        let ok = unsafe {
            xtest::XTestFakeButtonEvent(self.raw(), button, xbool(action.is_press()), 0)
        };
        if ok == 0 {
            return Err(DisplayError::Request { request: "XTestFakeButtonEvent" });
        }
        Ok(())
    }

    fn fake_motion(&self, position: PointerPosition) -> Result<(), DisplayError> {
        // SAFETY: live connection.
        let ok =
            unsafe { xtest::XTestFakeMotionEvent(self.raw(), 0, position.x, position.y, 0) };
        if ok == 0 {
            return Err(DisplayError::Request { request: "XTestFakeMotionEvent" });
        }
        Ok(())
    }

    fn send_key_event(&self, event: &DirectKeyEvent) -> Result<(), DisplayError> {
        let press = event.action.is_press();
        // SAFETY: an all-zero XKeyEvent is a valid value.
        let mut key: xlib::XKeyEvent = unsafe { mem::zeroed() };
        key.type_ = if press { xlib::KeyPress } else { xlib::KeyRelease };
        key.display = self.raw();
        key.window = event.window as xlib::Window;
        key.subwindow = event.subwindow as xlib::Window;
        key.time = CURRENT_TIME;
        key.state = event.state.bits();
        key.keycode = c_uint::from(event.keycode);

        let mut xevent = xlib::XEvent::from(key);
        let mask = if press { xlib::KeyPressMask } else { xlib::KeyReleaseMask };
        // SAFETY: xevent is a fully initialised key event.
        let status = unsafe {
            xlib::XSendEvent(self.raw(), key.window, xlib::False, mask, &mut xevent)
        };
        if status == 0 {
            return Err(DisplayError::Request { request: "XSendEvent" });
        }
        Ok(())
    }

    fn grab_key(&self, keycode: Keycode, window: WindowId) {
        // SAFETY: live connection.
        unsafe {
            xlib::XGrabKey(
                self.raw(),
                c_int::from(keycode),
                0,
                window as xlib::Window,
                xlib::False,
                GRAB_MODE_SYNC,
                GRAB_MODE_ASYNC,
            );
        }
    }

    fn flush(&self) {
        // SAFETY: live connection.
        unsafe {
            xlib::XFlush(self.raw());
        }
    }

    fn sync(&self) {
        // SAFETY: live connection.
        unsafe {
            xlib::XSync(self.raw(), xlib::False);
        }
    }

    fn check_mapping_notify(&self) -> Option<MappingNotify> {
        // SAFETY: an all-zero XEvent is a valid value; Xlib fills it in.
        let mut event: xlib::XEvent = unsafe { mem::zeroed() };
        // SAFETY: live connection, event is writable.
        let found =
            unsafe { xlib::XCheckTypedEvent(self.raw(), xlib::MappingNotify, &mut event) };
        if found == 0 {
            return None;
        }
        // SAFETY: the event type is MappingNotify, so `mapping` is the active member.
        Some(mapping_from_event(unsafe { &event.mapping }))
    }

    fn poll_event(&self) -> Option<DisplayEvent> {
        // SAFETY: live connection.  XPending flushes and reads without blocking.
        if unsafe { xlib::XPending(self.raw()) } == 0 {
            return None;
        }
        // SAFETY: as in check_mapping_notify; an event is known to be queued.
        let mut event: xlib::XEvent = unsafe { mem::zeroed() };
        unsafe {
            xlib::XNextEvent(self.raw(), &mut event);
        }
        let kind = event.get_type();
        if kind == xlib::MappingNotify {
            // SAFETY: `mapping` is the active member for MappingNotify.
            Some(DisplayEvent::Mapping(mapping_from_event(unsafe { &event.mapping })))
        } else {
            Some(DisplayEvent::Other(kind))
        }
    }

    fn refresh_mapping(&self, notify: &MappingNotify) {
        // SAFETY: an all-zero XMappingEvent is a valid value.
        let mut event: xlib::XMappingEvent = unsafe { mem::zeroed() };
        event.type_ = xlib::MappingNotify;
        event.display = self.raw();
        event.request = match notify.request {
            MappingRequest::Modifier => xlib::MappingModifier,
            MappingRequest::Keyboard => xlib::MappingKeyboard,
            MappingRequest::Pointer => xlib::MappingPointer,
        };
        event.first_keycode = c_int::from(notify.first_keycode);
        event.count = notify.count;
        // SAFETY: event describes a mapping change on this connection.
        unsafe {
            xlib::XRefreshKeyboardMapping(&mut event);
        }
        debug!(?notify, "keyboard mapping refreshed");
    }
}
