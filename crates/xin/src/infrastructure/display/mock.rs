//! Mock display session for unit and integration testing.
//!
//! # Why a mock display?
//!
//! The real [`XlibSession`](super::xlib::XlibSession) needs a running X server
//! and actually types on it.  `MockDisplaySession` answers queries from a
//! small in-memory keymap and records every request in a `Mutex<Vec<...>>`,
//! so test assertions can inspect exactly what was sent and in what order.
//!
//! # Event queue
//!
//! Tests that exercise the layout coordinator need the display to "receive"
//! a `MappingNotify` after the layout command runs.  [`MockEventQueue`] is a
//! cloneable handle onto the session's event queue; hand a clone to whatever
//! plays the role of the layout tool and push events into it.
//!
//! # `should_fail` flag
//!
//! [`MockDisplaySession::failing`] makes every injection request return
//! [`DisplayError::Request`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use xin_core::keymap::keysym::{XK_CONTROL_L, XK_RETURN, XK_SHIFT_L, XK_SUPER_L};
use xin_core::{KeyAction, ModifierMask, PointerPosition, ScreenBounds};

use crate::application::display::{
    DirectKeyEvent, DisplayError, DisplayEvent, DisplaySession, Keycode, MappingNotify, WindowId,
};

/// Root window id reported by the mock.
pub const MOCK_ROOT_WINDOW: WindowId = 0x0000_0100;
/// Default focus window id reported by the mock.
pub const MOCK_FOCUS_WINDOW: WindowId = 0x0240_0007;
/// Keycode the default keymap binds to `Super_L`.
pub const MOCK_SUPER_KEYCODE: Keycode = 133;

/// One request recorded by the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    FakeKey { keycode: Keycode, action: KeyAction },
    FakeButton { button: u32, action: KeyAction },
    FakeMotion(PointerPosition),
    SendKey(DirectKeyEvent),
    GrabKey { keycode: Keycode, window: WindowId },
    Flush,
    Sync,
    RefreshMapping(MappingNotify),
}

impl DisplayCall {
    /// `true` for requests that put input on the display.
    pub fn is_injection(&self) -> bool {
        matches!(
            self,
            DisplayCall::FakeKey { .. }
                | DisplayCall::FakeButton { .. }
                | DisplayCall::FakeMotion(_)
                | DisplayCall::SendKey(_)
        )
    }
}

/// Shared handle onto a mock session's pending events.
#[derive(Debug, Clone, Default)]
pub struct MockEventQueue(Arc<Mutex<VecDeque<DisplayEvent>>>);

impl MockEventQueue {
    pub fn push(&self, event: DisplayEvent) {
        self.0.lock().unwrap().push_back(event);
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_mapping(&self) -> Option<MappingNotify> {
        let mut queue = self.0.lock().unwrap();
        let index = queue
            .iter()
            .position(|e| matches!(e, DisplayEvent::Mapping(_)))?;
        match queue.remove(index) {
            Some(DisplayEvent::Mapping(notify)) => Some(notify),
            _ => None,
        }
    }

    fn pop(&self) -> Option<DisplayEvent> {
        self.0.lock().unwrap().pop_front()
    }
}

/// A display session that records all calls without touching an X server.
pub struct MockDisplaySession {
    keymap: Mutex<HashMap<u32, (Keycode, ModifierMask)>>,
    bounds: ScreenBounds,
    pointer: PointerPosition,
    focus: Option<WindowId>,
    root: WindowId,
    should_fail: bool,
    events: MockEventQueue,
    calls: Mutex<Vec<DisplayCall>>,
    pointer_queries: Mutex<usize>,
}

impl Default for MockDisplaySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDisplaySession {
    /// A 1920x1080 screen with the pointer in the middle, focus on
    /// [`MOCK_FOCUS_WINDOW`], and a small US keymap:
    ///
    /// | Keysym            | Keycode | Modifier |
    /// |-------------------|---------|----------|
    /// | `a` / `A`         | 38      |          |
    /// | `Return`          | 36      |          |
    /// | `Shift_L`         | 50      | Shift    |
    /// | `Control_L`       | 37      | Control  |
    /// | `Super_L`         | 133     | Mod4     |
    pub fn new() -> Self {
        let mut keymap = HashMap::new();
        keymap.insert(0x61, (38, ModifierMask::NONE));
        keymap.insert(0x41, (38, ModifierMask::NONE));
        keymap.insert(XK_RETURN, (36, ModifierMask::NONE));
        keymap.insert(XK_SHIFT_L, (50, ModifierMask(ModifierMask::SHIFT)));
        keymap.insert(XK_CONTROL_L, (37, ModifierMask(ModifierMask::CONTROL)));
        keymap.insert(XK_SUPER_L, (MOCK_SUPER_KEYCODE, ModifierMask(ModifierMask::MOD4)));

        Self {
            keymap: Mutex::new(keymap),
            bounds: ScreenBounds::new(1920, 1080),
            pointer: PointerPosition::new(960, 540),
            focus: Some(MOCK_FOCUS_WINDOW),
            root: MOCK_ROOT_WINDOW,
            should_fail: false,
            events: MockEventQueue::default(),
            calls: Mutex::new(Vec::new()),
            pointer_queries: Mutex::new(0),
        }
    }

    pub fn with_screen(mut self, width: i32, height: i32) -> Self {
        self.bounds = ScreenBounds::new(width, height);
        self
    }

    pub fn with_pointer(mut self, x: i32, y: i32) -> Self {
        self.pointer = PointerPosition::new(x, y);
        self
    }

    pub fn with_focus(mut self, focus: Option<WindowId>) -> Self {
        self.focus = focus;
        self
    }

    /// Makes every injection request fail.
    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Binds `keysym` to `keycode` in the mock keymap.
    pub fn map_keysym(&self, keysym: u32, keycode: Keycode, modifiers: ModifierMask) {
        self.keymap
            .lock()
            .unwrap()
            .insert(keysym, (keycode, modifiers));
    }

    /// Removes `keysym` from the mock keymap.
    pub fn unmap_keysym(&self, keysym: u32) {
        self.keymap.lock().unwrap().remove(&keysym);
    }

    /// A handle for pushing events the session will later report.
    pub fn event_queue(&self) -> MockEventQueue {
        self.events.clone()
    }

    /// Every recorded request, in order.
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the requests that put input on the display.
    pub fn injected(&self) -> Vec<DisplayCall> {
        self.calls()
            .into_iter()
            .filter(DisplayCall::is_injection)
            .collect()
    }

    /// How many times the real pointer position was queried.
    pub fn pointer_queries(&self) -> usize {
        *self.pointer_queries.lock().unwrap()
    }

    fn record(&self, call: DisplayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn inject(&self, call: DisplayCall, request: &'static str) -> Result<(), DisplayError> {
        if self.should_fail {
            return Err(DisplayError::Request { request });
        }
        self.record(call);
        Ok(())
    }
}

impl DisplaySession for MockDisplaySession {
    fn keysym_to_keycode(&self, keysym: u32) -> Option<Keycode> {
        self.keymap.lock().unwrap().get(&keysym).map(|(code, _)| *code)
    }

    fn keysym_modifiers(&self, keysym: u32) -> ModifierMask {
        self.keymap
            .lock()
            .unwrap()
            .get(&keysym)
            .map(|(_, mods)| *mods)
            .unwrap_or_default()
    }

    fn screen_bounds(&self) -> ScreenBounds {
        self.bounds
    }

    fn query_pointer(&self) -> PointerPosition {
        *self.pointer_queries.lock().unwrap() += 1;
        self.pointer
    }

    fn input_focus(&self) -> Option<WindowId> {
        self.focus
    }

    fn root_window(&self) -> WindowId {
        self.root
    }

    fn fake_key(&self, keycode: Keycode, action: KeyAction) -> Result<(), DisplayError> {
        self.inject(DisplayCall::FakeKey { keycode, action }, "XTestFakeKeyEvent")
    }

    fn fake_button(&self, button: u32, action: KeyAction) -> Result<(), DisplayError> {
        self.inject(DisplayCall::FakeButton { button, action }, "XTestFakeButtonEvent")
    }

    fn fake_motion(&self, position: PointerPosition) -> Result<(), DisplayError> {
        self.inject(DisplayCall::FakeMotion(position), "XTestFakeMotionEvent")
    }

    fn send_key_event(&self, event: &DirectKeyEvent) -> Result<(), DisplayError> {
        self.inject(DisplayCall::SendKey(*event), "XSendEvent")
    }

    fn grab_key(&self, keycode: Keycode, window: WindowId) {
        self.record(DisplayCall::GrabKey { keycode, window });
    }

    fn flush(&self) {
        self.record(DisplayCall::Flush);
    }

    fn sync(&self) {
        self.record(DisplayCall::Sync);
    }

    fn check_mapping_notify(&self) -> Option<MappingNotify> {
        self.events.take_mapping()
    }

    fn poll_event(&self) -> Option<DisplayEvent> {
        self.events.pop()
    }

    fn refresh_mapping(&self, notify: &MappingNotify) {
        self.record(DisplayCall::RefreshMapping(*notify));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
