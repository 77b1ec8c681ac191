//! InjectInputUseCase: replays key, button and motion commands on the display.
//!
//! This use case sits at the application layer and delegates every server
//! request to a [`DisplaySession`].  It owns the two pieces of process-wide
//! state the protocol needs: the [`ModifierTracker`] for direct key delivery
//! and the [`PointerState`] for motion accumulation.
//!
//! # Injection methods (for beginners)
//!
//! There are two ways to make an X server believe a key was pressed:
//!
//! | Method            | X11 call                | Honours grabs | Seen as real input |
//! |-------------------|-------------------------|---------------|--------------------|
//! | `Replay`          | `XTestFakeKeyEvent`     | yes           | yes                |
//! | `DirectDelivery`  | `XSendEvent`            | no            | no (`send_event`)  |
//!
//! Replay is the default: the server routes the event exactly like hardware
//! input, so window-manager shortcuts and grabs keep working.  Direct delivery
//! is useful when the XTEST extension is disabled; it writes the event
//! straight into the focused window and therefore has to fill in the modifier
//! state itself.  Buttons and motion always use XTEST.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};
use xin_core::keymap::describe_keysym;
use xin_core::keymap::keysym::is_modifier_keysym;
use xin_core::{
    ButtonCommand, KeyCommand, ModifierMask, ModifierTracker, MotionCommand, PointerPosition,
    PointerState,
};

use super::display::{
    keycode_from_wire, keysym_from_wire, DirectKeyEvent, DisplayError, DisplaySession, Keycode,
};

/// Highest pointer button number XTEST accepts.
const MAX_BUTTON: i32 = 255;

/// Error type for a single injected command.
///
/// All variants are per-line problems: the command is dropped and the receiver
/// moves on to the next line.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("couldn't find keycode for keysym {0:#x}")]
    UnresolvedKeysym(i32),

    #[error("keysym {0} is negative")]
    InvalidKeysym(i32),

    #[error("keycode {0} is outside the X11 range 8..=255")]
    InvalidKeycode(i32),

    #[error("button {0} is outside the range 1..=255")]
    InvalidButton(i32),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// How key commands are injected.  Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionMethod {
    /// XTEST fake events; honours grabs.
    #[default]
    Replay,
    /// `XSendEvent` to the focused window; bypasses grabs.
    #[serde(rename = "send-event", alias = "direct-delivery")]
    DirectDelivery,
}

/// The Inject Input use case.
pub struct InjectInputUseCase {
    display: Rc<dyn DisplaySession>,
    method: InjectionMethod,
    modifiers: ModifierTracker,
    pointer: PointerState,
}

impl InjectInputUseCase {
    /// Creates a new use case with no modifiers held and an unseeded pointer.
    pub fn new(display: Rc<dyn DisplaySession>, method: InjectionMethod) -> Self {
        Self {
            display,
            method,
            modifiers: ModifierTracker::new(),
            pointer: PointerState::new(),
        }
    }

    pub fn method(&self) -> InjectionMethod {
        self.method
    }

    /// Modifiers currently tracked for direct delivery.
    pub fn modifiers(&self) -> ModifierMask {
        self.modifiers.mask()
    }

    /// Last injected pointer position, `None` before the first motion command.
    pub fn pointer_position(&self) -> Option<PointerPosition> {
        self.pointer.position()
    }

    /// Handles a `k`/`K` command with the configured method.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError`] if the keysym is negative, the keycode cannot
    /// be resolved or the server refuses the request.
    pub fn handle_key(&mut self, cmd: &KeyCommand) -> Result<(), InjectError> {
        let keysym = keysym_from_wire(cmd.keysym).ok_or(InjectError::InvalidKeysym(cmd.keysym))?;
        match self.method {
            InjectionMethod::Replay => self.replay_key(cmd, keysym),
            InjectionMethod::DirectDelivery => self.deliver_key(cmd, keysym),
        }
    }

    /// Handles a `b`/`B` command.  Always replayed through XTEST.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::InvalidButton`] for button numbers outside
    /// 1..=255, or a display error if the server refuses the request.
    pub fn handle_button(&self, cmd: &ButtonCommand) -> Result<(), InjectError> {
        if !(1..=MAX_BUTTON).contains(&cmd.button) {
            return Err(InjectError::InvalidButton(cmd.button));
        }
        debug!(button = cmd.button, action = %cmd.action, "replay button");
        self.display.fake_button(cmd.button as u32, cmd.action)?;
        self.display.flush();
        Ok(())
    }

    /// Handles an `m` command and returns the position that was injected.
    ///
    /// The first motion command seeds the pointer state from the real pointer.
    ///
    /// # Errors
    ///
    /// Returns a display error if the server refuses the motion request.
    pub fn handle_motion(&mut self, cmd: &MotionCommand) -> Result<PointerPosition, InjectError> {
        if !self.pointer.is_seeded() {
            let start = self.display.query_pointer();
            debug!(%start, "seeding pointer state");
            self.pointer.seed(start);
        }

        let bounds = self.display.screen_bounds();
        let next = self.pointer.advance(cmd.dx, cmd.dy, bounds);
        self.display.fake_motion(next)?;
        self.display.flush();
        Ok(next)
    }

    // ── Key strategies ────────────────────────────────────────────────────────

    fn replay_key(&self, cmd: &KeyCommand, keysym: u32) -> Result<(), InjectError> {
        let keycode = self
            .resolve_keycode(cmd, keysym)?
            .ok_or(InjectError::UnresolvedKeysym(cmd.keysym))?;
        debug!(
            keysym = %describe_keysym(cmd.keysym),
            keycode,
            action = %cmd.action,
            "replay key"
        );
        self.display.fake_key(keycode, cmd.action)?;
        self.display.flush();
        Ok(())
    }

    fn deliver_key(&mut self, cmd: &KeyCommand, keysym: u32) -> Result<(), InjectError> {
        let window = match self.display.input_focus() {
            Some(window) => window,
            None => {
                warn!("no input focus; sending events to root window");
                self.display.root_window()
            }
        };

        // An unresolvable keysym is still delivered, with keycode 0.
        let keycode = self.resolve_keycode(cmd, keysym)?.unwrap_or_else(|| {
            debug!(keysym = %describe_keysym(cmd.keysym), "keysym has no keycode");
            0
        });

        let bits = self.display.keysym_modifiers(keysym);
        let state = if cmd.action.is_press() {
            self.modifiers.press(bits)
        } else {
            self.modifiers.release(bits)
        };

        if is_modifier_keysym(keysym) {
            debug!(keysym = %describe_keysym(cmd.keysym), %state, "modifier state changed");
        }

        let event = DirectKeyEvent {
            action: cmd.action,
            keycode,
            state,
            window,
            subwindow: window,
        };
        trace!(
            keysym = %describe_keysym(cmd.keysym),
            keycode,
            %state,
            window,
            action = %cmd.action,
            "deliver key"
        );
        self.display.send_key_event(&event)?;
        self.display.flush();
        Ok(())
    }

    /// Explicit keycodes are range-checked; keycode 0 is looked up from the keysym.
    fn resolve_keycode(
        &self,
        cmd: &KeyCommand,
        keysym: u32,
    ) -> Result<Option<Keycode>, InjectError> {
        if cmd.derives_keycode() {
            Ok(self.display.keysym_to_keycode(keysym))
        } else {
            keycode_from_wire(cmd.keycode)
                .map(Some)
                .ok_or(InjectError::InvalidKeycode(cmd.keycode))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
