//! X11 KeySym constants and names.
//!
//! X11 KeySym values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # What is an X11 KeySym? (for beginners)
//!
//! X11 identifies keys in two ways:
//!
//! - A **keycode** (8..=255) names a physical key.  Which keycode a key has
//!   depends on the hardware and the active keyboard layout.
//! - A **KeySym** names the symbol a key produces, independent of where the
//!   key sits.  Latin-1 characters use their code point (`XK_a` = 0x0061), and
//!   function/modifier keys live in the 0xFF00 page.
//!
//! | KeySym name | Value  | Meaning        |
//! |-------------|--------|----------------|
//! | `XK_a`      | 0x0061 | lowercase 'a'  |
//! | `XK_A`      | 0x0041 | uppercase 'A'  |
//! | `XK_Return` | 0xFF0D | Enter key      |
//! | `XK_Shift_L`| 0xFFE1 | left Shift     |
//!
//! The forwarding protocol carries KeySyms so that the sender's layout does
//! not have to match the receiver's.  The receiver asks the X server to
//! translate each KeySym into a keycode for the *current* layout, which is why
//! a layout switch must refresh the server's mapping before more keys arrive.

// Control keys
pub const XK_BACKSPACE: u32 = 0xFF08;
pub const XK_TAB: u32 = 0xFF09;
pub const XK_RETURN: u32 = 0xFF0D;
pub const XK_PAUSE: u32 = 0xFF13;
pub const XK_SCROLL_LOCK: u32 = 0xFF14;
pub const XK_ESCAPE: u32 = 0xFF1B;
pub const XK_DELETE: u32 = 0xFFFF;
pub const XK_SPACE: u32 = 0x0020;

// Navigation
pub const XK_HOME: u32 = 0xFF50;
pub const XK_LEFT: u32 = 0xFF51;
pub const XK_UP: u32 = 0xFF52;
pub const XK_RIGHT: u32 = 0xFF53;
pub const XK_DOWN: u32 = 0xFF54;
pub const XK_PAGE_UP: u32 = 0xFF55;
pub const XK_PAGE_DOWN: u32 = 0xFF56;
pub const XK_END: u32 = 0xFF57;
pub const XK_INSERT: u32 = 0xFF63;

// Modifiers
pub const XK_SHIFT_L: u32 = 0xFFE1;
pub const XK_SHIFT_R: u32 = 0xFFE2;
pub const XK_CONTROL_L: u32 = 0xFFE3;
pub const XK_CONTROL_R: u32 = 0xFFE4;
pub const XK_CAPS_LOCK: u32 = 0xFFE5;
pub const XK_META_L: u32 = 0xFFE7;
pub const XK_META_R: u32 = 0xFFE8;
pub const XK_ALT_L: u32 = 0xFFE9;
pub const XK_ALT_R: u32 = 0xFFEA;
pub const XK_SUPER_L: u32 = 0xFFEB;
pub const XK_SUPER_R: u32 = 0xFFEC;
pub const XK_NUM_LOCK: u32 = 0xFF7F;
pub const XK_ISO_LEVEL3_SHIFT: u32 = 0xFE03;

/// The key grabbed on the root window while a layout switch is in flight.
///
/// `Super_L` is present in every stock XKB layout, so its keycode resolves
/// before and after the switch.
pub const LAYOUT_SYNC_SENTINEL: u32 = XK_SUPER_L;

/// Returns the keysymdef.h name of `keysym`, if it is one the receiver knows.
///
/// Printable Latin-1 keysyms (0x20..=0x7E) are not named here; use
/// [`describe_keysym`] for logging, which renders those as characters.
pub fn keysym_name(keysym: u32) -> Option<&'static str> {
    let name = match keysym {
        XK_BACKSPACE => "BackSpace",
        XK_TAB => "Tab",
        XK_RETURN => "Return",
        XK_PAUSE => "Pause",
        XK_SCROLL_LOCK => "Scroll_Lock",
        XK_ESCAPE => "Escape",
        XK_DELETE => "Delete",
        XK_HOME => "Home",
        XK_LEFT => "Left",
        XK_UP => "Up",
        XK_RIGHT => "Right",
        XK_DOWN => "Down",
        XK_PAGE_UP => "Page_Up",
        XK_PAGE_DOWN => "Page_Down",
        XK_END => "End",
        XK_INSERT => "Insert",
        XK_SHIFT_L => "Shift_L",
        XK_SHIFT_R => "Shift_R",
        XK_CONTROL_L => "Control_L",
        XK_CONTROL_R => "Control_R",
        XK_CAPS_LOCK => "Caps_Lock",
        XK_META_L => "Meta_L",
        XK_META_R => "Meta_R",
        XK_ALT_L => "Alt_L",
        XK_ALT_R => "Alt_R",
        XK_SUPER_L => "Super_L",
        XK_SUPER_R => "Super_R",
        XK_NUM_LOCK => "Num_Lock",
        XK_ISO_LEVEL3_SHIFT => "ISO_Level3_Shift",
        0xFFBE..=0xFFC9 => return F_KEY_NAMES.get((keysym - 0xFFBE) as usize).copied(),
        _ => return None,
    };
    Some(name)
}

const F_KEY_NAMES: [&str; 12] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// Returns `true` for keysyms that stock layouts bind to a modifier.
///
/// The X server is the authority on modifier bits; this is only used to
/// pick a log level, never to build events.
pub fn is_modifier_keysym(keysym: u32) -> bool {
    matches!(
        keysym,
        XK_SHIFT_L..=XK_SUPER_R | XK_NUM_LOCK | XK_ISO_LEVEL3_SHIFT
    )
}

/// Formats a keysym from the wire for diagnostics, e.g. `'A' (0x41)` or
/// `Shift_L (0xffe1)`.
pub fn describe_keysym(keysym: i32) -> String {
    let raw = keysym as u32;
    if let Some(name) = keysym_name(raw) {
        return format!("{name} (0x{raw:x})");
    }
    match char::from_u32(raw) {
        Some(c) if (0x20..=0x7E).contains(&raw) => format!("'{c}' (0x{raw:x})"),
        _ => format!("0x{raw:x}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
