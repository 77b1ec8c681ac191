//! Key symbol tables.
//!
//! The wire protocol carries X11 KeySyms directly, so no translation table is
//! needed for injection; the X server resolves KeySyms to keycodes.  This
//! module only holds the constants and names the receiver uses for the
//! layout-switch sentinel and for readable diagnostics.

pub mod keysym;

pub use keysym::{describe_keysym, keysym_name, LAYOUT_SYNC_SENTINEL};
