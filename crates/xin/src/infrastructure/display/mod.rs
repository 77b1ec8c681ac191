//! Display session implementations.
//!
//! The Xlib session is only built where the X11 client libraries exist
//! (Unix other than macOS).  The recording mock is always available so the
//! application layer can be tested anywhere.

pub mod mock;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod xlib;
