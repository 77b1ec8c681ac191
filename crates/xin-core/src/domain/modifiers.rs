//! Modifier bookkeeping for direct key delivery.
//!
//! X11 key events carry a `state` field: a bitmask of the modifiers (Shift,
//! Lock, Control, Mod1..Mod5) that were held when the key changed.  When keys
//! are injected through XTEST the server computes this itself.  When they are
//! delivered with `XSendEvent` the sender has to supply it, so the receiver
//! keeps a running mask here.
//!
//! # Accounting rule
//!
//! A press ORs the keysym's modifier bits into the mask and a release clears
//! them again.  This is deliberately *not* a per-key press counter: pressing
//! both Shift keys and releasing only one clears the Shift bit even though the
//! other key is still down.  Senders forward balanced press/release pairs, so
//! the simple rule matches what they expect.

use std::fmt;

/// A bitmask of X11 core modifier bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const SHIFT: u32 = 1 << 0;
    pub const LOCK: u32 = 1 << 1;
    pub const CONTROL: u32 = 1 << 2;
    pub const MOD1: u32 = 1 << 3;
    pub const MOD2: u32 = 1 << 4;
    pub const MOD3: u32 = 1 << 5;
    pub const MOD4: u32 = 1 << 6;
    pub const MOD5: u32 = 1 << 7;

    /// The empty mask.
    pub const NONE: ModifierMask = ModifierMask(0);

    /// Returns `true` if no modifier bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `bits` is set in this mask.
    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    /// Returns the raw bit pattern.
    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Tracks the modifiers held by keys injected through direct delivery.
///
/// Starts empty.  Only the direct-delivery key path mutates it.
#[derive(Debug, Clone, Default)]
pub struct ModifierTracker {
    mask: ModifierMask,
}

impl ModifierTracker {
    /// Creates a tracker with no modifiers held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key press whose keysym maps to `bits` and returns the new mask.
    pub fn press(&mut self, bits: ModifierMask) -> ModifierMask {
        self.mask.0 |= bits.0;
        self.mask
    }

    /// Records a key release whose keysym maps to `bits` and returns the new mask.
    pub fn release(&mut self, bits: ModifierMask) -> ModifierMask {
        self.mask.0 &= !bits.0;
        self.mask
    }

    /// The modifiers currently believed to be held.
    pub fn mask(&self) -> ModifierMask {
        self.mask
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SHIFT: ModifierMask = ModifierMask(ModifierMask::SHIFT);
    const CONTROL: ModifierMask = ModifierMask(ModifierMask::CONTROL);

    #[test]
    fn test_new_tracker_starts_empty() {
        assert!(ModifierTracker::new().mask().is_empty());
    }

    #[test]
    fn test_press_then_release_restores_previous_mask() {
        // Arrange
        let mut tracker = ModifierTracker::new();
        tracker.press(CONTROL);
        let before = tracker.mask();

        // Act
        tracker.press(SHIFT);
        tracker.release(SHIFT);

        // Assert
        assert_eq!(tracker.mask(), before);
    }

    #[test]
    fn test_press_without_release_leaves_bit_set() {
        // Arrange
        let mut tracker = ModifierTracker::new();

        // Act
        let mask = tracker.press(SHIFT);

        // Assert
        assert!(mask.contains(ModifierMask::SHIFT));
        assert!(!mask.contains(ModifierMask::CONTROL));
    }

    #[test]
    fn test_release_without_press_is_harmless() {
        let mut tracker = ModifierTracker::new();

        let mask = tracker.release(SHIFT);

        assert_eq!(mask, ModifierMask::NONE);
    }

    #[test]
    fn test_non_modifier_keysym_does_not_change_mask() {
        // Arrange: a plain letter maps to no modifier bits
        let mut tracker = ModifierTracker::new();
        tracker.press(SHIFT);

        // Act
        tracker.press(ModifierMask::NONE);
        tracker.release(ModifierMask::NONE);

        // Assert
        assert_eq!(tracker.mask(), SHIFT);
    }

    #[test]
    fn test_interleaved_same_bit_releases_early() {
        // Two keys sharing the Shift bit: releasing either one clears it.
        let mut tracker = ModifierTracker::new();
        tracker.press(SHIFT); // Shift_L
        tracker.press(SHIFT); // Shift_R

        tracker.release(SHIFT); // Shift_L up, Shift_R still physically down

        assert!(tracker.mask().is_empty());
    }

    #[test]
    fn test_display_formats_as_hex() {
        assert_eq!(ModifierMask(0x45).to_string(), "0x45");
    }
}
