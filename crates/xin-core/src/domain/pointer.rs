//! Pointer position accumulation for motion commands.
//!
//! Motion commands carry deltas, but the receiver injects absolute XTEST
//! motion events.  [`PointerState`] remembers the last position it injected
//! and derives the next one from each command.
//!
//! # Coordinate rules
//!
//! - The deltas are **subtracted**: `m 5 5` moves the pointer up and to the
//!   left.  Existing senders rely on this sign convention.
//! - Negative results clamp to `0`.
//! - Results at or beyond the screen dimension clamp to the dimension itself,
//!   which is one pixel past the last addressable column/row.  The X server
//!   confines the pointer to the screen anyway, and senders have always seen
//!   this behaviour.

use std::fmt;

/// Width and height of the screen the pointer moves on, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub width: i32,
    pub height: i32,
}

impl ScreenBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An absolute position in root-window coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PointerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Last injected absolute pointer position.
///
/// `None` until the first motion command, at which point the caller seeds it
/// from the real pointer with [`PointerState::seed`].
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Option<PointerPosition>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the state has been seeded from the real pointer.
    pub fn is_seeded(&self) -> bool {
        self.position.is_some()
    }

    /// Sets the starting position.  Later calls overwrite it.
    pub fn seed(&mut self, position: PointerPosition) {
        self.position = Some(position);
    }

    /// The last position produced by [`advance`](Self::advance) or [`seed`](Self::seed).
    pub fn position(&self) -> Option<PointerPosition> {
        self.position
    }

    /// Applies one motion command and returns the clamped position to inject.
    ///
    /// An unseeded state starts from the origin; the receiver always seeds
    /// before the first call.
    pub fn advance(&mut self, dx: i32, dy: i32, bounds: ScreenBounds) -> PointerPosition {
        let current = self.position.unwrap_or_default();
        let next = PointerPosition {
            x: clamp_to_bound(current.x.saturating_sub(dx), bounds.width),
            y: clamp_to_bound(current.y.saturating_sub(dy), bounds.height),
        };
        self.position = Some(next);
        next
    }
}

/// Clamps `value` into `0..=bound`, mapping anything `>= bound` to `bound`.
pub fn clamp_to_bound(value: i32, bound: i32) -> i32 {
    if value < 0 {
        0
    } else if value >= bound {
        bound
    } else {
        value
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> ScreenBounds {
        ScreenBounds::new(800, 600)
    }

    fn seeded(x: i32, y: i32) -> PointerState {
        let mut state = PointerState::new();
        state.seed(PointerPosition::new(x, y));
        state
    }

    #[test]
    fn test_new_state_is_not_seeded() {
        let state = PointerState::new();
        assert!(!state.is_seeded());
        assert_eq!(state.position(), None);
    }

    #[test]
    fn test_deltas_are_subtracted() {
        // Arrange
        let mut state = seeded(100, 100);

        // Act
        let first = state.advance(5, 5, screen());
        let second = state.advance(5, 5, screen());

        // Assert
        assert_eq!(first, PointerPosition::new(95, 95));
        assert_eq!(second, PointerPosition::new(90, 90));
    }

    #[test]
    fn test_negative_deltas_move_right_and_down() {
        let mut state = seeded(100, 100);

        let pos = state.advance(-20, -10, screen());

        assert_eq!(pos, PointerPosition::new(120, 110));
    }

    #[test]
    fn test_negative_result_clamps_to_zero() {
        let mut state = seeded(3, 4);

        let pos = state.advance(10, 10, screen());

        assert_eq!(pos, PointerPosition::new(0, 0));
    }

    #[test]
    fn test_result_past_edge_clamps_to_dimension_not_last_pixel() {
        // Arrange
        let mut state = seeded(790, 590);

        // Act
        let pos = state.advance(-50, -50, screen());

        // Assert: exactly (W, H), one past the last addressable pixel
        assert_eq!(pos, PointerPosition::new(800, 600));
    }

    #[test]
    fn test_result_equal_to_dimension_stays_at_dimension() {
        let mut state = seeded(799, 599);

        let pos = state.advance(-1, -1, screen());

        assert_eq!(pos, PointerPosition::new(800, 600));
    }

    #[test]
    fn test_clamped_position_is_the_base_for_the_next_command() {
        // Arrange: drive into the left edge, then come back
        let mut state = seeded(5, 300);
        state.advance(50, 0, screen());

        // Act
        let pos = state.advance(-10, 0, screen());

        // Assert: no "debt" from the clamped overshoot
        assert_eq!(pos, PointerPosition::new(10, 300));
    }

    #[test]
    fn test_extreme_deltas_do_not_overflow() {
        let mut state = seeded(100, 100);

        let low = state.advance(i32::MAX, i32::MAX, screen());
        let high = state.advance(i32::MIN, i32::MIN, screen());

        assert_eq!(low, PointerPosition::new(0, 0));
        assert_eq!(high, PointerPosition::new(800, 600));
    }

    #[test]
    fn test_clamp_to_bound_matches_formula() {
        assert_eq!(clamp_to_bound(-1, 10), 0);
        assert_eq!(clamp_to_bound(0, 10), 0);
        assert_eq!(clamp_to_bound(9, 10), 9);
        assert_eq!(clamp_to_bound(10, 10), 10);
        assert_eq!(clamp_to_bound(11, 10), 10);
    }
}
