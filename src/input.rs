//! Pointer input polled once per frame.

use crate::timeline::SpacePoint;

/// The input the editor reads each frame.
///
/// `primary_confirmed` and `secondary_deleted` are edge triggered: they report
/// `true` once per press, so they take `&mut self`.
pub trait PointerInput {
    /// Pointer position in editor space.
    fn pointer_position(&self) -> SpacePoint;
    /// Whether a confirm (e.g. a left click) happened since the last poll.
    fn primary_confirmed(&mut self) -> bool;
    /// Whether a delete (e.g. a right click) happened since the last poll.
    fn secondary_deleted(&mut self) -> bool;
    /// Scroll movement since the last poll.
    fn scroll_delta(&mut self) -> f64;
}

/// One frame of input, for hosts that collect events themselves and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputFrame {
    /// Pointer position in editor space.
    pub pointer: SpacePoint,
    /// A confirm is pending.
    pub primary: bool,
    /// A delete is pending.
    pub secondary: bool,
    /// Accumulated scroll.
    pub scroll: f64,
}

impl InputFrame {
    /// A frame with the pointer at `(x, y)` and no events.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            pointer: SpacePoint::new(x, y),
            primary: false,
            secondary: false,
            scroll: 0.0,
        }
    }

    /// Add a confirm.
    #[must_use]
    pub const fn confirm(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Add a delete.
    #[must_use]
    pub const fn delete(mut self) -> Self {
        self.secondary = true;
        self
    }

    /// Add scroll.
    #[must_use]
    pub const fn scroll(mut self, delta: f64) -> Self {
        self.scroll = delta;
        self
    }
}

impl PointerInput for InputFrame {
    fn pointer_position(&self) -> SpacePoint {
        self.pointer
    }

    fn primary_confirmed(&mut self) -> bool {
        std::mem::take(&mut self.primary)
    }

    fn secondary_deleted(&mut self) -> bool {
        std::mem::take(&mut self.secondary)
    }

    fn scroll_delta(&mut self) -> f64 {
        std::mem::take(&mut self.scroll)
    }
}
