//! Time-to-space coordinate mapping module
//!
//! Provides the conversion between song time (milliseconds) and the vertical
//! editor-space coordinate. Every other part of the editor builds on this
//! single ratio, so notes, grid lines and the playback cursor always agree on
//! where a given instant is drawn.

use strict_num_extended::PositiveF64;

/// Default editor scale: one millisecond is half a space unit.
pub const DEFAULT_SPACE_PER_MS: PositiveF64 = PositiveF64::new_const(0.5);

/// A point in editor space.
///
/// `x` runs across the lanes, `y` runs along the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpacePoint {
    /// Horizontal coordinate, across the lanes.
    pub x: f64,
    /// Vertical coordinate, along the timeline.
    pub y: f64,
}

impl SpacePoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bidirectional mapping between milliseconds and editor-space `y`.
///
/// The mapping is linear with a single global ratio and is defined over all
/// reals; callers clamp to the song duration themselves. The ratio is a
/// [`PositiveF64`], so the mapping is always invertible.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSpaceMapper {
    space_per_ms: PositiveF64,
}

impl Default for TimeSpaceMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SPACE_PER_MS)
    }
}

impl TimeSpaceMapper {
    /// Create a mapper with the given ratio of space units per millisecond.
    #[must_use]
    pub const fn new(space_per_ms: PositiveF64) -> Self {
        Self { space_per_ms }
    }

    /// Get the ratio of space units per millisecond.
    #[must_use]
    pub const fn space_per_ms(&self) -> PositiveF64 {
        self.space_per_ms
    }

    /// Convert a song time in milliseconds into a space `y` coordinate.
    #[must_use]
    pub fn to_space(&self, time_ms: f64) -> f64 {
        time_ms * self.space_per_ms.as_f64()
    }

    /// Convert a space `y` coordinate back into a song time in milliseconds.
    #[must_use]
    pub fn to_time(&self, space_pos: f64) -> f64 {
        space_pos / self.space_per_ms.as_f64()
    }

    /// Convert a span of time into a span of space.
    ///
    /// Identical to [`Self::to_space`] as the mapping has no origin shift, but
    /// reads better at call sites dealing with lengths.
    #[must_use]
    pub fn span_to_space(&self, span_ms: f64) -> f64 {
        self.to_space(span_ms)
    }
}

/// Format a playback position as `mm:ss:fff`.
///
/// Negative positions are shown as zero.
#[must_use]
pub fn format_time(milliseconds: i64) -> String {
    let milliseconds = milliseconds.max(0);
    let total_seconds = milliseconds / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let ms = milliseconds % 1000;
    format!("{minutes:02}:{seconds:02}:{ms:03}")
}
