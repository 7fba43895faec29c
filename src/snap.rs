//! Snapping raw pointer positions onto lanes and grid lines.

use crate::{
    grid::{Grid, GridLine},
    lane::{Lane, LaneSet},
    timeline::SpacePoint,
};

/// A resolved snap: the lane and grid line nearest to a raw point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    /// Nearest lane.
    pub lane: Lane,
    /// Nearest active grid line.
    pub line: GridLine,
}

impl SnapTarget {
    /// The snapped point in editor space.
    #[must_use]
    pub const fn point(&self, lanes: &LaneSet) -> SpacePoint {
        SpacePoint::new(lanes.x_of(self.lane), self.line.space_pos)
    }
}

/// The line among `lines` nearest to `raw_y`.
///
/// Ties go to the line met first in iteration order, which for a [`Grid`] is
/// generation order. Returns `None` when `lines` is empty.
pub fn nearest_line<'a>(
    raw_y: f64,
    lines: impl IntoIterator<Item = &'a GridLine>,
) -> Option<&'a GridLine> {
    lines.into_iter().min_by(|a, b| {
        let da = (raw_y - a.space_pos).abs();
        let db = (raw_y - b.space_pos).abs();
        da.total_cmp(&db)
    })
}

/// Resolves raw positions against the active grid lines and the lane table.
///
/// Both lookups are linear scans; the line count is bounded by the song length
/// over the tick resolution.
#[derive(Debug, Clone, Copy)]
pub struct SnapResolver<'a> {
    grid: &'a Grid,
    lanes: &'a LaneSet,
}

impl<'a> SnapResolver<'a> {
    /// Create a resolver over the grid's active mode and the lane table.
    #[must_use]
    pub const fn new(grid: &'a Grid, lanes: &'a LaneSet) -> Self {
        Self { grid, lanes }
    }

    /// Nearest active grid line to `raw_y`, `None` if the grid is empty.
    #[must_use]
    pub fn snap_y(&self, raw_y: f64) -> Option<&'a GridLine> {
        nearest_line(raw_y, self.grid.active_lines())
    }

    /// Nearest lane to `raw_x`.
    #[must_use]
    pub fn snap_x(&self, raw_x: f64) -> Lane {
        self.lanes.nearest_lane(raw_x)
    }

    /// Snap both axes of `raw`.
    #[must_use]
    pub fn snap(&self, raw: SpacePoint) -> Option<SnapTarget> {
        let line = *self.snap_y(raw.y)?;
        Some(SnapTarget {
            lane: self.snap_x(raw.x),
            line,
        })
    }

    /// Whether `raw_x` is close enough to the lanes to place a note.
    #[must_use]
    pub fn in_bounds(&self, raw_x: f64, margin: f64) -> bool {
        self.lanes.contains(raw_x, margin)
    }
}
