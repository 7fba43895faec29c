//! Beat grid generation.
//!
//! A [`Grid`] holds every line a note can snap to for the whole song: one
//! measure bar per tick (`60000 / bpm` ms) plus the subdivision lines of both
//! [`SubdivisionMode`]s. Both subdivision sets are kept alive at once, so
//! switching the active mode only flips which lines are exposed and never
//! rebuilds anything.

use std::ops::RangeInclusive;

use num::ToPrimitive;
use strict_num_extended::PositiveF64;
use tracing::warn;

use crate::timeline::TimeSpaceMapper;

/// Fastest tempo a grid is generated for.
pub const MAX_BPM: f64 = 1000.0;

/// Upper bound on the number of lines of one grid.
pub const MAX_GRID_LINES: usize = 1 << 22;

/// How finely each tick of the grid is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubdivisionMode {
    /// Twelve lines per bar counting both halves, six interior lines per tick.
    #[default]
    Twelve,
    /// Sixteen lines per bar counting both halves, eight interior lines per tick.
    Sixteen,
}

impl SubdivisionMode {
    /// All modes, in generation order.
    pub const ALL: [Self; 2] = [Self::Twelve, Self::Sixteen];

    /// Number of subdivision lines generated inside one tick.
    #[must_use]
    pub const fn lines_per_tick(self) -> u32 {
        match self {
            Self::Twelve => 6,
            Self::Sixteen => 8,
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Twelve => Self::Sixteen,
            Self::Sixteen => Self::Twelve,
        }
    }
}

/// What a [`GridLine`] marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridLineKind {
    /// The start of a tick. Shown in every mode.
    MeasureBar,
    /// A line inside a tick, shown only in its own mode.
    Subdivision(SubdivisionMode),
}

/// A single snap target on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLine {
    /// Song time of the line in milliseconds.
    pub time_ms: f64,
    /// Space `y` coordinate of the line.
    pub space_pos: f64,
    /// Whether this is a measure bar or a subdivision line.
    pub kind: GridLineKind,
}

impl GridLine {
    /// Whether the line is a measure bar.
    #[must_use]
    pub const fn is_measure_bar(&self) -> bool {
        matches!(self.kind, GridLineKind::MeasureBar)
    }

    /// The subdivision mode the line belongs to, `None` for measure bars.
    #[must_use]
    pub const fn subdivision_mode(&self) -> Option<SubdivisionMode> {
        match self.kind {
            GridLineKind::MeasureBar => None,
            GridLineKind::Subdivision(mode) => Some(mode),
        }
    }

    /// Whether the line is exposed for snapping and rendering under `mode`.
    #[must_use]
    pub fn is_active_in(&self, mode: SubdivisionMode) -> bool {
        self.subdivision_mode().is_none_or(|own| own == mode)
    }
}

/// Inputs the grid is generated from. Equal parameters produce an equal grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridParams {
    /// Length of the song in milliseconds.
    pub duration_ms: i64,
    /// Beats per minute. One tick is one beat.
    pub bpm: PositiveF64,
    /// Shift applied to every line, in milliseconds.
    pub offset_ms: i64,
}

impl GridParams {
    /// Length of one tick in milliseconds.
    #[must_use]
    pub fn tick_time_ms(&self) -> f64 {
        60_000.0 / self.bpm.as_f64()
    }

    /// Indexes of the first and one past the last tick covering the song.
    ///
    /// Tick `i` starts at `offset + i * tick`. The range is chosen so the
    /// first bar lies at or before `0` and the last line at or after
    /// `duration_ms`. `None` when there is nothing to cover or the BPM is
    /// above [`MAX_BPM`].
    #[must_use]
    pub fn tick_range(&self) -> Option<(i64, i64)> {
        if self.duration_ms <= 0 || self.bpm.as_f64() > MAX_BPM {
            return None;
        }
        let tick = self.tick_time_ms();
        let offset = self.offset_ms as f64;
        let first = (-offset / tick).floor().to_i64()?;
        let end = ((self.duration_ms as f64 - offset) / tick).ceil().to_i64()?;
        (end > first).then_some((first, end))
    }

    /// Number of ticks needed to cover the song.
    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick_range()
            .and_then(|(first, end)| usize::try_from(end.checked_sub(first)?).ok())
            .unwrap_or(0)
    }
}

/// The full set of grid lines for a song plus the active subdivision mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    params: Option<GridParams>,
    mapper: TimeSpaceMapper,
    lines: Vec<GridLine>,
    mode: SubdivisionMode,
}

impl Grid {
    /// Generate every line covering `[0, duration_ms]`.
    ///
    /// Lines are stored in generation order: for each tick its measure bar,
    /// then the [`SubdivisionMode::Twelve`] lines, then the
    /// [`SubdivisionMode::Sixteen`] lines. Snapping breaks ties by this order.
    ///
    /// A grid that would exceed [`MAX_GRID_LINES`] or cannot be allocated is
    /// left empty.
    #[must_use]
    pub fn generate(params: GridParams, mapper: TimeSpaceMapper, mode: SubdivisionMode) -> Self {
        let lines = build_lines(&params, &mapper);
        Self {
            params: Some(params),
            mapper,
            lines,
            mode,
        }
    }

    /// An empty grid, used while no song is loaded.
    #[must_use]
    pub const fn empty(mapper: TimeSpaceMapper, mode: SubdivisionMode) -> Self {
        Self {
            params: None,
            mapper,
            lines: Vec::new(),
            mode,
        }
    }

    /// Rebuild the whole grid if `params` differ from the current ones.
    ///
    /// Returns whether the lines were rebuilt.
    pub fn regenerate(&mut self, params: GridParams) -> bool {
        if self.params == Some(params) {
            return false;
        }
        self.lines = build_lines(&params, &self.mapper);
        self.params = Some(params);
        true
    }

    /// Parameters the grid was generated from, `None` for [`Self::empty`].
    #[must_use]
    pub const fn params(&self) -> Option<&GridParams> {
        self.params.as_ref()
    }

    /// Currently active subdivision mode.
    #[must_use]
    pub const fn mode(&self) -> SubdivisionMode {
        self.mode
    }

    /// Switch the active subdivision mode. Lines are untouched.
    pub const fn set_mode(&mut self, mode: SubdivisionMode) {
        self.mode = mode;
    }

    /// Flip between the two subdivision modes.
    pub const fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Every generated line regardless of mode, in generation order.
    #[must_use]
    pub fn lines(&self) -> &[GridLine] {
        &self.lines
    }

    /// Lines exposed under the active mode, in generation order.
    pub fn active_lines(&self) -> impl Iterator<Item = &GridLine> {
        self.lines_for(self.mode)
    }

    /// Lines exposed under `mode`, in generation order.
    pub fn lines_for(&self, mode: SubdivisionMode) -> impl Iterator<Item = &GridLine> {
        self.lines.iter().filter(move |line| line.is_active_in(mode))
    }

    /// Active lines whose space position lies in `range`, for drawing a window.
    pub fn visible_lines(&self, range: RangeInclusive<f64>) -> impl Iterator<Item = &GridLine> {
        self.active_lines()
            .filter(move |line| range.contains(&line.space_pos))
    }

    /// Number of measure bars.
    #[must_use]
    pub fn measure_bar_count(&self) -> usize {
        self.lines.iter().filter(|line| line.is_measure_bar()).count()
    }

    /// Length of one tick in milliseconds, `None` for an empty grid.
    #[must_use]
    pub fn tick_time_ms(&self) -> Option<f64> {
        self.params.as_ref().map(GridParams::tick_time_ms)
    }

    /// Whether no line was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn build_lines(params: &GridParams, mapper: &TimeSpaceMapper) -> Vec<GridLine> {
    let Some((first, end)) = params.tick_range() else {
        if params.bpm.as_f64() > MAX_BPM {
            warn!(bpm = params.bpm.as_f64(), "tempo too fast, grid left empty");
        }
        return Vec::new();
    };
    let per_tick = 1 + SubdivisionMode::ALL
        .iter()
        .map(|mode| mode.lines_per_tick() as usize)
        .sum::<usize>();
    let Some(line_count) = params
        .tick_count()
        .checked_mul(per_tick)
        .filter(|&count| count <= MAX_GRID_LINES)
    else {
        warn!(?params, "grid too large, left empty");
        return Vec::new();
    };
    let mut lines = Vec::new();
    if lines.try_reserve_exact(line_count).is_err() {
        warn!(line_count, "grid allocation failed, left empty");
        return Vec::new();
    }

    let tick = params.tick_time_ms();
    let offset = params.offset_ms as f64;
    for i in first..end {
        let bar_time = offset + i as f64 * tick;
        lines.push(GridLine {
            time_ms: bar_time,
            space_pos: mapper.to_space(bar_time),
            kind: GridLineKind::MeasureBar,
        });
        for mode in SubdivisionMode::ALL {
            let divisions = mode.lines_per_tick();
            for j in 1..=divisions {
                let time_ms = bar_time + tick * f64::from(j) / f64::from(divisions);
                lines.push(GridLine {
                    time_ms,
                    space_pos: mapper.to_space(time_ms),
                    kind: GridLineKind::Subdivision(mode),
                });
            }
        }
    }
    lines
}
