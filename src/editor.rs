//! Note placement state machine.
//!
//! [`NotePlacementController`] owns the placed notes and turns pointer events
//! into placements and deletions. It never raises an error: every odd input
//! (out of bounds, overlap, nothing under the pointer) ends in a silent policy
//! branch reported through [`PlacementOutcome`].
//!
//! The states are:
//!
//! - [`PlacementState::Idle`]: nothing follows the pointer, confirms do nothing.
//! - [`PlacementState::PlacingShort`]: a short note follows the pointer.
//! - [`PlacementState::PlacingLongStart`]: a long note follows the pointer,
//!   waiting for its start.
//! - [`PlacementState::PlacingLongEnd`]: the start is captured, waiting for
//!   the end.

pub mod session;

use strict_num_extended::{FinF64, NonNegativeF64, PositiveF64};
use tracing::debug;

use crate::{
    chart::{Note, NoteKind},
    config::EditorConfig,
    grid::Grid,
    lane::{Lane, LaneSet},
    snap::SnapResolver,
    timeline::{SpacePoint, TimeSpaceMapper},
};

/// Identifier of a placed note, unique within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(pub usize);

impl NoteId {
    /// Get the internal usize value
    #[must_use]
    pub const fn value(self) -> usize {
        self.0
    }
}

/// Generator for sequential [`NoteId`]s
#[derive(Debug, Clone, Default)]
struct NoteIdGenerator {
    next: usize,
}

impl NoteIdGenerator {
    const fn next_id(&mut self) -> NoteId {
        let id = NoteId(self.next);
        self.next += 1;
        id
    }
}

/// A committed note as drawn on the editor.
///
/// The snapped position is authoritative; times are derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNote {
    /// Identifier of the note.
    pub id: NoteId,
    /// Short or long.
    pub kind: NoteKind,
    /// The lane the note sits on.
    pub lane: Lane,
    /// Anchor of the note, its start.
    pub position: SpacePoint,
    /// Drawn length from the anchor, `0` for a short note.
    pub length: f64,
}

impl PlacedNote {
    /// Space `y` where the note's drawn span ends.
    #[must_use]
    pub fn end_y(&self) -> f64 {
        self.position.y + self.length
    }

    /// The note in chart time, `None` if its position is not finite.
    #[must_use]
    pub fn to_note(&self, mapper: &TimeSpaceMapper) -> Option<Note> {
        let start = FinF64::new(mapper.to_time(self.position.y)).ok()?;
        Some(match self.kind {
            NoteKind::Short => Note::short(self.lane, start),
            NoteKind::Long => {
                let end = FinF64::new(mapper.to_time(self.end_y())).ok()?;
                Note::long(self.lane, start, end)
            }
        })
    }
}

/// The note following the pointer before it is confirmed. Purely visual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvisionalNote {
    /// Kind of note being placed.
    pub kind: NoteKind,
    /// Raw, unsnapped pointer position.
    pub position: SpacePoint,
    /// Snapped start `y` once a long note's start is captured.
    pub long_start_y: Option<f64>,
}

/// Where the placement state machine is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementState {
    /// Not placing anything.
    Idle,
    /// Placing short notes.
    PlacingShort,
    /// Placing long notes, waiting for a start.
    PlacingLongStart,
    /// Placing a long note whose start is captured.
    PlacingLongEnd {
        /// Snapped `y` of the captured start.
        start_y: f64,
    },
}

impl PlacementState {
    /// The kind of note being placed, `None` when idle.
    #[must_use]
    pub const fn note_kind(&self) -> Option<NoteKind> {
        match self {
            Self::Idle => None,
            Self::PlacingShort => Some(NoteKind::Short),
            Self::PlacingLongStart | Self::PlacingLongEnd { .. } => Some(NoteKind::Long),
        }
    }
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// The event had no effect in the current state.
    Ignored,
    /// A note was added.
    Committed(NoteId),
    /// The pointer was out of bounds; the pending note was thrown away.
    Discarded,
    /// The new short note hit an existing one; both are gone.
    OverlapDestroyed {
        /// The note that was already there.
        removed: NoteId,
    },
    /// A long note's start was captured.
    LongStartCaptured {
        /// Snapped `y` of the start.
        start_y: f64,
    },
    /// A note was deleted.
    Deleted(NoteId),
    /// No note was under the pointer to delete.
    NothingToDelete,
}

/// Distances the placement policy works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPolicy {
    /// How far beyond the outer lanes a commit is still accepted.
    pub lane_margin: NonNegativeF64,
    /// Distance under which two notes on a lane are the same position.
    pub overlap_epsilon: PositiveF64,
    /// Hit radius of a delete.
    pub delete_tolerance: PositiveF64,
}

impl From<&EditorConfig> for PlacementPolicy {
    fn from(config: &EditorConfig) -> Self {
        Self {
            lane_margin: config.lane_margin,
            overlap_epsilon: config.overlap_epsilon,
            delete_tolerance: config.delete_tolerance,
        }
    }
}

/// The placement state machine and the collection of placed notes.
#[derive(Debug, Clone)]
pub struct NotePlacementController {
    state: PlacementState,
    provisional: Option<ProvisionalNote>,
    notes: Vec<PlacedNote>,
    ids: NoteIdGenerator,
    pointer: SpacePoint,
    lanes: LaneSet,
    mapper: TimeSpaceMapper,
    policy: PlacementPolicy,
}

impl NotePlacementController {
    /// Create an idle controller with no notes.
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: PlacementState::Idle,
            provisional: None,
            notes: Vec::new(),
            ids: NoteIdGenerator::default(),
            pointer: SpacePoint::default(),
            lanes: config.lanes(),
            mapper: config.mapper(),
            policy: PlacementPolicy::from(config),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PlacementState {
        self.state
    }

    /// Committed notes in collection order.
    #[must_use]
    pub fn notes(&self) -> &[PlacedNote] {
        &self.notes
    }

    /// The note following the pointer, if any.
    #[must_use]
    pub const fn provisional(&self) -> Option<&ProvisionalNote> {
        self.provisional.as_ref()
    }

    /// Last known pointer position.
    #[must_use]
    pub const fn pointer(&self) -> SpacePoint {
        self.pointer
    }

    /// The lane table.
    #[must_use]
    pub const fn lanes(&self) -> &LaneSet {
        &self.lanes
    }

    /// Start placing notes of `kind`.
    ///
    /// Any pending note is thrown away, including a half captured long note.
    pub fn set_note_kind(&mut self, kind: NoteKind) {
        self.state = match kind {
            NoteKind::Short => PlacementState::PlacingShort,
            NoteKind::Long => PlacementState::PlacingLongStart,
        };
        self.spawn_provisional(kind);
    }

    /// Stop placing and drop the pending note.
    pub fn cancel(&mut self) {
        self.state = PlacementState::Idle;
        self.provisional = None;
    }

    /// Track the pointer. The pending note follows it without snapping.
    pub const fn pointer_moved(&mut self, point: SpacePoint) {
        self.pointer = point;
        if let Some(provisional) = self.provisional.as_mut() {
            provisional.position = point;
        }
    }

    /// Handle a confirm input at the current pointer.
    pub fn primary_confirm(&mut self, grid: &Grid) -> PlacementOutcome {
        let raw = self.pointer;
        match self.state {
            PlacementState::Idle => PlacementOutcome::Ignored,
            PlacementState::PlacingShort => self.confirm_short(grid, raw),
            PlacementState::PlacingLongStart => self.confirm_long_start(grid, raw),
            PlacementState::PlacingLongEnd { start_y } => self.confirm_long_end(grid, raw, start_y),
        }
    }

    /// Handle a delete input at the current pointer, in any state.
    ///
    /// Removes the first note in collection order whose anchor lies within the
    /// delete tolerance of the snapped pointer.
    pub fn secondary_delete(&mut self, grid: &Grid) -> PlacementOutcome {
        let Some(target) = SnapResolver::new(grid, &self.lanes).snap(self.pointer) else {
            return PlacementOutcome::NothingToDelete;
        };
        let point = target.point(&self.lanes);
        let tolerance = self.policy.delete_tolerance.as_f64();
        let hit = self.notes.iter().position(|note| {
            (note.position.x - point.x).abs() <= tolerance
                && (note.position.y - point.y).abs() <= tolerance
        });
        match hit {
            Some(index) => {
                let removed = self.notes.remove(index);
                debug!(id = removed.id.value(), lane = %removed.lane, y = removed.position.y, "note deleted");
                PlacementOutcome::Deleted(removed.id)
            }
            None => {
                debug!(x = point.x, y = point.y, "nothing to delete");
                PlacementOutcome::NothingToDelete
            }
        }
    }

    /// Replace all notes with `notes` converted to editor space.
    ///
    /// The pending note is left as it is.
    pub fn load_notes(&mut self, notes: &[Note]) {
        self.notes.clear();
        for note in notes {
            let start_y = self.mapper.to_space(note.start_time_ms.as_f64());
            let length = match note.kind {
                NoteKind::Short => 0.0,
                NoteKind::Long => self.mapper.to_space(note.end_time_ms.as_f64()) - start_y,
            };
            let placed = PlacedNote {
                id: self.ids.next_id(),
                kind: note.kind,
                lane: note.lane,
                position: SpacePoint::new(self.lanes.x_of(note.lane), start_y),
                length,
            };
            self.notes.push(placed);
        }
    }

    /// Remove every note and abandon the pending one, keeping the note kind.
    pub fn clear(&mut self) {
        self.notes.clear();
        if let Some(kind) = self.state.note_kind() {
            self.set_note_kind(kind);
        }
    }

    /// The placed notes in chart time, in collection order.
    #[must_use]
    pub fn chart_notes(&self) -> Vec<Note> {
        self.notes
            .iter()
            .filter_map(|note| note.to_note(&self.mapper))
            .collect()
    }

    fn spawn_provisional(&mut self, kind: NoteKind) {
        self.provisional = Some(ProvisionalNote {
            kind,
            position: self.pointer,
            long_start_y: None,
        });
    }

    fn in_bounds(&self, raw: SpacePoint) -> bool {
        self.lanes.contains(raw.x, self.policy.lane_margin.as_f64())
    }

    fn commit(&mut self, kind: NoteKind, lane: Lane, y: f64, length: f64) -> NoteId {
        let id = self.ids.next_id();
        self.notes.push(PlacedNote {
            id,
            kind,
            lane,
            position: SpacePoint::new(self.lanes.x_of(lane), y),
            length,
        });
        debug!(id = id.value(), ?kind, lane = %lane, y, length, "note committed");
        id
    }

    fn confirm_short(&mut self, grid: &Grid, raw: SpacePoint) -> PlacementOutcome {
        if !self.in_bounds(raw) {
            debug!(x = raw.x, "short note out of bounds, discarded");
            self.spawn_provisional(NoteKind::Short);
            return PlacementOutcome::Discarded;
        }
        let Some(target) = SnapResolver::new(grid, &self.lanes).snap(raw) else {
            return PlacementOutcome::Ignored;
        };
        let y = target.line.space_pos;
        let epsilon = self.policy.overlap_epsilon.as_f64();
        let overlapping = self
            .notes
            .iter()
            .position(|note| note.lane == target.lane && (note.position.y - y).abs() < epsilon);

        let outcome = if let Some(index) = overlapping {
            let removed = self.notes.remove(index);
            debug!(id = removed.id.value(), lane = %target.lane, y, "overlap, both notes destroyed");
            PlacementOutcome::OverlapDestroyed {
                removed: removed.id,
            }
        } else {
            PlacementOutcome::Committed(self.commit(NoteKind::Short, target.lane, y, 0.0))
        };
        self.spawn_provisional(NoteKind::Short);
        outcome
    }

    fn confirm_long_start(&mut self, grid: &Grid, raw: SpacePoint) -> PlacementOutcome {
        if !self.in_bounds(raw) {
            debug!(x = raw.x, "long note start out of bounds, discarded");
            self.spawn_provisional(NoteKind::Long);
            return PlacementOutcome::Discarded;
        }
        let Some(line) = SnapResolver::new(grid, &self.lanes).snap_y(raw.y) else {
            return PlacementOutcome::Ignored;
        };
        let start_y = line.space_pos;
        self.state = PlacementState::PlacingLongEnd { start_y };
        if let Some(provisional) = self.provisional.as_mut() {
            provisional.long_start_y = Some(start_y);
        }
        PlacementOutcome::LongStartCaptured { start_y }
    }

    fn confirm_long_end(&mut self, grid: &Grid, raw: SpacePoint, start_y: f64) -> PlacementOutcome {
        if !self.in_bounds(raw) {
            debug!(x = raw.x, "long note end out of bounds, capture abandoned");
            self.state = PlacementState::PlacingLongStart;
            self.spawn_provisional(NoteKind::Long);
            return PlacementOutcome::Discarded;
        }
        let Some(target) = SnapResolver::new(grid, &self.lanes).snap(raw) else {
            return PlacementOutcome::Ignored;
        };
        // Anchored at the start; an end above the start counts by distance only.
        let length = (start_y - target.line.space_pos).abs();
        let id = self.commit(NoteKind::Long, target.lane, start_y, length);
        self.state = PlacementState::PlacingLongStart;
        self.spawn_provisional(NoteKind::Long);
        PlacementOutcome::Committed(id)
    }
}
