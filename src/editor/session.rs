//! The editor session: one song, its grid, its notes and the playback cursor.
//!
//! The host calls [`EditorSession::tick`] once per frame. Everything else is a
//! discrete command (play, pause, switch song, save).
//!
//! Switching songs happens in two steps. [`EditorSession::switch_song`] stops
//! playback and clears the current chart right away, then queues the reload.
//! The next tick reads (or bootstraps) the chart, regenerates the grid and
//! materializes the notes. Switching again before that tick replaces the queued
//! song, so only the latest one is ever loaded.

use num::ToPrimitive;
use strict_num_extended::PositiveF64;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{NotePlacementController, PlacedNote, PlacementState, ProvisionalNote};
use crate::{
    chart::{BpmSection, ChartCodec, ChartDocument, ChartParseError, ChartWarning, NoteKind, Song},
    config::EditorConfig,
    grid::{Grid, SubdivisionMode},
    input::PointerInput,
    storage::{self, ChartStorage, StorageError, chart_path},
    timeline::{SpacePoint, format_time},
    transport::AudioTransport,
};

/// A song the author can pick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongEntry {
    /// Title, also the key of the chart file.
    pub title: String,
    /// Tempo used when the chart does not declare one.
    pub bpm: PositiveF64,
}

impl SongEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(title: impl Into<String>, bpm: PositiveF64) -> Self {
        Self {
            title: title.into(),
            bpm,
        }
    }
}

/// Whether the song is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// At the beginning, not playing.
    #[default]
    Stopped,
    /// Playing.
    Playing,
    /// Held at the paused position, which can be scrubbed.
    Paused,
}

/// An error surfaced by the session.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EditorError {
    /// The chart of the song being loaded is malformed. Nothing was applied.
    #[error("chart of `{title}` is malformed: {source}")]
    MalformedChart {
        /// The song whose chart failed.
        title: String,
        /// What was wrong.
        #[source]
        source: ChartParseError,
    },
    /// Reading or writing the chart failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// There is no loaded song to act on.
    #[error("no song is loaded")]
    NoSong,
}

/// What the host draws this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState<'a> {
    /// Playhead time in milliseconds.
    pub cursor_time_ms: i64,
    /// Playhead position in editor space.
    pub cursor_space_y: f64,
    /// Playhead time as `mm:ss:fff`.
    pub time_label: String,
    /// Normalized scroll position, `1` at the start of the song and `0` at the end.
    pub scroll_ratio: f64,
    /// Playback state.
    pub playback: PlaybackState,
    /// Active subdivision mode.
    pub mode: SubdivisionMode,
    /// Placement state.
    pub placement: PlacementState,
    /// The grid. Draw [`Grid::active_lines`].
    pub grid: &'a Grid,
    /// Committed notes.
    pub notes: &'a [PlacedNote],
    /// The note following the pointer.
    pub provisional: Option<&'a ProvisionalNote>,
}

/// The editor state for one host window.
#[derive(Debug)]
pub struct EditorSession<T, S> {
    config: EditorConfig,
    codec: ChartCodec,
    transport: T,
    storage: S,
    song: Option<Song>,
    grid: Grid,
    controller: NotePlacementController,
    playback: PlaybackState,
    paused_time_ms: i64,
    pending_switch: Option<SongEntry>,
    warnings: Vec<ChartWarning>,
}

impl<T: AudioTransport, S: ChartStorage> EditorSession<T, S> {
    /// Create a session with no song loaded.
    #[must_use]
    pub fn new(config: EditorConfig, transport: T, storage: S) -> Self {
        Self {
            codec: config.codec(),
            grid: Grid::empty(config.mapper(), config.subdivision_mode),
            controller: NotePlacementController::new(&config),
            config,
            transport,
            storage,
            song: None,
            playback: PlaybackState::Stopped,
            paused_time_ms: 0,
            pending_switch: None,
            warnings: Vec::new(),
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The loaded song.
    #[must_use]
    pub const fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    /// The grid of the loaded song.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The note placement state machine.
    #[must_use]
    pub const fn controller(&self) -> &NotePlacementController {
        &self.controller
    }

    /// The note placement state machine, for direct event injection.
    pub const fn controller_mut(&mut self) -> &mut NotePlacementController {
        &mut self.controller
    }

    /// The audio transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The audio transport, e.g. to advance a [`crate::transport::PlaybackClock`].
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The chart storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Playback state.
    #[must_use]
    pub const fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Where playback resumes from.
    #[must_use]
    pub const fn paused_time_ms(&self) -> i64 {
        self.paused_time_ms
    }

    /// Warnings from loading the current chart.
    #[must_use]
    pub fn warnings(&self) -> &[ChartWarning] {
        &self.warnings
    }

    /// Whether a song switch waits for the next tick.
    #[must_use]
    pub const fn has_pending_switch(&self) -> bool {
        self.pending_switch.is_some()
    }

    /// Switch to another song.
    ///
    /// Playback stops and the current chart is dropped now. The new chart is
    /// loaded on the next [`Self::tick`].
    pub fn switch_song(&mut self, entry: SongEntry) {
        self.transport.stop_and_reset();
        self.playback = PlaybackState::Stopped;
        self.paused_time_ms = 0;
        self.controller.clear();
        self.song = None;
        self.warnings.clear();
        self.grid = Grid::empty(self.config.mapper(), self.grid.mode());

        info!(title = %entry.title, "song switch queued");
        if let Some(stale) = self.pending_switch.replace(entry) {
            debug!(title = %stale.title, "pending song switch superseded");
        }
    }

    /// Run the queued song switch, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MalformedChart`] if the chart cannot be parsed and
    /// [`EditorError::Storage`] if it cannot be read or bootstrapped. The
    /// session is left with no song in both cases.
    pub fn load_pending(&mut self) -> Result<(), EditorError> {
        let Some(entry) = self.pending_switch.take() else {
            return Ok(());
        };
        let path = chart_path(&entry.title, &self.config.chart_extension);
        let loaded =
            storage::load_or_bootstrap(&mut self.storage, &path, &entry.title, entry.bpm, &self.codec)?;
        let output = self
            .codec
            .parse(&loaded.text)
            .map_err(|source| EditorError::MalformedChart {
                title: entry.title.clone(),
                source,
            })?;

        for warning in &output.warnings {
            warn!(title = %entry.title, %warning, "chart warning");
        }

        let ChartDocument { mut song, notes } = output.chart;
        if song.bpm().is_none() {
            song.bpm_by_section = vec![BpmSection::from_start(entry.bpm)];
        }
        if song.title.is_empty() {
            song.title.clone_from(&entry.title);
        }
        song.duration_ms = self.transport.duration_ms();

        let mode = self.grid.mode();
        self.grid = song.grid_params().map_or_else(
            || Grid::empty(self.config.mapper(), mode),
            |params| Grid::generate(params, self.config.mapper(), mode),
        );
        self.controller.load_notes(&notes);
        info!(
            title = %song.title,
            notes = notes.len(),
            grid_lines = self.grid.lines().len(),
            bootstrapped = loaded.bootstrapped,
            "song loaded"
        );
        self.song = Some(song);
        self.warnings = output.warnings;
        Ok(())
    }

    /// Play from the paused position, or from the start when stopped.
    pub fn play(&mut self) {
        match self.playback {
            PlaybackState::Playing => {}
            PlaybackState::Paused => {
                self.transport.set_position_ms(self.paused_time_ms);
                self.transport.resume();
            }
            PlaybackState::Stopped => {
                self.transport.set_position_ms(self.paused_time_ms);
                self.transport.start();
            }
        }
        self.playback = PlaybackState::Playing;
    }

    /// Pause, remembering the playhead.
    pub fn pause(&mut self) {
        if self.playback == PlaybackState::Playing {
            self.paused_time_ms = self.transport.current_position_ms();
            self.transport.pause();
            self.playback = PlaybackState::Paused;
        }
    }

    /// Stop and rewind.
    pub fn stop(&mut self) {
        self.transport.stop_and_reset();
        self.paused_time_ms = 0;
        self.playback = PlaybackState::Stopped;
    }

    /// Move the paused playhead by `delta` scroll units.
    ///
    /// Also applies while stopped, moving the position the next [`Self::play`]
    /// starts from. Ignored while playing. The result is clamped to the song.
    pub fn scrub(&mut self, delta: f64) {
        if self.playback == PlaybackState::Playing {
            return;
        }
        let duration = self.duration_ms().max(0);
        let target = (self.paused_time_ms as f64 + delta * self.config.scroll_speed_ms.as_f64())
            .clamp(0.0, duration as f64)
            .round();
        self.paused_time_ms = target.to_i64().unwrap_or(0).clamp(0, duration);
    }

    /// Start placing notes of `kind`.
    pub fn set_note_kind(&mut self, kind: NoteKind) {
        self.controller.set_note_kind(kind);
    }

    /// Show the lines of `mode`. Placed notes keep their positions.
    pub const fn set_subdivision_mode(&mut self, mode: SubdivisionMode) {
        self.grid.set_mode(mode);
    }

    /// Switch between twelve and sixteen lines per beat.
    pub const fn toggle_subdivision_mode(&mut self) {
        self.grid.toggle_mode();
    }

    /// The current chart as a document.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoSong`] if no song is loaded.
    pub fn document(&self) -> Result<ChartDocument, EditorError> {
        let song = self.song.clone().ok_or(EditorError::NoSong)?;
        Ok(ChartDocument {
            song,
            notes: self.controller.chart_notes(),
        })
    }

    /// Write the current chart to storage.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoSong`] if no song is loaded, or
    /// [`EditorError::Storage`] if writing fails.
    pub fn save(&mut self) -> Result<(), EditorError> {
        let document = self.document()?;
        let text = self.codec.generate(&document);
        let path = chart_path(&document.song.title, &self.config.chart_extension);
        self.storage.write_all(&path, &text)?;
        info!(
            path = %path.display(),
            notes = document.notes.len(),
            "chart saved"
        );
        Ok(())
    }

    /// Run one frame: load a queued song, apply the frame's input and report
    /// what to draw.
    ///
    /// # Errors
    ///
    /// Returns an error if a queued song fails to load. See [`Self::load_pending`].
    pub fn tick(&mut self, input: &mut impl PointerInput) -> Result<RenderState<'_>, EditorError> {
        self.load_pending()?;

        if input.primary_confirmed() {
            self.controller.pointer_moved(input.pointer_position());
            self.controller.primary_confirm(&self.grid);
        }
        if input.secondary_deleted() {
            self.controller.pointer_moved(input.pointer_position());
            self.controller.secondary_delete(&self.grid);
        }
        let delta = input.scroll_delta();
        if delta != 0.0 {
            self.scrub(delta);
        }

        let now_ms = self.transport.current_position_ms();
        Ok(self.advance(now_ms, input.pointer_position()))
    }

    /// Move the pointer and compute the frame for playhead time `now_ms`.
    ///
    /// `now_ms` is used while playing; otherwise the paused position is shown.
    pub fn advance(&mut self, now_ms: i64, pointer: SpacePoint) -> RenderState<'_> {
        self.controller.pointer_moved(pointer);

        let cursor_time_ms = match self.playback {
            PlaybackState::Playing => now_ms,
            PlaybackState::Paused | PlaybackState::Stopped => self.paused_time_ms,
        };
        let duration = self.duration_ms();
        let scroll_ratio = if duration > 0 {
            (1.0 - cursor_time_ms as f64 / duration as f64).clamp(0.0, 1.0)
        } else {
            1.0
        };

        RenderState {
            cursor_time_ms,
            cursor_space_y: self.config.mapper().to_space(cursor_time_ms as f64),
            time_label: format_time(cursor_time_ms),
            scroll_ratio,
            playback: self.playback,
            mode: self.grid.mode(),
            placement: self.controller.state(),
            grid: &self.grid,
            notes: self.controller.notes(),
            provisional: self.controller.provisional(),
        }
    }

    fn duration_ms(&self) -> i64 {
        self.song
            .as_ref()
            .map_or_else(|| self.transport.duration_ms(), |song| song.duration_ms)
    }
}
