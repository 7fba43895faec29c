//! The chart document and its text format.
//!
//! A chart file is UTF-8, line oriented, and split into three bracketed
//! sections:
//!
//! ```text
//! [Description]
//! Title: Example
//!
//! [Audio]
//! BPM: 170
//! Offset: 0
//!
//! [Note]
//! 2000, 0, 3
//! 2352.9411764705883, 1, 1, 3058.823529411765
//! ```
//!
//! `parse` module reads this text into a [`ChartDocument`], failing fast on a
//! malformed note record. `generate` module writes a document back, sorting
//! notes by start time and classifying each one as short or long by its drawn
//! length.
//!
//! In detail, our policies are:
//!
//! - Keys `Title`, `BPM` and `Offset` are recognized anywhere before `[Note]`.
//! - Every non-blank line after `[Note]` is a note record, up to the end.
//! - Unknown keys and sections are kept as warnings, not errors.

pub mod generate;
pub mod parse;

use strict_num_extended::{FinF64, NonNegativeF64, PositiveF64};

use crate::{grid::GridParams, lane::Lane, timeline::TimeSpaceMapper};

pub use self::parse::{ChartOutput, ChartParseError, ChartWarning, MalformedChartKind};

/// Header of the description section.
pub const DESCRIPTION_SECTION: &str = "[Description]";
/// Header of the audio section.
pub const AUDIO_SECTION: &str = "[Audio]";
/// Header of the note section.
pub const NOTE_SECTION: &str = "[Note]";

/// Default drawn length at or below which a note is written as short.
pub const DEFAULT_LONG_NOTE_THRESHOLD: NonNegativeF64 = NonNegativeF64::new_const(1.0);

/// The kind of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteKind {
    /// A tap, type code `0`.
    Short,
    /// A hold from start to end, type code `1`.
    Long,
}

impl NoteKind {
    /// The type code used in note records.
    #[must_use]
    pub const fn type_code(self) -> u8 {
        match self {
            Self::Short => 0,
            Self::Long => 1,
        }
    }

    /// Look up a kind by its type code.
    #[must_use]
    pub const fn from_type_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Short),
            1 => Some(Self::Long),
            _ => None,
        }
    }
}

/// A note on the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    /// Short or long.
    pub kind: NoteKind,
    /// The lane the note sits on.
    pub lane: Lane,
    /// Start time in milliseconds.
    pub start_time_ms: FinF64,
    /// End time in milliseconds, equal to `start_time_ms` for a short note.
    pub end_time_ms: FinF64,
}

impl Note {
    /// Create a short note.
    #[must_use]
    pub const fn short(lane: Lane, time_ms: FinF64) -> Self {
        Self {
            kind: NoteKind::Short,
            lane,
            start_time_ms: time_ms,
            end_time_ms: time_ms,
        }
    }

    /// Create a long note. `end_time_ms` is raised to `start_time_ms` if it is earlier.
    #[must_use]
    pub fn long(lane: Lane, start_time_ms: FinF64, end_time_ms: FinF64) -> Self {
        let end_time_ms = if end_time_ms.as_f64() < start_time_ms.as_f64() {
            start_time_ms
        } else {
            end_time_ms
        };
        Self {
            kind: NoteKind::Long,
            lane,
            start_time_ms,
            end_time_ms,
        }
    }

    /// Held length in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.end_time_ms.as_f64() - self.start_time_ms.as_f64()
    }
}

/// A tempo segment, starting at `start_time_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BpmSection {
    /// Where the segment starts, in milliseconds.
    pub start_time_ms: NonNegativeF64,
    /// Beats per minute within the segment.
    pub bpm: PositiveF64,
}

impl BpmSection {
    /// A tempo from the beginning of the song.
    #[must_use]
    pub const fn from_start(bpm: PositiveF64) -> Self {
        Self {
            start_time_ms: NonNegativeF64::ZERO,
            bpm,
        }
    }
}

/// Song metadata the chart is authored against.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Song {
    /// Song title, also the key of its chart file.
    pub title: String,
    /// Tempo segments in ascending order. Only a single segment is supported.
    pub bpm_by_section: Vec<BpmSection>,
    /// Shift applied to the beat grid, in milliseconds.
    pub offset_ms: i64,
    /// Length of the audio in milliseconds, `0` when unknown.
    pub duration_ms: i64,
}

impl Song {
    /// Create a song with a single tempo.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        bpm: PositiveF64,
        offset_ms: i64,
        duration_ms: i64,
    ) -> Self {
        Self {
            title: title.into(),
            bpm_by_section: vec![BpmSection::from_start(bpm)],
            offset_ms,
            duration_ms,
        }
    }

    /// The tempo of the song, `None` if it was never declared.
    #[must_use]
    pub fn bpm(&self) -> Option<PositiveF64> {
        self.bpm_by_section.first().map(|section| section.bpm)
    }

    /// Parameters for generating the beat grid, `None` without a tempo.
    #[must_use]
    pub fn grid_params(&self) -> Option<GridParams> {
        self.bpm().map(|bpm| GridParams {
            duration_ms: self.duration_ms,
            bpm,
            offset_ms: self.offset_ms,
        })
    }
}

/// A song together with its notes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartDocument {
    /// Song metadata.
    pub song: Song,
    /// Notes in any order. They are sorted by start time when written.
    pub notes: Vec<Note>,
}

impl ChartDocument {
    /// A document with no notes, as written for a song with no chart yet.
    #[must_use]
    pub fn skeleton(title: impl Into<String>, bpm: PositiveF64) -> Self {
        Self {
            song: Song::new(title, bpm, 0, 0),
            notes: Vec::new(),
        }
    }
}

/// Reads and writes chart text under a given coordinate scale.
///
/// The scale matters only when writing, where a note's drawn length decides
/// whether it is written as short or long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartCodec {
    mapper: TimeSpaceMapper,
    long_note_threshold: NonNegativeF64,
}

impl Default for ChartCodec {
    fn default() -> Self {
        Self {
            mapper: TimeSpaceMapper::default(),
            long_note_threshold: DEFAULT_LONG_NOTE_THRESHOLD,
        }
    }
}

impl ChartCodec {
    /// Create a codec for the given scale and long-note threshold.
    #[must_use]
    pub const fn new(mapper: TimeSpaceMapper, long_note_threshold: NonNegativeF64) -> Self {
        Self {
            mapper,
            long_note_threshold,
        }
    }

    /// Parse chart text.
    ///
    /// # Errors
    ///
    /// Returns [`ChartParseError`] on the first malformed line.
    pub fn parse(&self, source: &str) -> Result<ChartOutput, ChartParseError> {
        parse::parse_chart(source)
    }

    /// Write a document as chart text.
    #[must_use]
    pub fn generate(&self, chart: &ChartDocument) -> String {
        generate::generate_with(chart, self)
    }

    /// How a note is written: long only if its drawn length exceeds the threshold.
    #[must_use]
    pub fn classify(&self, note: &Note) -> NoteKind {
        let span = self.mapper.span_to_space(note.duration_ms());
        if span > self.long_note_threshold.as_f64() {
            NoteKind::Long
        } else {
            NoteKind::Short
        }
    }

    /// The coordinate scale of the codec.
    #[must_use]
    pub const fn mapper(&self) -> &TimeSpaceMapper {
        &self.mapper
    }
}

/// Parse chart text with the default codec. See [`ChartCodec::parse`].
///
/// # Errors
///
/// Returns [`ChartParseError`] on the first malformed line.
pub fn parse_chart(source: &str) -> Result<ChartOutput, ChartParseError> {
    parse::parse_chart(source)
}

/// Write a document with the default codec. See [`ChartCodec::generate`].
#[must_use]
pub fn generate_chart(chart: &ChartDocument) -> String {
    ChartCodec::default().generate(chart)
}
