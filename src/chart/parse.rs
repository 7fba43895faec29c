//! Parser of the chart text format.
//!
//! Raw [`str`] == [`parse_chart`] ==> [`ChartDocument`] (in [`ChartOutput`])

use std::ops::Range;

use strict_num_extended::{FinF64, PositiveF64};
use thiserror::Error;

use crate::{
    grid::MAX_BPM,
    lane::{InvalidLane, Lane},
};

use super::{
    AUDIO_SECTION, BpmSection, ChartDocument, DESCRIPTION_SECTION, NOTE_SECTION, Note, NoteKind,
    Song,
};

/// Why a line of a chart could not be read.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MalformedChartKind {
    /// A field was expected to be a number.
    #[error("field `{field}` is not a number: `{text}`")]
    InvalidNumber {
        /// Which field failed.
        field: &'static str,
        /// The text found instead.
        text: String,
    },
    /// A time field was `inf` or `NaN`.
    #[error("field `{field}` must be a finite time: `{text}`")]
    NonFiniteTime {
        /// Which field failed.
        field: &'static str,
        /// The text found.
        text: String,
    },
    /// The note type code is neither `0` nor `1`.
    #[error("unknown note type code {0}")]
    UnknownNoteType(u8),
    /// The record has the wrong number of fields for its type.
    #[error("expected {expected} fields, found {found}")]
    WrongFieldCount {
        /// Fields required by the note type.
        expected: usize,
        /// Fields present.
        found: usize,
    },
    /// The lane is outside `1..=4`.
    #[error(transparent)]
    InvalidLane(#[from] InvalidLane),
    /// A long note ends before it starts.
    #[error("long note ends at {end} before it starts at {start}")]
    EndBeforeStart {
        /// Start field text.
        start: String,
        /// End field text.
        end: String,
    },
    /// `BPM` or `Offset` has a value that cannot be used. A `BPM` must be
    /// positive and at most [`MAX_BPM`].
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidHeaderValue {
        /// The header key.
        key: &'static str,
        /// The value found.
        value: String,
    },
}

/// A chart failed to parse. Nothing of the chart is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("malformed chart at line {line}: {kind}")]
pub struct ChartParseError {
    /// 1-based line number.
    pub line: usize,
    /// Byte range of the line in the source, without its line break.
    pub span: Range<usize>,
    /// What was wrong.
    pub kind: MalformedChartKind,
}

/// Something odd in a chart that does not stop it from loading.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChartWarning {
    /// A bracketed header other than the three known ones.
    #[error("unknown section `{name}` at line {line}")]
    UnknownSection {
        /// 1-based line number.
        line: usize,
        /// The header text.
        name: String,
    },
    /// A `key: value` line with an unrecognized key.
    #[error("unknown key `{key}` at line {line}")]
    UnknownKey {
        /// 1-based line number.
        line: usize,
        /// The key.
        key: String,
    },
    /// A known key appeared again; the later value is used.
    #[error("duplicated key `{key}` at line {line}")]
    DuplicateKey {
        /// 1-based line number.
        line: usize,
        /// The key.
        key: String,
    },
    /// A line before `[Note]` that is neither a header nor `key: value`.
    #[error("unrecognized line {line}")]
    UnrecognizedLine {
        /// 1-based line number.
        line: usize,
    },
    /// The chart has no `Title`.
    #[error("missing `Title`")]
    MissingTitle,
    /// The chart has no `BPM`.
    #[error("missing `BPM`")]
    MissingBpm,
    /// The chart has no `[Note]` section.
    #[error("missing `[Note]` section")]
    MissingNoteSection,
}

/// Output of parsing a chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartOutput {
    /// The parsed chart. Its song duration is `0`; the audio decides it.
    pub chart: ChartDocument,
    /// Warnings that occurred during parsing.
    pub warnings: Vec<ChartWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Description,
    Audio,
    Note,
    Unknown,
}

#[derive(Debug, Default)]
struct Header {
    title: Option<String>,
    bpm: Option<PositiveF64>,
    offset_ms: Option<i64>,
}

/// A line with its position in the source.
struct SourceLine<'a> {
    number: usize,
    span: Range<usize>,
    text: &'a str,
}

impl SourceLine<'_> {
    fn error(&self, kind: MalformedChartKind) -> ChartParseError {
        ChartParseError {
            line: self.number,
            span: self.span.clone(),
            kind,
        }
    }
}

fn source_lines(source: &str) -> impl Iterator<Item = SourceLine<'_>> {
    source
        .split_inclusive('\n')
        .scan(0usize, |offset, raw| {
            let start = *offset;
            *offset += raw.len();
            let body = raw.trim_end_matches(['\n', '\r']);
            Some((start, body))
        })
        .enumerate()
        .map(|(index, (start, body))| SourceLine {
            number: index + 1,
            span: start..start + body.len(),
            text: body.trim(),
        })
}

/// Parse chart text into a [`ChartDocument`].
///
/// # Errors
///
/// Returns [`ChartParseError`] for the first malformed note record or unusable
/// `BPM`/`Offset` value. Parsing stops there and nothing is returned.
pub fn parse_chart(source: &str) -> Result<ChartOutput, ChartParseError> {
    let mut section = Section::Preamble;
    let mut header = Header::default();
    let mut notes = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_note_section = false;

    for line in source_lines(source) {
        if line.text.is_empty() {
            continue;
        }
        if section == Section::Note {
            notes.push(parse_note(&line)?);
            continue;
        }
        if line.text.starts_with('[') && line.text.ends_with(']') {
            section = match line.text {
                DESCRIPTION_SECTION => Section::Description,
                AUDIO_SECTION => Section::Audio,
                NOTE_SECTION => {
                    seen_note_section = true;
                    Section::Note
                }
                other => {
                    warnings.push(ChartWarning::UnknownSection {
                        line: line.number,
                        name: other.to_string(),
                    });
                    Section::Unknown
                }
            };
            continue;
        }
        parse_header_line(&line, &mut header, &mut warnings)?;
    }

    if header.title.is_none() {
        warnings.push(ChartWarning::MissingTitle);
    }
    if header.bpm.is_none() {
        warnings.push(ChartWarning::MissingBpm);
    }
    if !seen_note_section {
        warnings.push(ChartWarning::MissingNoteSection);
    }

    let song = Song {
        title: header.title.unwrap_or_default(),
        bpm_by_section: header.bpm.map(BpmSection::from_start).into_iter().collect(),
        offset_ms: header.offset_ms.unwrap_or(0),
        duration_ms: 0,
    };
    Ok(ChartOutput {
        chart: ChartDocument { song, notes },
        warnings,
    })
}

fn parse_header_line(
    line: &SourceLine<'_>,
    header: &mut Header,
    warnings: &mut Vec<ChartWarning>,
) -> Result<(), ChartParseError> {
    let Some((key, value)) = line.text.split_once(':') else {
        warnings.push(ChartWarning::UnrecognizedLine { line: line.number });
        return Ok(());
    };
    let (key, value) = (key.trim(), value.trim());
    let duplicated = match key {
        "Title" => header.title.replace(value.to_string()).is_some(),
        "BPM" => {
            let bpm = value
                .parse::<f64>()
                .ok()
                .filter(|&bpm| bpm <= MAX_BPM)
                .and_then(|bpm| PositiveF64::new(bpm).ok())
                .ok_or_else(|| {
                    line.error(MalformedChartKind::InvalidHeaderValue {
                        key: "BPM",
                        value: value.to_string(),
                    })
                })?;
            header.bpm.replace(bpm).is_some()
        }
        "Offset" => {
            let offset = value.parse::<i64>().map_err(|_| {
                line.error(MalformedChartKind::InvalidHeaderValue {
                    key: "Offset",
                    value: value.to_string(),
                })
            })?;
            header.offset_ms.replace(offset).is_some()
        }
        _ => {
            warnings.push(ChartWarning::UnknownKey {
                line: line.number,
                key: key.to_string(),
            });
            false
        }
    };
    if duplicated {
        warnings.push(ChartWarning::DuplicateKey {
            line: line.number,
            key: key.to_string(),
        });
    }
    Ok(())
}

fn parse_time(
    line: &SourceLine<'_>,
    field: &'static str,
    text: &str,
) -> Result<FinF64, ChartParseError> {
    let time = text.parse::<f64>().map_err(|_| {
        line.error(MalformedChartKind::InvalidNumber {
            field,
            text: text.to_string(),
        })
    })?;
    FinF64::new(time).map_err(|_| {
        line.error(MalformedChartKind::NonFiniteTime {
            field,
            text: text.to_string(),
        })
    })
}

fn parse_u8(line: &SourceLine<'_>, field: &'static str, text: &str) -> Result<u8, ChartParseError> {
    text.parse::<u8>().map_err(|_| {
        line.error(MalformedChartKind::InvalidNumber {
            field,
            text: text.to_string(),
        })
    })
}

/// Parse `time, 0, lane` or `time, 1, lane, end`.
fn parse_note(line: &SourceLine<'_>) -> Result<Note, ChartParseError> {
    let fields: Vec<&str> = line.text.split(',').map(str::trim).collect();
    let &[time, code, lane, ref rest @ ..] = fields.as_slice() else {
        return Err(line.error(MalformedChartKind::WrongFieldCount {
            expected: 3,
            found: fields.len(),
        }));
    };

    let start = parse_time(line, "time", time)?;
    let code = parse_u8(line, "type", code)?;
    let kind = NoteKind::from_type_code(code)
        .ok_or_else(|| line.error(MalformedChartKind::UnknownNoteType(code)))?;
    let expected = match kind {
        NoteKind::Short => 3,
        NoteKind::Long => 4,
    };
    if fields.len() != expected {
        return Err(line.error(MalformedChartKind::WrongFieldCount {
            expected,
            found: fields.len(),
        }));
    }
    let lane = Lane::try_from(parse_u8(line, "lane", lane)?)
        .map_err(|err| line.error(MalformedChartKind::InvalidLane(err)))?;

    match (kind, rest) {
        (NoteKind::Long, &[end_text]) => {
            let end = parse_time(line, "end", end_text)?;
            if end.as_f64() < start.as_f64() {
                return Err(line.error(MalformedChartKind::EndBeforeStart {
                    start: time.to_string(),
                    end: end_text.to_string(),
                }));
            }
            Ok(Note::long(lane, start, end))
        }
        _ => Ok(Note::short(lane, start)),
    }
}
