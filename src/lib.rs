//! The core of a four-lane rhythm game chart editor.
//!
//! The editor lays a beat grid over a song's timeline, snaps pointer input to
//! lanes and grid lines, and keeps the placed notes in a plain text chart.
//!
//! `timeline` module maps milliseconds to the vertical editor space and back.
//!
//! `grid` module generates the measure bars and both subdivision line sets of a
//! song. `lane` and `snap` modules resolve a raw pointer position to a lane and
//! a grid line.
//!
//! `editor` module holds the note placement state machine, and
//! [`editor::session::EditorSession`] wires it to an [`transport::AudioTransport`],
//! a [`input::PointerInput`] and a [`storage::ChartStorage`].
//!
//! `chart` module reads and writes the chart text format.
//!
//! In detail, our policies are:
//!
//! - One tempo per song.
//! - Notes snap to the subdivision shown when they are placed and are never re-snapped.
//! - Odd input (out of bounds, overlapping, nothing to delete) is a silent no-op, not an error.
//! - The only error a loaded song can raise is a malformed chart.
//! - Tempo, scale, distances and note times carry their range in their type
//!   (`strict_num_extended`). A tempo above [`grid::MAX_BPM`] is malformed.

pub mod chart;
pub mod config;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod editor;
pub mod grid;
pub mod input;
pub mod lane;
pub mod prelude;
pub mod snap;
pub mod storage;
pub mod timeline;
pub mod transport;
