//! Prelude module for the chart editor crate.
//!
//! You can use `use chart_editor::prelude::*;` to import the commonly used types at once.

#[cfg(feature = "diagnostics")]
pub use crate::diagnostics::{SimpleSource, ToAriadne, emit_chart_error, emit_chart_warnings};

pub use crate::{
    chart::{
        BpmSection, ChartCodec, ChartDocument, ChartOutput, ChartParseError, ChartWarning,
        MalformedChartKind, Note, NoteKind, Song, generate_chart, parse_chart,
    },
    config::{ConfigError, EditorConfig},
    editor::{
        NoteId, NotePlacementController, PlacedNote, PlacementOutcome, PlacementPolicy,
        PlacementState, ProvisionalNote,
        session::{EditorError, EditorSession, PlaybackState, RenderState, SongEntry},
    },
    grid::{Grid, GridLine, GridLineKind, GridParams, MAX_BPM, SubdivisionMode},
    input::{InputFrame, PointerInput},
    lane::{InvalidLane, LANE_COUNT, Lane, LaneSet},
    snap::{SnapResolver, SnapTarget, nearest_line},
    storage::{
        ChartStorage, FsChartStorage, LoadedChart, MemoryChartStorage, StorageError, chart_path,
        load_or_bootstrap,
    },
    timeline::{SpacePoint, TimeSpaceMapper, format_time},
    transport::{AudioTransport, PlaybackClock},
};
