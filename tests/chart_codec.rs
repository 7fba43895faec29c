//! Reading and writing chart text.

use chart_editor::{
    chart::{
        ChartCodec, ChartDocument, ChartWarning, MalformedChartKind, Note, NoteKind, Song,
        generate_chart, parse_chart,
    },
    lane::{InvalidLane, Lane},
    timeline::TimeSpaceMapper,
};
use pretty_assertions::assert_eq;
use strict_num_extended::{FinF64, NonNegativeF64, PositiveF64};

const NIGHT_DRIVE: &str = include_str!("files/night_drive.txt");
const MESSY: &str = include_str!("files/messy.txt");

fn lane(n: u8) -> Lane {
    Lane::new(n).unwrap()
}

fn ms(time: f64) -> FinF64 {
    FinF64::new(time).unwrap()
}

fn bpm(value: f64) -> PositiveF64 {
    PositiveF64::new(value).unwrap()
}

#[test]
fn canonical_file_round_trips_exactly() {
    let output = parse_chart(NIGHT_DRIVE).unwrap();
    assert_eq!(output.warnings, vec![]);
    assert_eq!(output.chart.notes.len(), 7);
    assert_eq!(generate_chart(&output.chart), NIGHT_DRIVE);
}

#[test]
fn messy_file_is_normalized() {
    let output = parse_chart(MESSY).unwrap();
    assert_eq!(
        output.warnings,
        vec![ChartWarning::UnknownKey {
            line: 3,
            key: "Artist".to_string(),
        }]
    );
    assert_eq!(output.chart.song.offset_ms, 12);

    let text = generate_chart(&output.chart);
    assert_eq!(
        text,
        "[Description]\nTitle: Messy\n\n[Audio]\nBPM: 150\nOffset: 12\n\n[Note]\n200, 1, 2, 600\n200, 0, 1\n1500, 0, 4\n"
    );
    // Written text is a fixed point.
    assert_eq!(generate_chart(&parse_chart(&text).unwrap().chart), text);
}

#[test]
fn note_order_is_preserved_by_time() {
    let chart = ChartDocument {
        song: Song::new("Order", bpm(170.0), 0, 0),
        notes: vec![
            Note::short(lane(1), ms(3000.0)),
            Note::long(lane(2), ms(1000.0), ms(1800.0)),
            Note::short(lane(4), ms(2000.0)),
        ],
    };
    let parsed = parse_chart(&generate_chart(&chart)).unwrap().chart;
    let starts: Vec<f64> = parsed.notes.iter().map(|n| n.start_time_ms.as_f64()).collect();
    assert_eq!(starts, vec![1000.0, 2000.0, 3000.0]);
}

#[test]
fn malformed_records_fail_with_line() {
    let cases: [(&str, MalformedChartKind); 5] = [
        (
            "abc, 0, 1",
            MalformedChartKind::InvalidNumber {
                field: "time",
                text: "abc".to_string(),
            },
        ),
        ("100, 5, 1", MalformedChartKind::UnknownNoteType(5)),
        (
            "100, 0",
            MalformedChartKind::WrongFieldCount {
                expected: 3,
                found: 2,
            },
        ),
        (
            "100, 1, 2",
            MalformedChartKind::WrongFieldCount {
                expected: 4,
                found: 3,
            },
        ),
        ("100, 0, 9", MalformedChartKind::InvalidLane(InvalidLane(9))),
    ];
    for (record, kind) in cases {
        let source = format!("[Audio]\nBPM: 120\n[Note]\n0, 0, 1\n{record}\n");
        let err = parse_chart(&source).unwrap_err();
        assert_eq!(err.line, 5, "{record}");
        assert_eq!(err.kind, kind, "{record}");
        assert_eq!(&source[err.span.clone()], record);
    }
}

#[test]
fn missing_sections_are_warnings() {
    let output = parse_chart("Title: Lonely\n").unwrap();
    assert_eq!(output.chart.song.title, "Lonely");
    assert_eq!(
        output.warnings,
        vec![ChartWarning::MissingBpm, ChartWarning::MissingNoteSection]
    );
    assert!(output.chart.notes.is_empty());
}

#[test]
fn short_long_note_is_written_short() {
    // 1.5ms is 0.75 space units, below the threshold.
    let chart = ChartDocument {
        song: Song::new("Tiny", bpm(120.0), 0, 0),
        notes: vec![Note::long(lane(3), ms(400.0), ms(401.5))],
    };
    assert_eq!(ChartCodec::default().classify(&chart.notes[0]), NoteKind::Short);
    assert!(generate_chart(&chart).ends_with("[Note]\n400, 0, 3\n"));
}

#[test]
fn classification_follows_codec_scale() {
    let note = Note::long(lane(1), ms(0.0), ms(1.5));
    let fine = ChartCodec::new(
        TimeSpaceMapper::new(bpm(1.0)),
        NonNegativeF64::new(1.0).unwrap(),
    );
    assert_eq!(fine.classify(&note), NoteKind::Long);
    assert_eq!(ChartCodec::default().classify(&note), NoteKind::Short);
}
