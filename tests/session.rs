//! Driving a whole editor session frame by frame.

use std::{fs, path::PathBuf};

use chart_editor::{
    chart::NoteKind,
    config::EditorConfig,
    editor::session::{EditorError, EditorSession, PlaybackState, SongEntry},
    grid::SubdivisionMode,
    input::InputFrame,
    storage::{ChartStorage, FsChartStorage, MemoryChartStorage, chart_path},
    timeline::SpacePoint,
    transport::{AudioTransport, PlaybackClock},
};
use gametime::{TimeSpan, TimeStamp};
use pretty_assertions::assert_eq;
use strict_num_extended::PositiveF64;

const SONG_170: &str = "[Description]\nTitle: Test Song\n\n[Audio]\nBPM: 170\nOffset: 0\n\n[Note]\n2000, 0, 3\n";

fn bpm(value: f64) -> PositiveF64 {
    PositiveF64::new(value).unwrap()
}

fn temp_root(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chart-editor-{name}-{}", std::process::id()))
}

fn memory_session(
    storage: MemoryChartStorage,
) -> EditorSession<PlaybackClock, MemoryChartStorage> {
    EditorSession::new(
        EditorConfig::default(),
        PlaybackClock::new(60_000, TimeStamp::now()),
        storage,
    )
}

#[test]
fn loads_places_and_saves_a_chart() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Test Song.txt", SONG_170);
    let mut session = memory_session(storage);

    session.switch_song(SongEntry::new("Test Song", bpm(170.0)));
    let frame = session.tick(&mut InputFrame::default()).unwrap();
    assert_eq!(frame.notes.len(), 1);
    assert_eq!(frame.notes[0].lane.number(), 3);
    assert_eq!(frame.notes[0].position, SpacePoint::new(25.0, 1000.0));
    assert_eq!(frame.time_label, "00:00:000");
    assert_eq!(frame.mode, SubdivisionMode::Twelve);

    // Saving unchanged notes reproduces the record.
    session.save().unwrap();
    assert_eq!(session.storage().get("Test Song.txt"), Some(SONG_170));
}

#[test]
fn missing_chart_is_bootstrapped_on_disk() {
    let root = temp_root("bootstrap");
    let mut session = EditorSession::new(
        EditorConfig::default(),
        PlaybackClock::new(10_000, TimeStamp::now()),
        FsChartStorage::new(&root),
    );
    session.switch_song(SongEntry::new("Fresh", bpm(140.0)));
    session.tick(&mut InputFrame::default()).unwrap();

    let written = fs::read_to_string(root.join("Fresh.txt")).unwrap();
    assert_eq!(
        written,
        "[Description]\nTitle: Fresh\n\n[Audio]\nBPM: 140\nOffset: 0\n\n[Note]\n"
    );
    assert_eq!(session.song().unwrap().bpm(), Some(bpm(140.0)));

    session.set_note_kind(NoteKind::Short);
    session
        .tick(&mut InputFrame::at(-75.0, 0.0).confirm())
        .unwrap();
    session.save().unwrap();
    let saved = session
        .storage()
        .read_all(&chart_path("Fresh", "txt"))
        .unwrap()
        .unwrap();
    assert!(saved.ends_with("[Note]\n0, 0, 1\n"));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn only_latest_switch_is_loaded() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Test Song.txt", SONG_170);
    storage.insert("Broken.txt", "[Note]\nnot a note\n");
    let mut session = memory_session(storage);

    session.switch_song(SongEntry::new("Broken", bpm(120.0)));
    session.switch_song(SongEntry::new("Test Song", bpm(170.0)));
    session.tick(&mut InputFrame::default()).unwrap();
    assert_eq!(session.song().unwrap().title, "Test Song");
    assert_eq!(session.controller().notes().len(), 1);
}

#[test]
fn switching_drops_current_notes_immediately() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Test Song.txt", SONG_170);
    let mut session = memory_session(storage);
    session.switch_song(SongEntry::new("Test Song", bpm(170.0)));
    session.tick(&mut InputFrame::default()).unwrap();
    session.play();

    session.switch_song(SongEntry::new("Other", bpm(100.0)));
    assert!(session.controller().notes().is_empty());
    assert!(session.grid().is_empty());
    assert_eq!(session.playback(), PlaybackState::Stopped);
    assert_eq!(session.transport().current_position_ms(), 0);
}

#[test]
fn malformed_chart_is_reported() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Bad.txt", "[Audio]\nBPM: 120\n[Note]\n100, 0, 5\n");
    let mut session = memory_session(storage);
    session.switch_song(SongEntry::new("Bad", bpm(120.0)));

    match session.tick(&mut InputFrame::default()) {
        Err(EditorError::MalformedChart { title, source }) => {
            assert_eq!(title, "Bad");
            assert_eq!(source.line, 4);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(session.song().is_none());
    // The next frame runs normally with nothing loaded.
    assert!(session.tick(&mut InputFrame::default()).is_ok());
}

#[test]
fn scroll_scrubs_only_while_not_playing() {
    let start = TimeStamp::now();
    let mut session = EditorSession::new(
        EditorConfig::default(),
        PlaybackClock::new(5000, start),
        MemoryChartStorage::new(),
    );
    session.switch_song(SongEntry::new("Scrub", bpm(120.0)));
    session.tick(&mut InputFrame::default()).unwrap();

    let frame = session.tick(&mut InputFrame::default().scroll(12.0)).unwrap();
    assert_eq!(frame.cursor_time_ms, 1200);

    session.play();
    session.transport_mut().step_to(start + TimeSpan::MILLISECOND * 300);
    let frame = session.tick(&mut InputFrame::default().scroll(50.0)).unwrap();
    assert_eq!(frame.playback, PlaybackState::Playing);
    assert_eq!(frame.cursor_time_ms, 1500);

    session.pause();
    let frame = session.tick(&mut InputFrame::default().scroll(-100.0)).unwrap();
    assert_eq!(frame.cursor_time_ms, 0);
    assert!((frame.scroll_ratio - 1.0).abs() < f64::EPSILON);

    let frame = session.tick(&mut InputFrame::default().scroll(100.0)).unwrap();
    assert_eq!(frame.cursor_time_ms, 5000);
    assert!(frame.scroll_ratio.abs() < f64::EPSILON);

    session.stop();
    assert_eq!(session.paused_time_ms(), 0);
}

#[test]
fn delete_through_tick() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Test Song.txt", SONG_170);
    let mut session = memory_session(storage);
    session.switch_song(SongEntry::new("Test Song", bpm(170.0)));
    session.tick(&mut InputFrame::default()).unwrap();

    // Delete snaps the pointer first, so aim at the line nearest the note.
    let line = session
        .grid()
        .active_lines()
        .min_by(|a, b| (a.space_pos - 1000.0).abs().total_cmp(&(b.space_pos - 1000.0).abs()))
        .copied()
        .unwrap();
    assert!((line.space_pos - 1000.0).abs() <= 5.0);

    let frame = session
        .tick(&mut InputFrame::at(25.0, line.space_pos).delete())
        .unwrap();
    assert!(frame.notes.is_empty());
}

#[test]
fn measure_bars_follow_the_beat() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Test Song.txt", SONG_170);
    let mut session = memory_session(storage);
    session.switch_song(SongEntry::new("Test Song", bpm(170.0)));
    session.tick(&mut InputFrame::default()).unwrap();

    let tick = 60_000.0 / 170.0;
    let bars: Vec<f64> = session
        .grid()
        .lines()
        .iter()
        .filter(|line| line.is_measure_bar())
        .map(|line| line.time_ms)
        .collect();
    assert_eq!(bars.len(), (60_000.0_f64 / tick).ceil() as usize);
    for (k, time) in bars.iter().enumerate() {
        assert!((time - k as f64 * tick).abs() < 1e-6, "bar {k} at {time}");
    }
}

#[test]
fn offset_chart_can_be_edited_to_the_end() {
    let mut storage = MemoryChartStorage::new();
    storage.insert(
        "Late.txt",
        "[Description]\nTitle: Late\n\n[Audio]\nBPM: 120\nOffset: -250\n\n[Note]\n",
    );
    let mut session = EditorSession::new(
        EditorConfig::default(),
        PlaybackClock::new(10_000, TimeStamp::now()),
        storage,
    );
    session.switch_song(SongEntry::new("Late", bpm(120.0)));
    session.set_note_kind(NoteKind::Short);
    session.tick(&mut InputFrame::default()).unwrap();

    // The last bar is at 9750ms; the song end lies half a beat into its tick.
    let frame = session
        .tick(&mut InputFrame::at(75.0, 5_000.0).confirm())
        .unwrap();
    assert_eq!(frame.notes.len(), 1);
    assert_eq!(frame.notes[0].position, SpacePoint::new(75.0, 5_000.0));
    let last = session.grid().lines().last().unwrap();
    assert!(last.time_ms >= 10_000.0);
}

#[test]
fn absurd_tempo_is_reported_not_fatal() {
    let mut storage = MemoryChartStorage::new();
    storage.insert("Fast.txt", "[Audio]\nBPM: 1e15\n[Note]\n");
    let mut session = memory_session(storage);
    session.switch_song(SongEntry::new("Fast", bpm(120.0)));

    match session.tick(&mut InputFrame::default()) {
        Err(EditorError::MalformedChart { source, .. }) => assert_eq!(source.line, 2),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(session.grid().is_empty());
    assert!(session.tick(&mut InputFrame::default()).is_ok());
}
