//! Writes a [`ChartDocument`] back into chart text.

use itertools::Itertools;

use super::{
    AUDIO_SECTION, ChartCodec, ChartDocument, DESCRIPTION_SECTION, NOTE_SECTION, Note, NoteKind,
};

/// Write `chart` using `codec` to classify notes.
///
/// Sections come in the conventional order: description, audio, notes. Note
/// records are sorted by start time, keeping insertion order among equal
/// times. Whether a record is short or long depends on its drawn length, not
/// on [`Note::kind`], so a long note shorter than the threshold comes back as
/// short.
pub(super) fn generate_with(chart: &ChartDocument, codec: &ChartCodec) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(chart.notes.len() + 9);

    lines.push(DESCRIPTION_SECTION.to_string());
    lines.push(format!("Title: {}", chart.song.title));
    lines.push(String::new());

    lines.push(AUDIO_SECTION.to_string());
    if let Some(bpm) = chart.song.bpm() {
        lines.push(format!("BPM: {}", bpm.as_f64()));
    }
    lines.push(format!("Offset: {}", chart.song.offset_ms));
    lines.push(String::new());

    lines.push(NOTE_SECTION.to_string());
    lines.extend(
        chart
            .notes
            .iter()
            .sorted_by(|a, b| a.start_time_ms.as_f64().total_cmp(&b.start_time_ms.as_f64()))
            .map(|note| note_record(note, codec.classify(note))),
    );

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn note_record(note: &Note, kind: NoteKind) -> String {
    let code = kind.type_code();
    match kind {
        NoteKind::Short => format!("{}, {code}, {}", note.start_time_ms.as_f64(), note.lane),
        NoteKind::Long => format!(
            "{}, {code}, {}, {}",
            note.start_time_ms.as_f64(),
            note.lane,
            note.end_time_ms.as_f64()
        ),
    }
}
