//! Loader and writer for the `.mc` chart document (a JSON object) and the
//! `.mcz` package (a zip archive holding one). The legacy binary layout is
//! detected and rejected; it is intentionally not parsed.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zip::ZipArchive;

use crate::error::LoadError;
use crate::game::chart::{Chart, ChartMetadata, EffectEvent, SoundEvent, TempoEvent};
use crate::game::gameplay::MAX_LANES;
use crate::game::note::{BeatFraction, Note, NoteKind};
use crate::game::timing::{TempoTimeline, TimeSignature};

/// Fallback BPM when the document declares no tempo checkpoint at all.
const DEFAULT_BPM: f64 = 120.0;
const DEFAULT_LANE_COUNT: usize = 4;

/// Directory scan order when no note names the song audio.
const AUDIO_EXTENSION_PRIORITY: [&str; 3] = ["ogg", "mp3", "wav"];

/// Note rows with this type code carry a sound reference instead of a
/// playable note.
const SOUND_CUE_TYPE_CODE: i64 = 1;

// --- Document shape -------------------------------------------------------
//
// Unknown keys are collected through `serde(flatten)` at every level that
// charts are known to extend, so a load/save cycle loses nothing.

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChartDoc {
    meta: MetaDoc,
    #[serde(default)]
    time: Vec<TimeEventDoc>,
    #[serde(default)]
    note: Vec<NoteDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    effect: Vec<EffectDoc>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetaDoc {
    #[serde(default)]
    song: SongDoc,
    #[serde(default)]
    creator: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    level: i64,
    #[serde(default, skip_serializing_if = "preview_is_unset")]
    preview: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode_ext: Option<ModeExtDoc>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SongDoc {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModeExtDoc {
    #[serde(default = "default_lane_count")]
    column: usize,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TimeEventDoc {
    beat: BeatFraction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bpm: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NoteDoc {
    beat: BeatFraction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    type_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endbeat: Option<BeatFraction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vol: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EffectDoc {
    beat: BeatFraction,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    params: Value,
}

fn default_lane_count() -> usize {
    DEFAULT_LANE_COUNT
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires the reference
fn preview_is_unset(preview: &f64) -> bool {
    *preview <= 0.0
}

// --- Loading --------------------------------------------------------------

/// Loads a chart from a `.mc`/`.mc.json` document or a `.mcz` package.
/// The container kind is sniffed from the content first: anything starting
/// with `{` or `[` is a JSON document regardless of its extension.
pub fn load_chart(path: &Path) -> Result<Chart, LoadError> {
    debug!("loading chart: {}", path.display());
    let bytes = fs::read(path).map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
    let chart_dir = path.parent().unwrap_or_else(|| Path::new("."));

    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        None => Err(LoadError::Malformed("empty chart document".to_string())),
        Some(b'{' | b'[') => parse_document(&bytes, chart_dir),
        Some(_) if has_extension(path, "mcz") => load_archive(&bytes, chart_dir),
        Some(_) => Err(LoadError::LegacyBinary),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case(ext))
}

fn load_archive(bytes: &[u8], chart_dir: &Path) -> Result<Chart, LoadError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| LoadError::Malformed(format!("invalid chart archive: {e}")))?;
    let member = archive
        .file_names()
        .find(|name| name.ends_with(".mc") || name.ends_with(".mc.json"))
        .map(String::from)
        .ok_or(LoadError::EmptyArchive)?;
    debug!("archive chart member: {member}");

    let mut doc_bytes = Vec::new();
    archive
        .by_name(&member)
        .and_then(|mut f| f.read_to_end(&mut doc_bytes).map_err(Into::into))
        .map_err(|e| LoadError::Malformed(format!("could not read archive member: {e}")))?;
    parse_document(&doc_bytes, chart_dir)
}

fn parse_document(bytes: &[u8], chart_dir: &Path) -> Result<Chart, LoadError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| LoadError::Malformed(format!("invalid JSON: {e}")))?;
    let Some(object) = value.as_object() else {
        return Err(LoadError::Malformed("chart document must be a JSON object".to_string()));
    };
    if !object.contains_key("meta") {
        return Err(LoadError::MissingField("meta"));
    }
    let doc: ChartDoc = serde_json::from_value(value)
        .map_err(|e| LoadError::Malformed(e.to_string()))?;

    let meta = doc.meta;
    let lane_count = match meta.mode_ext.as_ref().map(|m| m.column) {
        None | Some(0) => DEFAULT_LANE_COUNT,
        Some(n) if n > MAX_LANES => {
            return Err(LoadError::Malformed(format!(
                "chart declares {n} lanes; at most {MAX_LANES} are supported"
            )));
        }
        Some(n) => n,
    };

    // Tempo checkpoints. Rows without a bpm are other timing directives this
    // engine does not model; invalid bpm values are rejected row by row and
    // the timeline keeps its last valid state.
    let mut tempo_events = Vec::new();
    for event in &doc.time {
        match event.bpm {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => {
                tempo_events.push(TempoEvent { beat: event.beat, bpm });
            }
            Some(bpm) => warn!("dropping tempo checkpoint with invalid bpm {bpm}"),
            None => debug!("skipping non-bpm time event at beat {:?}", event.beat),
        }
    }
    let base_bpm = tempo_events.first().map_or(DEFAULT_BPM, |e| e.bpm);

    let mut timeline = TempoTimeline::new(base_bpm, TimeSignature::default());
    for event in &tempo_events {
        if let Err(e) = timeline.add_checkpoint(event.beat.as_beats(), event.bpm) {
            warn!("tempo checkpoint rejected: {e}");
        }
    }

    // Split note rows into playable notes and sound cues.
    let mut notes = Vec::new();
    let mut sound_events = Vec::new();
    for row in doc.note {
        if row.type_code == Some(SOUND_CUE_TYPE_CODE) {
            let Some(sound) = row.sound else {
                warn!("sound cue at beat {:?} names no file; dropped", row.beat);
                continue;
            };
            sound_events.push(SoundEvent {
                beat: row.beat,
                sound,
                volume: row.vol.unwrap_or(1.0),
            });
            continue;
        }

        let code = row.type_code.unwrap_or(0);
        let Some(kind) = NoteKind::from_code(code) else {
            return Err(LoadError::Malformed(format!("unknown note type code {code}")));
        };
        let lane = row.column.unwrap_or(0);
        if lane >= lane_count {
            return Err(LoadError::Malformed(format!(
                "note at beat {:?} targets lane {lane}, outside 0..{lane_count}",
                row.beat
            )));
        }

        let mut note = Note::new(row.beat, lane, kind);
        note.sound = row.sound;
        note.volume = row.vol.unwrap_or(1.0);
        match row.endbeat {
            Some(end) if end.as_beats() > row.beat.as_beats() => note.end_beat = Some(end),
            Some(end) if kind == NoteKind::Hold => {
                return Err(LoadError::Malformed(format!(
                    "hold at beat {:?} ends at or before its start ({end:?})",
                    row.beat
                )));
            }
            Some(end) => {
                warn!("dropping non-ascending end beat {end:?} on a {kind:?} note");
            }
            None if kind == NoteKind::Hold => {
                return Err(LoadError::Malformed(format!(
                    "hold at beat {:?} has no end beat",
                    row.beat
                )));
            }
            None => {}
        }
        notes.push(note);
    }

    let effect_events = doc
        .effect
        .into_iter()
        .map(|e| EffectEvent { beat: e.beat, kind: e.kind, params: e.params })
        .collect();

    let audio_path = resolve_audio(chart_dir, &sound_events, &notes);
    if audio_path.is_none() {
        warn!("no audio asset resolved in {}; session will run silent", chart_dir.display());
    }

    let metadata = ChartMetadata {
        title: meta.song.title,
        artist: meta.song.artist,
        charter: meta.creator,
        difficulty: meta.version,
        level: meta.level,
        base_bpm,
        time_signature: TimeSignature::default(),
        preview_offset: meta.preview,
        cover: meta.cover.unwrap_or_else(|| meta.background.clone()),
        background: meta.background,
        audio_path,
        lane_count,
    };

    let mut chart = Chart {
        metadata,
        notes,
        tempo_events,
        sound_events,
        effect_events,
        timeline,
        extra: doc.extra,
        meta_extra: meta.extra,
        song_extra: meta.song.extra,
    };
    chart.resolve_note_times();
    chart.sort_notes_by_time();

    info!(
        "chart loaded: '{}' by {} (Lv.{}), {} notes, {} tempo checkpoints",
        chart.metadata.title,
        chart.metadata.artist,
        chart.metadata.level,
        chart.notes.len(),
        chart.timeline.checkpoints().len()
    );
    Ok(chart)
}

/// Audio resolution: first an embedded reference from a sound cue or a note
/// that names an existing file, then a directory scan in extension priority
/// order. Directory entries are visited in name order so the pick is stable
/// across platforms.
fn resolve_audio(chart_dir: &Path, sound_events: &[SoundEvent], notes: &[Note]) -> Option<PathBuf> {
    let embedded = sound_events
        .iter()
        .map(|s| s.sound.as_str())
        .chain(notes.iter().filter_map(|n| n.sound.as_deref()));
    for name in embedded {
        let candidate = chart_dir.join(name);
        if candidate.is_file() {
            debug!("audio resolved from chart reference: {}", candidate.display());
            return Some(candidate);
        }
    }

    let mut files: Vec<PathBuf> = fs::read_dir(chart_dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    for ext in AUDIO_EXTENSION_PRIORITY {
        if let Some(found) = files.iter().find(|p| has_extension(p, ext)) {
            debug!("audio resolved by directory scan: {}", found.display());
            return Some(found.clone());
        }
    }
    None
}

// --- Saving ---------------------------------------------------------------

/// Writes the chart back out as a `.mc` document: metadata, tempo list,
/// notes (sound cues included, at the end as charts conventionally place
/// them) and every pass-through key.
pub fn save_chart(chart: &Chart, path: &Path) -> Result<(), LoadError> {
    let mut note_rows: Vec<NoteDoc> = chart
        .notes
        .iter()
        .map(|n| NoteDoc {
            beat: n.beat,
            column: Some(n.lane),
            type_code: (n.kind != NoteKind::Tap).then(|| n.kind.code()),
            endbeat: n.end_beat,
            sound: n.sound.clone(),
            vol: (n.volume != 1.0).then_some(n.volume),
        })
        .collect();
    note_rows.extend(chart.sound_events.iter().map(|s| NoteDoc {
        beat: s.beat,
        column: None,
        type_code: Some(SOUND_CUE_TYPE_CODE),
        endbeat: None,
        sound: Some(s.sound.clone()),
        vol: (s.volume != 1.0).then_some(s.volume),
    }));

    let doc = ChartDoc {
        meta: MetaDoc {
            song: SongDoc {
                title: chart.metadata.title.clone(),
                artist: chart.metadata.artist.clone(),
                extra: chart.song_extra.clone(),
            },
            creator: chart.metadata.charter.clone(),
            version: chart.metadata.difficulty.clone(),
            level: chart.metadata.level,
            preview: chart.metadata.preview_offset,
            background: chart.metadata.background.clone(),
            cover: (!chart.metadata.cover.is_empty()).then(|| chart.metadata.cover.clone()),
            mode_ext: Some(ModeExtDoc {
                column: chart.metadata.lane_count,
                extra: Map::new(),
            }),
            extra: chart.meta_extra.clone(),
        },
        time: chart
            .tempo_events
            .iter()
            .map(|e| TimeEventDoc { beat: e.beat, bpm: Some(e.bpm) })
            .collect(),
        note: note_rows,
        effect: chart
            .effect_events
            .iter()
            .map(|e| EffectDoc { beat: e.beat, kind: e.kind.clone(), params: e.params.clone() })
            .collect(),
        extra: chart.extra.clone(),
    };

    let bytes = serde_json::to_vec_pretty(&doc)
        .map_err(|e| LoadError::Malformed(format!("could not serialize chart: {e}")))?;
    fs::write(path, bytes).map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
    info!("chart saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    use serde_json::json;

    use super::{load_chart, save_chart};
    use crate::error::LoadError;
    use crate::game::note::NoteKind;

    fn sample_doc() -> serde_json::Value {
        json!({
            "meta": {
                "creator": "tester",
                "version": "Hyper",
                "level": 12,
                "preview": 31.5,
                "background": "bg.jpg",
                "mode_ext": { "column": 4 },
                "source": "unit",
                "song": { "title": "Test Song", "artist": "Nobody", "id": 77 }
            },
            "time": [
                { "beat": [0, 0, 1], "bpm": 120.0 },
                { "beat": [8, 0, 1], "bpm": 240.0 }
            ],
            "note": [
                { "beat": [1, 0, 1], "column": 0 },
                { "beat": [2, 0, 1], "endbeat": [3, 0, 1], "column": 1, "type": 2 },
                { "beat": [4, 1, 2], "column": 3, "type": 3 },
                { "beat": [0, 0, 1], "sound": "song.ogg", "vol": 100.0, "type": 1 }
            ],
            "effect": [
                { "beat": [0, 0, 1], "type": "flash", "params": { "strength": 2 } }
            ],
            "storyboard": { "layers": 3 }
        })
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("beatline-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_doc(dir: &PathBuf, name: &str, doc: &serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec(doc).unwrap()).unwrap();
        path
    }

    #[test]
    fn parses_metadata_notes_and_cues() {
        let dir = scratch_dir("parse");
        let path = write_doc(&dir, "chart.mc", &sample_doc());
        let chart = load_chart(&path).unwrap();

        assert_eq!(chart.metadata.title, "Test Song");
        assert_eq!(chart.metadata.artist, "Nobody");
        assert_eq!(chart.metadata.charter, "tester");
        assert_eq!(chart.metadata.difficulty, "Hyper");
        assert_eq!(chart.metadata.level, 12);
        assert_eq!(chart.metadata.lane_count, 4);
        assert!((chart.metadata.base_bpm - 120.0).abs() < 1e-9);
        assert!((chart.metadata.preview_offset - 31.5).abs() < 1e-9);
        // The cover falls back to the background reference.
        assert_eq!(chart.metadata.cover, "bg.jpg");

        // The sound cue is not a playable note.
        assert_eq!(chart.notes.len(), 3);
        assert_eq!(chart.sound_events.len(), 1);
        assert_eq!(chart.sound_events[0].sound, "song.ogg");
        assert_eq!(chart.effect_events.len(), 1);

        // Resolved times: beat 1 at 120 bpm.
        let tap = &chart.notes[0];
        assert_eq!(tap.kind, NoteKind::Tap);
        assert!((tap.time - 0.5).abs() < 1e-9);
        let hold = &chart.notes[1];
        assert_eq!(hold.kind, NoteKind::Hold);
        assert!((hold.end_time.unwrap() - 1.5).abs() < 1e-9);

        // Pass-through keys survive at every level.
        assert_eq!(chart.extra["storyboard"]["layers"], 3);
        assert_eq!(chart.meta_extra["source"], "unit");
        assert_eq!(chart.song_extra["id"], 77);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_structural_violations() {
        let dir = scratch_dir("invalid");

        let mut doc = sample_doc();
        doc["note"][0]["column"] = json!(7);
        let path = write_doc(&dir, "lane.mc", &doc);
        assert!(matches!(load_chart(&path), Err(LoadError::Malformed(_))));

        let mut doc = sample_doc();
        doc["note"][1]["endbeat"] = json!([2, 0, 1]);
        let path = write_doc(&dir, "hold.mc", &doc);
        assert!(matches!(load_chart(&path), Err(LoadError::Malformed(_))));

        let mut doc = sample_doc();
        doc["note"][0]["type"] = json!(9);
        let path = write_doc(&dir, "kind.mc", &doc);
        assert!(matches!(load_chart(&path), Err(LoadError::Malformed(_))));

        let mut doc = sample_doc();
        doc["note"][0]["beat"] = json!([1, 1, 0]);
        let path = write_doc(&dir, "beat.mc", &doc);
        assert!(matches!(load_chart(&path), Err(LoadError::Malformed(_))));

        let path = write_doc(&dir, "nometa.mc", &json!({ "note": [] }));
        assert!(matches!(load_chart(&path), Err(LoadError::MissingField("meta"))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn legacy_binary_is_reported_not_parsed() {
        let dir = scratch_dir("legacy");
        let path = dir.join("old.mc");
        fs::write(&path, b"MCB\x01\x00\x00\x07binary").unwrap();
        assert!(matches!(load_chart(&path), Err(LoadError::LegacyBinary)));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn invalid_tempo_rows_are_dropped_not_fatal() {
        let dir = scratch_dir("tempo");
        let mut doc = sample_doc();
        doc["time"] = json!([
            { "beat": [0, 0, 1], "bpm": 120.0 },
            { "beat": [4, 0, 1], "bpm": 0.0 },
            { "beat": [6, 0, 1] }
        ]);
        let path = write_doc(&dir, "chart.mc", &doc);
        let chart = load_chart(&path).unwrap();
        assert_eq!(chart.timeline.checkpoints().len(), 1);
        assert_eq!(chart.tempo_events.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn round_trip_preserves_document_content() {
        let dir = scratch_dir("roundtrip");
        let path = write_doc(&dir, "chart.mc", &sample_doc());
        let chart = load_chart(&path).unwrap();

        let saved = dir.join("saved.mc");
        save_chart(&chart, &saved).unwrap();
        let reloaded = load_chart(&saved).unwrap();

        assert_eq!(reloaded.metadata.title, chart.metadata.title);
        assert_eq!(reloaded.metadata.level, chart.metadata.level);
        assert_eq!(reloaded.notes.len(), chart.notes.len());
        assert_eq!(reloaded.sound_events, chart.sound_events);
        assert_eq!(reloaded.tempo_events, chart.tempo_events);
        assert_eq!(reloaded.effect_events, chart.effect_events);
        assert_eq!(reloaded.extra, chart.extra);
        assert_eq!(reloaded.meta_extra, chart.meta_extra);
        assert_eq!(reloaded.song_extra, chart.song_extra);
        for (a, b) in reloaded.notes.iter().zip(chart.notes.iter()) {
            assert_eq!(a.beat, b.beat);
            assert_eq!(a.lane, b.lane);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.end_beat, b.end_beat);
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn loads_chart_from_mcz_archive() {
        let dir = scratch_dir("mcz");
        let path = dir.join("pack.mcz");
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("inner/chart.mc", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(&serde_json::to_vec(&sample_doc()).unwrap())
            .unwrap();
        writer.finish().unwrap();

        let chart = load_chart(&path).unwrap();
        assert_eq!(chart.notes.len(), 3);

        let empty = dir.join("empty.mcz");
        let file = fs::File::create(&empty).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nothing here").unwrap();
        writer.finish().unwrap();
        assert!(matches!(load_chart(&empty), Err(LoadError::EmptyArchive)));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn audio_resolution_prefers_embedded_then_scans() {
        let dir = scratch_dir("audio");
        fs::write(dir.join("song.ogg"), b"not really audio").unwrap();
        fs::write(dir.join("alt.wav"), b"not really audio").unwrap();

        // Embedded reference wins when the file exists.
        let path = write_doc(&dir, "chart.mc", &sample_doc());
        let chart = load_chart(&path).unwrap();
        assert_eq!(
            chart.metadata.audio_path.as_deref(),
            Some(dir.join("song.ogg").as_path())
        );

        // Without any embedded reference the scan picks by extension
        // priority, so .ogg beats .wav.
        let mut doc = sample_doc();
        doc["note"] = json!([{ "beat": [1, 0, 1], "column": 0 }]);
        let path = write_doc(&dir, "noref.mc", &doc);
        let chart = load_chart(&path).unwrap();
        assert_eq!(
            chart.metadata.audio_path.as_deref(),
            Some(dir.join("song.ogg").as_path())
        );

        // A dangling reference falls back to the scan too.
        let mut doc = sample_doc();
        doc["note"][3]["sound"] = json!("missing.ogg");
        let path = write_doc(&dir, "dangling.mc", &doc);
        let chart = load_chart(&path).unwrap();
        assert!(chart.metadata.audio_path.is_some());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn constant_tempo_chart_with_no_time_rows_uses_default_bpm() {
        let dir = scratch_dir("notime");
        let mut doc = sample_doc();
        doc["time"] = json!([]);
        let path = write_doc(&dir, "chart.mc", &doc);
        let chart = load_chart(&path).unwrap();
        assert!((chart.metadata.base_bpm - 120.0).abs() < 1e-9);
        assert!(chart.timeline.checkpoints().is_empty());
        // Beat [1,0,1] under the constant formula.
        assert!((chart.notes[0].time - 0.5).abs() < 1e-9);
        fs::remove_dir_all(&dir).ok();
    }
}
