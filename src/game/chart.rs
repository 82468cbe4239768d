use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::game::note::{BeatFraction, Note};
use crate::game::timing::{TempoTimeline, TimeSignature};

/// Descriptive chart fields, created once at load and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ChartMetadata {
    pub title: String,
    pub artist: String,
    pub charter: String,
    pub difficulty: String,
    pub level: i64,
    pub base_bpm: f64,
    pub time_signature: TimeSignature,
    /// Offset into the song used for previews on a select screen.
    pub preview_offset: f64,
    pub background: String,
    pub cover: String,
    /// Resolved by the loader; `None` means the session runs silent.
    pub audio_path: Option<PathBuf>,
    pub lane_count: usize,
}

/// A tempo change as authored in the document. The timeline is rebuilt from
/// this list, and saving re-emits it untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub beat: BeatFraction,
    pub bpm: f64,
}

/// A type-code-1 row: the song audio or an extra keysound scheduled at a
/// beat. Kept separate from playable notes so saving does not drop it.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub beat: BeatFraction,
    pub sound: String,
    pub volume: f64,
}

/// Auxiliary automation rows. The engine does not interpret them; they ride
/// along for the round trip and for plugins that do.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectEvent {
    pub beat: BeatFraction,
    pub kind: String,
    pub params: Value,
}

/// The loaded chart: metadata, time-sorted notes, tempo events and the
/// timeline built from them, plus everything the parser did not recognize,
/// preserved verbatim.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    pub metadata: ChartMetadata,
    pub notes: Vec<Note>,
    pub tempo_events: Vec<TempoEvent>,
    pub sound_events: Vec<SoundEvent>,
    pub effect_events: Vec<EffectEvent>,
    pub timeline: TempoTimeline,
    /// Unrecognized top-level document keys.
    pub extra: Map<String, Value>,
    /// Unrecognized keys inside the `meta` section.
    pub meta_extra: Map<String, Value>,
    /// Unrecognized keys inside `meta.song`.
    pub song_extra: Map<String, Value>,
}

impl Chart {
    /// Recomputes every note's resolved time from the timeline. Must run
    /// after load and after any tempo or note mutation; resolved times are
    /// never authored.
    pub fn resolve_note_times(&mut self) {
        for note in &mut self.notes {
            note.time = self.timeline.beat_to_time(note.beat.as_beats());
            note.end_time = note.end_beat.map(|b| self.timeline.beat_to_time(b.as_beats()));
        }
    }

    /// Stable sort by resolved time, preserving document order for ties so
    /// "lowest index first" stays meaningful.
    pub fn sort_notes_by_time(&mut self) {
        self.notes.sort_by(|a, b| {
            a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    pub fn clear_judgments(&mut self) {
        for note in &mut self.notes {
            note.clear_judgments();
        }
    }
}
