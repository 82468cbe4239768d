use crate::game::gameplay::SessionState;
use crate::game::judgment::Judgment;

/// Outbound notifications for the UI collaborator. The session pushes these
/// onto an ordered queue as judgments and transitions happen, so the order a
/// consumer drains matches the order things occurred within a frame.
///
/// This is the typed replacement for string-keyed callback lists: a consumer
/// matches on the variant and gets a structurally checked payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    NoteHit { note_index: usize, judgment: Judgment },
    NoteMiss { note_index: usize, judgment: Judgment },
    ComboChanged { combo: u32 },
    ScoreChanged { score: u64 },
    GameStarted,
    GameEnded { score: u64, max_combo: u32, accuracy: f64 },
    StateChanged { from: SessionState, to: SessionState },
}
