//! The fixed message-passing surface consumed by the plugin collaborator.
//!
//! Plugins never touch live engine objects: they send a `Command` or a
//! `Query` through their host, which checks the sender's granted
//! capabilities against `required_capability` before dispatching. The engine
//! validates indices and values but deliberately does not enforce the
//! permission model itself.

use bitflags::bitflags;
use log::{info, warn};
use thiserror::Error;

use crate::game::gameplay::{PlaySession, SessionState};
use crate::game::judgment::JudgeTier;
use crate::game::note::{BeatFraction, Note, NoteKind};

bitflags! {
    /// Capability allow-list entries a host grants to a plugin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capability: u32 {
        const CHART_READ = 1 << 0;
        const CHART_MODIFY = 1 << 1;
        const PLAYBACK_CONTROL = 1 << 2;
        const SCORE_MODIFY = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNote {
        beat: BeatFraction,
        lane: usize,
        kind: NoteKind,
        end_beat: Option<BeatFraction>,
    },
    RemoveNote {
        index: usize,
    },
    MoveNote {
        index: usize,
        beat: BeatFraction,
        lane: usize,
    },
    AddTempoCheckpoint {
        beat: BeatFraction,
        bpm: f64,
    },
    Pause,
    Resume,
    Restart,
    SetScore(u64),
    SetCombo(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    NoteCount,
    Note { index: usize },
    State,
    Score,
    Combo,
    Accuracy,
}

/// Read-only snapshot of one note, so plugins never hold references into the
/// chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteView {
    pub beat: BeatFraction,
    pub lane: usize,
    pub kind: NoteKind,
    pub end_beat: Option<BeatFraction>,
    pub time: f64,
    pub judged: Option<JudgeTier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryReply {
    NoteCount(usize),
    Note(NoteView),
    State(SessionState),
    Score(u64),
    Combo(u32),
    Accuracy(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("note index {0} out of range")]
    NoteIndex(usize),
    #[error("lane {lane} outside 0..{lanes}")]
    Lane { lane: usize, lanes: usize },
    #[error("hold end beat must come after its start beat")]
    InvalidHold,
    #[error("tempo checkpoint rejected: {0}")]
    Tempo(#[from] crate::error::TempoError),
}

/// The capability a host must have granted before forwarding a command.
pub const fn required_capability(command: &Command) -> Capability {
    match command {
        Command::AddNote { .. }
        | Command::RemoveNote { .. }
        | Command::MoveNote { .. }
        | Command::AddTempoCheckpoint { .. } => Capability::CHART_MODIFY,
        Command::Pause | Command::Resume | Command::Restart => Capability::PLAYBACK_CONTROL,
        Command::SetScore(_) | Command::SetCombo(_) => Capability::SCORE_MODIFY,
    }
}

pub const fn required_query_capability(query: &Query) -> Capability {
    match query {
        Query::NoteCount | Query::Note { .. } => Capability::CHART_READ,
        Query::State | Query::Score | Query::Combo | Query::Accuracy => Capability::empty(),
    }
}

/// Applies a command to the session. Bad indices and values come back as
/// errors without touching any state; they can never abort a session.
pub fn execute(session: &mut PlaySession, command: Command) -> Result<(), CommandError> {
    match command {
        Command::AddNote { beat, lane, kind, end_beat } => {
            let lanes = session.chart.metadata.lane_count;
            if lane >= lanes {
                warn!("plugin note rejected: lane {lane} outside 0..{lanes}");
                return Err(CommandError::Lane { lane, lanes });
            }
            if kind == NoteKind::Hold
                && !end_beat.is_some_and(|e| e.as_beats() > beat.as_beats())
            {
                return Err(CommandError::InvalidHold);
            }
            let mut note = Note::new(beat, lane, kind);
            note.end_beat = end_beat;
            session.interrupt_active_holds();
            session.chart.notes.push(note);
            session.rebuild_note_indexes();
            info!("plugin added a {kind:?} note on lane {lane}");
            Ok(())
        }
        Command::RemoveNote { index } => {
            if index >= session.chart.notes.len() {
                warn!("plugin remove rejected: note index {index} out of range");
                return Err(CommandError::NoteIndex(index));
            }
            session.interrupt_active_holds();
            session.chart.notes.remove(index);
            session.rebuild_note_indexes();
            Ok(())
        }
        Command::MoveNote { index, beat, lane } => {
            let lanes = session.chart.metadata.lane_count;
            if index >= session.chart.notes.len() {
                return Err(CommandError::NoteIndex(index));
            }
            if lane >= lanes {
                return Err(CommandError::Lane { lane, lanes });
            }
            session.interrupt_active_holds();
            let note = &mut session.chart.notes[index];
            note.beat = beat;
            note.lane = lane;
            session.rebuild_note_indexes();
            Ok(())
        }
        Command::AddTempoCheckpoint { beat, bpm } => {
            session.chart.timeline.add_checkpoint(beat.as_beats(), bpm)?;
            session
                .chart
                .tempo_events
                .push(crate::game::chart::TempoEvent { beat, bpm });
            session.interrupt_active_holds();
            session.rebuild_note_indexes();
            Ok(())
        }
        Command::Pause => {
            session.pause();
            Ok(())
        }
        Command::Resume => {
            session.resume();
            Ok(())
        }
        Command::Restart => {
            session.restart();
            Ok(())
        }
        Command::SetScore(score) => {
            info!("plugin set score to {score}");
            session.score.score = score;
            Ok(())
        }
        Command::SetCombo(combo) => {
            info!("plugin set combo to {combo}");
            session.score.combo = combo;
            session.score.max_combo = session.score.max_combo.max(combo);
            Ok(())
        }
    }
}

pub fn query(session: &PlaySession, query: Query) -> Result<QueryReply, CommandError> {
    match query {
        Query::NoteCount => Ok(QueryReply::NoteCount(session.chart.notes.len())),
        Query::Note { index } => {
            let note = session
                .chart
                .notes
                .get(index)
                .ok_or(CommandError::NoteIndex(index))?;
            Ok(QueryReply::Note(NoteView {
                beat: note.beat,
                lane: note.lane,
                kind: note.kind,
                end_beat: note.end_beat,
                time: note.time,
                judged: note.result.map(|j| j.tier),
            }))
        }
        Query::State => Ok(QueryReply::State(session.state())),
        Query::Score => Ok(QueryReply::Score(session.score.score)),
        Query::Combo => Ok(QueryReply::Combo(session.score.combo)),
        Query::Accuracy => Ok(QueryReply::Accuracy(session.score.accuracy())),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Capability, Command, CommandError, Query, QueryReply, execute, query,
        required_capability, required_query_capability,
    };
    use crate::audio::NullAudio;
    use crate::config::Config;
    use crate::game::chart::Chart;
    use crate::game::gameplay::{PlaySession, SessionState};
    use crate::game::note::{BeatFraction, Note, NoteKind};
    use crate::game::timing::{TempoTimeline, TimeSignature};

    fn session() -> PlaySession {
        let mut chart = Chart::default();
        chart.metadata.lane_count = 4;
        chart.metadata.base_bpm = 120.0;
        chart.timeline = TempoTimeline::new(120.0, TimeSignature::default());
        chart
            .notes
            .push(Note::new(BeatFraction::whole(4), 0, NoteKind::Tap));
        PlaySession::new(chart, &Config::default(), Box::new(NullAudio)).unwrap()
    }

    #[test]
    fn capabilities_map_by_concern() {
        let add = Command::AddNote {
            beat: BeatFraction::whole(1),
            lane: 0,
            kind: NoteKind::Tap,
            end_beat: None,
        };
        assert_eq!(required_capability(&add), Capability::CHART_MODIFY);
        assert_eq!(required_capability(&Command::Pause), Capability::PLAYBACK_CONTROL);
        assert_eq!(required_capability(&Command::SetScore(1)), Capability::SCORE_MODIFY);
        assert_eq!(
            required_query_capability(&Query::Note { index: 0 }),
            Capability::CHART_READ
        );
        assert_eq!(required_query_capability(&Query::Score), Capability::empty());
    }

    #[test]
    fn add_note_resolves_time_and_reorders() {
        let mut s = session();
        execute(
            &mut s,
            Command::AddNote {
                beat: BeatFraction::whole(2),
                lane: 1,
                kind: NoteKind::Tap,
                end_beat: None,
            },
        )
        .unwrap();
        // The new note sorts before the original beat-4 tap.
        assert_eq!(s.chart().notes.len(), 2);
        assert!((s.chart().notes[0].time - 1.0).abs() < 1e-9);
        assert_eq!(s.chart().notes[0].lane, 1);
    }

    #[test]
    fn invalid_mutations_error_without_side_effects() {
        let mut s = session();
        let err = execute(
            &mut s,
            Command::AddNote {
                beat: BeatFraction::whole(2),
                lane: 9,
                kind: NoteKind::Tap,
                end_beat: None,
            },
        )
        .unwrap_err();
        assert_eq!(err, CommandError::Lane { lane: 9, lanes: 4 });

        let err = execute(&mut s, Command::RemoveNote { index: 5 }).unwrap_err();
        assert_eq!(err, CommandError::NoteIndex(5));

        let err = execute(
            &mut s,
            Command::AddNote {
                beat: BeatFraction::whole(2),
                lane: 0,
                kind: NoteKind::Hold,
                end_beat: Some(BeatFraction::whole(2)),
            },
        )
        .unwrap_err();
        assert_eq!(err, CommandError::InvalidHold);

        assert_eq!(s.chart().notes.len(), 1);
    }

    #[test]
    fn tempo_checkpoint_reshapes_note_times() {
        let mut s = session();
        assert!((s.chart().notes[0].time - 2.0).abs() < 1e-9);
        execute(
            &mut s,
            Command::AddTempoCheckpoint { beat: BeatFraction::whole(0), bpm: 240.0 },
        )
        .unwrap();
        assert!((s.chart().notes[0].time - 1.0).abs() < 1e-9);

        let err = execute(
            &mut s,
            Command::AddTempoCheckpoint { beat: BeatFraction::whole(2), bpm: -10.0 },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Tempo(_)));
    }

    #[test]
    fn playback_and_score_commands_round_trip_through_queries() {
        let mut s = session();
        s.start();
        execute(&mut s, Command::Pause).unwrap();
        assert_eq!(query(&s, Query::State).unwrap(), QueryReply::State(SessionState::Paused));
        execute(&mut s, Command::Resume).unwrap();

        execute(&mut s, Command::SetScore(4200)).unwrap();
        execute(&mut s, Command::SetCombo(17)).unwrap();
        assert_eq!(query(&s, Query::Score).unwrap(), QueryReply::Score(4200));
        assert_eq!(query(&s, Query::Combo).unwrap(), QueryReply::Combo(17));
        assert_eq!(query(&s, Query::NoteCount).unwrap(), QueryReply::NoteCount(1));
        assert!(matches!(query(&s, Query::Note { index: 0 }), Ok(QueryReply::Note(_))));
        assert_eq!(
            query(&s, Query::Note { index: 3 }),
            Err(CommandError::NoteIndex(3))
        );
    }
}
