use serde::{Deserialize, Serialize};

use crate::game::judgment::Judgment;

/// Rational beat position as authored in the chart document: whole beats plus
/// a proper fraction, serialized as a `[whole, numerator, denominator]` triple.
/// A bare `[whole]` is accepted the way older charts write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct BeatFraction {
    pub whole: u32,
    pub num: u32,
    pub den: u32,
}

impl BeatFraction {
    pub const fn new(whole: u32, num: u32, den: u32) -> Self {
        Self { whole, num, den }
    }

    pub const fn whole(whole: u32) -> Self {
        Self { whole, num: 0, den: 1 }
    }

    #[inline(always)]
    pub fn as_beats(self) -> f64 {
        f64::from(self.whole) + f64::from(self.num) / f64::from(self.den)
    }
}

impl TryFrom<Vec<i64>> for BeatFraction {
    type Error = String;

    fn try_from(raw: Vec<i64>) -> Result<Self, Self::Error> {
        let as_u32 = |v: i64, what: &str| -> Result<u32, String> {
            u32::try_from(v).map_err(|_| format!("beat {what} must be non-negative, got {v}"))
        };
        match raw.as_slice() {
            [whole] => Ok(Self::whole(as_u32(*whole, "count")?)),
            [whole, num, den] => {
                let den = as_u32(*den, "denominator")?;
                if den == 0 {
                    return Err("beat denominator must be non-zero".to_string());
                }
                Ok(Self::new(as_u32(*whole, "count")?, as_u32(*num, "numerator")?, den))
            }
            _ => Err(format!("beat triple must have 1 or 3 elements, got {}", raw.len())),
        }
    }
}

impl From<BeatFraction> for Vec<i64> {
    fn from(b: BeatFraction) -> Self {
        vec![i64::from(b.whole), i64::from(b.num), i64::from(b.den)]
    }
}

/// Playable note kinds and their chart type codes. Code 1 is not a note kind:
/// it marks a sound-cue row (see `chart::SoundEvent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Tap,
    Hold,
    Drag,
    Flick,
}

impl NoteKind {
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Tap),
            2 => Some(Self::Hold),
            3 => Some(Self::Drag),
            4 => Some(Self::Flick),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Tap => 0,
            Self::Hold => 2,
            Self::Drag => 3,
            Self::Flick => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Note {
    pub beat: BeatFraction,
    pub lane: usize,
    pub kind: NoteKind,
    pub end_beat: Option<BeatFraction>,
    /// Optional keysound reference, passed through to the audio collaborator.
    pub sound: Option<String>,
    pub volume: f64,
    /// Resolved against the tempo timeline at load and after any tempo or
    /// note mutation; never authored directly.
    pub time: f64,
    pub end_time: Option<f64>,
    /// Head judgment. `Some` means this note index has been judged and any
    /// further judgment attempt is a no-op.
    pub result: Option<Judgment>,
    /// Tail judgment for holds: settled when the hold ends, is released
    /// early, or the head is missed outright.
    pub tail_result: Option<Judgment>,
}

impl Note {
    pub fn new(beat: BeatFraction, lane: usize, kind: NoteKind) -> Self {
        Self {
            beat,
            lane,
            kind,
            end_beat: None,
            sound: None,
            volume: 1.0,
            time: 0.0,
            end_time: None,
            result: None,
            tail_result: None,
        }
    }

    #[inline(always)]
    pub fn is_judged(&self) -> bool {
        self.result.is_some()
    }

    /// Number of judgments this note must receive before the session can
    /// complete: holds settle a head and a tail, everything else one.
    #[inline(always)]
    pub fn judgment_slots(&self) -> usize {
        if self.kind == NoteKind::Hold { 2 } else { 1 }
    }

    pub fn clear_judgments(&mut self) {
        self.result = None;
        self.tail_result = None;
    }
}
