use std::cell::RefCell;
use std::cmp::Ordering;

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::TempoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { numerator: 4, denominator: 4 }
    }
}

/// A BPM change taking effect at a beat position. `time` is resolved by the
/// timeline and never authored directly.
#[derive(Debug, Clone, Copy)]
pub struct TempoCheckpoint {
    pub beat: f64,
    pub bpm: f64,
    pub time: f64,
}

/// Maps beat positions to absolute seconds and back under piecewise-constant
/// tempo segments. With no checkpoints the constant-tempo formula
/// `beat * 60 / bpm` applies.
///
/// Conversions are memoized by the exact bit pattern of the query, so the
/// per-note lookups done on every recalculation stay cheap. Both caches are
/// dropped whenever a checkpoint is inserted, since a new checkpoint shifts
/// the time origin of every later segment.
#[derive(Debug, Clone, Default)]
pub struct TempoTimeline {
    base_bpm: f64,
    time_signature: TimeSignature,
    checkpoints: Vec<TempoCheckpoint>,
    beat_to_time_cache: RefCell<FxHashMap<u64, f64>>,
    time_to_beat_cache: RefCell<FxHashMap<u64, f64>>,
}

impl TempoTimeline {
    pub fn new(base_bpm: f64, time_signature: TimeSignature) -> Self {
        Self {
            base_bpm,
            time_signature,
            checkpoints: Vec::new(),
            beat_to_time_cache: RefCell::new(FxHashMap::default()),
            time_to_beat_cache: RefCell::new(FxHashMap::default()),
        }
    }

    #[inline(always)]
    pub fn base_bpm(&self) -> f64 {
        self.base_bpm
    }

    #[inline(always)]
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    #[inline(always)]
    pub fn checkpoints(&self) -> &[TempoCheckpoint] {
        &self.checkpoints
    }

    /// The mapping is defined as long as there is at least one checkpoint or
    /// a positive base tempo. A session must refuse to start otherwise.
    pub fn is_usable(&self) -> bool {
        !self.checkpoints.is_empty() || (self.base_bpm.is_finite() && self.base_bpm > 0.0)
    }

    /// Inserts a checkpoint and recomputes every resolved time from the
    /// origin. Partial updates are unsound here: an insertion shifts the time
    /// of every later checkpoint, so the whole list is replayed.
    pub fn add_checkpoint(&mut self, beat: f64, bpm: f64) -> Result<(), TempoError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(TempoError::InvalidBpm(bpm));
        }
        self.checkpoints.push(TempoCheckpoint { beat, bpm, time: 0.0 });
        self.rebuild_checkpoint_times();
        debug!(
            "tempo checkpoint added: beat {beat:.3} -> {bpm} bpm ({} total)",
            self.checkpoints.len()
        );
        Ok(())
    }

    fn rebuild_checkpoint_times(&mut self) {
        self.checkpoints
            .sort_by(|a, b| a.beat.partial_cmp(&b.beat).unwrap_or(Ordering::Equal));

        let mut current_beat = 0.0;
        let mut current_time = 0.0;
        let mut bpm = self.base_bpm;
        for cp in &mut self.checkpoints {
            current_time += (cp.beat - current_beat) * 60.0 / bpm;
            current_beat = cp.beat;
            cp.time = current_time;
            bpm = cp.bpm;
        }

        self.beat_to_time_cache.borrow_mut().clear();
        self.time_to_beat_cache.borrow_mut().clear();
    }

    /// Absolute time in seconds at `beat`, integrating each tempo segment as
    /// `segment_beats * 60 / segment_bpm`.
    pub fn beat_to_time(&self, beat: f64) -> f64 {
        if let Some(&t) = self.beat_to_time_cache.borrow().get(&beat.to_bits()) {
            return t;
        }
        let time = if self.checkpoints.is_empty() {
            beat * 60.0 / self.base_bpm
        } else {
            let mut current_beat = 0.0;
            let mut current_time = 0.0;
            let mut bpm = self.base_bpm;
            for cp in &self.checkpoints {
                if cp.beat > beat {
                    break;
                }
                current_time += (cp.beat - current_beat) * 60.0 / bpm;
                current_beat = cp.beat;
                bpm = cp.bpm;
            }
            current_time + (beat - current_beat) * 60.0 / bpm
        };
        self.beat_to_time_cache.borrow_mut().insert(beat.to_bits(), time);
        time
    }

    /// Inverse of `beat_to_time`, walking the same segments keyed by each
    /// checkpoint's resolved time.
    pub fn time_to_beat(&self, time: f64) -> f64 {
        if let Some(&b) = self.time_to_beat_cache.borrow().get(&time.to_bits()) {
            return b;
        }
        let beat = if self.checkpoints.is_empty() {
            time * self.base_bpm / 60.0
        } else {
            let mut current_beat = 0.0;
            let mut current_time = 0.0;
            let mut bpm = self.base_bpm;
            for cp in &self.checkpoints {
                if cp.time > time {
                    break;
                }
                current_beat = cp.beat;
                current_time = cp.time;
                bpm = cp.bpm;
            }
            current_beat + (time - current_time) * bpm / 60.0
        };
        self.time_to_beat_cache.borrow_mut().insert(time.to_bits(), beat);
        beat
    }

    /// BPM in effect at an absolute time.
    pub fn bpm_at(&self, time: f64) -> f64 {
        self.checkpoints
            .iter()
            .take_while(|cp| cp.time <= time)
            .last()
            .map_or(self.base_bpm, |cp| cp.bpm)
    }

    /// Position within the current measure in `[0, 1)`, using the time
    /// signature's beat count per measure.
    pub fn beat_phase(&self, time: f64) -> f64 {
        let beats_per_measure = f64::from(self.time_signature.numerator.max(1));
        let beat = self.time_to_beat(time);
        (beat % beats_per_measure) / beats_per_measure
    }
}

/// The session's authoritative timebase: accumulated wall-clock delta,
/// pause-aware and time-scaled. Polling the audio device position is
/// deliberately not part of this; the calibration offset reconciles
/// perceptible audio latency instead.
#[derive(Debug, Clone, Copy)]
pub struct GameClock {
    real_time: f64,
    game_time: f64,
    paused: bool,
    time_scale: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self { real_time: 0.0, game_time: 0.0, paused: false, time_scale: 1.0 }
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, dt: f64) {
        self.real_time += dt;
        if !self.paused {
            self.game_time += dt * self.time_scale;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[inline(always)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline(always)]
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    #[inline(always)]
    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    #[inline(always)]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Non-positive or non-finite scales are ignored; the clock keeps its
    /// current scale.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.time_scale = scale;
        } else {
            log::warn!("ignoring invalid time scale {scale}");
        }
    }

    pub fn seek(&mut self, time: f64) {
        self.game_time = time;
    }

    pub fn reset(&mut self) {
        let scale = self.time_scale;
        *self = Self::default();
        self.time_scale = scale;
    }
}
