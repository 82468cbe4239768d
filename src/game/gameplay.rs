use log::{debug, info, warn};

use crate::audio::{AudioControl, FallbackAudio};
use crate::config::Config;
use crate::error::SessionError;
use crate::event::GameEvent;
use crate::game::chart::Chart;
use crate::game::judgment::{JudgeTier, Judgment, ScoreState};
use crate::game::note::NoteKind;
use crate::game::timing::GameClock;
use crate::game::timing_windows::JudgeWindows;

pub const MAX_LANES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Playing,
    Paused,
    Finished,
}

/// A hold whose head was hit and whose lane is still pressed.
#[derive(Debug, Clone, Copy)]
struct ActiveHold {
    note_index: usize,
    end_time: f64,
}

/// One play-through of a chart: the authoritative game clock, the score, the
/// per-note judgment state, and the cursors that keep per-frame work away
/// from the full note list.
///
/// The host drives it synchronously: `update(dt)` once per frame plus
/// `press`/`release` for lane input, then `drain_events()` for whatever the
/// UI needs to show. There is no internal threading; determinism falls out
/// of the fact that the same call sequence always produces the same state.
pub struct PlaySession {
    pub(crate) chart: Chart,
    pub(crate) score: ScoreState,
    windows: JudgeWindows,
    calibration_offset_ms: f64,
    clock: GameClock,
    state: SessionState,
    audio: FallbackAudio<Box<dyn AudioControl>>,
    master_volume: f64,

    /// Forward-only cursor over the time-sorted note list; everything before
    /// it is judged or inside the acceptance horizon.
    miss_cursor: usize,
    /// Per-lane note indexes in time order, with forward-only cursors so a
    /// press never rescans judged prefix.
    lane_notes: [Vec<usize>; MAX_LANES],
    lane_cursor: [usize; MAX_LANES],
    lane_held: [bool; MAX_LANES],
    active_holds: [Option<ActiveHold>; MAX_LANES],
    /// Judgments still owed before the session can complete (hold tails
    /// count separately from their heads).
    pending_judgments: usize,
    events: Vec<GameEvent>,
}

impl PlaySession {
    /// Builds a session over a loaded chart. Fails only on the one fatal
    /// condition: a timeline that cannot map beats to time at all.
    pub fn new(
        chart: Chart,
        config: &Config,
        audio: Box<dyn AudioControl>,
    ) -> Result<Self, SessionError> {
        if !chart.timeline.is_usable() {
            return Err(SessionError::UnusableTimeline);
        }
        let mut clock = GameClock::new();
        clock.set_time_scale(config.time_scale);

        let mut session = Self {
            chart,
            score: ScoreState::new(),
            windows: config.windows,
            calibration_offset_ms: config.calibration_offset_ms,
            clock,
            state: SessionState::Ready,
            audio: FallbackAudio::new(audio),
            master_volume: f64::from(config.master_volume) / 100.0,
            miss_cursor: 0,
            lane_notes: std::array::from_fn(|_| Vec::new()),
            lane_cursor: [0; MAX_LANES],
            lane_held: [false; MAX_LANES],
            active_holds: [None; MAX_LANES],
            pending_judgments: 0,
            events: Vec::new(),
        };
        session.rebuild_note_indexes();
        Ok(session)
    }

    #[inline(always)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline(always)]
    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    #[inline(always)]
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    #[inline(always)]
    pub fn game_time(&self) -> f64 {
        self.clock.game_time()
    }

    /// Hands the ordered event backlog to the caller; delivery order matches
    /// the order judgments and transitions happened.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
        let _ = self.audio.set_volume(self.master_volume);
    }

    // --- Session control --------------------------------------------------

    pub fn start(&mut self) {
        if self.state != SessionState::Ready {
            warn!("start ignored in state {:?}", self.state);
            return;
        }
        let _ = self.audio.set_volume(self.master_volume);
        let _ = self.audio.seek(0.0);
        let _ = self.audio.play();
        info!(
            "session started: '{}', {} notes",
            self.chart.metadata.title,
            self.chart.notes.len()
        );
        self.events.push(GameEvent::GameStarted);
        self.set_state(SessionState::Playing);
    }

    /// Freezes the clock; paused wall time is never counted back in on
    /// resume.
    pub fn pause(&mut self) {
        if self.state != SessionState::Playing {
            debug!("pause ignored in state {:?}", self.state);
            return;
        }
        self.clock.pause();
        let _ = self.audio.pause();
        self.set_state(SessionState::Paused);
    }

    pub fn resume(&mut self) {
        if self.state != SessionState::Paused {
            debug!("resume ignored in state {:?}", self.state);
            return;
        }
        self.clock.resume();
        let _ = self.audio.resume();
        self.set_state(SessionState::Playing);
    }

    /// Fully resets score, per-note judgments, cursors and clock, then
    /// starts again. Nothing leaks from the previous run.
    pub fn restart(&mut self) {
        info!("session restarting");
        let _ = self.audio.stop();
        self.chart.clear_judgments();
        self.score.reset();
        self.clock.reset();
        self.miss_cursor = 0;
        self.lane_cursor = [0; MAX_LANES];
        self.lane_held = [false; MAX_LANES];
        self.active_holds = [None; MAX_LANES];
        self.recount_pending();
        self.set_state(SessionState::Ready);
        self.start();
    }

    pub fn finish(&mut self) {
        if self.state == SessionState::Finished {
            return;
        }
        let _ = self.audio.stop();
        let accuracy = self.score.accuracy();
        info!(
            "session finished: score {}, max combo {}, accuracy {accuracy:.2}%",
            self.score.score, self.score.max_combo
        );
        self.events.push(GameEvent::GameEnded {
            score: self.score.score,
            max_combo: self.score.max_combo,
            accuracy,
        });
        self.set_state(SessionState::Finished);
    }

    fn set_state(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        debug!("session state {from:?} -> {to:?}");
        self.events.push(GameEvent::StateChanged { from, to });
    }

    // --- Per-frame update -------------------------------------------------

    /// Advances the game clock and settles everything time can settle on its
    /// own: expired notes become Misses, engaged holds complete at their end
    /// beat, and the session finishes once every judgment owed is in.
    pub fn update(&mut self, dt: f64) {
        self.clock.update(dt);
        if self.state != SessionState::Playing {
            return;
        }
        let now = self.clock.game_time();
        self.sweep_expired_notes(now);
        self.settle_active_holds(now);
        if self.pending_judgments == 0 {
            self.finish();
        }
    }

    /// Force-misses every unjudged note whose time trails the clock by more
    /// than the widest window. The cursor never moves backwards, so each
    /// note is visited a bounded number of times over a session.
    fn sweep_expired_notes(&mut self, now: f64) {
        let horizon_s = self.windows.widest_ms() / 1000.0;
        while self.miss_cursor < self.chart.notes.len() {
            let i = self.miss_cursor;
            if self.chart.notes[i].is_judged() {
                self.miss_cursor += 1;
                continue;
            }
            let note_time = self.chart.notes[i].time;
            if now - note_time <= horizon_s {
                break;
            }
            info!(
                "auto-miss: note {i} on lane {} scheduled at {note_time:.3}s",
                self.chart.notes[i].lane
            );
            self.deliver_head(i, JudgeTier::Miss, (now - note_time) * 1000.0);
            self.miss_cursor += 1;
        }
    }

    fn settle_active_holds(&mut self, now: f64) {
        for lane in 0..MAX_LANES {
            let Some(hold) = self.active_holds[lane] else { continue };
            if now >= hold.end_time {
                self.active_holds[lane] = None;
                self.settle_tail(hold.note_index, JudgeTier::Best, 0.0);
            }
        }
    }

    // --- Input ------------------------------------------------------------

    /// Routes a lane press to the temporally nearest unjudged note on that
    /// lane. Only notes within the widest window are eligible; ties go to
    /// the lowest note index. Presses that match nothing are ghost taps and
    /// judge nothing.
    pub fn press(&mut self, lane: usize) {
        if self.state != SessionState::Playing {
            return;
        }
        if lane >= self.chart.metadata.lane_count {
            warn!(
                "press on lane {lane} ignored: chart has {} lanes",
                self.chart.metadata.lane_count
            );
            return;
        }
        self.lane_held[lane] = true;

        let now = self.clock.game_time();
        let horizon_s = self.windows.widest_ms() / 1000.0;
        let mut nearest: Option<(usize, f64)> = None;
        let mut idx = self.lane_cursor[lane];
        while idx < self.lane_notes[lane].len() {
            let note_index = self.lane_notes[lane][idx];
            let note = &self.chart.notes[note_index];
            if note.is_judged() {
                if idx == self.lane_cursor[lane] {
                    self.lane_cursor[lane] += 1;
                }
                idx += 1;
                continue;
            }
            if note.time > now + horizon_s {
                break;
            }
            let distance = (note.time - now).abs();
            if distance <= horizon_s && nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((note_index, distance));
            }
            idx += 1;
        }

        match nearest {
            Some((note_index, _)) => {
                self.try_judge_head(note_index, now);
            }
            None => debug!("ghost press on lane {lane} at {now:.3}s"),
        }
    }

    /// Marks the lane released. An engaged hold released before its end beat
    /// forfeits its tail immediately; the head judgment stands.
    pub fn release(&mut self, lane: usize) {
        if lane >= self.chart.metadata.lane_count {
            return;
        }
        self.lane_held[lane] = false;
        if self.state != SessionState::Playing {
            return;
        }
        if let Some(hold) = self.active_holds[lane].take() {
            let now = self.clock.game_time();
            if now < hold.end_time {
                info!("hold on lane {lane} released early; tail missed");
                self.settle_tail(hold.note_index, JudgeTier::Miss, (now - hold.end_time) * 1000.0);
            } else {
                self.settle_tail(hold.note_index, JudgeTier::Best, 0.0);
            }
        }
    }

    // --- Judgment ---------------------------------------------------------

    /// Judges one note against one input time. A diff inside a window grades
    /// it; beyond every window it is a Miss only if the note has already
    /// expired, otherwise no judgment is produced and the caller retries on
    /// a later frame. A second attempt on a judged note is a logged no-op.
    fn try_judge_head(&mut self, note_index: usize, input_time: f64) -> Option<JudgeTier> {
        if self.chart.notes[note_index].is_judged() {
            debug!("note {note_index} already judged; re-entry ignored");
            return None;
        }
        let note_time = self.chart.notes[note_index].time;
        let offset_ms = (input_time - note_time) * 1000.0 - self.calibration_offset_ms;
        match self.windows.classify(offset_ms) {
            Some(tier) => {
                self.deliver_head(note_index, tier, offset_ms);
                Some(tier)
            }
            None if offset_ms > self.windows.widest_ms() => {
                self.deliver_head(note_index, JudgeTier::Miss, offset_ms);
                Some(JudgeTier::Miss)
            }
            None => None,
        }
    }

    fn deliver_head(&mut self, note_index: usize, tier: JudgeTier, offset_ms: f64) {
        let lane = self.chart.notes[note_index].lane;
        let points = self.score.apply(tier);
        let judgment = Judgment { tier, offset_ms, points, combo: self.score.combo, lane };
        self.chart.notes[note_index].result = Some(judgment);
        self.pending_judgments -= 1;
        self.push_judgment_events(note_index, judgment);

        if self.chart.notes[note_index].kind == NoteKind::Hold {
            if tier == JudgeTier::Miss {
                // A missed head forfeits the tail outright.
                self.settle_tail(note_index, JudgeTier::Miss, offset_ms);
            } else {
                let end_time = self.chart.notes[note_index]
                    .end_time
                    .unwrap_or(self.chart.notes[note_index].time);
                if let Some(old) = self.active_holds[lane].replace(ActiveHold { note_index, end_time }) {
                    warn!("overlapping hold on lane {lane}; earlier tail forfeited");
                    self.settle_tail(old.note_index, JudgeTier::Miss, 0.0);
                }
            }
        }
    }

    fn settle_tail(&mut self, note_index: usize, tier: JudgeTier, offset_ms: f64) {
        if self.chart.notes[note_index].tail_result.is_some() {
            debug!("hold tail {note_index} already settled; re-entry ignored");
            return;
        }
        let lane = self.chart.notes[note_index].lane;
        let points = self.score.apply(tier);
        let judgment = Judgment { tier, offset_ms, points, combo: self.score.combo, lane };
        self.chart.notes[note_index].tail_result = Some(judgment);
        self.pending_judgments -= 1;
        self.push_judgment_events(note_index, judgment);
    }

    fn push_judgment_events(&mut self, note_index: usize, judgment: Judgment) {
        if judgment.tier == JudgeTier::Miss {
            self.events.push(GameEvent::NoteMiss { note_index, judgment });
        } else {
            self.events.push(GameEvent::NoteHit { note_index, judgment });
        }
        self.events.push(GameEvent::ComboChanged { combo: self.score.combo });
        self.events.push(GameEvent::ScoreChanged { score: self.score.score });
    }

    // --- Index maintenance ------------------------------------------------

    /// Re-derives every cache that depends on note content: resolved times,
    /// time order, per-lane indexes, cursors and the judgment debt. Called
    /// at construction and after any external chart mutation.
    pub(crate) fn rebuild_note_indexes(&mut self) {
        self.chart.resolve_note_times();
        self.chart.sort_notes_by_time();
        for lane in &mut self.lane_notes {
            lane.clear();
        }
        for (i, note) in self.chart.notes.iter().enumerate() {
            if note.lane < MAX_LANES {
                self.lane_notes[note.lane].push(i);
            }
        }
        self.lane_cursor = [0; MAX_LANES];
        self.miss_cursor = 0;
        self.recount_pending();
    }

    /// Chart mutation invalidates the note indexes an engaged hold points
    /// at, so the hold cannot survive it; the tail is forfeited with a
    /// warning before the caller rebuilds.
    pub(crate) fn interrupt_active_holds(&mut self) {
        for lane in 0..MAX_LANES {
            if let Some(hold) = self.active_holds[lane].take() {
                warn!("active hold on lane {lane} interrupted by chart mutation; tail forfeited");
                self.settle_tail(hold.note_index, JudgeTier::Miss, 0.0);
            }
        }
    }

    fn recount_pending(&mut self) {
        self.pending_judgments = self
            .chart
            .notes
            .iter()
            .map(|n| {
                let mut slots = n.judgment_slots();
                if n.result.is_some() {
                    slots -= 1;
                }
                if n.tail_result.is_some() {
                    slots = slots.saturating_sub(1);
                }
                slots
            })
            .sum();
    }
}
