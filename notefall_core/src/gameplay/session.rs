use std::mem;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::audio::transport::AudioTransport;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::gameplay::events::GameplayEvent;
use crate::gameplay::judge::InputOutcome;
use crate::gameplay::result::{HitEvent, PlayResult};
use crate::gameplay::ruleset::{ruleset_for, Ruleset, VisibleNote};
use crate::gameplay::score::{ApplyResult, ScoreOptions, ScoreProcessor, ScoreState};
use crate::input::events::InputEvent;
use crate::input::InputQueue;
use crate::replay::{generate_autoplay, Replay, ReplayPlayer, ReplayRecorder};
use crate::time::TimingSource;
use crate::{Chart, LogicalTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    NotStarted,
    Playing,
    Paused,
    ResumeCountdown,
    Failed,
    Completed,
    Restarting,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Completed)
    }
}

/// Everything a restart throws away and rebuilds from the chart.
struct SessionCore {
    ruleset: Box<dyn Ruleset>,
    score: ScoreProcessor,
    clock: TimingSource,
    recorder: ReplayRecorder,
    player: Option<ReplayPlayer>,
    hits: Vec<HitEvent>,
    on_break: bool,
    last_input_time: LogicalTime,
}

impl SessionCore {
    fn build(
        chart: &Chart,
        config: &SessionConfig,
        transport: Option<Box<dyn AudioTransport>>,
        replay: Option<&Replay>,
    ) -> Result<Self, SessionError> {
        let mut ruleset = ruleset_for(chart.mode, config.judgment_table.clone());
        ruleset.initialize(chart)?;

        let player = replay
            .map(|r| ReplayPlayer::new(r, chart.lane_count()))
            .transpose()?;

        let score = ScoreProcessor::new(
            config.judgment_table.clone(),
            ScoreOptions {
                uncapped_health: config.uncapped_health,
                no_fail: config.modifiers.no_fail,
            },
        );
        let origin = -config.start_delay_ms;

        Ok(Self {
            ruleset,
            score,
            clock: TimingSource::new(transport, config.start_delay_ms),
            recorder: ReplayRecorder::new(origin, config.modifiers),
            player,
            hits: Vec::new(),
            on_break: false,
            last_input_time: origin,
        })
    }
}

/// One play of one chart: owns the clock, the ruleset, scoring and the
/// pause/restart/fail lifecycle. Driven by [`GameplaySession::update`] once per frame.
pub struct GameplaySession {
    chart: Chart,
    config: SessionConfig,
    replay: Option<Replay>,
    state: SessionState,
    core: SessionCore,
    input: InputQueue,
    events: Vec<GameplayEvent>,
    outcomes: Vec<InputOutcome>,
    pending_input: Vec<InputEvent>,
    pause_warned: bool,
    resume_elapsed_ms: f64,
    restart_key: bool,
    restart_held_ms: f64,
}

impl GameplaySession {
    /// Live session. With the autoplay modifier set, a generated perfect
    /// replay drives input instead of the queue.
    pub fn new(
        chart: Chart,
        config: SessionConfig,
        transport: Option<Box<dyn AudioTransport>>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        chart.validate()?;
        let replay = config
            .modifiers
            .autoplay
            .then(|| generate_autoplay(&chart, -config.start_delay_ms, config.modifiers));
        Self::build(chart, config, transport, replay)
    }

    /// Session driven by a recorded replay. The replay's modifiers replace
    /// the ones in `config`.
    pub fn with_replay(
        chart: Chart,
        mut config: SessionConfig,
        transport: Option<Box<dyn AudioTransport>>,
        replay: Replay,
    ) -> Result<Self, SessionError> {
        config.modifiers = replay.modifiers;
        config.validate()?;
        chart.validate()?;
        Self::build(chart, config, transport, Some(replay))
    }

    fn build(
        chart: Chart,
        config: SessionConfig,
        transport: Option<Box<dyn AudioTransport>>,
        replay: Option<Replay>,
    ) -> Result<Self, SessionError> {
        let core = SessionCore::build(&chart, &config, transport, replay.as_ref())?;
        log::info!(
            "session ready: {:?}, {} notes, modifiers {:?}",
            chart.mode,
            chart.notes.len(),
            config.modifiers
        );
        Ok(Self {
            chart,
            config,
            replay,
            state: SessionState::NotStarted,
            core,
            input: InputQueue::new(),
            events: Vec::new(),
            outcomes: Vec::new(),
            pending_input: Vec::new(),
            pause_warned: false,
            resume_elapsed_ms: 0.0,
            restart_key: false,
            restart_held_ms: 0.0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn score(&self) -> &ScoreState {
        self.core.score.state()
    }

    pub fn ruleset(&self) -> &dyn Ruleset {
        self.core.ruleset.as_ref()
    }

    pub fn current_time(&self) -> LogicalTime {
        self.core.clock.current_time()
    }

    pub fn is_on_break(&self) -> bool {
        self.core.on_break
    }

    pub fn is_replay(&self) -> bool {
        self.core.player.is_some()
    }

    /// Restart hold progress in `[0, 1]` for the fade-out overlay.
    pub fn restart_progress(&self) -> f64 {
        if self.config.restart_hold_ms <= 0.0 {
            return if self.restart_key { 1.0 } else { 0.0 };
        }
        (self.restart_held_ms / self.config.restart_hold_ms).min(1.0)
    }

    /// Sender for a device thread; events carry their own logical timestamps.
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.input.sender()
    }

    pub fn push_input(&self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameplayEvent> {
        mem::take(&mut self.events)
    }

    pub fn draw(&self) -> Vec<VisibleNote> {
        self.core.ruleset.draw(self.current_time())
    }

    /// Key log of everything judged so far in the current attempt.
    pub fn recorded_replay(&self) -> &Replay {
        self.core.recorder.replay()
    }

    pub fn result(&self) -> PlayResult {
        PlayResult::new(
            self.core.score.state(),
            self.config.modifiers,
            self.core.ruleset.pool().len(),
            self.core.hits.clone(),
        )
    }

    /// Starts the clock. Only valid once, from `NotStarted`.
    pub fn initialize(&mut self) {
        if self.state != SessionState::NotStarted {
            return;
        }
        self.core.clock.start();
        self.transition(SessionState::Playing);
        self.update_break(self.current_time());
    }

    /// Advances the session by `real_dt_ms` of wall-clock time.
    pub fn update(&mut self, real_dt_ms: f64) {
        match self.state {
            SessionState::Playing => {}
            SessionState::ResumeCountdown => {
                self.discard_input();
                self.resume_elapsed_ms += real_dt_ms;
                if self.resume_elapsed_ms >= self.config.resume_delay_ms {
                    self.core.clock.resume();
                    self.transition(SessionState::Playing);
                }
                return;
            }
            _ => {
                self.discard_input();
                return;
            }
        }

        if self.restart_key {
            self.restart_held_ms += real_dt_ms;
            if self.restart_held_ms >= self.config.restart_hold_ms {
                if let Err(e) = self.restart() {
                    log::error!("restart failed: {e}");
                    self.fail();
                }
                return;
            }
        }

        self.core.clock.update(real_dt_ms);
        let now = self.current_time();

        self.collect_input(now);
        for event in mem::take(&mut self.pending_input) {
            // Judge exactly what the replay will contain: key-state transitions only.
            if !self.core.recorder.record(&event) {
                let state = if event.pressed { "down" } else { "up" };
                log::trace!("lane {} already {state} at {}ms", event.lane, event.time);
                continue;
            }
            self.core.ruleset.handle_input(event, &mut self.outcomes);
            self.apply_outcomes();
        }

        self.core.ruleset.update(now, &mut self.outcomes);
        self.apply_outcomes();

        if self.core.score.is_failed() {
            self.fail();
            return;
        }
        if self.core.ruleset.pool().is_complete() {
            log::info!("chart complete at {now}ms");
            self.transition(SessionState::Completed);
            self.events.push(GameplayEvent::Completed);
            return;
        }
        self.update_break(now);
    }

    /// Toggles pause. Playing pauses, a second toggle starts the resume countdown.
    pub fn request_pause(&mut self) {
        match self.state {
            SessionState::Playing if self.config.modifiers.no_pause => {
                if self.pause_warned {
                    log::info!("second pause request under NoPause, failing");
                    self.fail();
                } else {
                    log::warn!("pausing is disabled; pause again to give up");
                    self.pause_warned = true;
                    self.events.push(GameplayEvent::PauseBlocked);
                }
            }
            SessionState::Playing => {
                self.core.clock.pause();
                self.restart_held_ms = 0.0;
                self.transition(SessionState::Paused);
            }
            SessionState::Paused => {
                self.resume_elapsed_ms = 0.0;
                self.transition(SessionState::ResumeCountdown);
            }
            _ => {}
        }
    }

    pub fn focus_lost(&mut self) {
        if self.config.modifiers.no_pause {
            return;
        }
        match self.state {
            SessionState::Playing => self.request_pause(),
            SessionState::ResumeCountdown => self.transition(SessionState::Paused),
            _ => {}
        }
    }

    /// Reports the restart key state. Letting go before the threshold resets the hold.
    pub fn set_restart_key(&mut self, down: bool) {
        self.restart_key = down;
        if !down {
            self.restart_held_ms = 0.0;
        }
    }

    /// Jumps to just before the next note while on a break. Returns whether a skip happened.
    pub fn request_skip(&mut self) -> bool {
        if self.state != SessionState::Playing || !self.core.on_break {
            return false;
        }
        let Some(next) = self.core.ruleset.pool().peek_next() else {
            return false;
        };
        let target = next.start - self.config.start_delay_ms + self.config.device_latency_ms;
        if target <= self.current_time() {
            return false;
        }

        self.core.clock.seek(target);
        if let Some(player) = self.core.player.as_mut() {
            player.seek(target);
        }
        self.core.last_input_time = self.core.last_input_time.max(target);
        log::debug!("skipped to {target}ms");
        self.events.push(GameplayEvent::Skipped { to: target });
        self.update_break(target);
        true
    }

    pub fn force_fail(&mut self) {
        if matches!(
            self.state,
            SessionState::Playing | SessionState::Paused | SessionState::ResumeCountdown
        ) {
            self.fail();
        }
    }

    /// Rebuilds the session core from the chart and starts playing again.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Restarting);

        self.core.ruleset.destroy();
        let transport = self.core.clock.take_transport();
        self.core = SessionCore::build(&self.chart, &self.config, transport, self.replay.as_ref())?;
        self.input.drain();
        self.pause_warned = false;
        self.restart_key = false;
        self.restart_held_ms = 0.0;
        self.resume_elapsed_ms = 0.0;

        log::info!("session restarted");
        self.events.push(GameplayEvent::Restarted);
        self.core.clock.start();
        self.transition(SessionState::Playing);
        self.update_break(self.current_time());
        Ok(())
    }

    /// Keys pressed while gameplay is halted are dropped.
    fn discard_input(&mut self) {
        let dropped = self.input.drain().len();
        if dropped > 0 {
            log::debug!("dropped {dropped} inputs while {:?}", self.state);
        }
    }

    fn collect_input(&mut self, now: LogicalTime) {
        let lane_count = self.chart.lane_count();
        let live = self.input.drain();

        match self.core.player.as_mut() {
            Some(player) => {
                if !live.is_empty() {
                    log::debug!("ignoring {} live inputs during replay", live.len());
                }
                player.poll(now, &mut self.pending_input);
            }
            None => {
                for event in live {
                    if event.lane >= lane_count {
                        log::debug!("input on lane {} ignored", event.lane);
                        continue;
                    }
                    // Keep times monotonic and never ahead of the clock.
                    let floor = self.core.last_input_time;
                    let time = event.time.clamp(floor, now.max(floor));
                    self.core.last_input_time = time;
                    self.pending_input.push(InputEvent { time, ..event });
                }
            }
        }
    }

    fn apply_outcomes(&mut self) {
        for outcome in self.outcomes.drain(..) {
            match outcome {
                InputOutcome::Judged(verdict) => {
                    let applied = self.core.score.apply(verdict.judgment);
                    if applied == ApplyResult::Ignored {
                        continue;
                    }
                    self.events.push(GameplayEvent::Judged(verdict));
                    if let ApplyResult::ComboBroken { combo } = applied {
                        self.events.push(GameplayEvent::ComboBroken { combo });
                    }
                    if !verdict.judgment.is_miss() {
                        self.core.hits.push(HitEvent::from(&verdict));
                    }
                }
                InputOutcome::GhostTap { lane, time } => {
                    self.events.push(GameplayEvent::GhostTap { lane, time });
                }
                InputOutcome::Ignored => {}
            }
        }
    }

    fn update_break(&mut self, now: LogicalTime) {
        let gap = self.core.ruleset.pool().peek_next().map(|o| (o.start, o.start - now));
        let start_delay = self.config.start_delay_ms;
        match (self.core.on_break, gap) {
            (false, Some((start, gap))) if gap >= start_delay + self.config.break_lead_ms => {
                self.core.on_break = true;
                self.events.push(GameplayEvent::BreakStarted { until: start });
            }
            (true, Some((_, gap))) if gap <= start_delay => {
                self.core.on_break = false;
                self.events.push(GameplayEvent::BreakEnded);
            }
            (true, None) => {
                self.core.on_break = false;
                self.events.push(GameplayEvent::BreakEnded);
            }
            _ => {}
        }
    }

    fn fail(&mut self) {
        if self.state == SessionState::Failed {
            return;
        }
        self.core.score.force_fail();
        self.core.clock.stop();
        log::info!("session failed at {}ms", self.current_time());
        self.transition(SessionState::Failed);
        self.events.push(GameplayEvent::Failed);
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        log::debug!("session {from:?} -> {to:?}");
        self.state = to;
        self.events.push(GameplayEvent::StateChanged { from, to });
    }
}
