use notefall_chart::ChartValidationError;

use crate::gameplay::judge::{InputOutcome, JudgeMachine};
use crate::gameplay::judgment::{JudgmentTable, Verdict};
use crate::gameplay::pool::{ObjectId, ObjectPool, ObjectState};
use crate::input::events::InputEvent;
use crate::{Chart, GameMode, LogicalTime};

/// How far ahead of the judgment line notes are handed to the renderer.
pub const DEFAULT_LOOKAHEAD_MS: LogicalTime = 1500;

/// Note as a renderer needs it: where it is relative to the judgment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleNote {
    pub object: ObjectId,
    pub lane: u8,
    /// Milliseconds until the head reaches the line; negative once passed.
    pub time_until_ms: LogicalTime,
    pub hold_ms: Option<LogicalTime>,
    pub held: bool,
}

/// Per game mode gameplay rules, picked once when the session is built.
pub trait Ruleset {
    fn mode(&self) -> GameMode;

    fn initialize(&mut self, chart: &Chart) -> Result<(), ChartValidationError>;

    /// Expires whatever `now` has moved past.
    fn update(&mut self, now: LogicalTime, out: &mut Vec<InputOutcome>);

    /// Judges a key event at its own timestamp, expiring older notes first.
    fn handle_input(&mut self, event: InputEvent, out: &mut Vec<InputOutcome>);

    fn draw(&self, now: LogicalTime) -> Vec<VisibleNote>;

    fn destroy(&mut self);

    fn pool(&self) -> &ObjectPool;
}

/// Lane-based rules shared by the key modes; `LANES` fixes the mode.
#[derive(Debug, Clone)]
pub struct KeysRuleset<const LANES: u8> {
    judge: JudgeMachine,
    pool: ObjectPool,
    lookahead_ms: LogicalTime,
    scratch: Vec<Verdict>,
}

pub type Keys4Ruleset = KeysRuleset<4>;
pub type Keys7Ruleset = KeysRuleset<7>;

impl<const LANES: u8> KeysRuleset<LANES> {
    pub fn new(table: JudgmentTable) -> Self {
        Self {
            judge: JudgeMachine::new(table),
            pool: ObjectPool::default(),
            lookahead_ms: DEFAULT_LOOKAHEAD_MS,
            scratch: Vec::new(),
        }
    }

    pub fn with_lookahead(mut self, lookahead_ms: LogicalTime) -> Self {
        self.lookahead_ms = lookahead_ms;
        self
    }

    fn expire(&mut self, now: LogicalTime, out: &mut Vec<InputOutcome>) {
        self.pool.advance(now, &mut self.scratch);
        out.extend(self.scratch.drain(..).map(InputOutcome::Judged));
    }
}

impl<const LANES: u8> Ruleset for KeysRuleset<LANES> {
    fn mode(&self) -> GameMode {
        match LANES {
            4 => GameMode::Keys4,
            _ => GameMode::Keys7,
        }
    }

    fn initialize(&mut self, chart: &Chart) -> Result<(), ChartValidationError> {
        if chart.lane_count() != LANES {
            return Err(ChartValidationError::LaneCountMismatch {
                expected: LANES,
                found: chart.lane_count(),
            });
        }
        self.pool = ObjectPool::from_chart(chart, self.judge.table())?;
        log::debug!("{:?} ruleset loaded {} objects", self.mode(), self.pool.len());
        Ok(())
    }

    fn update(&mut self, now: LogicalTime, out: &mut Vec<InputOutcome>) {
        self.expire(now, out);
    }

    fn handle_input(&mut self, event: InputEvent, out: &mut Vec<InputOutcome>) {
        self.expire(event.time, out);
        match self.judge.process_input(event, &mut self.pool) {
            InputOutcome::Ignored => {}
            outcome => out.push(outcome),
        }
    }

    fn draw(&self, now: LogicalTime) -> Vec<VisibleNote> {
        let mut notes: Vec<VisibleNote> = self
            .pool
            .upcoming(now.saturating_add(self.lookahead_ms))
            .map(|o| VisibleNote {
                object: o.id,
                lane: o.lane,
                time_until_ms: o.start - now,
                hold_ms: o.end.map(|end| end - o.start),
                held: o.state() == ObjectState::Held,
            })
            .collect();
        notes.sort_by_key(|n| (n.time_until_ms, n.lane));
        notes
    }

    fn destroy(&mut self) {
        self.pool = ObjectPool::default();
        self.scratch.clear();
    }

    fn pool(&self) -> &ObjectPool {
        &self.pool
    }
}

pub fn ruleset_for(mode: GameMode, table: JudgmentTable) -> Box<dyn Ruleset> {
    match mode {
        GameMode::Keys4 => Box::new(Keys4Ruleset::new(table)),
        GameMode::Keys7 => Box::new(Keys7Ruleset::new(table)),
    }
}
