use crate::gameplay::judgment::{HitPhase, Judgment, JudgmentTable, Verdict};
use crate::gameplay::pool::{ObjectPool, ObjectState};
use crate::input::events::InputEvent;
use crate::LogicalTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Judged(Verdict),
    /// Press with no note close enough to judge.
    GhostTap { lane: u8, time: LogicalTime },
    /// Release with nothing held, or a lane the pool does not have.
    Ignored,
}

/// Matches key events against the pool using a timing window table.
#[derive(Debug, Clone)]
pub struct JudgeMachine {
    table: JudgmentTable,
}

impl Default for JudgeMachine {
    fn default() -> Self {
        Self::new(JudgmentTable::default())
    }
}

impl JudgeMachine {
    pub fn new(table: JudgmentTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &JudgmentTable {
        &self.table
    }

    /// Judges one key event. The caller is expected to have advanced the pool
    /// to `event.time` first so that expired notes are not matched.
    pub fn process_input(&self, event: InputEvent, pool: &mut ObjectPool) -> InputOutcome {
        if event.lane >= pool.lane_count() {
            log::debug!("input on lane {} outside a {}-lane pool", event.lane, pool.lane_count());
            return InputOutcome::Ignored;
        }
        if event.pressed {
            self.judge_press(event, pool)
        } else {
            self.judge_release(event, pool)
        }
    }

    fn judge_press(&self, event: InputEvent, pool: &mut ObjectPool) -> InputOutcome {
        let ghost = InputOutcome::GhostTap {
            lane: event.lane,
            time: event.time,
        };
        let Some(note) = pool.front_pending(event.lane) else {
            return ghost;
        };

        let offset_ms = event.time - note.start;
        let Some(judgment) = self.table.classify(offset_ms) else {
            // Too early for the next note; late presses never get here because the
            // pool already expired anything past the widest window.
            return ghost;
        };

        let id = note.id;
        pool.press(id);
        InputOutcome::Judged(Verdict {
            object: id,
            lane: event.lane,
            phase: HitPhase::Press,
            judgment,
            time: event.time,
            offset_ms,
        })
    }

    fn judge_release(&self, event: InputEvent, pool: &mut ObjectPool) -> InputOutcome {
        let Some(note) = pool.held_in(event.lane) else {
            return InputOutcome::Ignored;
        };
        let id = note.id;
        let end = note.end.unwrap_or(note.start);

        let offset_ms = event.time - end;
        // Letting go before the tail window opens drops the hold.
        let judgment = self.table.classify(offset_ms).unwrap_or(Judgment::Miss);

        let state = pool.release(id);
        debug_assert_eq!(state, ObjectState::Released);
        InputOutcome::Judged(Verdict {
            object: id,
            lane: event.lane,
            phase: HitPhase::Release,
            judgment,
            time: event.time,
            offset_ms,
        })
    }
}
