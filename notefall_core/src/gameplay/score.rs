use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::COMBO_BREAK_THRESHOLD;
use crate::gameplay::judgment::{Judgment, JudgmentTable};

pub const MAX_HEALTH: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub combo: u32,
    pub max_combo: u32,
    pub counts: BTreeMap<Judgment, u32>,
    pub health: f64,
    /// Percentage in `[0, 100]`; zero until something has been judged.
    pub accuracy: f64,
    pub failed: bool,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            combo: 0,
            max_combo: 0,
            counts: Judgment::ALL.iter().map(|&j| (j, 0)).collect(),
            health: MAX_HEALTH,
            accuracy: 0.0,
            failed: false,
        }
    }
}

impl ScoreState {
    pub fn count(&self, judgment: Judgment) -> u32 {
        self.counts.get(&judgment).copied().unwrap_or(0)
    }

    pub fn judged(&self) -> u32 {
        self.counts.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    pub uncapped_health: bool,
    pub no_fail: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Applied,
    /// A miss ended a streak long enough to be worth announcing.
    ComboBroken { combo: u32 },
    /// The session already failed; the verdict was dropped.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ScoreProcessor {
    table: JudgmentTable,
    options: ScoreOptions,
    state: ScoreState,
}

impl ScoreProcessor {
    pub fn new(table: JudgmentTable, options: ScoreOptions) -> Self {
        Self {
            table,
            options,
            state: ScoreState::default(),
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        self.state.failed
    }

    pub fn apply(&mut self, judgment: Judgment) -> ApplyResult {
        if self.state.failed {
            return ApplyResult::Ignored;
        }

        let state = &mut self.state;
        *state.counts.entry(judgment).or_insert(0) += 1;

        let mut result = ApplyResult::Applied;
        if judgment.is_miss() {
            if state.combo >= COMBO_BREAK_THRESHOLD {
                result = ApplyResult::ComboBroken { combo: state.combo };
            }
            state.combo = 0;
        } else {
            state.combo += 1;
            state.max_combo = state.max_combo.max(state.combo);
        }

        let upper = if self.options.uncapped_health {
            f64::INFINITY
        } else {
            MAX_HEALTH
        };
        state.health = (state.health + self.table.health(judgment)).clamp(0.0, upper);

        self.recompute_accuracy();

        if self.state.health <= 0.0 && !self.options.no_fail {
            log::debug!("health depleted");
            self.state.failed = true;
        }
        result
    }

    /// Fails the session regardless of health. Idempotent.
    pub fn force_fail(&mut self) {
        self.state.failed = true;
    }

    fn recompute_accuracy(&mut self) {
        let judged = self.state.judged();
        let max_weight = self.table.max_weight();
        if judged == 0 || max_weight <= 0.0 {
            self.state.accuracy = 0.0;
            return;
        }
        let earned: f64 = self
            .state
            .counts
            .iter()
            .map(|(&j, &n)| self.table.weight(j) * f64::from(n))
            .sum();
        let accuracy = earned / (f64::from(judged) * max_weight) * 100.0;
        self.state.accuracy = accuracy.clamp(0.0, 100.0);
    }
}

impl Default for ScoreProcessor {
    fn default() -> Self {
        Self::new(JudgmentTable::default(), ScoreOptions::default())
    }
}
