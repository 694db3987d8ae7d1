use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gameplay::pool::ObjectId;
use crate::LogicalTime;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Judgment {
    Perfect,
    Great,
    Good,
    Okay,
    Bad,
    #[default]
    Miss,
}

impl Judgment {
    pub const ALL: [Judgment; 6] = [
        Judgment::Perfect,
        Judgment::Great,
        Judgment::Good,
        Judgment::Okay,
        Judgment::Bad,
        Judgment::Miss,
    ];

    pub fn is_miss(self) -> bool {
        self == Judgment::Miss
    }
}

/// One tolerance band: an offset `|t - target| <= tolerance_ms` earns `judgment`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentWindow {
    pub judgment: Judgment,
    pub tolerance_ms: LogicalTime,
    pub weight: f64,
    pub health: f64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("judgment table has no hit windows")]
    Empty,
    #[error("window {0:?} must not be Miss")]
    MissWindow(Judgment),
    #[error("window {0:?} appears more than once")]
    Duplicate(Judgment),
    #[error("window {0:?} is not wider than the window before it")]
    NotAscending(Judgment),
    #[error("window {0:?} has a negative tolerance or weight")]
    Negative(Judgment),
}

/// Hit windows ordered narrowest first, plus what a miss is worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentTable {
    pub windows: Vec<JudgmentWindow>,
    pub miss_weight: f64,
    pub miss_health: f64,
}

impl Default for JudgmentTable {
    fn default() -> Self {
        let window = |judgment, tolerance_ms, weight, health| JudgmentWindow {
            judgment,
            tolerance_ms,
            weight,
            health,
        };
        Self {
            windows: vec![
                window(Judgment::Perfect, 18, 100.0, 0.5),
                window(Judgment::Great, 43, 95.0, 0.4),
                window(Judgment::Good, 76, 65.0, 0.2),
                window(Judgment::Okay, 106, 25.0, -3.0),
                window(Judgment::Bad, 150, 5.0, -4.5),
            ],
            miss_weight: 0.0,
            miss_health: -6.0,
        }
    }
}

impl JudgmentTable {
    pub fn validate(&self) -> Result<(), TableError> {
        if self.windows.is_empty() {
            return Err(TableError::Empty);
        }
        let mut previous: Option<LogicalTime> = None;
        for (i, w) in self.windows.iter().enumerate() {
            if w.judgment.is_miss() {
                return Err(TableError::MissWindow(w.judgment));
            }
            if self.windows[..i].iter().any(|o| o.judgment == w.judgment) {
                return Err(TableError::Duplicate(w.judgment));
            }
            if w.tolerance_ms < 0 || !(w.weight >= 0.0) {
                return Err(TableError::Negative(w.judgment));
            }
            if previous.is_some_and(|p| w.tolerance_ms <= p) {
                return Err(TableError::NotAscending(w.judgment));
            }
            previous = Some(w.tolerance_ms);
        }
        if !(self.miss_weight >= 0.0) {
            return Err(TableError::Negative(Judgment::Miss));
        }
        Ok(())
    }

    pub fn widest(&self) -> JudgmentWindow {
        // validate() guarantees at least one window
        self.windows[self.windows.len() - 1]
    }

    pub fn widest_ms(&self) -> LogicalTime {
        self.widest().tolerance_ms
    }

    /// Narrowest window covering `offset_ms`, or `None` beyond the widest one.
    /// An offset sitting exactly on a boundary belongs to the narrower window.
    pub fn classify(&self, offset_ms: LogicalTime) -> Option<Judgment> {
        let distance = offset_ms.abs();
        self.windows
            .iter()
            .find(|w| distance <= w.tolerance_ms)
            .map(|w| w.judgment)
    }

    pub fn weight(&self, judgment: Judgment) -> f64 {
        self.window(judgment).map_or(self.miss_weight, |w| w.weight)
    }

    pub fn health(&self, judgment: Judgment) -> f64 {
        self.window(judgment).map_or(self.miss_health, |w| w.health)
    }

    pub fn max_weight(&self) -> f64 {
        self.windows
            .iter()
            .map(|w| w.weight)
            .fold(self.miss_weight, f64::max)
    }

    fn window(&self, judgment: Judgment) -> Option<&JudgmentWindow> {
        self.windows.iter().find(|w| w.judgment == judgment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitPhase {
    Press,
    Release,
}

/// Outcome of judging one note head or hold tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub object: ObjectId,
    pub lane: u8,
    pub phase: HitPhase,
    pub judgment: Judgment,
    /// Logical time the verdict was reached.
    pub time: LogicalTime,
    /// Signed distance to the target time; negative means early.
    pub offset_ms: LogicalTime,
}
