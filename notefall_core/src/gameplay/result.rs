use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Modifiers;
use crate::gameplay::judgment::{HitPhase, Judgment, Verdict};
use crate::gameplay::score::ScoreState;
use crate::LogicalTime;

/// One judged hit, kept for the offset histogram on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitEvent {
    pub object: usize,
    pub lane: u8,
    pub phase: HitPhase,
    pub judgment: Judgment,
    pub offset_ms: LogicalTime,
}

impl From<&Verdict> for HitEvent {
    fn from(v: &Verdict) -> Self {
        Self {
            object: v.object,
            lane: v.lane,
            phase: v.phase,
            judgment: v.judgment,
            offset_ms: v.offset_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub passed: bool,
    pub modifiers: Modifiers,
    pub total_objects: usize,
    pub max_combo: u32,
    pub accuracy: f64,
    pub health: f64,
    pub counts: BTreeMap<Judgment, u32>,
    /// Non-miss verdicts only; misses have no meaningful offset.
    pub hits: Vec<HitEvent>,
    pub mean_offset_ms: Option<f64>,
}

impl PlayResult {
    pub fn new(
        score: &ScoreState,
        modifiers: Modifiers,
        total_objects: usize,
        hits: Vec<HitEvent>,
    ) -> Self {
        let mean_offset_ms = (!hits.is_empty()).then(|| {
            hits.iter().map(|h| h.offset_ms as f64).sum::<f64>() / hits.len() as f64
        });
        Self {
            passed: !score.failed,
            modifiers,
            total_objects,
            max_combo: score.max_combo,
            accuracy: score.accuracy,
            health: score.health,
            counts: score.counts.clone(),
            hits,
            mean_offset_ms,
        }
    }

    pub fn hit_offsets(&self) -> impl Iterator<Item = LogicalTime> + '_ {
        self.hits.iter().map(|h| h.offset_ms)
    }
}
