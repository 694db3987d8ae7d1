use thiserror::Error;

use crate::{Chart, LogicalTime, MAX_NOTE_TIME_MS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartValidationError {
    #[error("note {index}: lane {lane} is out of range for a {lane_count}-lane chart")]
    InvalidLane { index: usize, lane: u8, lane_count: u8 },

    #[error("note {index}: time {time_ms}ms is outside ±{MAX_NOTE_TIME_MS}ms")]
    TimeOutOfRange { index: usize, time_ms: LogicalTime },

    #[error("note {index}: start {start_ms}ms precedes previous note at {previous_ms}ms")]
    OutOfOrder {
        index: usize,
        start_ms: LogicalTime,
        previous_ms: LogicalTime,
    },

    #[error("note {index}: hold ends at {end_ms}ms before it starts at {start_ms}ms")]
    EndBeforeStart {
        index: usize,
        start_ms: LogicalTime,
        end_ms: LogicalTime,
    },

    #[error("note {index}: overlaps note {previous} in lane {lane}")]
    Overlapping { index: usize, previous: usize, lane: u8 },

    #[error("chart has {found} lanes but the ruleset plays {expected}")]
    LaneCountMismatch { expected: u8, found: u8 },
}

impl Chart {
    /// Checks the invariants the gameplay core relies on: notes sorted by start time,
    /// lanes and times in range, holds well-formed, and no two notes occupying a lane at once.
    pub fn validate(&self) -> Result<(), ChartValidationError> {
        let lane_count = self.lane_count();
        // (note index, time the lane frees up)
        let mut lane_tail: Vec<Option<(usize, LogicalTime)>> = vec![None; lane_count as usize];
        let mut previous_ms: Option<LogicalTime> = None;

        for (index, note) in self.notes.iter().enumerate() {
            if note.lane >= lane_count {
                return Err(ChartValidationError::InvalidLane {
                    index,
                    lane: note.lane,
                    lane_count,
                });
            }

            let out_of_range = std::iter::once(note.start_ms)
                .chain(note.end_ms())
                .find(|t| t.abs() > MAX_NOTE_TIME_MS);
            if let Some(time_ms) = out_of_range {
                return Err(ChartValidationError::TimeOutOfRange { index, time_ms });
            }

            if let Some(previous_ms) = previous_ms {
                if note.start_ms < previous_ms {
                    return Err(ChartValidationError::OutOfOrder {
                        index,
                        start_ms: note.start_ms,
                        previous_ms,
                    });
                }
            }
            previous_ms = Some(note.start_ms);

            if let Some(end_ms) = note.end_ms() {
                if end_ms < note.start_ms {
                    return Err(ChartValidationError::EndBeforeStart {
                        index,
                        start_ms: note.start_ms,
                        end_ms,
                    });
                }
            }

            let slot = &mut lane_tail[note.lane as usize];
            if let Some((previous, free_at)) = *slot {
                if note.start_ms <= free_at {
                    return Err(ChartValidationError::Overlapping {
                        index,
                        previous,
                        lane: note.lane,
                    });
                }
            }
            *slot = Some((index, note.last_time_ms()));
        }

        Ok(())
    }
}
