use serde::{Deserialize, Serialize};

use crate::LogicalTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Logical song time when the key changed state.
    pub time: LogicalTime,
    pub lane: u8,
    pub pressed: bool,
}

impl InputEvent {
    pub fn press(lane: u8, time: LogicalTime) -> Self {
        Self {
            time,
            lane,
            pressed: true,
        }
    }

    pub fn release(lane: u8, time: LogicalTime) -> Self {
        Self {
            time,
            lane,
            pressed: false,
        }
    }
}
