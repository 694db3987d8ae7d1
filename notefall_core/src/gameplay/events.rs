use serde::{Deserialize, Serialize};

use crate::gameplay::judgment::Verdict;
use crate::gameplay::session::SessionState;
use crate::LogicalTime;

/// Things the UI layer reacts to; drained once per frame from the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameplayEvent {
    Judged(Verdict),
    GhostTap { lane: u8, time: LogicalTime },
    ComboBroken { combo: u32 },
    StateChanged { from: SessionState, to: SessionState },
    /// A pause request was refused under NoPause; the next one fails the play.
    PauseBlocked,
    BreakStarted { until: LogicalTime },
    BreakEnded,
    Skipped { to: LogicalTime },
    Restarted,
    Failed,
    Completed,
}
