//! Compact key-state logs: recording during live play, playback in place of live input.

mod autoplay;
mod codec;
mod player;
mod recorder;

pub use autoplay::{generate_autoplay, AUTOPLAY_TAP_HOLD_MS};
pub use codec::{decode, encode, REPLAY_MAGIC, REPLAY_VERSION};
pub use player::ReplayPlayer;
pub use recorder::ReplayRecorder;

use serde::{Deserialize, Serialize};

use crate::config::Modifiers;
use crate::error::ReplayFormatError;
use crate::LogicalTime;

/// Set of lanes held down; bit `n` is lane `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyMask(pub u32);

impl KeyMask {
    pub const MAX_LANES: u8 = 32;

    pub fn is_pressed(self, lane: u8) -> bool {
        lane < Self::MAX_LANES && self.0 & (1 << lane) != 0
    }

    pub fn with(self, lane: u8, pressed: bool) -> Self {
        if lane >= Self::MAX_LANES {
            return self;
        }
        if pressed {
            Self(self.0 | (1 << lane))
        } else {
            Self(self.0 & !(1 << lane))
        }
    }

    /// Highest lane held, if any.
    pub fn highest_lane(self) -> Option<u8> {
        (self.0 != 0).then(|| (31 - self.0.leading_zeros()) as u8)
    }

    /// Lanes whose state differs between `self` and `other`, lowest first.
    pub fn changed_lanes(self, other: KeyMask) -> impl Iterator<Item = u8> {
        let diff = self.0 ^ other.0;
        (0..Self::MAX_LANES).filter(move |&lane| diff & (1 << lane) != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Milliseconds since the previous frame (or since the replay origin).
    pub delta_ms: u32,
    pub keys: KeyMask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub modifiers: Modifiers,
    /// Absolute time the first delta is measured from.
    pub origin_ms: LogicalTime,
    pub frames: Vec<ReplayFrame>,
}

impl Replay {
    pub fn new(origin_ms: LogicalTime, modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            origin_ms,
            frames: Vec::new(),
        }
    }

    /// Frames paired with their reconstructed absolute times.
    /// Times saturate; `checked_end_ms` reports replays that would overflow.
    pub fn timeline(&self) -> impl Iterator<Item = (LogicalTime, KeyMask)> + '_ {
        self.frames.iter().scan(self.origin_ms, |time, frame| {
            *time = time.saturating_add(LogicalTime::from(frame.delta_ms));
            Some((*time, frame.keys))
        })
    }

    pub fn end_ms(&self) -> LogicalTime {
        self.timeline().last().map_or(self.origin_ms, |(t, _)| t)
    }

    pub fn checked_end_ms(&self) -> Result<LogicalTime, ReplayFormatError> {
        self.frames
            .iter()
            .enumerate()
            .try_fold(self.origin_ms, |time, (frame, f)| {
                time.checked_add(LogicalTime::from(f.delta_ms))
                    .ok_or(ReplayFormatError::TimeOverflow { frame })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mask_bits() {
        let keys = KeyMask::default().with(0, true).with(6, true);
        assert!(keys.is_pressed(0));
        assert!(keys.is_pressed(6));
        assert!(!keys.is_pressed(3));
        assert_eq!(keys.highest_lane(), Some(6));
        assert_eq!(keys.with(6, false).highest_lane(), Some(0));
        assert_eq!(KeyMask::default().highest_lane(), None);
    }

    #[test]
    fn changed_lanes_are_ordered() {
        let a = KeyMask(0b1010);
        let b = KeyMask(0b0011);
        assert_eq!(a.changed_lanes(b).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn timeline_accumulates_deltas() {
        let mut replay = Replay::new(-3000, Modifiers::default());
        replay.frames = vec![
            ReplayFrame { delta_ms: 4000, keys: KeyMask(1) },
            ReplayFrame { delta_ms: 0, keys: KeyMask(3) },
            ReplayFrame { delta_ms: 50, keys: KeyMask(0) },
        ];
        let times: Vec<_> = replay.timeline().map(|(t, _)| t).collect();
        assert_eq!(times, vec![1000, 1000, 1050]);
        assert_eq!(replay.end_ms(), 1050);
        assert_eq!(replay.checked_end_ms(), Ok(1050));
    }

    #[test]
    fn overflowing_times_are_reported() {
        let mut replay = Replay::new(i64::MAX - 10, Modifiers::default());
        replay.frames = vec![
            ReplayFrame { delta_ms: 10, keys: KeyMask(1) },
            ReplayFrame { delta_ms: 5, keys: KeyMask(0) },
        ];
        assert_eq!(
            replay.checked_end_ms(),
            Err(ReplayFormatError::TimeOverflow { frame: 1 })
        );
        assert_eq!(replay.end_ms(), i64::MAX);
    }
}
