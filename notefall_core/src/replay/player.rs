use crate::error::ReplayFormatError;
use crate::input::events::InputEvent;
use crate::replay::{KeyMask, Replay};
use crate::LogicalTime;

/// Feeds a recorded replay back as input events, in place of live keys.
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    frames: Vec<(LogicalTime, KeyMask)>,
    cursor: usize,
    keys: KeyMask,
}

impl ReplayPlayer {
    /// Rejects replays that press lanes the chart does not have or run past the time range.
    pub fn new(replay: &Replay, lane_count: u8) -> Result<Self, ReplayFormatError> {
        replay.checked_end_ms()?;
        let frames: Vec<_> = replay.timeline().collect();
        for (frame, (_, keys)) in frames.iter().enumerate() {
            if let Some(lane) = keys.highest_lane() {
                if lane >= lane_count {
                    return Err(ReplayFormatError::LaneOutOfRange {
                        frame,
                        lane,
                        lane_count,
                    });
                }
            }
        }
        Ok(Self {
            frames,
            cursor: 0,
            keys: KeyMask::default(),
        })
    }

    pub fn keys(&self) -> KeyMask {
        self.keys
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Emits a press or release for every lane that changed in frames at or before `now`.
    pub fn poll(&mut self, now: LogicalTime, out: &mut Vec<InputEvent>) {
        while let Some(&(time, keys)) = self.frames.get(self.cursor) {
            if time > now {
                break;
            }
            for lane in self.keys.changed_lanes(keys) {
                out.push(InputEvent {
                    time,
                    lane,
                    pressed: keys.is_pressed(lane),
                });
            }
            self.keys = keys;
            self.cursor += 1;
        }
    }

    /// Repositions to `time` without emitting events. Keys held at that point
    /// count as already down.
    pub fn seek(&mut self, time: LogicalTime) {
        self.cursor = self.frames.partition_point(|&(t, _)| t <= time);
        self.keys = self
            .cursor
            .checked_sub(1)
            .map_or(KeyMask::default(), |i| self.frames[i].1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Modifiers;
    use crate::replay::ReplayFrame;

    fn replay() -> Replay {
        Replay {
            modifiers: Modifiers::default(),
            origin_ms: 0,
            frames: vec![
                ReplayFrame { delta_ms: 100, keys: KeyMask(0b101) },
                ReplayFrame { delta_ms: 50, keys: KeyMask(0b001) },
                ReplayFrame { delta_ms: 50, keys: KeyMask(0) },
            ],
        }
    }

    #[test]
    fn poll_emits_transitions_in_lane_order() {
        let mut player = ReplayPlayer::new(&replay(), 4).unwrap();
        let mut out = Vec::new();
        player.poll(99, &mut out);
        assert!(out.is_empty());

        player.poll(150, &mut out);
        assert_eq!(
            out,
            vec![
                InputEvent::press(0, 100),
                InputEvent::press(2, 100),
                InputEvent::release(2, 150),
            ]
        );
        assert!(!player.is_finished());

        out.clear();
        player.poll(1000, &mut out);
        assert_eq!(out, vec![InputEvent::release(0, 200)]);
        assert!(player.is_finished());
    }

    #[test]
    fn lanes_beyond_chart_are_rejected() {
        let err = ReplayPlayer::new(&replay(), 2).unwrap_err();
        assert_eq!(
            err,
            ReplayFormatError::LaneOutOfRange {
                frame: 0,
                lane: 2,
                lane_count: 2
            }
        );
    }

    #[test]
    fn overflowing_replay_is_rejected() {
        let mut replay = replay();
        replay.origin_ms = i64::MAX;
        assert_eq!(
            ReplayPlayer::new(&replay, 4).unwrap_err(),
            ReplayFormatError::TimeOverflow { frame: 0 }
        );
    }

    #[test]
    fn seek_restores_held_keys() {
        let mut player = ReplayPlayer::new(&replay(), 4).unwrap();
        player.seek(160);
        assert_eq!(player.keys(), KeyMask(0b001));
        let mut out = Vec::new();
        player.poll(200, &mut out);
        assert_eq!(out, vec![InputEvent::release(0, 200)]);

        player.seek(-10);
        assert_eq!(player.keys(), KeyMask(0));
        assert!(!player.is_finished());
    }
}
