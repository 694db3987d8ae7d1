use crate::config::Modifiers;
use crate::input::events::InputEvent;
use crate::replay::{KeyMask, Replay, ReplayFrame};
use crate::LogicalTime;

/// Turns a stream of key transitions into replay frames.
/// A frame is written only when the held-key set actually changes.
#[derive(Debug, Clone)]
pub struct ReplayRecorder {
    replay: Replay,
    keys: KeyMask,
    last_time: LogicalTime,
}

impl ReplayRecorder {
    pub fn new(origin_ms: LogicalTime, modifiers: Modifiers) -> Self {
        Self {
            replay: Replay::new(origin_ms, modifiers),
            keys: KeyMask::default(),
            last_time: origin_ms,
        }
    }

    pub fn keys(&self) -> KeyMask {
        self.keys
    }

    /// Returns `false` when the event leaves the held-key set unchanged and nothing was written.
    pub fn record(&mut self, event: &InputEvent) -> bool {
        let keys = self.keys.with(event.lane, event.pressed);
        if keys == self.keys {
            return false;
        }

        // Out-of-order events are stamped at the last recorded time.
        let mut delta = (event.time - self.last_time).max(0);
        while delta > LogicalTime::from(u32::MAX) {
            self.replay.frames.push(ReplayFrame {
                delta_ms: u32::MAX,
                keys: self.keys,
            });
            delta -= LogicalTime::from(u32::MAX);
        }
        self.replay.frames.push(ReplayFrame {
            delta_ms: delta as u32,
            keys,
        });

        self.keys = keys;
        self.last_time = self.last_time.max(event.time);
        true
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    pub fn finish(self) -> Replay {
        self.replay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_state_is_not_recorded() {
        let mut rec = ReplayRecorder::new(-3000, Modifiers::default());
        assert!(rec.record(&InputEvent::press(1, 100)));
        assert!(!rec.record(&InputEvent::press(1, 120)));
        assert!(!rec.record(&InputEvent::release(2, 130)));
        assert!(rec.record(&InputEvent::release(1, 180)));

        let replay = rec.finish();
        assert_eq!(
            replay.frames,
            vec![
                ReplayFrame { delta_ms: 3100, keys: KeyMask(0b10) },
                ReplayFrame { delta_ms: 80, keys: KeyMask(0) },
            ]
        );
    }

    #[test]
    fn late_events_get_zero_delta() {
        let mut rec = ReplayRecorder::new(0, Modifiers::default());
        rec.record(&InputEvent::press(0, 500));
        rec.record(&InputEvent::press(1, 450));
        let times: Vec<_> = rec.replay().timeline().map(|(t, _)| t).collect();
        assert_eq!(times, vec![500, 500]);
    }

    #[test]
    fn huge_gaps_are_split() {
        let mut rec = ReplayRecorder::new(0, Modifiers::default());
        let far = LogicalTime::from(u32::MAX) + 10;
        rec.record(&InputEvent::press(0, far));
        let replay = rec.finish();
        assert_eq!(replay.frames.len(), 2);
        assert_eq!(replay.frames[0].keys, KeyMask(0));
        assert_eq!(replay.end_ms(), far);
    }
}
