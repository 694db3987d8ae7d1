#![allow(dead_code)]

use notefall_core::input::events::InputEvent;
use notefall_core::{Chart, GameMode, LogicalTime, Note};
use proptest::prelude::*;

/// Per-lane note layouts: (gap before the note, hold length; 0 means tap).
pub fn arb_chart(mode: GameMode) -> impl Strategy<Value = Chart> {
    let lanes = usize::from(mode.lane_count());
    prop::collection::vec(
        prop::collection::vec((1..800i64, prop_oneof![Just(0i64), 1..1500i64]), 0..12),
        lanes,
    )
    .prop_map(move |per_lane| {
        let mut notes = Vec::new();
        for (lane, layout) in per_lane.into_iter().enumerate() {
            let mut free_at: LogicalTime = 0;
            for (gap, len) in layout {
                let start = free_at + gap;
                let note = if len == 0 {
                    Note::tap(lane as u8, start)
                } else {
                    Note::hold(lane as u8, start, start + len)
                };
                free_at = note.last_time_ms();
                notes.push(note);
            }
        }
        notes.sort_by_key(|n| (n.start_ms, n.lane));
        Chart::new(mode, notes)
    })
}

/// Key transitions in non-decreasing time order.
pub fn arb_inputs(lanes: u8, until: LogicalTime) -> impl Strategy<Value = Vec<InputEvent>> {
    prop::collection::vec((0..lanes, 0..until, any::<bool>()), 0..120).prop_map(|mut raw| {
        raw.sort_by_key(|&(_, t, _)| t);
        raw.into_iter()
            .map(|(lane, time, pressed)| InputEvent { time, lane, pressed })
            .collect()
    })
}

pub fn single_tap_chart(start_ms: LogicalTime) -> Chart {
    Chart::new(GameMode::Keys4, vec![Note::tap(0, start_ms)])
}
