use crate::config::Modifiers;
use crate::input::events::InputEvent;
use crate::replay::{Replay, ReplayRecorder};
use crate::{Chart, LogicalTime, NoteKind};

/// How long autoplay keeps a key down for a tap note.
pub const AUTOPLAY_TAP_HOLD_MS: LogicalTime = 40;

/// Builds a replay that hits every note dead on time.
pub fn generate_autoplay(chart: &Chart, origin_ms: LogicalTime, modifiers: Modifiers) -> Replay {
    let modifiers = Modifiers {
        autoplay: true,
        ..modifiers
    };

    let mut next_in_lane: Vec<Option<LogicalTime>> = vec![None; usize::from(chart.lane_count())];
    let mut events = Vec::with_capacity(chart.notes.len() * 2);

    // Walk backwards so each note knows when its lane is needed again.
    for note in chart.notes.iter().rev() {
        let Some(next) = next_in_lane.get_mut(usize::from(note.lane)) else {
            continue;
        };
        let release = match note.kind {
            NoteKind::Hold { end_ms } => end_ms,
            NoteKind::Tap => {
                let natural = note.start_ms + AUTOPLAY_TAP_HOLD_MS;
                next.map_or(natural, |n| natural.min(n - 1)).max(note.start_ms)
            }
        };
        events.push(InputEvent::press(note.lane, note.start_ms));
        events.push(InputEvent::release(note.lane, release));
        *next = Some(note.start_ms);
    }

    // Releases first on ties so a key can be pressed again on the same tick.
    events.sort_by_key(|e| (e.time, e.pressed, e.lane));

    let mut recorder = ReplayRecorder::new(origin_ms, modifiers);
    for event in &events {
        recorder.record(event);
    }
    recorder.finish()
}
