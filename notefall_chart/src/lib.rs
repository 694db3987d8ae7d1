use serde::{Deserialize, Serialize};

mod load;
mod validate;

pub use load::{load_chart_json_from_path, load_chart_json_from_str};
pub use validate::ChartValidationError;

/// Song position in milliseconds. Negative during the lead-in before the track starts.
pub type LogicalTime = i64;

/// Note times are limited to a day either side of song start.
pub const MAX_NOTE_TIME_MS: LogicalTime = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    #[serde(default)]
    pub meta: Metadata,
    pub mode: GameMode,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub audio_file: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Keys4,
    Keys7,
}

impl GameMode {
    pub fn lane_count(self) -> u8 {
        match self {
            GameMode::Keys4 => 4,
            GameMode::Keys7 => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub lane: u8,
    pub start_ms: LogicalTime,
    #[serde(flatten)]
    pub kind: NoteKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum NoteKind {
    #[serde(rename = "tap")]
    Tap,

    #[serde(rename = "hold")]
    Hold { end_ms: LogicalTime },
}

impl NoteKind {
    pub fn end_ms(&self) -> Option<LogicalTime> {
        match self {
            NoteKind::Tap => None,
            NoteKind::Hold { end_ms } => Some(*end_ms),
        }
    }
}

impl Note {
    pub fn tap(lane: u8, start_ms: LogicalTime) -> Self {
        Self {
            lane,
            start_ms,
            kind: NoteKind::Tap,
        }
    }

    pub fn hold(lane: u8, start_ms: LogicalTime, end_ms: LogicalTime) -> Self {
        Self {
            lane,
            start_ms,
            kind: NoteKind::Hold { end_ms },
        }
    }

    pub fn end_ms(&self) -> Option<LogicalTime> {
        self.kind.end_ms()
    }

    /// Time after which the lane is free again.
    pub fn last_time_ms(&self) -> LogicalTime {
        self.end_ms().unwrap_or(self.start_ms)
    }
}

impl Chart {
    pub fn new(mode: GameMode, notes: Vec<Note>) -> Self {
        Self {
            meta: Metadata::default(),
            mode,
            notes,
        }
    }

    pub fn lane_count(&self) -> u8 {
        self.mode.lane_count()
    }

    /// Number of judgments a full play produces: one per tap, two per hold.
    pub fn judgment_count(&self) -> usize {
        self.notes
            .iter()
            .map(|n| if n.end_ms().is_some() { 2 } else { 1 })
            .sum()
    }

    pub fn duration_ms(&self) -> LogicalTime {
        self.notes.iter().map(Note::last_time_ms).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_kind_serialization_includes_type_tag() {
        let note = Note::hold(3, 123, 456);

        let json = serde_json::to_value(note).unwrap();
        assert_eq!(json["type"], "hold");
        assert_eq!(json["end_ms"], 456);
        assert_eq!(json["start_ms"], 123);
        assert_eq!(json["lane"], 3);
    }

    #[test]
    fn tap_has_no_end_time() {
        let v = serde_json::json!({
            "lane": 0,
            "start_ms": 1500,
            "type": "tap"
        });

        let note: Note = serde_json::from_value(v).unwrap();
        assert_eq!(note.kind, NoteKind::Tap);
        assert_eq!(note.end_ms(), None);
        assert_eq!(note.last_time_ms(), 1500);
    }

    #[test]
    fn chart_roundtrip_minimal() {
        let mut chart = Chart::new(
            GameMode::Keys7,
            vec![Note::tap(1, 0), Note::hold(6, 250, 900)],
        );
        chart.meta.title = "t".to_string();
        chart.meta.audio_file = Some("song.ogg".to_string());

        let json = serde_json::to_string(&chart).unwrap();
        let back: Chart = serde_json::from_str(&json).unwrap();
        assert_eq!(chart, back);
        assert_eq!(back.judgment_count(), 3);
        assert_eq!(back.duration_ms(), 900);
    }

    #[test]
    fn mode_names_are_snake_case() {
        assert_eq!(serde_json::to_value(GameMode::Keys4).unwrap(), "keys4");
        assert_eq!(GameMode::Keys7.lane_count(), 7);
    }
}
