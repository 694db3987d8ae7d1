use thiserror::Error;

pub use crate::audio::transport::TransportError;
pub use notefall_chart::ChartValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayFormatError {
    #[error("missing replay magic header")]
    BadMagic,

    #[error("unsupported replay version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown modifier bits {0:#04x}")]
    UnknownModifiers(u8),

    #[error("replay data truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("malformed replay body: {0}")]
    Body(String),

    #[error("failed to encode replay: {0}")]
    Encode(String),

    #[error("frame {frame} lies beyond the representable time range")]
    TimeOverflow { frame: usize },

    #[error("{count} trailing bytes after the last frame")]
    TrailingBytes { count: usize },

    #[error("frame {frame} presses lane {lane} but the chart only has {lane_count} lanes")]
    LaneOutOfRange { frame: usize, lane: u8, lane_count: u8 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Chart(#[from] ChartValidationError),

    #[error(transparent)]
    Replay(#[from] ReplayFormatError),

    #[error("invalid session config: {0}")]
    Config(String),
}
