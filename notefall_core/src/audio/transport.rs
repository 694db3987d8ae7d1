use thiserror::Error;

use crate::LogicalTime;

/// Where the track currently is, if the audio side can tell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioPosition {
    At(f64),
    Unavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("audio engine is not ready")]
    NotReady,

    #[error("audio thread disconnected")]
    Disconnected,

    #[error("seek to {0}ms is outside the track")]
    SeekOutOfRange(LogicalTime),
}

/// Narrow command/query surface of an audio playback engine. Every call may fail;
/// callers treat failures as "audio unavailable" and keep going.
pub trait AudioTransport {
    fn position(&self) -> Result<AudioPosition, TransportError>;

    fn play(&mut self, start_ms: LogicalTime) -> Result<(), TransportError>;

    fn pause(&mut self) -> Result<(), TransportError>;

    fn resume(&mut self) -> Result<(), TransportError>;

    fn seek(&mut self, to_ms: LogicalTime) -> Result<(), TransportError>;

    fn has_played(&self) -> bool;

    fn stop(&mut self) -> Result<(), TransportError> {
        self.pause()
    }
}
