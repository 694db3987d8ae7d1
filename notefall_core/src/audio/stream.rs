use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::audio::assets::TrackInfo;
use crate::audio::transport::{AudioPosition, AudioTransport, TransportError};
use crate::LogicalTime;

enum TransportCommand {
    Play { start_ms: f64 },
    Pause,
    Resume,
    Seek { to_ms: f64 },
}

/// Audio-thread half of an in-process transport. The output callback calls
/// [`PlaybackCursor::process`] once per buffer; the position it reaches is
/// published for the game thread through an atomic.
pub struct PlaybackCursor {
    track: TrackInfo,
    position_ms: f64,
    playing: bool,
    published: Arc<AtomicF64>,
    command_rx: Receiver<TransportCommand>,
}

/// Game-thread half: commands go over a channel, position is read from the atomic.
pub struct StreamTransport {
    command_tx: Sender<TransportCommand>,
    published: Arc<AtomicF64>,
    track: TrackInfo,
    played: bool,
}

impl PlaybackCursor {
    pub fn new(track: TrackInfo) -> (Self, StreamTransport) {
        let (tx, rx) = unbounded();
        let published = Arc::new(AtomicF64::new(0.0));
        (
            Self {
                track,
                position_ms: 0.0,
                playing: false,
                published: published.clone(),
                command_rx: rx,
            },
            StreamTransport {
                command_tx: tx,
                published,
                track,
                played: false,
            },
        )
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Applies pending commands, then advances by `frames` output frames if playing.
    pub fn process(&mut self, frames: u64) {
        // 1. Process commands
        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                TransportCommand::Play { start_ms } => {
                    self.position_ms = start_ms;
                    self.playing = true;
                }
                TransportCommand::Pause => self.playing = false,
                TransportCommand::Resume => self.playing = true,
                TransportCommand::Seek { to_ms } => self.position_ms = to_ms,
            }
        }

        // 2. Advance; the track stops by itself at its end
        if self.playing {
            let end = self.track.duration_ms();
            self.position_ms += self.track.frames_to_ms(frames);
            if self.position_ms >= end {
                self.position_ms = end;
                self.playing = false;
            }
        }

        // 3. Publish
        self.published.store(self.position_ms, Ordering::Release);
    }
}

impl StreamTransport {
    pub fn track(&self) -> TrackInfo {
        self.track
    }

    fn send(&self, cmd: TransportCommand) -> Result<(), TransportError> {
        self.command_tx
            .send(cmd)
            .map_err(|_| TransportError::Disconnected)
    }

    fn check_range(&self, ms: LogicalTime) -> Result<f64, TransportError> {
        let ms_f = ms as f64;
        if ms < 0 || ms_f > self.track.duration_ms() {
            return Err(TransportError::SeekOutOfRange(ms));
        }
        Ok(ms_f)
    }
}

impl AudioTransport for StreamTransport {
    fn position(&self) -> Result<AudioPosition, TransportError> {
        if !self.played {
            return Ok(AudioPosition::Unavailable);
        }
        Ok(AudioPosition::At(self.published.load(Ordering::Acquire)))
    }

    fn play(&mut self, start_ms: LogicalTime) -> Result<(), TransportError> {
        let start_ms = self.check_range(start_ms)?;
        self.send(TransportCommand::Play { start_ms })?;
        // Publish eagerly so the game thread does not read a stale position
        // before the audio thread picks the command up.
        self.published.store(start_ms, Ordering::Release);
        self.played = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), TransportError> {
        if !self.played {
            return Err(TransportError::NotReady);
        }
        self.send(TransportCommand::Pause)
    }

    fn resume(&mut self) -> Result<(), TransportError> {
        if !self.played {
            return Err(TransportError::NotReady);
        }
        self.send(TransportCommand::Resume)
    }

    fn seek(&mut self, to_ms: LogicalTime) -> Result<(), TransportError> {
        let to_ms = self.check_range(to_ms)?;
        self.send(TransportCommand::Seek { to_ms })?;
        self.published.store(to_ms, Ordering::Release);
        Ok(())
    }

    fn has_played(&self) -> bool {
        self.played
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (PlaybackCursor, StreamTransport) {
        PlaybackCursor::new(TrackInfo::from_duration_ms(10_000, 44100).unwrap())
    }

    #[test]
    fn position_unavailable_until_played() {
        let (_cursor, transport) = pair();
        assert_eq!(transport.position(), Ok(AudioPosition::Unavailable));
        assert!(!transport.has_played());
    }

    #[test]
    fn cursor_advances_only_while_playing() {
        let (mut cursor, mut transport) = pair();
        transport.play(1000).unwrap();
        cursor.process(44100);
        assert_eq!(transport.position(), Ok(AudioPosition::At(2000.0)));

        transport.pause().unwrap();
        cursor.process(44100);
        assert_eq!(cursor.position_ms(), 2000.0);

        transport.resume().unwrap();
        cursor.process(4410);
        assert_eq!(cursor.position_ms(), 2100.0);
    }

    #[test]
    fn seek_outside_track_is_rejected() {
        let (_cursor, mut transport) = pair();
        assert_eq!(transport.seek(-5), Err(TransportError::SeekOutOfRange(-5)));
        assert_eq!(transport.seek(20_000), Err(TransportError::SeekOutOfRange(20_000)));
        assert!(transport.seek(5_000).is_ok());
    }

    #[test]
    fn dropped_cursor_disconnects() {
        let (cursor, mut transport) = pair();
        drop(cursor);
        assert_eq!(transport.play(0), Err(TransportError::Disconnected));
    }

    #[test]
    fn playback_stops_at_track_end() {
        let (mut cursor, mut transport) = pair();
        transport.play(9_900).unwrap();
        cursor.process(44100);
        assert_eq!(cursor.position_ms(), 10_000.0);
        assert!(!cursor.is_playing());
    }
}
