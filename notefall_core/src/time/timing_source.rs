use crate::audio::transport::{AudioPosition, AudioTransport};
use crate::LogicalTime;

/// Logical song clock. Follows the audio transport while the track plays and
/// extrapolates with frame deltas in between readings, before the track starts,
/// and whenever the transport cannot report a position.
pub struct TimingSource {
    transport: Option<Box<dyn AudioTransport>>,
    time_ms: f64,
    last_audio_ms: Option<f64>,
    running: bool,
    track_started: bool,
    audio_ok: bool,
}

impl TimingSource {
    pub fn new(mut transport: Option<Box<dyn AudioTransport>>, start_delay_ms: LogicalTime) -> Self {
        if let Some(t) = transport.as_mut() {
            if t.has_played() {
                if let Err(e) = t.stop() {
                    log::warn!("could not stop previous playback: {e}");
                }
            }
        }
        Self {
            transport,
            time_ms: -(start_delay_ms as f64),
            last_audio_ms: None,
            running: false,
            track_started: false,
            audio_ok: true,
        }
    }

    pub fn without_audio(start_delay_ms: LogicalTime) -> Self {
        Self::new(None, start_delay_ms)
    }

    pub fn has_audio(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_time(&self) -> LogicalTime {
        self.time_ms.floor() as LogicalTime
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Moves the clock forward by one frame of `dt_ms` real milliseconds.
    pub fn update(&mut self, dt_ms: f64) {
        if !self.running {
            return;
        }
        let previous = self.time_ms;
        let extrapolated = previous + dt_ms;
        self.time_ms = extrapolated;

        self.start_track_if_due();

        if let Some(audio_ms) = self.read_audio() {
            if self.last_audio_ms != Some(audio_ms) {
                self.last_audio_ms = Some(audio_ms);
                // Snap to fresh audio without running backwards; only seek() may do that.
                // A lagging track holds the clock until it catches up.
                self.time_ms = audio_ms.max(previous);
            }
        }
    }

    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if self.track_started {
            if let Some(t) = self.transport.as_mut() {
                if let Err(e) = t.pause() {
                    log::warn!("audio pause failed: {e}");
                }
            }
        }
    }

    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_audio_ms = None;
        if self.track_started {
            if let Some(t) = self.transport.as_mut() {
                if let Err(e) = t.resume() {
                    log::warn!("audio resume failed: {e}");
                }
            }
        }
    }

    /// Halts the clock and the track for good (fail screen).
    pub fn stop(&mut self) {
        self.running = false;
        if self.track_started {
            if let Some(t) = self.transport.as_mut() {
                if let Err(e) = t.stop() {
                    log::warn!("audio stop failed: {e}");
                }
            }
        }
    }

    /// Jumps the clock to `to_ms`. The fallback clock moves even if the
    /// transport refuses, so visuals stay consistent with gameplay.
    pub fn seek(&mut self, to_ms: LogicalTime) {
        self.time_ms = to_ms as f64;
        self.last_audio_ms = None;

        let Some(t) = self.transport.as_mut() else {
            return;
        };
        if to_ms >= 0 {
            let result = if self.track_started {
                t.seek(to_ms)
            } else {
                self.track_started = true;
                t.play(to_ms)
            };
            if let Err(e) = result {
                log::warn!("seek to {to_ms}ms failed, continuing on the fallback clock: {e}");
            }
        } else if self.track_started {
            // Back in the lead-in: the track restarts once the clock reaches zero again.
            if let Err(e) = t.pause() {
                log::warn!("audio pause failed: {e}");
            }
            self.track_started = false;
        }
    }

    pub fn take_transport(&mut self) -> Option<Box<dyn AudioTransport>> {
        self.track_started = false;
        self.transport.take()
    }

    fn start_track_if_due(&mut self) {
        if self.track_started || self.time_ms < 0.0 {
            return;
        }
        self.track_started = true;
        let start_ms = self.time_ms.floor() as LogicalTime;
        if let Some(t) = self.transport.as_mut() {
            match t.play(start_ms) {
                Ok(()) => log::debug!("track started at {start_ms}ms"),
                Err(e) => log::warn!("track failed to start, playing without audio: {e}"),
            }
        }
    }

    fn read_audio(&mut self) -> Option<f64> {
        if !self.track_started {
            return None;
        }
        let t = self.transport.as_ref()?;
        match t.position() {
            Ok(AudioPosition::At(ms)) => {
                if !self.audio_ok {
                    log::info!("audio position available again");
                    self.audio_ok = true;
                }
                Some(ms)
            }
            Ok(AudioPosition::Unavailable) => None,
            Err(e) => {
                if self.audio_ok {
                    log::warn!("audio position unavailable, using fallback clock: {e}");
                    self.audio_ok = false;
                }
                None
            }
        }
    }
}
