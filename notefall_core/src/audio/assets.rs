use anyhow::{bail, Result};

/// Length and rate of a decoded music track; enough for the transport to clamp seeks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackInfo {
    frame_count: u64,
    sample_rate: u32,
}

impl TrackInfo {
    pub fn new(frame_count: u64, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            bail!("Track sample rate must be non-zero");
        }
        Ok(Self {
            frame_count,
            sample_rate,
        })
    }

    pub fn from_duration_ms(duration_ms: u64, sample_rate: u32) -> Result<Self> {
        Self::new(duration_ms * u64::from(sample_rate) / 1000, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn duration_ms(&self) -> f64 {
        self.frame_count as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn frames_to_ms(&self, frames: u64) -> f64 {
        frames as f64 * 1000.0 / self.sample_rate as f64
    }
}
