use serde::{Deserialize, Serialize};

use crate::error::{ReplayFormatError, SessionError};
use crate::gameplay::judgment::JudgmentTable;
use crate::LogicalTime;
use notefall_chart::MAX_NOTE_TIME_MS;

/// Lead-in before song time zero. The clock starts at `-START_DELAY_MS`.
pub const START_DELAY_MS: LogicalTime = 3000;
/// Real time between the second pause toggle and gameplay resuming.
pub const RESUME_DELAY_MS: f64 = 800.0;
/// How long the restart key must be held before the session rebuilds.
pub const RESTART_HOLD_MS: f64 = 350.0;
/// Extra gap beyond the start delay before an idle stretch counts as a break.
pub const BREAK_LEAD_MS: LogicalTime = 10_000;
/// Minimum combo for which losing it is reported.
pub const COMBO_BREAK_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub no_fail: bool,
    pub no_pause: bool,
    pub autoplay: bool,
}

impl Modifiers {
    const NO_FAIL: u8 = 0b001;
    const NO_PAUSE: u8 = 0b010;
    const AUTOPLAY: u8 = 0b100;

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.no_fail {
            bits |= Self::NO_FAIL;
        }
        if self.no_pause {
            bits |= Self::NO_PAUSE;
        }
        if self.autoplay {
            bits |= Self::AUTOPLAY;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Result<Self, ReplayFormatError> {
        let known = Self::NO_FAIL | Self::NO_PAUSE | Self::AUTOPLAY;
        if bits & !known != 0 {
            return Err(ReplayFormatError::UnknownModifiers(bits));
        }
        Ok(Self {
            no_fail: bits & Self::NO_FAIL != 0,
            no_pause: bits & Self::NO_PAUSE != 0,
            autoplay: bits & Self::AUTOPLAY != 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub start_delay_ms: LogicalTime,
    pub judgment_table: JudgmentTable,
    /// Added to skip targets to compensate for output latency.
    pub device_latency_ms: LogicalTime,
    pub resume_delay_ms: f64,
    pub restart_hold_ms: f64,
    pub break_lead_ms: LogicalTime,
    /// Lifts the upper health bound; the lower bound of zero always applies.
    pub uncapped_health: bool,
    pub modifiers: Modifiers,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: START_DELAY_MS,
            judgment_table: JudgmentTable::default(),
            device_latency_ms: 0,
            resume_delay_ms: RESUME_DELAY_MS,
            restart_hold_ms: RESTART_HOLD_MS,
            break_lead_ms: BREAK_LEAD_MS,
            uncapped_health: false,
            modifiers: Modifiers::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.start_delay_ms < 0 {
            return Err(SessionError::Config("start_delay_ms must be >= 0".into()));
        }
        if self.break_lead_ms < 0 {
            return Err(SessionError::Config("break_lead_ms must be >= 0".into()));
        }
        if !(self.resume_delay_ms >= 0.0) || !(self.restart_hold_ms >= 0.0) {
            return Err(SessionError::Config(
                "resume_delay_ms and restart_hold_ms must be >= 0".into(),
            ));
        }
        self.judgment_table
            .validate()
            .map_err(|e| SessionError::Config(e.to_string()))?;

        // Keeps offsets from chart times within i64 range.
        let spans = [
            ("start_delay_ms", self.start_delay_ms),
            ("break_lead_ms", self.break_lead_ms),
            ("device_latency_ms", self.device_latency_ms),
            ("judgment window", self.judgment_table.widest_ms()),
        ];
        for (name, value) in spans {
            if value.unsigned_abs() > MAX_NOTE_TIME_MS.unsigned_abs() {
                return Err(SessionError::Config(format!(
                    "{name} must be within {MAX_NOTE_TIME_MS}ms"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_bits_roundtrip() {
        let m = Modifiers {
            no_fail: true,
            no_pause: false,
            autoplay: true,
        };
        assert_eq!(m.bits(), 0b101);
        assert_eq!(Modifiers::from_bits(0b101), Ok(m));
        assert_eq!(
            Modifiers::from_bits(0b1000),
            Err(ReplayFormatError::UnknownModifiers(0b1000))
        );
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "device_latency_ms": 12, "modifiers": { "no_fail": true } }"#)
                .unwrap();
        assert_eq!(config.device_latency_ms, 12);
        assert!(config.modifiers.no_fail);
        assert_eq!(config.start_delay_ms, START_DELAY_MS);
        assert_eq!(config.judgment_table, JudgmentTable::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let config = SessionConfig {
            device_latency_ms: i64::MIN,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));

        let mut config = SessionConfig::default();
        config.judgment_table.windows.last_mut().unwrap().tolerance_ms = MAX_NOTE_TIME_MS + 1;
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn negative_delays_are_rejected() {
        let config = SessionConfig {
            resume_delay_ms: -1.0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }
}
