use std::str::FromStr;

use crate::error::{SplitError, SplitResult};
use crate::types::{AudioData, Timestamp};

/// Maps archive timestamps and durations onto buffer indices.
///
/// The time base is the decoded sample rate, so indices address samples
/// directly. `TimeIndex::millis()` gives the 1000-units-per-second base the
/// archive tooling historically used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeIndex {
    units_per_second: u32,
}

impl TimeIndex {
    pub fn new(units_per_second: u32) -> SplitResult<Self> {
        if units_per_second == 0 {
            return Err(SplitError::invalid("time base must be positive"));
        }
        Ok(Self { units_per_second })
    }

    pub fn millis() -> Self {
        Self {
            units_per_second: 1000,
        }
    }

    pub fn for_audio(audio: &AudioData) -> SplitResult<Self> {
        Self::new(audio.sample_rate)
    }

    pub fn to_index(self, timestamp: Timestamp) -> usize {
        (timestamp.total_seconds() * self.units_per_second as u64) as usize
    }

    /// Convert a duration in minutes to time-base units (rounded to the nearest unit).
    pub fn minutes_to_units(self, minutes: f64) -> SplitResult<usize> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(SplitError::invalid(format!(
                "duration must be a positive number of minutes, got {}",
                minutes
            )));
        }
        let units = (minutes * 60.0 * self.units_per_second as f64).round();
        if units < 1.0 {
            return Err(SplitError::invalid(format!(
                "{} minutes is shorter than one time-base unit",
                minutes
            )));
        }
        Ok(units as usize)
    }
}

impl FromStr for Timestamp {
    type Err = SplitError;

    /// Parse `HH:MM:SS` (hours 0-23, minutes and seconds 0-59).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || SplitError::invalid(format!("malformed timestamp '{}'", raw));
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if parts.len() != 3 {
            return Err(malformed());
        }
        let mut fields = [0u32; 3];
        for (field, part) in fields.iter_mut().zip(&parts) {
            // digits only: no signs, spaces or fractions
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            *field = part.parse().map_err(|_| malformed())?;
        }
        let [hours, minutes, seconds] = fields;
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(malformed());
        }
        Ok(Timestamp::new(hours, minutes, seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_hms_to_millis() {
        let index = TimeIndex::millis();
        assert_eq!(index.to_index(Timestamp::new(0, 7, 0)), 420_000);
        assert_eq!(index.to_index(Timestamp::new(1, 0, 1)), 3_601_000);
    }

    #[test]
    fn converts_hms_to_samples() {
        let index = TimeIndex::new(44_100).unwrap();
        assert_eq!(index.to_index(Timestamp::new(0, 0, 2)), 88_200);
    }

    #[test]
    fn minutes_to_units_rounds() {
        let index = TimeIndex::millis();
        assert_eq!(index.minutes_to_units(3.0).unwrap(), 180_000);
        assert_eq!(index.minutes_to_units(0.5).unwrap(), 30_000);
    }

    #[test]
    fn rejects_non_positive_durations() {
        let index = TimeIndex::millis();
        assert!(index.minutes_to_units(0.0).unwrap_err().is_configuration());
        assert!(index.minutes_to_units(-1.0).is_err());
        assert!(index.minutes_to_units(f64::NAN).is_err());
        assert!(TimeIndex::new(0).is_err());
    }

    #[test]
    fn parses_archive_timestamps() {
        let ts: Timestamp = "00:07:05".parse().unwrap();
        assert_eq!(ts, Timestamp::new(0, 7, 5));
        let ts: Timestamp = "1:2:3".parse().unwrap();
        assert_eq!(ts, Timestamp::new(1, 2, 3));
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for raw in ["", "07:05", "00:61:00", "aa:00:00", "00:00:-1", "00:00:00:00", "24:00:00"] {
            let err = raw.parse::<Timestamp>().unwrap_err();
            assert!(err.is_configuration(), "{raw} should be rejected");
        }
    }
}
