//! Wall-clock time in the site's home time zone.

use crate::config::ClockConfig;
use crate::error::{AssistantError, Result};
use chrono::{DateTime, FixedOffset, Utc};

/// Clock widget text for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    /// `"03:05:09 PM"`.
    pub time: String,
    /// `"Saturday, October 17, 2026"`.
    pub date: String,
}

/// Formats instants in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SiteClock {
    offset: FixedOffset,
}

impl SiteClock {
    /// Create a clock for the configured offset.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] when the offset is out of range.
    pub fn new(config: &ClockConfig) -> Result<Self> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            AssistantError::Config(format!(
                "clock.utc_offset_minutes out of range: {}",
                config.utc_offset_minutes
            ))
        })?;
        Ok(Self { offset })
    }

    /// `"3:05 PM. Saturday, October 17, 2026"` for `at`.
    pub fn spoken(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.offset);
        format!(
            "{}. {}",
            local.format("%-I:%M %p"),
            local.format("%A, %B %-d, %Y")
        )
    }

    /// Widget text for `at`.
    pub fn reading(&self, at: DateTime<Utc>) -> ClockReading {
        let local = at.with_timezone(&self.offset);
        ClockReading {
            time: local.format("%I:%M:%S %p").to_string(),
            date: local.format("%A, %B %-d, %Y").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chrono::TimeZone;

    fn kathmandu() -> SiteClock {
        SiteClock::new(&ClockConfig::default()).unwrap()
    }

    #[test]
    fn spoken_uses_quarter_hour_offset() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 20, 0).unwrap();
        assert_eq!(kathmandu().spoken(at), "3:05 PM. Saturday, October 17, 2026");
    }

    #[test]
    fn reading_rolls_date_over_midnight() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 18, 30, 9).unwrap();
        let reading = kathmandu().reading(at);
        assert_eq!(reading.time, "12:15:09 AM");
        assert_eq!(reading.date, "Sunday, October 18, 2026");
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let config = ClockConfig {
            utc_offset_minutes: 24 * 60,
            ..ClockConfig::default()
        };
        assert!(SiteClock::new(&config).is_err());
    }
}
