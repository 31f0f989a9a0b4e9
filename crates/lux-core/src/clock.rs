//! Wall-clock source for actions that announce the time.
//!
//! Cue timing never reads this clock; it runs on the async runtime's
//! monotonic timer.

use chrono::{DateTime, Utc};

/// Format used when the time is spoken or shown on stage.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// The current time of day as `HH:MM:SS`.
    fn time_of_day(&self) -> String {
        self.now().format(TIME_OF_DAY_FORMAT).to_string()
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Midnight;

    impl Clock for Midnight {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 7).unwrap()
        }
    }

    #[test]
    fn test_time_of_day_is_zero_padded() {
        assert_eq!(Midnight.time_of_day(), "00:00:07");
    }

    #[test]
    fn test_system_clock_time_of_day_has_three_fields() {
        let time = SystemClock.time_of_day();

        assert_eq!(time.split(':').count(), 3);
        assert_eq!(time.len(), 8);
    }
}
