//! Gateway timestamp format: `YYYY:MM:DD-hh:mm:ss` in UTC

use chrono::{DateTime, Utc};

/// Source of the current time for transaction timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format an instant the way the gateway expects it
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y:%m:%d-%H:%M:%S").to_string()
}

/// Current time in gateway format
pub fn now_timestamp(clock: &dyn Clock) -> String {
    format_timestamp(clock.now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Fixed(DateTime<Utc>);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_zero_padded_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 4, 5, 9).unwrap();
        assert_eq!(format_timestamp(at), "2024:03:07-04:05:09");
    }

    #[test]
    fn test_now_reads_clock() {
        let clock = Fixed(Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap());
        assert_eq!(now_timestamp(&clock), "1999:12:31-23:59:59");
    }

    #[test]
    fn test_system_clock_shape() {
        let ts = now_timestamp(&SystemClock);
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], ":");
        assert_eq!(&ts[10..11], "-");
    }
}
