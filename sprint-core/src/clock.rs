//! Time utilities: deciding what "today" is for planning and overdue checks.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, evaluated in an IANA timezone like "Europe/Berlin".
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_timezone_name(tz: &str) -> Result<Self> {
        Ok(Self::new(parse_timezone(tz)?))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iana_names() {
        assert!(SystemClock::from_timezone_name("America/Chicago").is_ok());
        assert!(SystemClock::from_timezone_name(" UTC ").is_ok());
        assert!(SystemClock::from_timezone_name("Mars/Olympus").is_err());
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        assert_eq!(FixedClock(day).today(), day);
    }
}
