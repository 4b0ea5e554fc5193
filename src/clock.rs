use chrono::{DateTime, Utc};

/// Time source injected into the engine so seasonal weighting and cache
/// expiry can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar month of `now`, 1..=12.
    fn current_month(&self) -> u32 {
        use chrono::Datelike;
        self.now().month()
    }
}

/// Wall-clock time, the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen time source for tests and replay.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_pinned_month() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(clock.current_month(), 3);
    }
}
