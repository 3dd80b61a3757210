use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};

/// Lookback window anchored to "now". Doubles as the key that selects a report slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeOffset {
    Days(u32),
    Years(u32),
}

/// The seven lookbacks queried for every identifier, baseline first.
pub const FIXED_OFFSETS: [TimeOffset; 7] = [
    TimeOffset::Days(0),
    TimeOffset::Days(7),
    TimeOffset::Days(30),
    TimeOffset::Days(90),
    TimeOffset::Years(1),
    TimeOffset::Years(2),
    TimeOffset::Years(3),
];

impl TimeOffset {
    pub const ZERO: TimeOffset = TimeOffset::Days(0);

    pub fn is_baseline(&self) -> bool {
        matches!(self, TimeOffset::Days(0))
    }

    /// Resolve the absolute instant `now - self`. Years step back by calendar months, so
    /// Feb 29 lands on Feb 28.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            TimeOffset::Days(days) => now
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            TimeOffset::Years(years) => now
                .checked_sub_months(Months::new(years.saturating_mul(12)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Report column name, e.g. `day_30` or `year_2`.
    pub fn slot_name(&self) -> String {
        match self {
            TimeOffset::Days(days) => format!("day_{days}"),
            TimeOffset::Years(years) => format!("year_{years}"),
        }
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOffset::Days(days) => write!(f, "{days}d"),
            TimeOffset::Years(years) => write!(f, "{years}y"),
        }
    }
}
