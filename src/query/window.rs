//! The `[start, end)` time window a query covers.

use chrono::{DateTime, Duration, Utc};

use crate::error_handling::types::ConfigError;

/// Source of "now", swappable in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QueryWindow {
    pub const DEFAULT_SPAN_HOURS: i64 = 1;

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::InvalidWindow(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Fills in the defaults: `end` is now, `start` is one hour before `end`.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        clock: &dyn Clock,
    ) -> Result<Self, ConfigError> {
        let end = end.unwrap_or_else(|| clock.now());
        let start = start.unwrap_or(end - Duration::hours(Self::DEFAULT_SPAN_HOURS));
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The same window widened by `padding` on both sides.
    pub fn padded(&self, padding: Duration) -> Self {
        Self {
            start: self.start - padding,
            end: self.end + padding,
        }
    }
}
