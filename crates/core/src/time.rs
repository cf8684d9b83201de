use chrono::{DateTime, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

/// Default length of an assessment, in seconds (10 minutes).
pub const DEFAULT_ASSESSMENT_SECS: u32 = 600;

/// Visible countdown for an assessment.
///
/// Reaching zero has no effect on the questions; the countdown only floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(total_secs: u32) -> Self {
        Self {
            remaining_secs: total_secs,
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// Removes one second, saturating at zero.
    pub fn tick(&mut self) {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
    }

    /// Formats the remaining time as `m:ss`.
    #[must_use]
    pub fn display(&self) -> String {
        let minutes = self.remaining_secs / 60;
        let seconds = self.remaining_secs % 60;
        format!("{minutes}:{seconds:02}")
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_ASSESSMENT_SECS)
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_floors_at_zero() {
        let mut countdown = Countdown::new(2);
        countdown.tick();
        countdown.tick();
        countdown.tick();
        assert_eq!(countdown.remaining_secs(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn countdown_display_pads_seconds() {
        assert_eq!(Countdown::new(600).display(), "10:00");
        assert_eq!(Countdown::new(65).display(), "1:05");
        assert_eq!(Countdown::new(0).display(), "0:00");
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), fixed_now());
        assert_eq!(clock.now(), clock.now());
    }
}
