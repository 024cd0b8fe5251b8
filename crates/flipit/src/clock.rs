//! Wall-clock time source.
//!
//! The face only needs the local time of day; reading it through a trait keeps
//! tick gating and layout testable at fixed instants.

use std::cell::Cell;

use chrono::{Local, NaiveTime};

/// Source of the local time of day.
pub trait WallClock {
    fn now(&self) -> NaiveTime;
}

/// Local system time, via chrono.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Clock pinned to a settable time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Cell<NaiveTime>,
}

impl FixedClock {
    pub fn new(time: NaiveTime) -> Self {
        Self { time: Cell::new(time) }
    }

    /// Clock at `h:m:s`. Out-of-range parts yield midnight.
    pub fn at(h: u32, m: u32, s: u32) -> Self {
        Self::new(NaiveTime::from_hms_opt(h, m, s).unwrap_or_default())
    }

    pub fn set(&self, time: NaiveTime) {
        self.time.set(time);
    }

    pub fn set_hms(&self, h: u32, m: u32, s: u32) {
        if let Some(t) = NaiveTime::from_hms_opt(h, m, s) {
            self.time.set(t);
        }
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.time.get()
    }
}

impl<C: WallClock + ?Sized> WallClock for &C {
    fn now(&self) -> NaiveTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn fixed_clock_reports_what_it_was_set_to() {
        let clock = FixedClock::at(14, 7, 33);
        assert_eq!((clock.now().hour(), clock.now().minute()), (14, 7));

        clock.set_hms(23, 59, 59);
        assert_eq!(clock.now().second(), 59);
    }

    #[test]
    fn invalid_time_leaves_clock_unchanged() {
        let clock = FixedClock::at(1, 2, 3);
        clock.set_hms(24, 0, 0);
        assert_eq!(clock.now(), NaiveTime::from_hms_opt(1, 2, 3).unwrap());
        assert_eq!(FixedClock::at(25, 0, 0).now(), NaiveTime::default());
    }

    fn minute_of<C: WallClock>(clock: C) -> u32 {
        clock.now().minute()
    }

    #[test]
    fn shared_reference_is_a_clock() {
        let clock = FixedClock::at(9, 30, 0);
        assert_eq!(minute_of(&clock), 30);
    }
}
