use std::time::{Duration, Instant};

/// Fixed-interval timer polled by the event loop.
///
/// A stopped ticker has no deadline. A running one fires once per `interval`;
/// if the loop was stalled past several deadlines (debugger, suspend), the
/// missed ticks collapse into a single one and the schedule restarts from
/// `now`.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next: Option<Instant>,
    fired: u64,
}

impl Ticker {
    /// Creates a stopped ticker.
    ///
    /// A zero interval is bumped to one millisecond so `poll` cannot spin.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next: None,
            fired: 0,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the interval. A running ticker keeps its current deadline.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Starts (or restarts) the ticker; the first tick is due one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Next instant the ticker wants to be polled at, if running.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Number of ticks fired since creation.
    #[inline]
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Returns `true` when a tick is due at `now`, and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next else { return false };
        if now < due {
            return false;
        }

        let mut next = due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next = Some(next);
        self.fired = self.fired.wrapping_add(1);
        true
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn stopped_ticker_never_fires() {
        let mut t = Ticker::new(SEC);
        let now = Instant::now();
        assert!(!t.is_running());
        assert!(!t.poll(now + SEC * 5));
        assert_eq!(t.deadline(), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC);
        t.start(t0);

        assert!(!t.poll(t0 + Duration::from_millis(999)));
        assert!(t.poll(t0 + SEC));
        assert!(!t.poll(t0 + SEC));
        assert_eq!(t.deadline(), Some(t0 + SEC * 2));
        assert!(t.poll(t0 + SEC * 2 + Duration::from_millis(5)));
        assert_eq!(t.fired(), 2);
    }

    #[test]
    fn late_poll_keeps_the_original_cadence() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC);
        t.start(t0);

        assert!(t.poll(t0 + Duration::from_millis(1300)));
        assert_eq!(t.deadline(), Some(t0 + SEC * 2));
    }

    #[test]
    fn long_stall_collapses_missed_ticks() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC);
        t.start(t0);

        let late = t0 + SEC * 10;
        assert!(t.poll(late));
        assert!(!t.poll(late));
        assert_eq!(t.deadline(), Some(late + SEC));
        assert_eq!(t.fired(), 1);
    }

    #[test]
    fn stop_clears_deadline() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC);
        t.start(t0);
        t.stop();
        assert!(!t.poll(t0 + SEC * 2));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let t = Ticker::new(Duration::ZERO);
        assert_eq!(t.interval(), Duration::from_millis(1));
    }
}
