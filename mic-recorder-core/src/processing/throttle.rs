use std::time::{Duration, Instant};

/// Enforces a minimum gap between successive emissions.
///
/// Owned by the read loop, so it needs no synchronization. Offers that arrive
/// inside the interval are rejected and counted; the caller drops them.
#[derive(Debug)]
pub struct EmitThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    suppressed: u64,
}

impl EmitThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            suppressed: 0,
        }
    }

    /// Returns `true` if an event may be emitted at `now`, and records it.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_emit {
            if now.saturating_duration_since(last) < self.interval {
                self.suppressed += 1;
                return false;
            }
        }
        self.last_emit = Some(now);
        true
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Number of offers rejected so far.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reset(&mut self) {
        self.last_emit = None;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_offer_always_passes() {
        let mut throttle = EmitThrottle::new(Duration::from_millis(50));
        assert!(throttle.try_acquire_at(Instant::now()));
    }

    #[test]
    fn offers_inside_interval_are_suppressed() {
        let start = Instant::now();
        let mut throttle = EmitThrottle::new(Duration::from_millis(50));

        assert!(throttle.try_acquire_at(start));
        assert!(!throttle.try_acquire_at(start + Duration::from_millis(10)));
        assert!(!throttle.try_acquire_at(start + Duration::from_millis(49)));
        assert!(throttle.try_acquire_at(start + Duration::from_millis(50)));
        assert_eq!(throttle.suppressed(), 2);
    }

    #[test]
    fn sustained_fast_offers_respect_interval() {
        let start = Instant::now();
        let interval = Duration::from_millis(50);
        let mut throttle = EmitThrottle::new(interval);

        // One offer every 2.9 ms for one second (~ a 128-frame block at 44.1 kHz).
        let emitted: Vec<Instant> = (0..345)
            .map(|i| start + Duration::from_micros(i * 2900))
            .filter(|&t| throttle.try_acquire_at(t))
            .collect();

        assert!(emitted.len() <= 21, "emitted {} events", emitted.len());
        assert!(emitted.len() >= 19);
        for pair in emitted.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(45));
        }
    }

    #[test]
    fn reset_allows_immediate_emit() {
        let start = Instant::now();
        let mut throttle = EmitThrottle::new(Duration::from_secs(10));
        assert!(throttle.try_acquire_at(start));
        throttle.reset();
        assert!(throttle.try_acquire_at(start + Duration::from_millis(1)));
    }
}
