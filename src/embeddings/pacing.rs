// pacing.rs — Request pacing for rate-limited providers.
//
// The policy (when to pause, for how long) is separate from the mechanism (the
// actual blocking sleep), so tests can run thousands of requests instantly.

use std::time::Duration;

use crate::config;

/// Decides whether to pause after a request.
pub trait PacingStrategy {
    /// `request_index` is zero-based: 0 for the first request issued.
    fn pause_after(&self, request_index: u64) -> Option<Duration>;
}

/// Pause for a fixed duration after every `every`-th request.
///
/// Blind: never looks at provider responses or rate-limit headers.
#[derive(Debug, Clone)]
pub struct FixedIntervalPacing {
    pub every: u64,
    pub pause: Duration,
}

impl Default for FixedIntervalPacing {
    fn default() -> Self {
        Self {
            every: config::pacing::REQUESTS_PER_PAUSE,
            pause: Duration::from_secs(config::pacing::PAUSE_SECS),
        }
    }
}

impl PacingStrategy for FixedIntervalPacing {
    fn pause_after(&self, request_index: u64) -> Option<Duration> {
        if self.every == 0 {
            return None;
        }
        (request_index % self.every == self.every - 1).then_some(self.pause)
    }
}

/// Blocks the caller.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Counts requests and applies the pacing strategy after each one.
pub struct Throttle {
    strategy: Box<dyn PacingStrategy>,
    sleeper: Box<dyn Sleeper>,
    issued: u64,
}

impl Throttle {
    pub fn new(strategy: Box<dyn PacingStrategy>, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            strategy,
            sleeper,
            issued: 0,
        }
    }

    /// Record one completed request; sleeps if the strategy asks for it.
    pub fn after_request(&mut self) {
        let index = self.issued;
        self.issued += 1;
        if let Some(pause) = self.strategy.pause_after(index) {
            log::info!("avoiding rate limit: pausing {}s after request #{}", pause.as_secs(), self.issued);
            self.sleeper.sleep(pause);
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records requested sleeps instead of blocking.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) calls: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub(crate) fn recorded(&self) -> Vec<Duration> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    fn throttle_with(sleeper: &RecordingSleeper) -> Throttle {
        Throttle::new(Box::new(FixedIntervalPacing::default()), Box::new(sleeper.clone()))
    }

    #[test]
    fn test_fixed_interval_pauses_on_30th_request() {
        let p = FixedIntervalPacing::default();
        assert_eq!(p.pause_after(0), None);
        assert_eq!(p.pause_after(28), None);
        assert_eq!(p.pause_after(29), Some(Duration::from_secs(120)));
        assert_eq!(p.pause_after(30), None);
        assert_eq!(p.pause_after(59), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_61_requests_sleep_exactly_twice() {
        let sleeper = RecordingSleeper::default();
        let mut throttle = throttle_with(&sleeper);

        for i in 1..=61u64 {
            throttle.after_request();
            let expected = (i / 30) as usize;
            assert_eq!(sleeper.recorded().len(), expected, "after request #{i}");
        }
        assert_eq!(throttle.issued(), 61);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(120); 2]);
    }

    #[test]
    fn test_thousands_of_requests_without_real_sleep() {
        let sleeper = RecordingSleeper::default();
        let mut throttle = throttle_with(&sleeper);
        for _ in 0..3000 {
            throttle.after_request();
        }
        assert_eq!(sleeper.recorded().len(), 100);
    }

    #[test]
    fn test_zero_interval_never_pauses() {
        let p = FixedIntervalPacing {
            every: 0,
            pause: Duration::from_secs(1),
        };
        assert_eq!(p.pause_after(0), None);
        assert_eq!(p.pause_after(29), None);
    }
}
