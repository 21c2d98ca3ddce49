/// During a sustained outage only every Nth consecutive failure is logged.
pub const FAILURE_LOG_EVERY: u64 = 100;

/// Tracks consecutive heartbeat failures and decides which outcomes are
/// worth a log line. Offline until the first successful send.
#[derive(Debug, Clone, Default)]
pub struct FailureTracker {
    failures: u64,
    online: bool,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a failure. True for the first failure of a streak and every
    /// [`FAILURE_LOG_EVERY`]th after it.
    pub fn record_failure(&mut self) -> bool {
        self.failures += 1;
        if self.failures == 1 {
            self.online = false;
            return true;
        }
        self.failures % FAILURE_LOG_EVERY == 0
    }

    /// Count a success. True when it ends a failure streak.
    pub fn record_success(&mut self) -> bool {
        let recovered = self.failures > 0;
        self.failures = 0;
        self.online = true;
        recovered
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.failures
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Inside a failure streak, where most failures go unlogged.
    pub fn is_suppressing(&self) -> bool {
        self.failures > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_failure_then_success_logs_twice() {
        let mut tracker = FailureTracker::new();
        let mut logs = 0;
        if tracker.record_failure() {
            logs += 1;
        }
        assert!(!tracker.is_online());
        if tracker.record_success() {
            logs += 1;
        }
        assert_eq!(logs, 2);
        assert!(tracker.is_online());
        assert_eq!(tracker.consecutive_failures(), 0);
    }

    #[test]
    fn test_sustained_outage_logs_sparsely() {
        let mut tracker = FailureTracker::new();
        let logged: Vec<u64> = (1..=250u64).filter(|_| tracker.record_failure()).collect();
        assert_eq!(logged, vec![1, 100, 200]);
        assert_eq!(tracker.consecutive_failures(), 250);
        assert!(tracker.is_suppressing());
    }

    #[test]
    fn test_success_without_failures_is_quiet() {
        let mut tracker = FailureTracker::new();
        assert!(!tracker.is_online());
        assert!(!tracker.record_success());
        assert!(!tracker.record_success());
        assert!(tracker.is_online());
    }

    #[test]
    fn test_new_streak_logs_first_failure_again() {
        let mut tracker = FailureTracker::new();
        for _ in 0..5 {
            tracker.record_failure();
        }
        assert!(tracker.record_success());
        assert!(tracker.record_failure());
    }
}
