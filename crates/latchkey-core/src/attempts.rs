//! Wrong-attempt bookkeeping

/// What a failed attempt escalates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Below the threshold; `count` is the running total after this attempt
    Warn {
        /// Failed attempts so far
        count: u32,
    },
    /// This attempt reached the threshold; the counter has been reset
    Alarm {
        /// The attempt number that tripped the alarm (equal to the threshold)
        count: u32,
    },
}

/// Counts consecutive wrong passwords.
///
/// The stored value never reaches `threshold`: hitting it resets the count
/// to zero and yields [`FailureVerdict::Alarm`].
#[derive(Debug, Clone)]
pub struct AttemptCounter {
    count: u32,
    threshold: u32,
}

impl AttemptCounter {
    /// New counter at zero. A zero threshold is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Current number of failures
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Configured threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Forget all failures
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Register one wrong password
    pub fn record_failure(&mut self) -> FailureVerdict {
        self.count += 1;
        if self.count >= self.threshold {
            let count = self.count;
            self.count = 0;
            FailureVerdict::Alarm { count }
        } else {
            FailureVerdict::Warn { count: self.count }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_on_third_failure() {
        let mut counter = AttemptCounter::new(3);
        assert_eq!(counter.record_failure(), FailureVerdict::Warn { count: 1 });
        assert_eq!(counter.record_failure(), FailureVerdict::Warn { count: 2 });
        assert_eq!(counter.record_failure(), FailureVerdict::Alarm { count: 3 });
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut counter = AttemptCounter::new(3);
        counter.record_failure();
        counter.record_failure();
        counter.reset();
        assert_eq!(counter.record_failure(), FailureVerdict::Warn { count: 1 });
    }

    #[test]
    fn test_threshold_of_one() {
        let mut counter = AttemptCounter::new(0);
        assert_eq!(counter.threshold(), 1);
        assert_eq!(counter.record_failure(), FailureVerdict::Alarm { count: 1 });
    }
}
