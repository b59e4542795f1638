use std::time::Duration;

/// Pause between two reads of a session record.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F: FnMut(Duration)> Sleeper for F {
    fn sleep(&mut self, duration: Duration) {
        self(duration)
    }
}

/// How a waiting participant re-reads the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub factor: u32,
    /// Total sleeping time after which the wait gives up. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(3),
            factor: 2,
            timeout: None,
        }
    }
}

/// Exponential backoff between `initial` and `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: PollPolicy,
    current: Duration,
    waited: Duration,
}

impl Backoff {
    pub fn new(policy: PollPolicy) -> Self {
        Backoff {
            policy,
            current: policy.initial,
            waited: Duration::ZERO,
        }
    }

    /// Delay to sleep now; the following one grows by `factor` up to `max`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.policy.max);
        self.current = (delay * self.policy.factor.max(1)).min(self.policy.max);
        self.waited += delay;
        delay
    }

    /// Back to the initial delay after the record changed.
    pub fn reset(&mut self) {
        self.current = self.policy.initial;
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn expired(&self) -> bool {
        self.policy.timeout.is_some_and(|limit| self.waited >= limit)
    }
}
