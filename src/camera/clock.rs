//! Monotonic millisecond time source used for response deadlines

use std::time::Instant;

/// Source of monotonic milliseconds
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

/// Wall-clock backed implementation, counting from construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
pub mod mocks {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Fake clock that moves forward by a fixed step on every read
    #[derive(Debug, Clone)]
    pub struct StepClock {
        now: Arc<AtomicU64>,
        step: u64,
    }

    impl StepClock {
        pub fn new(step: u64) -> Self {
            Self {
                now: Arc::new(AtomicU64::new(0)),
                step,
            }
        }

        pub fn elapsed(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    impl Clock for StepClock {
        fn now_ms(&self) -> u64 {
            self.now.fetch_add(self.step, Ordering::SeqCst)
        }
    }
}
