use std::time::Instant;

/// Monotonic time source with nanosecond resolution.
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary but fixed origin.
    fn now(&self) -> u64;
}

/// [Clock] backed by [Instant].
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
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Measures the duration of a single backup.
pub struct Stopwatch<'a> {
    clock: &'a dyn Clock,
    start: u64,
}

impl<'a> Stopwatch<'a> {
    pub fn start(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            start: clock.now(),
        }
    }

    /// Nanoseconds since [start](Self::start).
    pub fn elapsed(&self) -> u64 {
        self.clock.now().saturating_sub(self.start)
    }
}
