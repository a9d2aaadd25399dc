//! Monotonic time source used for keep-alive, retry, and timeout bookkeeping.

/// A monotonic millisecond counter supplied by the embedder (e.g. `Instant::now()` under
/// `std`, a hardware tick counter on bare metal).
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[cfg(feature = "std")]
pub mod std_clock {
    use super::Clock;
    use std::time::Instant;

    /// A [`Clock`] backed by `std::time::Instant`, for hosted targets and tests.
    pub struct StdClock {
        start: Instant,
    }

    impl StdClock {
        pub fn new() -> Self {
            Self { start: Instant::now() }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_ms(&self) -> u64 {
            self.start.elapsed().as_millis() as u64
        }
    }
}

/// A loopback-free in-memory [`Clock`] used by this crate's own tests, exposed unconditionally
/// (not `#[cfg(test)]`) so the black-box tests under `tests/`, compiled as a separate crate,
/// can depend on it too.
pub mod mock {
    use super::Clock;
    use core::cell::Cell;

    /// A [`Clock`] the test controls explicitly.
    #[derive(Default)]
    pub struct MockClock {
        now: Cell<u64>,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self { now: Cell::new(0) }
        }

        pub fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }
}
