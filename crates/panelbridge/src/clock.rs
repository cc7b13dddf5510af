//! Injectable time source for the poll loops.
//!
//! The loops only ever ask "what time is it" and "wait this long", so
//! tests can drive them with a manual clock and no real time passing.

use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeClock;
    use super::*;

    #[test]
    fn fake_clock_advances_on_sleep() {
        let clock = FakeClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_millis(250));

        assert_eq!(clock.now() - start, Duration::from_millis(250));
        assert_eq!(clock.slept.borrow().as_slice(), &[Duration::from_millis(250)]);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
