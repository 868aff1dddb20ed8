//! Submission timestamps.
//!
//! Message order rests on client wall-clock time. Clocks on different clients
//! can disagree; within one client [`SystemClock`] at least never steps
//! backwards.

use std::sync::Mutex;

use parley_types::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock that is monotonic per instance.
///
/// If the system time moves backwards or repeats, the next timestamp is one
/// nanosecond after the last one handed out.
#[derive(Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&self, wall: Timestamp) -> Timestamp {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stamp = match *last {
            Some(prev) if wall <= prev => prev.next(),
            _ => wall,
        };
        *last = Some(stamp);
        stamp
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.advance(Timestamp::from_datetime(chrono::Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_repeats_or_goes_backwards() {
        let clock = SystemClock::new();
        let t1 = clock.advance(Timestamp::new(100, 0));
        let t2 = clock.advance(Timestamp::new(100, 0));
        let t3 = clock.advance(Timestamp::new(99, 0));
        let t4 = clock.advance(Timestamp::new(200, 0));
        assert_eq!(t1, Timestamp::new(100, 0));
        assert_eq!(t2, Timestamp::new(100, 1));
        assert_eq!(t3, Timestamp::new(100, 2));
        assert_eq!(t4, Timestamp::new(200, 0));
    }

    #[test]
    fn system_clock_is_strictly_increasing() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }
}
