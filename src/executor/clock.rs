use std::time::Instant;

/// Source of timestamps for per-call timing.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Whole milliseconds between two instants, rounded to nearest.
pub fn elapsed_millis(start: Instant, end: Instant) -> u64 {
    let nanos = end.saturating_duration_since(start).as_nanos();
    ((nanos + 500_000) / 1_000_000) as u64
}

pub fn millis_to_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_millis_rounds_to_nearest() {
        let start = Instant::now();
        assert_eq!(elapsed_millis(start, start + Duration::from_micros(1_499)), 1);
        assert_eq!(elapsed_millis(start, start + Duration::from_micros(1_500)), 2);
        assert_eq!(elapsed_millis(start + Duration::from_secs(1), start), 0);
    }

    #[test]
    fn millis_to_secs_keeps_three_decimals() {
        assert_eq!(millis_to_secs(1_234), 1.234);
        assert_eq!(millis_to_secs(0), 0.0);
    }
}
