use std::collections::VecDeque;
use std::time::Instant;

/// Window used by [`PerformanceCounter::default`].
pub const DEFAULT_CAPACITY: usize = 120;

#[derive(Clone, Copy, Debug)]
struct Sample {
    at: Instant,
    size: usize,
}

/// Frame rate and mean transfer size over the last `capacity` reads.
///
/// Feed it once per frame with [`tick`](PerformanceCounter::tick). Every
/// `capacity` ticks it returns `true`, which is the moment to report
/// [`fps`](PerformanceCounter::fps) and
/// [`mean_data_size`](PerformanceCounter::mean_data_size). Both are computed
/// from the samples currently in the window, never from running totals.
#[derive(Clone, Debug)]
pub struct PerformanceCounter {
    capacity: usize,
    samples: VecDeque<Sample>,
    ticks: usize,
}

impl Default for PerformanceCounter {
    fn default() -> Self {
        PerformanceCounter::new(DEFAULT_CAPACITY)
    }
}

impl PerformanceCounter {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> PerformanceCounter {
        let capacity = capacity.max(1);
        PerformanceCounter {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            ticks: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn tick(&mut self, byte_size: usize) -> bool {
        self.tick_at(byte_size, Instant::now())
    }

    /// Records a sample taken at `at`. Returns `true` when a full window's
    /// worth of samples has arrived since the last `true`.
    pub fn tick_at(&mut self, byte_size: usize, at: Instant) -> bool {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { at, size: byte_size });

        self.ticks += 1;
        if self.ticks == self.capacity {
            self.ticks = 0;
            true
        } else {
            false
        }
    }

    /// Samples per second across the window. Zero when the window spans no
    /// time (fewer than two samples, or all at the same instant).
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let span = last.at.saturating_duration_since(first.at).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / span
    }

    pub fn mean_data_size(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: u128 = self.samples.iter().map(|s| s.size as u128).sum();
        total as f64 / self.samples.len() as f64
    }

    /// Drops every sample and starts a fresh cycle.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_when_window_fills() {
        let t0 = Instant::now();
        let mut counter = PerformanceCounter::new(3);
        assert!(!counter.tick_at(100, t0));
        assert!(!counter.tick_at(200, t0 + Duration::from_secs(1)));
        assert!(counter.tick_at(300, t0 + Duration::from_secs(2)));
        assert_eq!(counter.mean_data_size(), 200.0);
        assert_eq!(counter.fps(), 1.5);
    }

    #[test]
    fn reports_again_after_another_full_cycle() {
        let t0 = Instant::now();
        let mut counter = PerformanceCounter::new(2);
        let fired: Vec<bool> = (0..6)
            .map(|i| counter.tick_at(10, t0 + Duration::from_millis(100 * i)))
            .collect();
        assert_eq!(fired, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn window_is_bounded_and_evicts_oldest() {
        let t0 = Instant::now();
        let mut counter = PerformanceCounter::new(3);
        for (i, size) in [1000, 10, 20, 30].into_iter().enumerate() {
            counter.tick_at(size, t0 + Duration::from_secs(i as u64));
        }
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.mean_data_size(), 20.0);
        // samples at 1s, 2s, 3s
        assert_eq!(counter.fps(), 1.5);
    }

    #[test]
    fn zero_span_does_not_divide_by_zero() {
        let t0 = Instant::now();
        let mut counter = PerformanceCounter::new(2);
        counter.tick_at(5, t0);
        counter.tick_at(5, t0);
        assert_eq!(counter.fps(), 0.0);

        let counter = PerformanceCounter::new(4);
        assert_eq!(counter.fps(), 0.0);
        assert_eq!(counter.mean_data_size(), 0.0);
    }

    #[test]
    fn reset_starts_over() {
        let t0 = Instant::now();
        let mut counter = PerformanceCounter::new(3);
        counter.tick_at(1, t0);
        counter.tick_at(1, t0 + Duration::from_secs(1));
        counter.reset();
        assert!(counter.is_empty());
        assert!(!counter.tick_at(1, t0 + Duration::from_secs(2)));
        assert!(!counter.tick_at(1, t0 + Duration::from_secs(3)));
        assert!(counter.tick_at(1, t0 + Duration::from_secs(4)));
    }

    #[test]
    fn default_window_is_120() {
        let counter = PerformanceCounter::default();
        assert_eq!(counter.capacity(), DEFAULT_CAPACITY);
        assert_eq!(counter.capacity(), 120);
        assert!(counter.is_empty());
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let mut counter = PerformanceCounter::new(0);
        assert_eq!(counter.capacity(), 1);
        assert!(counter.tick(42));
    }
}
