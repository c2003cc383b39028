// Rolling throughput history for the live rate chart
use std::collections::VecDeque;

pub const RATE_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSample {
    pub rate: f64,
    pub time_ms: i64,
}

/// Fixed size FIFO of per-second rates derived from a growing total.
///
/// The buffer starts full of zero samples; they take part in min/max like
/// any other sample until pushed out.
#[derive(Debug, Clone)]
pub struct RateTracker {
    samples: VecDeque<RateSample>,
    capacity: usize,
    last_update_ms: i64,
    last_total: u64,
}

impl RateTracker {
    pub fn new(capacity: usize, now_ms: i64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: std::iter::repeat(RateSample::default()).take(capacity).collect(),
            capacity,
            last_update_ms: now_ms,
            last_total: 0,
        }
    }

    /// Two point derivative of `total` since the previous call, per second.
    pub fn record(&mut self, total: u64, now_ms: i64) -> f64 {
        let elapsed_ms = (now_ms - self.last_update_ms).max(1);
        let delta = total as f64 - self.last_total as f64;
        let rate = delta / elapsed_ms as f64 * 1000.0;

        self.samples.push_back(RateSample { rate, time_ms: now_ms });
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.last_update_ms = now_ms;
        self.last_total = total;
        rate
    }

    /// Rounded minimum and maximum rate over the whole buffer.
    pub fn min_max(&self) -> (f64, f64) {
        let (min, max) = self.samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.rate), hi.max(s.rate))
        });
        (min.round(), max.round())
    }

    pub fn samples(&self) -> impl ExactSizeIterator<Item = &RateSample> {
        self.samples.iter()
    }

    pub fn sample_at(&self, index: usize) -> Option<&RateSample> {
        self.samples.get(index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Sample positions labelled on the chart: a quarter, half and three
    /// quarters of the way through the buffer.
    pub fn label_indices(&self) -> [usize; 3] {
        let quarter = self.capacity / 4;
        [quarter, self.capacity / 2, quarter * 3]
    }
}
