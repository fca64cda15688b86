//! Windowed History Aggregation
//!
//! Keeps one slot per acquisition cycle for the last [`HISTORY_CAPACITY`]
//! cycles. A cycle that produced no value still occupies a slot, holding the
//! `None` gap marker, so a window of "the last 10 entries" always means the
//! last 10 cycles in time, not the last 10 successful ones.
//!
//! Windows drop gap slots before aggregating:
//!
//! | Window   | Entries | Aggregate |
//! |----------|---------|-----------|
//! | `Short`  | 3       | median    |
//! | `Medium` | 10      | median    |
//! | `Long`   | 120     | mean      |
//!
//! The short window is the natural published value in this mode: a
//! 3-sample median absorbs one outlier batch without the lag of the longer
//! windows.

use heapless::Vec;

use crate::buffer::RingBuffer;
use crate::constants::conditioning::{
    HISTORY_CAPACITY, LONG_WINDOW_LEN, MEDIUM_WINDOW_LEN, SHORT_WINDOW_LEN,
};

/// Aggregation method for a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    /// Average of values
    Mean,
    /// Median value (mean of the middle pair for even counts)
    Median,
}

/// The three standard windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Last 3 cycles (~90 seconds)
    Short,
    /// Last 10 cycles (~5 minutes)
    Medium,
    /// Whole history (~60 minutes)
    Long,
}

impl Window {
    /// Number of trailing slots the window covers
    pub const fn len(self) -> usize {
        match self {
            Self::Short => SHORT_WINDOW_LEN,
            Self::Medium => MEDIUM_WINDOW_LEN,
            Self::Long => LONG_WINDOW_LEN,
        }
    }

    /// How the window is reduced
    pub const fn method(self) -> AggregationMethod {
        match self {
            Self::Short | Self::Medium => AggregationMethod::Median,
            Self::Long => AggregationMethod::Mean,
        }
    }
}

/// All three window values at once
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSnapshot {
    /// Median of the short window
    pub short: Option<f32>,
    /// Median of the medium window
    pub medium: Option<f32>,
    /// Mean of the long window
    pub long: Option<f32>,
}

/// Gap-aware history of per-cycle adjusted values
#[derive(Debug, Clone, Default)]
pub struct HistoryAggregator {
    slots: RingBuffer<Option<f32>, HISTORY_CAPACITY>,
}

impl HistoryAggregator {
    /// Empty history
    pub const fn new() -> Self {
        Self { slots: RingBuffer::new() }
    }

    /// Record this cycle's value
    pub fn record(&mut self, value: f32) {
        self.slots.push(Some(value));
    }

    /// Record a cycle that produced nothing
    pub fn record_gap(&mut self) {
        self.slots.push(None);
    }

    /// Slots recorded so far, gaps included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Aggregate one window; `None` if it holds only gaps
    pub fn window(&self, window: Window) -> Option<f32> {
        self.aggregate(window.len(), window.method())
    }

    /// Aggregate the trailing `len` slots with `method`
    pub fn aggregate(&self, len: usize, method: AggregationMethod) -> Option<f32> {
        let mut values: Vec<f32, HISTORY_CAPACITY> = self
            .slots
            .recent(len)
            .filter_map(|slot| *slot)
            .collect();

        if values.is_empty() {
            return None;
        }

        match method {
            AggregationMethod::Mean => {
                Some(values.iter().sum::<f32>() / values.len() as f32)
            }
            AggregationMethod::Median => Some(median(&mut values)),
        }
    }

    /// Short, medium and long window values
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            short: self.window(Window::Short),
            medium: self.window(Window::Medium),
            long: self.window(Window::Long),
        }
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Median of a non-empty slice; sorts in place
fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_window_median() {
        let mut agg = HistoryAggregator::new();
        for v in [100.0, 10.0, 30.0, 20.0] {
            agg.record(v);
        }
        // Last three: 10, 30, 20
        assert_eq!(agg.window(Window::Short), Some(20.0));
    }

    #[test]
    fn gaps_are_dropped_but_keep_time_alignment() {
        let mut agg = HistoryAggregator::new();
        agg.record(50.0);
        agg.record(10.0);
        agg.record_gap();
        agg.record(30.0);

        // Last three slots: 10, gap, 30
        assert_eq!(agg.window(Window::Short), Some(20.0));
        assert_eq!(agg.len(), 4);
    }

    #[test]
    fn all_gap_window_is_absent() {
        let mut agg = HistoryAggregator::new();
        agg.record(10.0);
        for _ in 0..3 {
            agg.record_gap();
        }
        assert_eq!(agg.window(Window::Short), None);
        assert_eq!(agg.window(Window::Medium), Some(10.0));
    }

    #[test]
    fn long_window_is_mean_of_everything() {
        let mut agg = HistoryAggregator::new();
        for i in 1..=130 {
            agg.record(i as f32);
        }
        // Holds 11..=130
        assert_eq!(agg.window(Window::Long), Some(70.5));
    }

    #[test]
    fn medium_window_even_count_median() {
        let mut agg = HistoryAggregator::new();
        for v in [1.0, 2.0, 3.0, 4.0] {
            agg.record(v);
        }
        assert_eq!(agg.window(Window::Medium), Some(2.5));
    }

    #[test]
    fn empty_snapshot() {
        let agg = HistoryAggregator::new();
        assert_eq!(agg.snapshot(), WindowSnapshot::default());
    }
}
