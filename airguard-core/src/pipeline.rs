//! Signal Conditioning Pipeline
//!
//! ## Overview
//!
//! The particulate sensor's raw values are spiky: a burst of six frames can
//! easily contain a value twice the others. The pipeline turns one decoded
//! batch into at most one trustworthy reading per cycle:
//!
//! ```text
//! RawBatch ─► select ─► volatility ─► reduce ─► adjust ─┬─► directional ─► smooth ─► Reading
//!             last 6     max-min<100   median-ish  mul,add │   filter
//!             sorted                                       ├─► ring buffer (adjusted history)
//!                                                          └─► history aggregator
//! ```
//!
//! Every stage returns a [`ConditioningResult`] and the chain short-circuits
//! with `?`. When any stage rejects the cycle the reading is
//! [`Reading::Absent`], the directional filter and smoother forget their
//! previous values and the aggregator records a gap, so a later valid cycle
//! is never compared against a value from before the gap.
//!
//! ## Directional Filter
//!
//! The filter reports the lower of the previous and current adjusted values
//! but always remembers the *current* one. An upward spike is therefore
//! delayed by one cycle (and dropped entirely if it lasts a single cycle),
//! while a genuine decrease shows up immediately.
//!
//! ## Example
//!
//! ```rust
//! use airguard_core::pipeline::{ConditioningPipeline, Reading};
//! use airguard_core::smoothing::{Adjustment, Smoothing};
//!
//! let mut pipeline = ConditioningPipeline::new(Adjustment::IDENTITY, Smoothing::Disabled);
//! assert_eq!(pipeline.process(&[100, 110, 120]), Reading::Value(110.0));
//! ```

use heapless::Vec;

use crate::aggregator::{HistoryAggregator, Window};
use crate::buffer::RingBuffer;
use crate::constants::conditioning::{
    HISTORY_CAPACITY, MAX_RETAINED_VALUES, MIN_USABLE_VALUES, VOLATILITY_THRESHOLD,
};
use crate::errors::{ConditioningError, ConditioningResult};
use crate::smoothing::{Adjustment, Smoother, Smoothing};

/// Values retained for reduction, sorted ascending
pub type Retained = Vec<u16, MAX_RETAINED_VALUES>;

/// One cycle's conditioned value, or why there is none
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// A publishable, non-negative value
    Value(f32),
    /// Nothing could be derived this cycle
    Absent(ConditioningError),
}

impl Reading {
    /// The value, if present
    pub fn value(&self) -> Option<f32> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Absent(_) => None,
        }
    }

    /// Whether this cycle produced nothing
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }
}

/// Which value a cycle publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputMode {
    /// Output of the directional filter and smoother
    #[default]
    Smoothed,
    /// Median of the last three cycles' adjusted values
    ShortWindow,
}

/// Intermediate values of one successful cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleValues {
    /// Reduced value before adjustment
    pub reduced: f32,
    /// After adjustment (what the history holds)
    pub adjusted: f32,
    /// After the directional filter
    pub filtered: f32,
    /// After smoothing
    pub smoothed: f32,
}

/// "Report the lower of the last two" filter
#[derive(Debug, Clone, Default)]
pub struct DirectionalFilter {
    last: Option<f32>,
}

impl DirectionalFilter {
    /// Filter with no history
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Report `min(previous, value)` and remember `value` unfiltered
    pub fn apply(&mut self, value: f32) -> f32 {
        let output = match self.last {
            Some(previous) if value > previous => previous,
            _ => value,
        };
        self.last = Some(value);
        output
    }

    /// Last unfiltered value
    pub fn last(&self) -> Option<f32> {
        self.last
    }

    /// Forget the previous value
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Keep the most recent values and sort them ascending
///
/// Assumes `batch` is in arrival order.
pub fn select(batch: &[u16]) -> Retained {
    let start = batch.len().saturating_sub(MAX_RETAINED_VALUES);
    let mut retained: Retained = batch[start..].iter().copied().collect();
    retained.sort_unstable();
    retained
}

/// Reject a sorted selection whose spread reaches the volatility threshold
pub fn check_volatility(sorted: &[u16]) -> ConditioningResult<()> {
    match (sorted.first(), sorted.last()) {
        (Some(&min), Some(&max)) if max.saturating_sub(min) >= VOLATILITY_THRESHOLD => {
            Err(ConditioningError::TooVolatile { min, max })
        }
        (Some(_), Some(_)) => Ok(()),
        _ => Err(ConditioningError::NoFrames),
    }
}

/// Reduce a sorted selection of 3 to 6 values to one value
///
/// | count | result                    |
/// |-------|---------------------------|
/// | 3     | `v[1]`                    |
/// | 4     | `(v[1] + v[2]) / 2`       |
/// | 5     | `v[2]`                    |
/// | 6     | `(v[2] + v[3]) / 2`       |
pub fn reduce(sorted: &[u16]) -> ConditioningResult<f32> {
    let v = |i: usize| f32::from(sorted[i]);
    match sorted.len() {
        3 => Ok(v(1)),
        4 => Ok((v(1) + v(2)) / 2.0),
        5 => Ok(v(2)),
        6 => Ok((v(2) + v(3)) / 2.0),
        available => Err(ConditioningError::InsufficientData {
            required: MIN_USABLE_VALUES,
            available,
        }),
    }
}

/// Stateful conditioning pipeline
///
/// Owns all history: the adjusted-reading ring buffer, the aggregator, the
/// directional filter and the smoother.
#[derive(Debug, Clone)]
pub struct ConditioningPipeline {
    adjustment: Adjustment,
    output: OutputMode,
    history: RingBuffer<f32, HISTORY_CAPACITY>,
    aggregator: HistoryAggregator,
    filter: DirectionalFilter,
    smoother: Smoother,
}

impl ConditioningPipeline {
    /// Pipeline publishing the smoothed value
    pub fn new(adjustment: Adjustment, smoothing: Smoothing) -> Self {
        Self {
            adjustment,
            output: OutputMode::Smoothed,
            history: RingBuffer::new(),
            aggregator: HistoryAggregator::new(),
            filter: DirectionalFilter::new(),
            smoother: Smoother::new(smoothing),
        }
    }

    /// Choose which value [`process`](Self::process) reports
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Condition one batch into this cycle's reading
    pub fn process(&mut self, batch: &[u16]) -> Reading {
        match self.condition(batch) {
            Ok(values) => match self.output {
                OutputMode::Smoothed => Reading::Value(values.smoothed),
                OutputMode::ShortWindow => self
                    .aggregator
                    .window(Window::Short)
                    .map_or(Reading::Value(values.adjusted), Reading::Value),
            },
            Err(reason) => self.record_absent(reason),
        }
    }

    /// Run every stage, returning all intermediate values
    pub fn condition(&mut self, batch: &[u16]) -> ConditioningResult<CycleValues> {
        let values = self.try_condition(batch);
        if values.is_err() {
            self.reset_filters();
            self.aggregator.record_gap();
        }
        values
    }

    fn try_condition(&mut self, batch: &[u16]) -> ConditioningResult<CycleValues> {
        if batch.is_empty() {
            return Err(ConditioningError::NoFrames);
        }

        let retained = select(batch);
        check_volatility(&retained)?;
        let reduced = reduce(&retained)?;
        let adjusted = self.adjustment.apply(reduced);

        self.history.push(adjusted);
        self.aggregator.record(adjusted);

        let filtered = self.filter.apply(adjusted);
        let smoothed = self.smoother.apply(filtered);

        Ok(CycleValues { reduced, adjusted, filtered, smoothed })
    }

    /// Mark this cycle as absent for a reason found outside the pipeline
    ///
    /// Used when the transport read itself failed.
    pub fn record_absent(&mut self, reason: ConditioningError) -> Reading {
        self.reset_filters();
        self.aggregator.record_gap();
        Reading::Absent(reason)
    }

    fn reset_filters(&mut self) {
        self.filter.reset();
        self.smoother.reset();
    }

    /// Adjusted readings, oldest first (read-only)
    pub fn history(&self) -> &RingBuffer<f32, HISTORY_CAPACITY> {
        &self.history
    }

    /// Gap-aware windowed history (read-only)
    pub fn aggregator(&self) -> &HistoryAggregator {
        &self.aggregator
    }

    /// Previous unfiltered adjusted value held by the directional filter
    pub fn last_adjusted(&self) -> Option<f32> {
        self.filter.last()
    }

    /// Previous smoothed output
    pub fn last_smoothed(&self) -> Option<f32> {
        self.smoother.previous()
    }

    /// Mean of the adjusted history (roughly the last hour)
    pub fn hourly_average(&self) -> Option<f32> {
        self.history.mean()
    }
}
