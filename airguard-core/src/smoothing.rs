//! Linear Adjustment and Output Smoothing
//!
//! Both are resolved once at startup into closed types; the pipeline never
//! inspects configuration at runtime.
//!
//! ## Adjustment
//!
//! A per-unit calibration `value * mul + add`, clamped at zero. Multiply
//! runs first so `add` is expressed in output units. Either constant may be
//! absent, which leaves that step as the identity.
//!
//! ## Smoothing
//!
//! | Strategy        | Output                                           |
//! |-----------------|--------------------------------------------------|
//! | `Disabled`      | the filtered value                               |
//! | `Exponential(α)`| `previous * α + filtered * (1 - α)`              |
//! | `Mean`          | running mean of every value since the last reset |
//! | `Custom(f)`     | `f(previous, filtered)`                          |
//!
//! With no previous output (first cycle, or first cycle after a gap) every
//! strategy passes the value through.

/// Calibration applied to each reduced value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjustment {
    /// Offset added after scaling
    pub add: Option<f32>,
    /// Scale factor applied first
    pub mul: Option<f32>,
}

impl Adjustment {
    /// No adjustment
    pub const IDENTITY: Self = Self { add: None, mul: None };

    /// Adjustment with the given constants
    pub const fn new(add: Option<f32>, mul: Option<f32>) -> Self {
        Self { add, mul }
    }

    /// Apply multiply-then-add and clamp negatives to zero
    pub fn apply(&self, value: f32) -> f32 {
        let mut adjusted = value;
        if let Some(mul) = self.mul {
            adjusted *= mul;
        }
        if let Some(add) = self.add {
            adjusted += add;
        }
        adjusted.max(0.0)
    }
}

/// Combines the previous smoothed output with the new filtered value
pub type SmoothingFn = fn(previous: f32, current: f32) -> f32;

/// Smoothing strategy, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Smoothing {
    /// Pass-through
    #[default]
    Disabled,
    /// Exponential smoothing with coefficient α in `[0, 1)`
    Exponential(f32),
    /// Cumulative moving average since the last reset
    Mean,
    /// Caller-supplied combination of previous output and new value
    Custom(SmoothingFn),
}

/// Stateful application of a [`Smoothing`] strategy
#[derive(Debug, Clone)]
pub struct Smoother {
    strategy: Smoothing,
    previous: Option<f32>,
    samples: u32,
}

impl Smoother {
    /// Smoother with no history
    pub const fn new(strategy: Smoothing) -> Self {
        Self { strategy, previous: None, samples: 0 }
    }

    /// Last smoothed output, if any since the last reset
    pub fn previous(&self) -> Option<f32> {
        self.previous
    }

    /// Smooth `value` and remember the result
    pub fn apply(&mut self, value: f32) -> f32 {
        self.samples = self.samples.saturating_add(1);

        let output = match (self.previous, self.strategy) {
            (None, _) | (_, Smoothing::Disabled) => value,
            (Some(prev), Smoothing::Exponential(alpha)) => prev * alpha + value * (1.0 - alpha),
            (Some(prev), Smoothing::Mean) => prev + (value - prev) / self.samples as f32,
            (Some(prev), Smoothing::Custom(combine)) => combine(prev, value),
        };

        self.previous = Some(output);
        output
    }

    /// Forget history so the next value passes through
    pub fn reset(&mut self) {
        self.previous = None;
        self.samples = 0;
    }
}
