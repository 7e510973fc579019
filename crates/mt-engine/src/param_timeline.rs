//! Declarative parameter automation on the engine clock.
//!
//! A `ParamTimeline` is a short list of `(value, at)` control points in
//! absolute engine seconds, evaluated like an audio-parameter event list:
//! a `Set` point jumps to its value, a `Linear` point ramps to its value
//! from the previous point. Because points are absolute, evaluating a
//! timeline part-way through (e.g. when playback starts mid-fade) yields the
//! same value the full run would have produced at that instant.

use arrayvec::ArrayVec;

/// Maximum control points per timeline. A clip envelope needs four.
pub const MAX_CONTROL_POINTS: usize = 8;

/// How a control point is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    /// Jump to the value at `at`.
    Set,
    /// Ramp linearly from the previous point, arriving at `at`.
    Linear,
}

/// A single scheduled value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub value: f32,
    /// Absolute engine time in seconds.
    pub at: f64,
    pub ramp: Ramp,
}

/// Sorted control points plus the value before the first one.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamTimeline {
    points: ArrayVec<ControlPoint, MAX_CONTROL_POINTS>,
    initial: f32,
}

impl ParamTimeline {
    pub fn new(initial: f32) -> Self {
        Self { points: ArrayVec::new(), initial }
    }

    fn insert(&mut self, point: ControlPoint) -> bool {
        if self.points.is_full() {
            return false;
        }
        // Points with equal times keep scheduling order.
        let idx = self.points.partition_point(|p| p.at <= point.at);
        self.points.insert(idx, point);
        true
    }

    /// Schedule a jump. Returns `false` when the timeline is full.
    pub fn set_value_at_time(&mut self, value: f32, at: f64) -> bool {
        self.insert(ControlPoint { value, at, ramp: Ramp::Set })
    }

    /// Schedule a linear ramp ending at `at`. Returns `false` when full.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, at: f64) -> bool {
        self.insert(ControlPoint { value, at, ramp: Ramp::Linear })
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Drop every scheduled point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Value at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let after = self.points.partition_point(|p| p.at <= t);
        if after == 0 {
            return self.initial;
        }
        let prev = &self.points[after - 1];
        match self.points.get(after) {
            Some(next) if next.ramp == Ramp::Linear => {
                let span = next.at - prev.at;
                if span <= 0.0 {
                    return next.value;
                }
                let progress = ((t - prev.at) / span) as f32;
                prev.value + (next.value - prev.value) * progress
            }
            _ => prev.value,
        }
    }
}

/// Placement of a clip envelope on the engine clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeShape {
    /// Engine time of the clip's timeline start (may lie before playback began).
    pub true_start: f64,
    /// Engine time of the clip's timeline end.
    pub true_end: f64,
    /// Fade-in length in engine seconds.
    pub fade_in: f64,
    /// Fade-out length in engine seconds.
    pub fade_out: f64,
}

impl EnvelopeShape {
    /// Gain envelope sustaining at `level` with the shape's fades.
    pub fn timeline(&self, level: f32) -> ParamTimeline {
        let mut tl = ParamTimeline::new(0.0);
        if self.fade_in > 0.0 {
            tl.set_value_at_time(0.0, self.true_start);
            tl.linear_ramp_to_value_at_time(level, self.true_start + self.fade_in);
        } else {
            tl.set_value_at_time(level, self.true_start);
        }
        if self.fade_out > 0.0 {
            tl.set_value_at_time(level, self.true_end - self.fade_out);
            tl.linear_ramp_to_value_at_time(0.0, self.true_end);
        }
        tl
    }
}
