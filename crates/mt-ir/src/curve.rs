//! Interpolation laws for automation segments.

use serde::{Deserialize, Serialize};

/// How a segment moves from its left keyframe to the next one.
///
/// The kind is stored on the left keyframe and governs the whole segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    /// Straight line.
    #[default]
    Linear,
    /// Quadratic, starts slow.
    EaseIn,
    /// Quadratic, ends slow.
    EaseOut,
    /// Quadratic on both ends.
    EaseInOut,
    /// Hold the left value until the next keyframe's exact time.
    Step,
}

impl Interpolation {
    pub const ALL: [Interpolation; 5] = [
        Interpolation::Linear,
        Interpolation::EaseIn,
        Interpolation::EaseOut,
        Interpolation::EaseInOut,
        Interpolation::Step,
    ];

    /// Map normalized progress `t` (0..1) onto the curve's progress.
    pub fn remap(self, t: f64) -> f64 {
        match self {
            Interpolation::Linear => t,
            Interpolation::EaseIn => t * t,
            Interpolation::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Interpolation::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u / 2.0
                }
            }
            Interpolation::Step => 0.0,
        }
    }
}

/// Interpolate between two values using the given curve at position `t` (0.0..1.0).
pub fn interpolate(curve: Interpolation, from: f64, to: f64, t: f64) -> f64 {
    if curve == Interpolation::Step {
        return from;
    }
    from + (to - from) * curve.remap(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_step_holds_value() {
        assert_eq!(interpolate(Interpolation::Step, 0.0, 10.0, 0.0), 0.0);
        assert_eq!(interpolate(Interpolation::Step, 0.0, 10.0, 0.5), 0.0);
        assert_eq!(interpolate(Interpolation::Step, 0.0, 10.0, 0.999), 0.0);
    }

    #[test]
    fn interpolate_linear_midpoint() {
        assert_eq!(interpolate(Interpolation::Linear, 0.0, 10.0, 0.5), 5.0);
        assert_eq!(interpolate(Interpolation::Linear, 10.0, -10.0, 0.5), 0.0);
    }

    #[test]
    fn ease_in_below_linear() {
        assert!((interpolate(Interpolation::EaseIn, 0.0, 10.0, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ease_out_above_linear() {
        assert!((interpolate(Interpolation::EaseOut, 0.0, 10.0, 0.5) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let a = Interpolation::EaseInOut.remap(0.25);
        let b = Interpolation::EaseInOut.remap(0.75);
        assert!((a - 0.125).abs() < 1e-12);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!((Interpolation::EaseInOut.remap(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn every_curve_starts_at_zero() {
        for kind in Interpolation::ALL {
            assert_eq!(kind.remap(0.0), 0.0, "{:?}", kind);
        }
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&Interpolation::EaseInOut).unwrap();
        assert_eq!(json, "\"ease-in-out\"");
        let kind: Interpolation = serde_json::from_str("\"step\"").unwrap();
        assert_eq!(kind, Interpolation::Step);
    }
}
