use serde::{Deserialize, Serialize};

/// Control points of a CSS-style cubic bezier timing curve.
///
/// The curve runs from `(0, 0)` to `(1, 1)`; `(x1, y1)` and `(x2, y2)` are
/// the two inner control points. `x1` and `x2` are expected in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BezierCurve {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BezierCurve {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn sample(p1: f64, p2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    }

    /// Approximate `y` for a given `x` by bisecting the curve parameter.
    pub fn solve(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let mut s = x;
        for _ in 0..32 {
            let sx = Self::sample(self.x1, self.x2, s);
            if (sx - x).abs() < 1e-6 {
                break;
            }
            if sx < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        Self::sample(self.y1, self.y2, s)
    }
}

/// Easing function applied when blending toward a keyframe.
///
/// The easing recorded on a keyframe describes the arrival curve from its
/// predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Bezier-parameterized; the curve lives next to the easing on the keyframe.
    Custom,
}

impl Easing {
    /// Apply the easing function to a normalized time value t in [0, 1].
    ///
    /// `Custom` without a curve degrades to linear.
    pub fn apply(&self, t: f64, curve: Option<&BezierCurve>) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Custom => match curve {
                Some(curve) => curve.solve(t),
                None => t,
            },
        }
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Easing::Linear => write!(f, "linear"),
            Easing::EaseIn => write!(f, "easeIn"),
            Easing::EaseOut => write!(f, "easeOut"),
            Easing::EaseInOut => write!(f, "easeInOut"),
            Easing::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for Easing {
    type Err = crate::KinemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Easing::Linear),
            "easeIn" | "ease-in" => Ok(Easing::EaseIn),
            "easeOut" | "ease-out" => Ok(Easing::EaseOut),
            "easeInOut" | "ease-in-out" => Ok(Easing::EaseInOut),
            "custom" => Ok(Easing::Custom),
            other => Err(crate::KinemaError::InvalidArgument(format!(
                "unknown easing '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_linear() {
        let e = Easing::Linear;
        assert!((e.apply(0.0, None)).abs() < 0.001);
        assert!((e.apply(0.5, None) - 0.5).abs() < 0.001);
        assert!((e.apply(1.0, None) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_easing_ease_in_is_quadratic() {
        assert!((Easing::EaseIn.apply(0.5, None) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_easing_ease_out() {
        let e = Easing::EaseOut;
        assert!((e.apply(0.5, None) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_easing_ease_in_out_is_piecewise_quadratic() {
        let e = Easing::EaseInOut;
        assert!((e.apply(0.25, None) - 0.125).abs() < 1e-12);
        assert!((e.apply(0.5, None) - 0.5).abs() < 1e-12);
        assert!((e.apply(0.75, None) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_easing_boundaries() {
        let curve = BezierCurve::new(0.42, 0.0, 0.58, 1.0);
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::Custom,
        ] {
            assert!(
                (easing.apply(0.0, Some(&curve))).abs() < 0.001,
                "{:?} should start at 0",
                easing
            );
            assert!(
                (easing.apply(1.0, Some(&curve)) - 1.0).abs() < 0.001,
                "{:?} should end at 1",
                easing
            );
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-2.0, None), 0.0);
        assert_eq!(Easing::EaseIn.apply(3.0, None), 1.0);
    }

    #[test]
    fn test_custom_without_curve_is_linear() {
        assert!((Easing::Custom.apply(0.3, None) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_linear_bezier_matches_identity() {
        let curve = BezierCurve::new(0.25, 0.25, 0.75, 0.75);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((curve.solve(t) - t).abs() < 0.01, "t={t}");
        }
    }

    #[test]
    fn test_ease_in_bezier_is_slow_at_start() {
        let curve = BezierCurve::new(0.42, 0.0, 1.0, 1.0);
        assert!(Easing::Custom.apply(0.5, Some(&curve)) < 0.5);
    }

    #[test]
    fn test_easing_parse_and_display() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut, Easing::Custom] {
            let parsed: Easing = easing.to_string().parse().unwrap();
            assert_eq!(parsed, easing);
        }
        assert!("bounce".parse::<Easing>().is_err());
    }
}
