//! Curves judging a single normalized measurement.
//!
//! A [`Curve`] maps an input already normalized to `[0, 1]` onto a utility.
//! Curves are pure and never clamp: the node holding the curve clamps the
//! output before caching it, so a curve is free to overshoot.

use std::f64::consts::E;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

type CurveFnPtr = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Pure single-input utility function.
#[derive(Clone)]
pub struct Curve(CurveFnPtr);

impl Curve {
    /// Wraps an arbitrary host function as a curve.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// Applies the curve to a normalized input.
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        (self.0)(x)
    }

    /// `y = a*x + b`
    pub fn linear(a: f64, b: f64) -> Self {
        Self::new(move |x| a * x + b)
    }

    /// Distance based curve around `center`.
    ///
    /// A convex curve peaks at the center, `y = 1 - |x - center|^exponent`,
    /// while a concave one bottoms out there, `y = |x - center|^exponent`.
    pub fn exponential(center: f64, exponent: f64, convex: bool) -> Self {
        if convex {
            Self::new(move |x| 1.0 - (x - center).abs().powf(exponent))
        } else {
            Self::new(move |x| (x - center).abs().powf(exponent))
        }
    }

    /// Sigmoid threshold, `y = 1 / (1 + (slope*e)^(10*(inflection - x)))`.
    ///
    /// The decreasing variant mirrors it as `1 - y`.
    pub fn logistic(inflection: f64, slope: f64, increasing: bool) -> Self {
        let base = slope * E;
        if increasing {
            Self::new(move |x| 1.0 / (1.0 + base.powf(10.0 * (inflection - x))))
        } else {
            Self::new(move |x| 1.0 - 1.0 / (1.0 + base.powf(10.0 * (inflection - x))))
        }
    }
}

impl<F> From<F> for Curve
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
{
    fn from(func: F) -> Self {
        Self::new(func)
    }
}

impl Debug for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Curve(*)")
    }
}

/// Serializable description of a built-in curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CurveSpec {
    Linear {
        a: f64,
        b: f64,
    },
    Exponential {
        center: f64,
        exponent: f64,
        #[serde(default)]
        convex: bool,
    },
    Logistic {
        inflection: f64,
        #[serde(default = "unit_slope")]
        slope: f64,
        #[serde(default = "increasing")]
        increasing: bool,
    },
}

fn unit_slope() -> f64 {
    1.0
}

fn increasing() -> bool {
    true
}

impl CurveSpec {
    pub fn build(&self) -> Curve {
        match *self {
            CurveSpec::Linear { a, b } => Curve::linear(a, b),
            CurveSpec::Exponential {
                center,
                exponent,
                convex,
            } => Curve::exponential(center, exponent, convex),
            CurveSpec::Logistic {
                inflection,
                slope,
                increasing,
            } => Curve::logistic(inflection, slope, increasing),
        }
    }
}

impl From<CurveSpec> for Curve {
    fn from(spec: CurveSpec) -> Self {
        spec.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_linear() {
        let curve = Curve::linear(2.0, 0.25);
        assert!(close(curve.apply(0.0), 0.25));
        assert!(close(curve.apply(0.5), 1.25));
    }

    #[test]
    fn test_linear_does_not_clamp() {
        assert_eq!(Curve::linear(10.0, 0.0).apply(1.0), 10.0);
        assert_eq!(Curve::linear(-1.0, 0.0).apply(1.0), -1.0);
    }

    #[test]
    fn test_exponential_convex() {
        let curve = Curve::exponential(0.5, 2.0, true);
        assert!(close(curve.apply(0.5), 1.0));
        assert!(close(curve.apply(0.0), 0.75));
        assert!(close(curve.apply(1.0), 0.75));
    }

    #[test]
    fn test_exponential_concave() {
        let curve = Curve::exponential(0.0, 3.0, false);
        assert!(close(curve.apply(0.0), 0.0));
        assert!(close(curve.apply(0.5), 0.125));
        assert!(close(curve.apply(1.0), 1.0));
    }

    #[test]
    fn test_logistic_inflection() {
        let inc = Curve::logistic(0.5, 1.0, true);
        let dec = Curve::logistic(0.5, 1.0, false);
        assert!(close(inc.apply(0.5), 0.5));
        assert!(close(dec.apply(0.5), 0.5));
        assert!(inc.apply(0.9) > 0.95);
        assert!(dec.apply(0.9) < 0.05);
        assert!(close(inc.apply(0.3) + dec.apply(0.3), 1.0));
    }

    #[test]
    fn test_logistic_slope() {
        // A steeper base pushes values further from the inflection point.
        let soft = Curve::logistic(0.5, 1.0, true);
        let steep = Curve::logistic(0.5, 2.0, true);
        assert!(steep.apply(0.6) > soft.apply(0.6));
        assert!(steep.apply(0.4) < soft.apply(0.4));
    }

    #[test]
    fn test_deserialize() {
        let spec: CurveSpec =
            serde_json::from_str(r#"{"type":"logistic","inflection":0.3}"#).unwrap();
        assert_eq!(
            spec,
            CurveSpec::Logistic {
                inflection: 0.3,
                slope: 1.0,
                increasing: true
            }
        );

        let spec: CurveSpec =
            serde_json::from_str(r#"{"type":"linear","a":1.0,"b":0.0}"#).unwrap();
        assert!(close(spec.build().apply(0.4), 0.4));
    }
}
