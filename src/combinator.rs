//! Combinators merging two utilities into one.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

type CombinatorFnPtr = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Pure two-input utility function. Both inputs are guaranteed to lie in
/// `[0, 1]`; the output is clamped by the owning node, not here.
#[derive(Clone)]
pub struct Combinator(CombinatorFnPtr);

impl Combinator {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> f64 {
        (self.0)(x, y)
    }

    /// `z = a*x + b*y + c`
    pub fn additive(a: f64, b: f64, c: f64) -> Self {
        Self::new(move |x, y| a * x + b * y + c)
    }

    /// `z = a*x*y + b`
    pub fn multiplicative(a: f64, b: f64) -> Self {
        Self::new(move |x, y| a * x * y + b)
    }
}

impl<F> From<F> for Combinator
where
    F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
{
    fn from(func: F) -> Self {
        Self::new(func)
    }
}

impl Debug for Combinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Combinator(*)")
    }
}

/// Serializable description of a built-in combinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CombinatorSpec {
    Additive {
        a: f64,
        b: f64,
        #[serde(default)]
        c: f64,
    },
    Multiplicative {
        a: f64,
        #[serde(default)]
        b: f64,
    },
}

impl CombinatorSpec {
    pub fn build(&self) -> Combinator {
        match *self {
            CombinatorSpec::Additive { a, b, c } => Combinator::additive(a, b, c),
            CombinatorSpec::Multiplicative { a, b } => Combinator::multiplicative(a, b),
        }
    }
}

impl From<CombinatorSpec> for Combinator {
    fn from(spec: CombinatorSpec) -> Self {
        spec.build()
    }
}
