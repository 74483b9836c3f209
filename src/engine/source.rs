use crate::curve::Curve;
use crate::engine::{NONZERO_FLOOR, clamp_unit};

/// Utility backed directly by an external measurement.
pub(crate) struct SourceState {
    name: Box<str>,
    curve: Curve,
    /// Lower bound of the normalization window.
    lo: f64,
    /// Upper bound of the normalization window.
    hi: f64,
    nonzero: bool,
    value: f64,
}

impl SourceState {
    /// Creates a source over the identity window `[0, 1]`, caching the
    /// utility of a zero measurement.
    pub(crate) fn new(name: Box<str>, curve: Curve, nonzero: bool) -> Self {
        let mut node = Self {
            name,
            curve,
            lo: 0.0,
            hi: 1.0,
            nonzero,
            value: 0.0,
        };
        node.value = node.judge(0.0);
        node
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Takes effect on the next update only.
    pub(crate) fn set_range(&mut self, lo: f64, hi: f64) {
        self.lo = lo;
        self.hi = hi;
    }

    /// Maps a raw measurement through the window. A degenerate window passes
    /// the measurement through untouched.
    pub(crate) fn normalize(&self, raw: f64) -> f64 {
        if self.hi != self.lo {
            (raw - self.lo) / (self.hi - self.lo)
        } else {
            raw
        }
    }

    fn judge(&self, raw: f64) -> f64 {
        let value = clamp_unit(self.curve.apply(self.normalize(raw)));
        if self.nonzero && value == 0.0 {
            NONZERO_FLOOR
        } else {
            value
        }
    }

    /// Recomputes and caches the utility. Propagation to dependents is the
    /// caller's job, since the edges live in the arena.
    pub(crate) fn update(&mut self, raw: f64) -> f64 {
        self.value = self.judge(raw);
        self.value
    }
}
