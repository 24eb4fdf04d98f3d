use std::cell::OnceCell;

use crate::curve::Curve;
use crate::range::Range;

/// A peak that is the measured samples themselves, binned over its range.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawProfile {
    curve: Curve,
    x_count: usize,
    dx: f64,
    sum_y: OnceCell<f64>,
}

impl RawProfile {
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn set_curve(&mut self, curve: Curve, range: &Range) {
        self.curve = curve;
        self.prepare(range);
    }

    /// Recompute the bin layout for `range`.
    pub fn prepare(&mut self, range: &Range) {
        self.sum_y = OnceCell::new();
        if range.is_empty() || self.curve.is_empty() {
            self.x_count = 0;
            self.dx = 0.0;
        } else {
            self.x_count = self.curve.len();
            self.dx = range.width() / self.x_count as f64;
        }
    }

    /// The sample of the bin holding `x`, 0 outside of `range`.
    pub fn y(&self, x: f64, range: &Range) -> f64 {
        if self.x_count == 0 || !range.contains(x) {
            return 0.0;
        }
        let bin = ((x - range.min) / self.dx).floor();
        let i = (bin.max(0.0) as usize).min(self.x_count - 1);
        self.curve.y(i)
    }

    pub fn sum_y(&self) -> f64 {
        *self.sum_y.get_or_init(|| self.curve.sum_y())
    }
}
