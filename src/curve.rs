//! Sampled curves and points.

use serde::{Deserialize, Serialize};

use crate::functions::Function;
use crate::range::{Range, Ranges};

/// A point in the (x, y) plane, e.g. a peak position and intensity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

impl XY {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered sequence of (x, y) samples.
///
/// The x values must be non-decreasing; callers sort before appending.
/// The extents of both axes are tracked as points are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    xs: Vec<f64>,
    ys: Vec<f64>,
    rge_x: Range,
    rge_y: Range,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from paired samples.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn from_xy(xs: &[f64], ys: &[f64]) -> Self {
        assert_eq!(xs.len(), ys.len(), "x and y data must have the same length");
        let mut curve = Self::new();
        for (&x, &y) in xs.iter().zip(ys) {
            curve.append(x, y);
        }
        curve
    }

    /// Sample `f` at each of `xs`.
    pub fn from_fn(xs: impl IntoIterator<Item = f64>, f: impl Fn(f64) -> f64) -> Self {
        let mut curve = Self::new();
        for x in xs {
            curve.append(x, f(x));
        }
        curve
    }

    pub fn clear(&mut self) {
        self.xs.clear();
        self.ys.clear();
        self.rge_x.invalidate();
        self.rge_y.invalidate();
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.xs.len(), self.ys.len());
        self.xs.len()
    }

    pub fn append(&mut self, x: f64, y: f64) {
        self.xs.push(x);
        self.ys.push(y);
        self.rge_x.extend_by(x);
        self.rge_y.extend_by(y);
    }

    pub fn x(&self, i: usize) -> f64 {
        self.xs[i]
    }

    pub fn y(&self, i: usize) -> f64 {
        self.ys[i]
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Extent of the x values, invalid while empty.
    pub fn rge_x(&self) -> &Range {
        &self.rge_x
    }

    /// Extent of the y values, invalid while empty.
    pub fn rge_y(&self) -> &Range {
        &self.rge_y
    }

    pub fn iter(&self) -> impl Iterator<Item = XY> + '_ {
        self.xs.iter().zip(&self.ys).map(|(&x, &y)| XY::new(x, y))
    }

    pub fn is_ordered(&self) -> bool {
        self.xs.windows(2).all(|w| w[0] <= w[1])
    }

    /// The samples whose x lies in `range`. Empty for an empty range.
    pub fn intersect(&self, range: &Range) -> Curve {
        let mut res = Curve::new();
        if !range.is_empty() {
            debug_assert!(self.is_ordered());
            let mut xi = 0;
            self.collect_in(range, &mut xi, &mut res);
        }
        res
    }

    /// The samples whose x lies in any of `ranges`.
    ///
    /// Relies on both the samples and the ranges being ordered.
    pub fn intersect_ranges(&self, ranges: &Ranges) -> Curve {
        debug_assert!(self.is_ordered());
        let mut res = Curve::new();
        let mut xi = 0;
        for range in ranges {
            self.collect_in(range, &mut xi, &mut res);
        }
        res
    }

    fn collect_in(&self, range: &Range, xi: &mut usize, res: &mut Curve) {
        let cnt = self.len();
        while *xi < cnt && self.xs[*xi] < range.min {
            *xi += 1;
        }
        while *xi < cnt && self.xs[*xi] <= range.max {
            res.append(self.xs[*xi], self.ys[*xi]);
            *xi += 1;
        }
    }

    /// This curve minus `f` evaluated at each x.
    pub fn subtract<F: Function + ?Sized>(&self, f: &F) -> Curve {
        let mut res = Curve::new();
        for (&x, &y) in self.xs.iter().zip(&self.ys) {
            res.append(x, y - f.y(x, None));
        }
        res
    }

    /// Pointwise sum by index, on the x axis of the longer curve.
    pub fn add(&self, that: &Curve) -> Curve {
        let (shorter, longer) = if self.len() > that.len() {
            (that, self)
        } else {
            (self, that)
        };

        let mut res = Curve::new();
        for i in 0..longer.len() {
            let y = if i < shorter.len() {
                shorter.y(i) + longer.y(i)
            } else {
                longer.y(i)
            };
            res.append(longer.x(i), y);
        }
        res
    }

    /// Every y scaled by `factor`.
    pub fn mul(&self, factor: f64) -> Curve {
        let mut res = Curve::new();
        for (&x, &y) in self.xs.iter().zip(&self.ys) {
            res.append(x, y * factor);
        }
        res
    }

    /// Three-point moving average; the result is two samples shorter.
    pub fn smooth3(&self) -> Curve {
        let mut res = Curve::new();
        for w in 0..self.len().saturating_sub(2) {
            let y = (self.ys[w] + self.ys[w + 1] + self.ys[w + 2]) / 3.0;
            res.append(self.xs[w + 1], y);
        }
        res
    }

    /// Index of the first sample with the largest y; 0 for an empty curve.
    pub fn max_y_index(&self) -> usize {
        let mut index = 0;
        for (i, &y) in self.ys.iter().enumerate() {
            if y > self.ys[index] {
                index = i;
            }
        }
        index
    }

    pub fn sum_y(&self) -> f64 {
        self.ys.iter().sum()
    }
}
