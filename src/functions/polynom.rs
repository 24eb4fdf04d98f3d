use serde_json::{Map, Value};

use crate::curve::Curve;
use crate::error::{FitError, Result};
use crate::lm::{FitReport, LevenbergMarquardt};
use crate::parameters::Parameter;
use crate::range::{Range, Ranges};

use super::simple::SimpleFunction;
use super::{Function, FunctionType, KEY_PARAMETERS, KEY_TYPE};

/// A polynomial `c0 + c1*x + ... + cd*x^d`, used for backgrounds.
///
/// The parameter vector is the coefficient list, constant term first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynom {
    params: SimpleFunction,
}

impl Polynom {
    /// A polynomial of `degree` with all coefficients zero.
    pub fn new(degree: usize) -> Self {
        Self {
            params: SimpleFunction::with_count(degree + 1),
        }
    }

    pub fn degree(&self) -> usize {
        debug_assert!(!self.params.is_empty());
        self.params.len() - 1
    }

    /// Change the degree, keeping the lower coefficients.
    pub fn set_degree(&mut self, degree: usize) {
        self.params.set_parameter_count(degree + 1);
    }

    pub fn coefficients(&self) -> Vec<f64> {
        self.parameter_values()
    }

    /// Set all coefficients at once, constant term first.
    ///
    /// # Panics
    ///
    /// Panics unless `coefficients` has `degree() + 1` entries.
    pub fn set_coefficients(&mut self, coefficients: &[f64]) {
        assert_eq!(coefficients.len(), self.params.len(), "wrong number of coefficients");
        for (i, &c) in coefficients.iter().enumerate() {
            self.params.set_value(i, c);
        }
    }

    /// Mean value over `range`, from the closed-form antiderivative.
    ///
    /// A zero-width range yields the value at its start.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakfit_rs::functions::Polynom;
    /// use peakfit_rs::Range;
    ///
    /// let mut p = Polynom::new(2);
    /// p.set_coefficients(&[0.0, 0.0, 3.0]);
    /// assert_eq!(p.avg_y(&Range::new(0.0, 1.0), None), 1.0);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid range.
    pub fn avg_y(&self, range: &Range, par_values: Option<&[f64]>) -> f64 {
        assert!(range.is_valid(), "average over an invalid range");

        let w = range.width();
        if w <= 0.0 {
            return self.y(range.min, par_values);
        }

        let (mut min_pow, mut max_pow) = (1.0, 1.0);
        let mut avg = 0.0;
        for i in 0..self.params.len() {
            min_pow *= range.min;
            max_pow *= range.max;
            let fac = self.params.par_value(i, par_values) / (i as f64 + 1.0);
            avg += fac * (max_pow - min_pow);
        }
        avg / w
    }

    /// Fit to the samples of `curve` within `ranges` with the default fitter.
    pub fn fit(&mut self, curve: &Curve, ranges: &Ranges) -> FitReport {
        self.fit_with(curve, ranges, &LevenbergMarquardt::default())
    }

    /// Reset, then fit to the samples of `curve` within `ranges`.
    pub fn fit_with(&mut self, curve: &Curve, ranges: &Ranges, fitter: &LevenbergMarquardt) -> FitReport {
        self.reset();
        fitter.fit(self, &curve.intersect_ranges(ranges))
    }

    /// A new polynomial of `degree` fitted to `curve` within `ranges`.
    pub fn from_fit(degree: usize, curve: &Curve, ranges: &Ranges) -> Self {
        let mut poly = Self::new(degree);
        poly.fit(curve, ranges);
        poly
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(KEY_TYPE.to_string(), FunctionType::Polynom.tag().into());
        self.params.save_json(&mut obj);
        Value::Object(obj)
    }

    pub(crate) fn load_json(&mut self, obj: &Map<String, Value>) -> Result<()> {
        self.params.load_json(obj)?;
        if self.params.is_empty() {
            return Err(FitError::invalid(KEY_PARAMETERS, "a polynom needs at least one coefficient"));
        }
        Ok(())
    }
}

impl Function for Polynom {
    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn parameter_at(&self, i: usize) -> &Parameter {
        self.params.parameter_at(i)
    }

    fn parameter_at_mut(&mut self, i: usize) -> &mut Parameter {
        self.params.parameter_at_mut(i)
    }

    fn y(&self, x: f64, par_values: Option<&[f64]>) -> f64 {
        let mut val = 0.0;
        let mut x_pow = 1.0;
        for i in 0..self.params.len() {
            val += self.params.par_value(i, par_values) * x_pow;
            x_pow *= x;
        }
        val
    }

    fn dy(&self, x: f64, par_index: usize, _par_values: Option<&[f64]>) -> f64 {
        debug_assert!(par_index < self.params.len());
        (0..par_index).fold(1.0, |acc, _| acc * x)
    }
}
