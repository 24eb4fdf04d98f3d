//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, one scalar unknown of a fit
//! function. Besides its value and estimated error, a parameter carries an
//! allowed value range and optional limits on how far a single optimizer step
//! may move it and how large its error may grow.

use serde::{Deserialize, Serialize};

use crate::range::Range;

/// A parameter of a fit function
///
/// The four optional limits are checked by [`Parameter::check_constraints`]
/// relative to the currently stored value; `None` means "no limit".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Current value of the parameter
    value: f64,

    /// Standard error of the value (set after fitting, not persisted)
    #[serde(skip)]
    error: f64,

    /// Allowed values; infinite unless the function restricts it
    range: Range,

    /// Largest absolute change accepted in one step
    #[serde(rename = "maxDelta", default, skip_serializing_if = "Option::is_none")]
    max_delta: Option<f64>,

    /// Largest relative change, in percent of the current value
    #[serde(rename = "maxDeltaPercent", default, skip_serializing_if = "Option::is_none")]
    max_delta_percent: Option<f64>,

    /// Largest accepted error
    #[serde(rename = "maxError", default, skip_serializing_if = "Option::is_none")]
    max_error: Option<f64>,

    /// Largest accepted error, in percent of the current value
    #[serde(rename = "maxErrorPercent", default, skip_serializing_if = "Option::is_none")]
    max_error_percent: Option<f64>,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            value: 0.0,
            error: 0.0,
            range: Range::infinite(),
            max_delta: None,
            max_delta_percent: None,
            max_error: None,
            max_error_percent: None,
        }
    }
}

impl Parameter {
    /// Create an unconstrained parameter with value 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter restricted to `[min, max]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakfit_rs::parameters::Parameter;
    ///
    /// let amplitude = Parameter::with_range(0.0, f64::INFINITY);
    /// assert!(amplitude.check_constraints(3.0, 0.0));
    /// assert!(!amplitude.check_constraints(-1.0, 0.0));
    /// ```
    pub fn with_range(min: f64, max: f64) -> Self {
        let mut param = Self::default();
        param.set_value_range(min, max);
        param
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    /// Store a value and its error unconditionally.
    pub fn set_value(&mut self, value: f64, error: f64) {
        self.value = value;
        self.error = error;
    }

    /// The range as stored, possibly invalid.
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// The allowed range, or a point range at the current value if no valid
    /// range is set. There is always something to clamp against.
    pub fn value_range(&self) -> Range {
        if self.range.is_valid() {
            self.range
        } else {
            Range::point(self.value)
        }
    }

    pub fn set_value_range(&mut self, min: f64, max: f64) {
        self.range.set(min, max);
    }

    pub fn max_delta(&self) -> Option<f64> {
        self.max_delta
    }

    pub fn set_max_delta(&mut self, max_delta: Option<f64>) {
        self.max_delta = max_delta;
    }

    pub fn max_delta_percent(&self) -> Option<f64> {
        self.max_delta_percent
    }

    pub fn set_max_delta_percent(&mut self, max_delta_percent: Option<f64>) {
        self.max_delta_percent = max_delta_percent;
    }

    pub fn max_error(&self) -> Option<f64> {
        self.max_error
    }

    pub fn set_max_error(&mut self, max_error: Option<f64>) {
        self.max_error = max_error;
    }

    pub fn max_error_percent(&self) -> Option<f64> {
        self.max_error_percent
    }

    pub fn set_max_error_percent(&mut self, max_error_percent: Option<f64>) {
        self.max_error_percent = max_error_percent;
    }

    /// Whether `maxError` or `maxErrorPercent` is set.
    pub fn has_error_limits(&self) -> bool {
        self.max_error.is_some() || self.max_error_percent.is_some()
    }

    /// Whether moving to `value` with `error` is acceptable.
    ///
    /// Deltas are measured from the currently stored value. Relative limits
    /// reject everything while the stored value is zero.
    pub fn check_constraints(&self, value: f64, error: f64) -> bool {
        if self.range.is_valid() && !self.range.contains(value) {
            return false;
        }

        if let Some(max_delta) = self.max_delta {
            if (value - self.value).abs() > max_delta {
                return false;
            }
        }

        if let Some(max_delta_percent) = self.max_delta_percent {
            if self.value == 0.0
                || ((value - self.value) / self.value).abs() * 100.0 > max_delta_percent
            {
                return false;
            }
        }

        if let Some(max_error) = self.max_error {
            if error > max_error {
                return false;
            }
        }

        if let Some(max_error_percent) = self.max_error_percent {
            if self.value == 0.0 || (error / self.value).abs() * 100.0 > max_error_percent {
                return false;
            }
        }

        true
    }

    /// [`Parameter::check_constraints`] for the stored value and error.
    pub fn check_current(&self) -> bool {
        self.check_constraints(self.value, self.error)
    }
}
