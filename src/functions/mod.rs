//! Fit functions.
//!
//! Every function exposes its value, analytic partial derivatives and an
//! ordered parameter list through the [`Function`] trait, which is all the
//! Levenberg-Marquardt fitter needs. The concrete functions form a closed
//! family, [`AnyFunction`], whose persisted type tags are listed once in
//! [`FunctionType`].
//!
//! - [`Polynom`]: background polynomial of any degree
//! - [`SumFunctions`]: several functions sharing one parameter vector
//! - [`PeakFunction`]: a peak of one of the [`PeakType`] shapes
//!
//! Evaluation takes an optional flat parameter vector. With `None` the
//! function's own parameter values are used; the fitter passes its trial
//! vector instead, so it can probe candidates without touching the function.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{FitError, Result};
use crate::parameters::Parameter;

mod peak;
mod polynom;
mod raw;
mod shapes;
mod simple;
mod sum;

pub use peak::{PeakFunction, PeakType};
pub use polynom::Polynom;
pub use simple::SimpleFunction;
pub use sum::SumFunctions;

pub(crate) use peak::half_maximum_estimate;

/// A differentiable function of `x` with a vector of fit parameters.
pub trait Function {
    /// Length of the parameter vector.
    fn parameter_count(&self) -> usize;

    /// The parameter at position `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= parameter_count()`.
    fn parameter_at(&self, i: usize) -> &Parameter;

    /// Mutable access to the parameter at position `i`.
    fn parameter_at_mut(&mut self, i: usize) -> &mut Parameter;

    /// Value at `x`, using `par_values` instead of the stored values if given.
    fn y(&self, x: f64, par_values: Option<&[f64]>) -> f64;

    /// Partial derivative of `y` at `x` with respect to parameter `par_index`.
    fn dy(&self, x: f64, par_index: usize, par_values: Option<&[f64]>) -> f64;

    /// Move every parameter to zero clamped into its range, with zero error.
    fn reset(&mut self) {
        for i in 0..self.parameter_count() {
            let param = self.parameter_at_mut(i);
            let value = param.value_range().bound(0.0);
            param.set_value(value, 0.0);
        }
    }

    /// The stored parameter values, in vector order.
    fn parameter_values(&self) -> Vec<f64> {
        (0..self.parameter_count())
            .map(|i| self.parameter_at(i).value())
            .collect()
    }
}

/// The persisted type of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    Sum,
    Polynom,
    Peak(PeakType),
}

impl FunctionType {
    const ALL: [FunctionType; 7] = [
        FunctionType::Sum,
        FunctionType::Polynom,
        FunctionType::Peak(PeakType::Raw),
        FunctionType::Peak(PeakType::Gaussian),
        FunctionType::Peak(PeakType::Lorentzian),
        FunctionType::Peak(PeakType::PseudoVoigt1),
        FunctionType::Peak(PeakType::PseudoVoigt2),
    ];

    /// The `"type"` tag written to persisted objects.
    pub fn tag(self) -> &'static str {
        match self {
            FunctionType::Sum => "sum",
            FunctionType::Polynom => "polynom",
            FunctionType::Peak(PeakType::Raw) => "Raw",
            FunctionType::Peak(PeakType::Gaussian) => "Gaussian",
            FunctionType::Peak(PeakType::Lorentzian) => "Lorentzian",
            FunctionType::Peak(PeakType::PseudoVoigt1) => "PseudoVoigt1",
            FunctionType::Peak(PeakType::PseudoVoigt2) => "PseudoVoigt2",
        }
    }

    /// Look up a tag by exact match.
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == tag)
            .ok_or_else(|| FitError::UnknownFunctionType(tag.to_string()))
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FunctionType {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s)
    }
}

/// Any of the concrete fit functions.
#[derive(Debug, Clone)]
pub enum AnyFunction {
    Sum(SumFunctions),
    Polynom(Polynom),
    Peak(PeakFunction),
}

impl AnyFunction {
    /// An empty function of the given type, ready to be loaded.
    pub fn new(function_type: FunctionType) -> Self {
        match function_type {
            FunctionType::Sum => AnyFunction::Sum(SumFunctions::new()),
            FunctionType::Polynom => AnyFunction::Polynom(Polynom::new(0)),
            FunctionType::Peak(peak_type) => AnyFunction::Peak(PeakFunction::new(peak_type)),
        }
    }

    pub fn function_type(&self) -> FunctionType {
        match self {
            AnyFunction::Sum(_) => FunctionType::Sum,
            AnyFunction::Polynom(_) => FunctionType::Polynom,
            AnyFunction::Peak(f) => FunctionType::Peak(f.peak_type()),
        }
    }

    /// The persisted form of this function.
    pub fn to_json(&self) -> Value {
        match self {
            AnyFunction::Sum(f) => f.to_json(),
            AnyFunction::Polynom(f) => f.to_json(),
            AnyFunction::Peak(f) => f.to_json(),
        }
    }

    /// Rebuild a function from its persisted form.
    ///
    /// The `"type"` tag selects the function; an unknown tag is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakfit_rs::functions::{AnyFunction, Function, FunctionType};
    ///
    /// let json = serde_json::json!({
    ///     "type": "polynom",
    ///     "parameters": [
    ///         {"value": 2.0, "range": {"min": null, "max": null}},
    ///         {"value": 3.0, "range": {"min": null, "max": null}}
    ///     ]
    /// });
    /// let f = AnyFunction::from_json(&json).unwrap();
    /// assert_eq!(f.function_type(), FunctionType::Polynom);
    /// assert_eq!(f.y(1.0, None), 5.0);
    /// ```
    pub fn from_json(obj: &Value) -> Result<Self> {
        let obj = as_object(obj, "function")?;
        let tag = load_str(obj, KEY_TYPE)?;
        let mut f = AnyFunction::new(FunctionType::from_tag(tag)?);
        match &mut f {
            AnyFunction::Sum(sum) => sum.load_json(obj)?,
            AnyFunction::Polynom(poly) => poly.load_json(obj)?,
            AnyFunction::Peak(peak) => peak.load_json(obj)?,
        }
        Ok(f)
    }
}

impl Function for AnyFunction {
    fn parameter_count(&self) -> usize {
        match self {
            AnyFunction::Sum(f) => f.parameter_count(),
            AnyFunction::Polynom(f) => f.parameter_count(),
            AnyFunction::Peak(f) => f.parameter_count(),
        }
    }

    fn parameter_at(&self, i: usize) -> &Parameter {
        match self {
            AnyFunction::Sum(f) => f.parameter_at(i),
            AnyFunction::Polynom(f) => f.parameter_at(i),
            AnyFunction::Peak(f) => f.parameter_at(i),
        }
    }

    fn parameter_at_mut(&mut self, i: usize) -> &mut Parameter {
        match self {
            AnyFunction::Sum(f) => f.parameter_at_mut(i),
            AnyFunction::Polynom(f) => f.parameter_at_mut(i),
            AnyFunction::Peak(f) => f.parameter_at_mut(i),
        }
    }

    fn y(&self, x: f64, par_values: Option<&[f64]>) -> f64 {
        match self {
            AnyFunction::Sum(f) => f.y(x, par_values),
            AnyFunction::Polynom(f) => f.y(x, par_values),
            AnyFunction::Peak(f) => f.y(x, par_values),
        }
    }

    fn dy(&self, x: f64, par_index: usize, par_values: Option<&[f64]>) -> f64 {
        match self {
            AnyFunction::Sum(f) => f.dy(x, par_index, par_values),
            AnyFunction::Polynom(f) => f.dy(x, par_index, par_values),
            AnyFunction::Peak(f) => f.dy(x, par_index, par_values),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyFunction::Sum(f) => f.reset(),
            AnyFunction::Polynom(f) => f.reset(),
            AnyFunction::Peak(f) => f.reset(),
        }
    }
}

impl From<SumFunctions> for AnyFunction {
    fn from(f: SumFunctions) -> Self {
        AnyFunction::Sum(f)
    }
}

impl From<Polynom> for AnyFunction {
    fn from(f: Polynom) -> Self {
        AnyFunction::Polynom(f)
    }
}

impl From<PeakFunction> for AnyFunction {
    fn from(f: PeakFunction) -> Self {
        AnyFunction::Peak(f)
    }
}

// Keys of the persisted form
pub(crate) const KEY_TYPE: &str = "type";
pub(crate) const KEY_PARAMETERS: &str = "parameters";
pub(crate) const KEY_RANGE: &str = "range";

pub(crate) fn as_object<'a>(value: &'a Value, key: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| FitError::invalid(key, "expected an object"))
}

pub(crate) fn load_key<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| FitError::MissingKey(key.to_string()))
}

pub(crate) fn load_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    load_key(obj, key)?
        .as_str()
        .ok_or_else(|| FitError::invalid(key, "expected a string"))
}

/// Deserialize `obj[key]` into `T`, attributing failures to `key`.
pub(crate) fn load_as<T>(obj: &Map<String, Value>, key: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    T::deserialize(load_key(obj, key)?).map_err(|e| FitError::invalid(key, e.to_string()))
}
