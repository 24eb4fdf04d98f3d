use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

use crate::curve::{Curve, XY};
use crate::error::{FitError, Result};
use crate::lm::{FitReport, LevenbergMarquardt};
use crate::parameters::Parameter;
use crate::range::Range;

use super::raw::RawProfile;
use super::shapes::{self, Shape, AMPL, XSHIFT};
use super::simple::SimpleFunction;
use super::{load_as, Function, FunctionType, KEY_PARAMETERS, KEY_RANGE, KEY_TYPE};

const KEY_GUESSED_PEAK: &str = "guessed peak";
const KEY_GUESSED_FWHM: &str = "guessed fwhm";

/// The available peak shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum PeakType {
    /// The measured samples, not a model
    Raw,
    Gaussian,
    /// Cauchy-Lorentz
    Lorentzian,
    /// Gaussian/Lorentzian mix with one shared width
    PseudoVoigt1,
    /// Gaussian/Lorentzian mix with separate widths
    PseudoVoigt2,
}

impl PeakType {
    pub const ALL: [PeakType; 5] = [
        PeakType::Raw,
        PeakType::Gaussian,
        PeakType::Lorentzian,
        PeakType::PseudoVoigt1,
        PeakType::PseudoVoigt2,
    ];

    /// The persisted type tag.
    pub fn tag(self) -> &'static str {
        FunctionType::Peak(self).tag()
    }

    /// Names of the parameters, in vector order. Empty for `Raw`.
    pub fn parameter_names(self) -> &'static [&'static str] {
        self.shape().map_or(&[], |shape| shape.names)
    }

    fn shape(self) -> Option<&'static Shape> {
        match self {
            PeakType::Raw => None,
            PeakType::Gaussian => Some(&shapes::GAUSSIAN),
            PeakType::Lorentzian => Some(&shapes::LORENTZIAN),
            PeakType::PseudoVoigt1 => Some(&shapes::PSEUDO_VOIGT1),
            PeakType::PseudoVoigt2 => Some(&shapes::PSEUDO_VOIGT2),
        }
    }
}

impl fmt::Display for PeakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<PeakType> for &'static str {
    fn from(peak_type: PeakType) -> Self {
        peak_type.tag()
    }
}

impl TryFrom<String> for PeakType {
    type Error = FitError;

    fn try_from(tag: String) -> Result<Self> {
        match FunctionType::from_tag(&tag)? {
            FunctionType::Peak(peak_type) => Ok(peak_type),
            _ => Err(FitError::invalid(KEY_TYPE, format!("'{}' is not a peak type", tag))),
        }
    }
}

/// A single peak over a range of the curve.
///
/// Analytic shapes are fitted with Levenberg-Marquardt, seeded from the
/// guessed peak and FWHM. A `Raw` peak has no parameters; fitting stores the
/// samples in its range and evaluation reads them back.
///
/// # Examples
///
/// ```
/// use peakfit_rs::functions::{Function, PeakFunction, PeakType};
/// use peakfit_rs::{Curve, Range, XY};
///
/// let curve = Curve::from_fn((0..=100).map(|i| i as f64 / 10.0), |x| {
///     10.0 * (-0.5 * ((x - 5.0) / 0.8).powi(2)).exp()
/// });
///
/// let mut peak = PeakFunction::new(PeakType::Gaussian);
/// peak.set_guessed_peak(XY::new(5.0, 10.0));
/// peak.set_guessed_fwhm(2.0);
/// peak.fit(&curve, &Range::new(2.0, 8.0));
///
/// assert!((peak.fitted_peak().x - 5.0).abs() < 1e-6);
/// assert!((peak.fitted_peak().y - 10.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct PeakFunction {
    peak_type: PeakType,
    params: SimpleFunction,
    range: Range,
    guessed_peak: Option<XY>,
    guessed_fwhm: Option<f64>,
    raw: RawProfile,
}

impl PeakFunction {
    /// A peak of the given shape with bounded parameters and no guesses.
    pub fn new(peak_type: PeakType) -> Self {
        let mut params = SimpleFunction::new();
        if let Some(shape) = peak_type.shape() {
            params.set_parameter_count(shape.parameter_count());
            for (i, &(min, max)) in shape.bounds.iter().enumerate() {
                params.parameter_at_mut(i).set_value_range(min, max);
                params.set_value(i, Range::new(min, max).bound(1.0));
            }
            params.set_value(XSHIFT, 0.0);
        }

        Self {
            peak_type,
            params,
            range: Range::invalid(),
            guessed_peak: None,
            guessed_fwhm: None,
            raw: RawProfile::default(),
        }
    }

    pub fn peak_type(&self) -> PeakType {
        self.peak_type
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn set_range(&mut self, range: Range) {
        self.range = range;
        if self.peak_type == PeakType::Raw {
            self.raw.prepare(&self.range);
        }
    }

    pub fn guessed_peak(&self) -> Option<XY> {
        self.guessed_peak
    }

    /// Remember a peak guess and move amplitude and position onto it.
    pub fn set_guessed_peak(&mut self, peak: XY) {
        self.guessed_peak = Some(peak);
        if self.peak_type.shape().is_some() {
            self.params.set_value(XSHIFT, peak.x);
            self.params.set_value(AMPL, peak.y);
        }
    }

    pub fn guessed_fwhm(&self) -> Option<f64> {
        self.guessed_fwhm
    }

    /// Remember a FWHM guess and derive the width parameters from it.
    pub fn set_guessed_fwhm(&mut self, fwhm: f64) {
        self.guessed_fwhm = Some(fwhm);
        if let Some(shape) = self.peak_type.shape() {
            let params = &mut self.params;
            (shape.seed_fwhm)(&mut |i, v| params.set_value(i, v), fwhm);
        }
    }

    /// Forget both guesses; the next fit computes its own.
    pub fn clear_guesses(&mut self) {
        self.guessed_peak = None;
        self.guessed_fwhm = None;
    }

    /// Fit with the default fitter. See [`PeakFunction::fit_with`].
    pub fn fit(&mut self, curve: &Curve, range: &Range) -> FitReport {
        self.fit_with(curve, range, &LevenbergMarquardt::default())
    }

    /// Fit this peak to the samples of `curve` within `range`.
    ///
    /// The range becomes the peak's range and the parameters are reset. Any
    /// guess not set beforehand is estimated from the highest sample and
    /// the half-maximum crossings around it.
    pub fn fit_with(&mut self, curve: &Curve, range: &Range, fitter: &LevenbergMarquardt) -> FitReport {
        self.range = *range;
        self.reset();
        let c = curve.intersect(range);

        if self.peak_type == PeakType::Raw {
            self.raw.set_curve(c, range);
            return FitReport::not_run("raw peaks are not fitted");
        }
        if c.is_empty() {
            return FitReport::not_run("no samples in the peak range");
        }

        if self.guessed_peak.is_none() || self.guessed_fwhm.is_none() {
            let (peak, fwhm) = half_maximum_estimate(&c);
            if self.guessed_peak.is_none() {
                self.set_guessed_peak(peak);
            }
            if self.guessed_fwhm.is_none() {
                self.set_guessed_fwhm(fwhm);
            }
        }

        fitter.fit(self, &c)
    }

    /// Fitted position and height.
    pub fn fitted_peak(&self) -> XY {
        match self.peak_type {
            PeakType::Raw => XY::new(self.range.center(), self.raw.sum_y()),
            _ => XY::new(self.params.par_value(XSHIFT, None), self.params.par_value(AMPL, None)),
        }
    }

    /// Standard errors of [`PeakFunction::fitted_peak`].
    pub fn peak_error(&self) -> XY {
        match self.peak_type {
            PeakType::Raw => XY::new(0.0, 0.0),
            _ => XY::new(
                self.params.parameter_at(XSHIFT).error(),
                self.params.parameter_at(AMPL).error(),
            ),
        }
    }

    /// Full width at half maximum of the fitted shape.
    pub fn fitted_fwhm(&self) -> f64 {
        match self.peak_type.shape() {
            None => self.range.width(),
            Some(shape) => (shape.fwhm)(&self.parameter_values()),
        }
    }

    /// Error of the width parameters behind [`PeakFunction::fitted_fwhm`].
    pub fn fwhm_error(&self) -> f64 {
        match self.peak_type.shape() {
            None => 0.0,
            Some(shape) => (shape.fwhm_error)(self.params.parameters()),
        }
    }

    /// The samples a `Raw` peak was fitted to; empty for analytic shapes.
    pub fn raw_curve(&self) -> &Curve {
        self.raw.curve()
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(KEY_TYPE.to_string(), self.peak_type.tag().into());
        self.params.save_json(&mut obj);
        obj.insert(KEY_RANGE.to_string(), serde_json::to_value(self.range).unwrap_or(Value::Null));
        if let Some(peak) = self.guessed_peak {
            obj.insert(KEY_GUESSED_PEAK.to_string(), serde_json::json!({"x": peak.x, "y": peak.y}));
        }
        if let Some(fwhm) = self.guessed_fwhm {
            obj.insert(KEY_GUESSED_FWHM.to_string(), fwhm.into());
        }
        Value::Object(obj)
    }

    pub(crate) fn load_json(&mut self, obj: &Map<String, Value>) -> Result<()> {
        self.params.load_json(obj)?;
        let expected = self.peak_type.parameter_names().len();
        if self.params.len() != expected {
            return Err(FitError::invalid(
                KEY_PARAMETERS,
                format!("{} expects {} parameters, found {}", self.peak_type, expected, self.params.len()),
            ));
        }

        self.set_range(load_as(obj, KEY_RANGE)?);
        self.guessed_peak = match obj.get(KEY_GUESSED_PEAK) {
            Some(Value::Null) | None => None,
            Some(_) => Some(load_as(obj, KEY_GUESSED_PEAK)?),
        };
        self.guessed_fwhm = match obj.get(KEY_GUESSED_FWHM) {
            Some(Value::Null) | None => None,
            Some(_) => Some(load_as(obj, KEY_GUESSED_FWHM)?),
        };
        Ok(())
    }

    fn values<'a>(&'a self, par_values: Option<&'a [f64]>) -> Cow<'a, [f64]> {
        match par_values {
            Some(values) => Cow::Borrowed(values),
            None => Cow::Owned(self.parameter_values()),
        }
    }
}

impl Function for PeakFunction {
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
        match self.peak_type.shape() {
            None => self.raw.y(x, &self.range),
            Some(shape) => (shape.y)(&self.values(par_values), x),
        }
    }

    fn dy(&self, x: f64, par_index: usize, par_values: Option<&[f64]>) -> f64 {
        match self.peak_type.shape() {
            None => 0.0,
            Some(shape) => (shape.dy)(&self.values(par_values), x, par_index),
        }
    }

    /// Reset the parameters, then re-apply the stored guesses.
    fn reset(&mut self) {
        for i in 0..self.params.len() {
            let param = self.params.parameter_at_mut(i);
            let value = param.value_range().bound(0.0);
            param.set_value(value, 0.0);
        }
        if let Some(peak) = self.guessed_peak {
            self.set_guessed_peak(peak);
        }
        if let Some(fwhm) = self.guessed_fwhm {
            self.set_guessed_fwhm(fwhm);
        }
    }
}

/// The highest sample and the distance between the first samples below half
/// of it on either side, or the curve ends.
///
/// # Panics
///
/// Panics on an empty curve.
pub(crate) fn half_maximum_estimate(c: &Curve) -> (XY, f64) {
    let peak_index = c.max_y_index();
    let peak = XY::new(c.x(peak_index), c.y(peak_index));
    let half = peak.y / 2.0;

    let mut hmi1 = peak_index;
    for i in (0..peak_index).rev() {
        hmi1 = i;
        if c.y(i) < half {
            break;
        }
    }

    let mut hmi2 = peak_index;
    for i in peak_index..c.len() {
        hmi2 = i;
        if c.y(i) < half {
            break;
        }
    }

    (peak, c.x(hmi2) - c.x(hmi1))
}
