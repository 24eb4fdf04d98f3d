//! A diffractogram and the fits derived from it.
//!
//! [`Dfgram`] owns one measured curve and caches everything computed from it:
//! the background fit, the background sampled as a curve, the curve with the
//! background subtracted, and per peak index a raw outcome, a fitted peak
//! function and the fitted peak sampled as a curve.
//!
//! Every artifact is computed on first read and kept until invalidated. The
//! fit setup is passed to each read; when it changes, the owner invalidates
//! the affected caches:
//!
//! - background ranges or degree changed: [`Dfgram::invalidate_bg`]
//! - all peaks changed: [`Dfgram::invalidate_peaks`]
//! - peak `i` changed: [`Dfgram::invalidate_peak_at`]
//!
//! Peak indices are stable and never compacted.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::FitConfig;
use crate::curve::Curve;
use crate::functions::{half_maximum_estimate, Function, PeakFunction, PeakType, Polynom};
use crate::lazy::{Cached, CachedSlots};
use crate::lm::FitReport;

/// A function together with the report of the fit that produced it.
#[derive(Debug, Clone)]
pub struct Fitted<F> {
    pub function: F,
    pub report: FitReport,
}

impl<F: Function> Fitted<F> {
    pub fn y(&self, x: f64) -> f64 {
        self.function.y(x, None)
    }

    pub fn success(&self) -> bool {
        self.report.success
    }
}

/// Model-free numbers for a peak range of the background-subtracted curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawOutcome {
    /// Intensity-weighted mean x
    pub center: f64,
    /// Width between the half-maximum crossings
    pub fwhm: f64,
    /// Sum of the y values
    pub intensity: f64,
}

impl RawOutcome {
    /// Outcome of `curve`; all NaN when it is empty.
    pub fn from_curve(curve: &Curve) -> Self {
        if curve.is_empty() {
            return Self {
                center: f64::NAN,
                fwhm: f64::NAN,
                intensity: f64::NAN,
            };
        }

        let intensity = curve.sum_y();
        let center = if intensity != 0.0 {
            curve.iter().map(|p| p.x * p.y).sum::<f64>() / intensity
        } else {
            curve.rge_x().center()
        };
        let (_, fwhm) = half_maximum_estimate(curve);

        Self {
            center,
            fwhm,
            intensity,
        }
    }
}

/// Fitted peak numbers, one row of a result table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakInfo {
    pub index: usize,
    #[serde(rename = "type")]
    pub peak_type: PeakType,
    pub center: f64,
    pub center_error: f64,
    pub intensity: f64,
    pub intensity_error: f64,
    pub fwhm: f64,
    pub fwhm_error: f64,
}

impl PeakInfo {
    pub fn from_peak(index: usize, peak: &PeakFunction) -> Self {
        let fitted = peak.fitted_peak();
        let error = peak.peak_error();
        Self {
            index,
            peak_type: peak.peak_type(),
            center: fitted.x,
            center_error: error.x,
            intensity: fitted.y,
            intensity_error: error.y,
            fwhm: peak.fitted_fwhm(),
            fwhm_error: peak.fwhm_error(),
        }
    }
}

/// How often each cache has been computed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub bg_fit: usize,
    pub bg_as_curve: usize,
    pub curve_minus_bg: usize,
    pub raw_outcomes: Vec<usize>,
    pub peak_fits: Vec<usize>,
    pub peaks_as_curve: Vec<usize>,
}

/// One measured curve and its cached fits.
#[derive(Debug)]
pub struct Dfgram {
    curve: Curve,
    bg_fit: Cached<Fitted<Polynom>>,
    bg_as_curve: Cached<Curve>,
    curve_minus_bg: Cached<Curve>,
    raw_outcomes: CachedSlots<RawOutcome>,
    peak_fits: CachedSlots<Fitted<PeakFunction>>,
    peaks_as_curve: CachedSlots<Curve>,
}

impl Dfgram {
    /// A diffractogram with cache slots for `peak_count` peak indices.
    pub fn new(curve: Curve, peak_count: usize) -> Self {
        Self {
            curve,
            bg_fit: Cached::new(),
            bg_as_curve: Cached::new(),
            curve_minus_bg: Cached::new(),
            raw_outcomes: CachedSlots::new(peak_count),
            peak_fits: CachedSlots::new(peak_count),
            peaks_as_curve: CachedSlots::new(peak_count),
        }
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn peak_slots(&self) -> usize {
        self.peak_fits.len()
    }

    /// Change the number of peak indices. Existing indices keep their caches.
    pub fn set_peak_slots(&mut self, peak_count: usize) {
        self.raw_outcomes.resize(peak_count);
        self.peak_fits.resize(peak_count);
        self.peaks_as_curve.resize(peak_count);
    }

    /// The background polynomial fitted over the background ranges.
    pub fn bg_fit(&self, config: &FitConfig) -> &Fitted<Polynom> {
        self.bg_fit.get_or_compute(|| {
            debug!(
                "Fitting background: degree {} over {} ranges",
                config.bg_degree,
                config.bg_ranges.len()
            );
            let mut function = Polynom::new(config.bg_degree);
            let report = function.fit_with(&self.curve, &config.bg_ranges, &config.fitter());
            Fitted { function, report }
        })
    }

    /// The background at every x of the curve.
    pub fn bg_as_curve(&self, config: &FitConfig) -> &Curve {
        self.bg_as_curve.get_or_compute(|| {
            debug!("Sampling background curve");
            let bg = self.bg_fit(config);
            Curve::from_fn(self.curve.xs().iter().copied(), |x| bg.y(x))
        })
    }

    /// The curve minus the background.
    pub fn curve_minus_bg(&self, config: &FitConfig) -> &Curve {
        self.curve_minus_bg.get_or_compute(|| {
            debug!("Subtracting background");
            self.curve.subtract(&self.bg_fit(config).function)
        })
    }

    /// Model-free numbers for peak `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a peak of `config` or has no cache slot.
    pub fn raw_outcome(&self, config: &FitConfig, index: usize) -> &RawOutcome {
        let peak = &config.peaks[index];
        self.raw_outcomes.get_or_compute(index, || {
            debug!("Computing raw outcome of peak {}", index);
            RawOutcome::from_curve(&self.curve_minus_bg(config).intersect(&peak.range))
        })
    }

    /// Peak `index` fitted to the background-subtracted curve.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a peak of `config` or has no cache slot.
    pub fn peak_fit(&self, config: &FitConfig, index: usize) -> &Fitted<PeakFunction> {
        let peak = &config.peaks[index];
        self.peak_fits.get_or_compute(index, || {
            debug!(
                "Fitting peak {} ({}) over [{}, {}]",
                index, peak.peak_type, peak.range.min, peak.range.max
            );
            let mut function = peak.to_function();
            let report = function.fit_with(self.curve_minus_bg(config), &peak.range, &config.fitter());
            Fitted { function, report }
        })
    }

    /// The fitted peak `index` at every x of the curve within its range.
    pub fn peak_as_curve(&self, config: &FitConfig, index: usize) -> &Curve {
        let peak = &config.peaks[index];
        self.peaks_as_curve.get_or_compute(index, || {
            debug!("Sampling curve of peak {}", index);
            let fitted = self.peak_fit(config, index);
            let xs = self.curve.intersect(&peak.range);
            Curve::from_fn(xs.xs().iter().copied(), |x| fitted.y(x))
        })
    }

    /// Result row for peak `index`, from its cached fit.
    pub fn peak_info(&self, config: &FitConfig, index: usize) -> PeakInfo {
        PeakInfo::from_peak(index, &self.peak_fit(config, index).function)
    }

    /// Drop the background caches and, since peaks are fitted against the
    /// background-subtracted curve, every peak cache.
    pub fn invalidate_bg(&mut self) {
        debug!("Invalidating background");
        self.bg_fit.invalidate();
        self.bg_as_curve.invalidate();
        self.curve_minus_bg.invalidate();
        self.invalidate_peaks();
    }

    /// Drop every peak cache, keeping the background.
    pub fn invalidate_peaks(&mut self) {
        debug!("Invalidating all peaks");
        self.raw_outcomes.invalidate_all();
        self.peak_fits.invalidate_all();
        self.peaks_as_curve.invalidate_all();
    }

    /// Drop the caches of peak `index` only.
    pub fn invalidate_peak_at(&mut self, index: usize) {
        debug!("Invalidating peak {}", index);
        self.raw_outcomes.invalidate(index);
        self.peak_fits.invalidate(index);
        self.peaks_as_curve.invalidate(index);
    }

    pub fn counters(&self) -> CacheCounters {
        let slots = 0..self.peak_slots();
        CacheCounters {
            bg_fit: self.bg_fit.computations(),
            bg_as_curve: self.bg_as_curve.computations(),
            curve_minus_bg: self.curve_minus_bg.computations(),
            raw_outcomes: slots.clone().map(|i| self.raw_outcomes.computations(i)).collect(),
            peak_fits: slots.clone().map(|i| self.peak_fits.computations(i)).collect(),
            peaks_as_curve: slots.map(|i| self.peaks_as_curve.computations(i)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeakConfig;
    use crate::range::Range;
    use approx::assert_relative_eq;

    fn measured() -> Curve {
        Curve::from_fn((0..=500).map(|i| i as f64 * 0.1), |x| {
            2.0 + 0.1 * x + 10.0 * (-0.5 * ((x - 25.0) / 1.5).powi(2)).exp()
        })
    }

    fn config() -> FitConfig {
        FitConfig::new(1)
            .with_bg_range(Range::new(0.0, 10.0))
            .with_bg_range(Range::new(40.0, 50.0))
            .with_peak(PeakConfig::new(Range::new(18.0, 32.0), PeakType::Gaussian))
            .with_peak(PeakConfig::new(Range::new(20.0, 30.0), PeakType::Raw))
    }

    #[test]
    fn test_background() {
        let config = config();
        let dfgram = Dfgram::new(measured(), 2);

        let c = dfgram.bg_fit(&config).function.coefficients();
        assert_relative_eq!(c[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(c[1], 0.1, epsilon = 1e-6);

        let bg = dfgram.bg_as_curve(&config);
        assert_eq!(bg.len(), dfgram.curve().len());
        assert_relative_eq!(bg.y(100), 3.0, epsilon = 1e-6);

        let rest = dfgram.curve_minus_bg(&config);
        assert_relative_eq!(rest.y(250), 10.0, epsilon = 1e-6);
        assert_relative_eq!(rest.y(0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_peaks() {
        let config = config();
        let dfgram = Dfgram::new(measured(), 2);

        let fitted = dfgram.peak_fit(&config, 0);
        assert!(fitted.report.iterations > 0, "{}", fitted.report);

        let info = dfgram.peak_info(&config, 0);
        assert_eq!(info.peak_type, PeakType::Gaussian);
        assert_relative_eq!(info.center, 25.0, epsilon = 1e-5);
        assert_relative_eq!(info.intensity, 10.0, epsilon = 1e-5);
        assert_relative_eq!(info.fwhm, 1.5 / 0.424661, epsilon = 1e-4);

        let raw = dfgram.raw_outcome(&config, 1);
        assert_relative_eq!(raw.center, 25.0, epsilon = 1e-3);
        assert!(raw.intensity > 0.0);

        let peak_curve = dfgram.peak_as_curve(&config, 0);
        assert_eq!(peak_curve.x(0), dfgram.curve().intersect(&Range::new(18.0, 32.0)).x(0));
        assert!(peak_curve.rge_y().max > 9.99);
    }

    #[test]
    fn test_reads_are_cached() {
        let config = config();
        let dfgram = Dfgram::new(measured(), 2);

        dfgram.peak_as_curve(&config, 0);
        dfgram.peak_as_curve(&config, 0);
        dfgram.peak_fit(&config, 0);
        dfgram.curve_minus_bg(&config);

        let counters = dfgram.counters();
        assert_eq!(counters.bg_fit, 1);
        assert_eq!(counters.curve_minus_bg, 1);
        assert_eq!(counters.bg_as_curve, 0);
        assert_eq!(counters.peak_fits, vec![1, 0]);
        assert_eq!(counters.peaks_as_curve, vec![1, 0]);
    }

    #[test]
    fn test_invalidate_peak_at() {
        let config = config();
        let mut dfgram = Dfgram::new(measured(), 2);
        for i in 0..2 {
            dfgram.peak_fit(&config, i);
            dfgram.raw_outcome(&config, i);
        }

        dfgram.invalidate_peak_at(1);
        for i in 0..2 {
            dfgram.peak_fit(&config, i);
            dfgram.raw_outcome(&config, i);
        }

        let counters = dfgram.counters();
        assert_eq!(counters.peak_fits, vec![1, 2]);
        assert_eq!(counters.raw_outcomes, vec![1, 2]);
        assert_eq!(counters.bg_fit, 1);
        assert_eq!(counters.curve_minus_bg, 1);
    }

    #[test]
    fn test_invalidate_bg_reaches_peaks() {
        let config = config();
        let mut dfgram = Dfgram::new(measured(), 2);
        dfgram.bg_as_curve(&config);
        dfgram.peak_fit(&config, 0);

        dfgram.invalidate_bg();
        dfgram.bg_as_curve(&config);
        dfgram.peak_fit(&config, 0);

        let counters = dfgram.counters();
        assert_eq!(counters.bg_fit, 2);
        assert_eq!(counters.bg_as_curve, 2);
        assert_eq!(counters.curve_minus_bg, 2);
        assert_eq!(counters.peak_fits, vec![2, 0]);

        dfgram.invalidate_peaks();
        dfgram.peak_fit(&config, 0);
        let counters = dfgram.counters();
        assert_eq!(counters.bg_fit, 2);
        assert_eq!(counters.peak_fits, vec![3, 0]);
    }

    #[test]
    fn test_raw_outcome_of_empty_range() {
        let outcome = RawOutcome::from_curve(&Curve::new());
        assert!(outcome.intensity.is_nan());

        let flat = Curve::from_xy(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]);
        let outcome = RawOutcome::from_curve(&flat);
        assert_eq!(outcome.intensity, 0.0);
        assert_eq!(outcome.center, 2.0);
    }

    #[test]
    #[should_panic]
    fn test_unknown_peak_index() {
        let config = config();
        let dfgram = Dfgram::new(measured(), 2);
        dfgram.peak_fit(&config, 2);
    }
}
