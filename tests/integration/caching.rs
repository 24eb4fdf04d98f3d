//! Integration tests for the diffractogram caches
//!
//! A setup is edited the way an interactive session edits it, and the
//! diffractogram is invalidated accordingly. Only the invalidated artifacts
//! may be recomputed, and they must reflect the edited setup.

use approx::assert_relative_eq;
use peakfit_rs::{Curve, Dfgram, FitConfig, PeakConfig, PeakType, Range};

fn two_peaks() -> Curve {
    Curve::from_fn((0..=1000).map(|i| i as f64 * 0.05), |x| {
        5.0 + 0.05 * x
            + 12.0 * (-0.5 * ((x - 15.0) / 0.6).powi(2)).exp()
            + 7.0 / (1.0 + ((x - 32.0) / 0.5).powi(2))
    })
}

fn setup() -> FitConfig {
    FitConfig::new(1)
        .with_bg_range(Range::new(0.0, 8.0))
        .with_bg_range(Range::new(44.0, 50.0))
        .with_peak(PeakConfig::new(Range::new(11.0, 19.0), PeakType::Gaussian))
        .with_peak(PeakConfig::new(Range::new(28.0, 36.0), PeakType::Lorentzian))
}

#[test]
fn test_peak_edit_refits_only_that_peak() {
    let mut config = setup();
    let mut dfgram = Dfgram::new(two_peaks(), 2);

    let first = dfgram.peak_info(&config, 0);
    let second = dfgram.peak_info(&config, 1);
    assert_relative_eq!(first.center, 15.0, epsilon = 1e-3);
    assert_relative_eq!(second.center, 32.0, epsilon = 1e-2);

    config.peaks[0].peak_type = PeakType::PseudoVoigt1;
    dfgram.invalidate_peak_at(0);

    let edited = dfgram.peak_info(&config, 0);
    assert_eq!(edited.peak_type, PeakType::PseudoVoigt1);
    assert_relative_eq!(edited.center, 15.0, epsilon = 1e-3);
    assert_eq!(dfgram.peak_info(&config, 1), second);

    let counters = dfgram.counters();
    assert_eq!(counters.bg_fit, 1);
    assert_eq!(counters.peak_fits, vec![2, 1]);
}

#[test]
fn test_background_edit_refits_everything() {
    let mut config = setup();
    let mut dfgram = Dfgram::new(two_peaks(), 2);

    dfgram.bg_as_curve(&config);
    dfgram.peak_as_curve(&config, 0);
    dfgram.raw_outcome(&config, 1);

    config.bg_degree = 0;
    dfgram.invalidate_bg();
    let flat = dfgram.bg_fit(&config).function.coefficients();
    assert_eq!(flat.len(), 1);

    dfgram.peak_as_curve(&config, 0);
    dfgram.raw_outcome(&config, 1);

    let counters = dfgram.counters();
    assert_eq!(counters.bg_fit, 2);
    assert_eq!(counters.bg_as_curve, 1);
    assert_eq!(counters.curve_minus_bg, 2);
    assert_eq!(counters.peak_fits, vec![2, 0]);
    assert_eq!(counters.peaks_as_curve, vec![2, 0]);
    assert_eq!(counters.raw_outcomes, vec![0, 2]);
}

#[test]
fn test_added_peak_keeps_existing_caches() {
    let mut config = setup();
    let mut dfgram = Dfgram::new(two_peaks(), 2);
    dfgram.peak_fit(&config, 0);
    dfgram.peak_fit(&config, 1);

    config.peaks.push(PeakConfig::new(Range::new(30.0, 34.0), PeakType::Raw));
    dfgram.set_peak_slots(config.peaks.len());

    let raw = dfgram.peak_info(&config, 2);
    assert_eq!(raw.peak_type, PeakType::Raw);
    assert_relative_eq!(raw.center, 32.0);
    assert_eq!(raw.fwhm, 4.0);

    let counters = dfgram.counters();
    assert_eq!(counters.peak_fits, vec![1, 1, 1]);
    assert_eq!(counters.bg_fit, 1);
}

#[test]
fn test_raw_outcome_matches_fit() {
    let config = setup();
    let dfgram = Dfgram::new(two_peaks(), 2);

    let raw = *dfgram.raw_outcome(&config, 0);
    let fitted = dfgram.peak_info(&config, 0);

    // the Lorentzian tail skews the centroid slightly
    assert_relative_eq!(raw.center, fitted.center, epsilon = 1e-2);
    assert_relative_eq!(raw.fwhm, fitted.fwhm, epsilon = 0.15);
    // Riemann sum of the Gaussian over the range, at 0.05 spacing
    let area = 12.0 * 0.6 * (2.0 * std::f64::consts::PI).sqrt() / 0.05;
    assert_relative_eq!(raw.intensity, area, max_relative = 1e-2);
}

#[test]
fn test_subtracted_curve() {
    let config = setup();
    let dfgram = Dfgram::new(two_peaks(), 2);

    let bg = dfgram.bg_as_curve(&config);
    let rest = dfgram.curve_minus_bg(&config);
    let curve = dfgram.curve();
    assert_eq!(rest.len(), curve.len());
    for i in (0..curve.len()).step_by(97) {
        assert_relative_eq!(rest.y(i) + bg.y(i), curve.y(i), epsilon = 1e-9);
    }
}
