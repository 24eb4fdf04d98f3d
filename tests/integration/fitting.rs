//! Integration tests for fitting peaks and backgrounds
//!
//! These tests fit synthetic diffractograms, with and without noise, and
//! check the recovered peak positions, heights and widths.

use approx::assert_relative_eq;
use peakfit_rs::{
    lm::ConvergenceStatus, Curve, Function, LevenbergMarquardt, PeakFunction, PeakType, Polynom,
    Range, Ranges, SumFunctions, XY,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn sample_xs(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> {
    let n = ((to - from) / step).round() as usize;
    (0..=n).map(move |i| from + i as f64 * step)
}

/// Pseudo-Voigt with one half-width: amplitude, position, half-width, eta.
fn pseudo_voigt(x: f64, ampl: f64, x0: f64, w: f64, eta: f64) -> f64 {
    let arg2 = ((x - x0) / w).powi(2);
    ampl * ((1.0 - eta) * (-std::f64::consts::LN_2 * arg2).exp() + eta / (1.0 + arg2))
}

#[test]
fn test_noisy_pseudo_voigt() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.02).unwrap();

    let mut curve = Curve::new();
    for x in sample_xs(25.0, 35.0, 0.02) {
        curve.append(x, pseudo_voigt(x, 8.0, 30.0, 0.6, 0.4) + noise.sample(&mut rng));
    }

    let mut peak = PeakFunction::new(PeakType::PseudoVoigt1);
    let report = peak.fit(&curve, &Range::new(25.0, 35.0));
    assert!(report.iterations > 0, "{}", report);
    assert_ne!(report.status, ConvergenceStatus::NumericalError);

    let fitted = peak.fitted_peak();
    assert_relative_eq!(fitted.x, 30.0, epsilon = 0.01);
    assert_relative_eq!(fitted.y, 8.0, epsilon = 0.1);
    assert_relative_eq!(peak.fitted_fwhm(), 1.2, epsilon = 0.05);
    assert_relative_eq!(peak.parameter_at(3).value(), 0.4, epsilon = 0.1);

    let error = peak.peak_error();
    assert!(error.x > 0.0 && error.x < 0.01);
    assert!(error.y > 0.0 && error.y < 0.1);
    assert!(peak.fwhm_error() > 0.0);
}

#[test]
fn test_every_analytic_shape_recovers_its_own_curve() {
    for peak_type in [
        PeakType::Gaussian,
        PeakType::Lorentzian,
        PeakType::PseudoVoigt1,
        PeakType::PseudoVoigt2,
    ] {
        let mut truth = PeakFunction::new(peak_type);
        truth.set_guessed_peak(XY::new(12.0, 6.0));
        truth.set_guessed_fwhm(1.5);
        if let Some(eta) = peak_type.parameter_names().iter().position(|&n| n == "eta") {
            truth.parameter_at_mut(eta).set_value(0.5, 0.0);
        }
        let curve = Curve::from_fn(sample_xs(5.0, 19.0, 0.05), |x| truth.y(x, None));

        let mut peak = PeakFunction::new(peak_type);
        peak.set_guessed_peak(XY::new(11.8, 5.0));
        peak.set_guessed_fwhm(1.2);
        peak.fit(&curve, &Range::new(5.0, 19.0));

        assert_relative_eq!(peak.fitted_peak().x, 12.0, epsilon = 1e-3);
        assert_relative_eq!(peak.fitted_peak().y, 6.0, epsilon = 1e-2);
        assert_relative_eq!(peak.y(12.5, None), truth.y(12.5, None), epsilon = 1e-2);
    }
}

#[test]
fn test_fwhm_seed_round_trip() {
    for peak_type in [
        PeakType::Gaussian,
        PeakType::Lorentzian,
        PeakType::PseudoVoigt1,
        PeakType::PseudoVoigt2,
    ] {
        let mut peak = PeakFunction::new(peak_type);
        peak.set_guessed_fwhm(0.37);
        assert_relative_eq!(peak.fitted_fwhm(), 0.37, epsilon = 1e-6);
    }
}

#[test]
fn test_background_polynomial() {
    let curve = Curve::from_fn(sample_xs(0.0, 20.0, 0.1), |x| {
        0.5 - 0.2 * x + 0.01 * x * x + 20.0 * (-0.5 * ((x - 10.0) / 0.5).powi(2)).exp()
    });

    let mut ranges = Ranges::new();
    ranges.add(Range::new(0.0, 6.0));
    ranges.add(Range::new(14.0, 20.0));

    let bg = Polynom::from_fit(2, &curve, &ranges);
    let c = bg.coefficients();
    assert_relative_eq!(c[0], 0.5, epsilon = 1e-6);
    assert_relative_eq!(c[1], -0.2, epsilon = 1e-6);
    assert_relative_eq!(c[2], 0.01, epsilon = 1e-7);

    let rest = curve.subtract(&bg);
    assert_relative_eq!(rest.rge_y().max, 20.0, epsilon = 1e-5);
}

#[test]
fn test_sum_of_background_and_peak() {
    let curve = Curve::from_fn(sample_xs(0.0, 10.0, 0.05), |x| {
        1.0 + 4.0 * (-0.5 * ((x - 5.0) / 0.6).powi(2)).exp()
    });

    let mut sum = SumFunctions::new();
    sum.add_function(Polynom::new(0));
    sum.add_function(PeakFunction::new(PeakType::Gaussian));
    assert_eq!(sum.parameter_count(), 4);

    sum.parameter_at_mut(0).set_value(0.5, 0.0);
    sum.parameter_at_mut(1).set_value(3.0, 0.0);
    sum.parameter_at_mut(2).set_value(4.8, 0.0);
    sum.parameter_at_mut(3).set_value(0.8, 0.0);

    let report = LevenbergMarquardt::with_default_config().fit(&mut sum, &curve);
    assert!(report.iterations > 0, "{}", report);

    let values = sum.parameter_values();
    assert_relative_eq!(values[0], 1.0, epsilon = 1e-6);
    assert_relative_eq!(values[1], 4.0, epsilon = 1e-6);
    assert_relative_eq!(values[2], 5.0, epsilon = 1e-6);
    assert_relative_eq!(values[3], 0.6, epsilon = 1e-6);
    assert!(report.cost < 1e-10);
}

#[test]
fn test_position_stays_in_its_range() {
    let curve = Curve::from_fn(sample_xs(0.0, 10.0, 0.05), |x| {
        4.0 * (-0.5 * ((x - 6.0) / 0.6).powi(2)).exp()
    });

    let mut peak = PeakFunction::new(PeakType::Gaussian);
    peak.set_guessed_peak(XY::new(5.5, 4.0));
    peak.set_guessed_fwhm(1.4);
    peak.parameter_at_mut(1).set_value_range(5.0, 5.8);
    peak.fit(&curve, &Range::new(0.0, 10.0));

    let x0 = peak.fitted_peak().x;
    assert!((5.0..=5.8).contains(&x0), "position left its range: {}", x0);
}

#[test]
fn test_raw_peak() {
    let curve = Curve::from_xy(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 3.0, 1.0, 0.0]);

    let mut peak = PeakFunction::new(PeakType::Raw);
    let report = peak.fit(&curve, &Range::new(0.5, 3.5));

    assert_eq!(report.status, ConvergenceStatus::NotRun);
    assert_eq!(peak.parameter_count(), 0);
    assert_eq!(peak.raw_curve().len(), 3);
    assert_eq!(peak.fitted_peak(), XY::new(2.0, 5.0));
    assert_eq!(peak.fitted_fwhm(), 3.0);
    assert_eq!(peak.fwhm_error(), 0.0);
    assert_eq!(peak.peak_error(), XY::new(0.0, 0.0));
}

#[test]
fn test_empty_peak_range_is_not_fitted() {
    let curve = Curve::from_xy(&[0.0, 1.0, 2.0], &[1.0, 2.0, 1.0]);

    let mut peak = PeakFunction::new(PeakType::Lorentzian);
    peak.set_guessed_peak(XY::new(5.5, 2.0));
    peak.parameter_at_mut(2).set_value(3.0, 0.1);
    let mut expected = peak.clone();
    expected.reset();

    let report = peak.fit(&curve, &Range::new(5.0, 6.0));

    assert_eq!(report.status, ConvergenceStatus::NotRun);
    assert!(!report.success);
    assert_eq!(peak.parameter_values(), expected.parameter_values());
    assert_eq!(peak.parameter_values(), vec![2.0, 5.5, 0.0]);
}

#[test]
fn test_seeded_gaussian() {
    let mut truth = PeakFunction::new(PeakType::Gaussian);
    truth.set_guessed_peak(XY::new(5.0, 10.0));
    truth.set_guessed_fwhm(2.0);
    let curve = Curve::from_fn(sample_xs(0.0, 10.0, 0.05), |x| truth.y(x, None));

    let mut peak = PeakFunction::new(PeakType::Gaussian);
    peak.set_guessed_peak(XY::new(5.0, 10.0));
    peak.set_guessed_fwhm(2.0);
    peak.fit(&curve, &Range::new(0.0, 10.0));

    assert_relative_eq!(peak.fitted_peak().x, 5.0, epsilon = 1e-6);
    assert_relative_eq!(peak.fitted_peak().y, 10.0, epsilon = 1e-6);
    assert_relative_eq!(peak.fitted_fwhm(), 2.0, epsilon = 1e-6);
}
