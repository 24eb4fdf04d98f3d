//! Integration tests for JSON persistence
//!
//! Functions are saved after fitting and loaded back; the loaded function
//! must evaluate exactly like the saved one.

use approx::assert_relative_eq;
use peakfit_rs::{
    AnyFunction, Curve, FitConfig, FitError, Function, FunctionType, PeakConfig, PeakFunction,
    PeakType, Polynom, Range, SumFunctions, XY,
};
use serde_json::json;

fn fitted_peak(peak_type: PeakType) -> PeakFunction {
    let curve = Curve::from_fn((0..=200).map(|i| i as f64 * 0.05), |x| {
        3.0 / (1.0 + ((x - 5.0) / 0.4).powi(2))
    });
    let mut peak = PeakFunction::new(peak_type);
    peak.fit(&curve, &Range::new(2.0, 8.0));
    peak
}

#[test]
fn test_peak_round_trip() {
    // Raw samples are not persisted
    for peak_type in PeakType::ALL.into_iter().filter(|&t| t != PeakType::Raw) {
        let peak = fitted_peak(peak_type);
        let json = AnyFunction::from(peak.clone()).to_json();
        assert_eq!(json["type"], peak_type.tag());

        let loaded = AnyFunction::from_json(&json).unwrap();
        assert_eq!(loaded.function_type(), FunctionType::Peak(peak_type));
        assert_eq!(loaded.parameter_count(), peak.parameter_count());
        for x in [2.5, 4.7, 5.0, 6.1] {
            assert_eq!(loaded.y(x, None), peak.y(x, None), "{} at {}", peak_type, x);
        }
    }
}

#[test]
fn test_sum_round_trip() {
    let mut sum = SumFunctions::new();
    let mut bg = Polynom::new(2);
    bg.set_coefficients(&[1.0, -0.5, 0.25]);
    sum.add_function(bg);
    sum.add_function(fitted_peak(PeakType::Lorentzian));
    sum.add_function(fitted_peak(PeakType::Gaussian));

    let json = AnyFunction::from(sum.clone()).to_json();
    assert_eq!(json["function count"], 3);
    assert_eq!(json["f1"]["type"], "polynom");
    assert_eq!(json["f3"]["type"], "Gaussian");

    let loaded = match AnyFunction::from_json(&json).unwrap() {
        AnyFunction::Sum(loaded) => loaded,
        other => panic!("Expected a sum, got {:?}", other.function_type()),
    };
    assert_eq!(loaded.function_count(), 3);
    assert_eq!(loaded.parameter_count(), sum.parameter_count());
    for x in [0.0, 3.3, 5.0, 9.0] {
        assert_relative_eq!(loaded.y(x, None), sum.y(x, None));
    }
}

#[test]
fn test_parameter_constraints_are_persisted() {
    let mut bg = Polynom::new(0);
    bg.parameter_at_mut(0).set_value_range(-1.0, 2.0);
    bg.parameter_at_mut(0).set_max_delta(Some(0.5));
    bg.set_coefficients(&[1.5]);

    let loaded = AnyFunction::from_json(&bg.to_json()).unwrap();
    let param = loaded.parameter_at(0);
    assert_eq!(param.value(), 1.5);
    assert_eq!(param.range(), &Range::new(-1.0, 2.0));
    assert_eq!(param.max_delta(), Some(0.5));
    assert_eq!(param.max_error(), None);
}

#[test]
fn test_guesses_are_persisted() {
    let mut peak = PeakFunction::new(PeakType::PseudoVoigt2);
    peak.set_range(Range::new(1.0, 9.0));
    peak.set_guessed_peak(XY::new(4.0, 2.0));
    peak.set_guessed_fwhm(0.8);

    let loaded = match AnyFunction::from_json(&peak.to_json()).unwrap() {
        AnyFunction::Peak(loaded) => loaded,
        other => panic!("Expected a peak, got {:?}", other.function_type()),
    };
    assert_eq!(loaded.range(), &Range::new(1.0, 9.0));
    assert_eq!(loaded.guessed_peak(), Some(XY::new(4.0, 2.0)));
    assert_eq!(loaded.guessed_fwhm(), Some(0.8));

    let unguessed = PeakFunction::new(PeakType::Gaussian).to_json();
    assert!(unguessed.get("guessed peak").is_none());
}

#[test]
fn test_load_errors() {
    let unknown = json!({"type": "Voigt", "parameters": []});
    assert!(matches!(
        AnyFunction::from_json(&unknown),
        Err(FitError::UnknownFunctionType(tag)) if tag == "Voigt"
    ));

    let no_range = json!({"type": "Raw", "parameters": []});
    assert!(matches!(
        AnyFunction::from_json(&no_range),
        Err(FitError::MissingKey(key)) if key == "range"
    ));

    let missing_member = json!({"type": "sum", "function count": 2, "f1": {
        "type": "polynom",
        "parameters": [{"value": 1.0, "range": {"min": null, "max": null}}]
    }});
    assert!(matches!(
        AnyFunction::from_json(&missing_member),
        Err(FitError::MissingKey(key)) if key == "f2"
    ));

    let wrong_count = json!({"type": "Gaussian", "range": {}, "parameters": [
        {"value": 1.0, "range": {"min": null, "max": null}}
    ]});
    assert!(matches!(
        AnyFunction::from_json(&wrong_count),
        Err(FitError::InvalidValue { .. })
    ));
}

#[test]
fn test_fit_config_round_trip() {
    let config = FitConfig::new(3)
        .with_bg_range(Range::new(0.0, 10.0))
        .with_bg_range(Range::new(5.0, 15.0))
        .with_peak(PeakConfig::new(Range::new(20.0, 25.0), PeakType::Lorentzian))
        .with_peak(
            PeakConfig::new(Range::new(30.0, 33.0), PeakType::PseudoVoigt2)
                .with_guesses(XY::new(31.5, 100.0), 1.0),
        );
    assert_eq!(config.bg_ranges.len(), 1);

    let json = config.to_json().unwrap();
    let loaded = FitConfig::from_json(&json).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.bg_ranges.at(0), &Range::new(0.0, 15.0));
}
