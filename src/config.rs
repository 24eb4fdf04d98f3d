//! Fit setup: which background and which peaks to fit.
//!
//! A [`FitConfig`] is what a diffractogram needs besides its samples. It is
//! plain data, loadable from and writable to JSON.
//!
//! ```
//! use peakfit_rs::config::FitConfig;
//! use peakfit_rs::functions::PeakType;
//!
//! let config = FitConfig::from_json(r#"{
//!     "background ranges": [{"min": 0.0, "max": 10.0}, {"min": 40.0, "max": 50.0}],
//!     "background degree": 1,
//!     "peaks": [{"range": {"min": 20.0, "max": 30.0}, "type": "Gaussian"}]
//! }"#).unwrap();
//!
//! assert_eq!(config.bg_ranges.len(), 2);
//! assert_eq!(config.peaks[0].peak_type, PeakType::Gaussian);
//! assert!(config.peaks[0].guessed_peak.is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::curve::XY;
use crate::error::Result;
use crate::functions::{PeakFunction, PeakType};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::range::{Range, Ranges};

/// One peak to fit: where, with which shape, and optional seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakConfig {
    pub range: Range,

    #[serde(rename = "type")]
    pub peak_type: PeakType,

    #[serde(rename = "guessed peak", default, skip_serializing_if = "Option::is_none")]
    pub guessed_peak: Option<XY>,

    #[serde(rename = "guessed fwhm", default, skip_serializing_if = "Option::is_none")]
    pub guessed_fwhm: Option<f64>,
}

impl PeakConfig {
    pub fn new(range: Range, peak_type: PeakType) -> Self {
        Self {
            range,
            peak_type,
            guessed_peak: None,
            guessed_fwhm: None,
        }
    }

    pub fn with_guesses(mut self, peak: XY, fwhm: f64) -> Self {
        self.guessed_peak = Some(peak);
        self.guessed_fwhm = Some(fwhm);
        self
    }

    /// A fresh, unfitted peak function for this configuration.
    pub fn to_function(&self) -> PeakFunction {
        let mut f = PeakFunction::new(self.peak_type);
        f.set_range(self.range);
        if let Some(peak) = self.guessed_peak {
            f.set_guessed_peak(peak);
        }
        if let Some(fwhm) = self.guessed_fwhm {
            f.set_guessed_fwhm(fwhm);
        }
        f
    }
}

/// Background and peak setup shared by all curves of a data set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Where the curve is pure background
    #[serde(rename = "background ranges", default)]
    pub bg_ranges: Ranges,

    /// Degree of the background polynomial
    #[serde(rename = "background degree", default)]
    pub bg_degree: usize,

    #[serde(default)]
    pub peaks: Vec<PeakConfig>,

    #[serde(rename = "fitter", default)]
    pub lm: LmConfig,
}

impl FitConfig {
    pub fn new(bg_degree: usize) -> Self {
        Self {
            bg_degree,
            ..Self::default()
        }
    }

    /// Add a background range, merging it with overlapping ones.
    pub fn with_bg_range(mut self, range: Range) -> Self {
        self.bg_ranges.add(range);
        self
    }

    pub fn with_peak(mut self, peak: PeakConfig) -> Self {
        self.peaks.push(peak);
        self
    }

    pub fn fitter(&self) -> LevenbergMarquardt {
        LevenbergMarquardt::new(self.lm.clone())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;

    fn sample() -> FitConfig {
        FitConfig::new(2)
            .with_bg_range(Range::new(0.0, 5.0))
            .with_bg_range(Range::new(15.0, 20.0))
            .with_peak(PeakConfig::new(Range::new(8.0, 12.0), PeakType::PseudoVoigt1))
            .with_peak(
                PeakConfig::new(Range::new(12.0, 14.0), PeakType::Raw)
                    .with_guesses(XY::new(13.0, 2.0), 0.5),
            )
    }

    #[test]
    fn test_json_round_trip() {
        let config = sample();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"PseudoVoigt1\""));
        assert!(json.contains("background ranges"));

        let back = FitConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_unknown_peak_type() {
        let err = FitConfig::from_json(r#"{"peaks": [{"range": {}, "type": "Voigt"}]}"#).unwrap_err();
        assert!(matches!(err, FitError::Json(_)));
        assert!(err.to_string().contains("Voigt"));
    }

    #[test]
    fn test_defaults() {
        let config = FitConfig::from_json("{}").unwrap();
        assert!(config.bg_ranges.is_empty());
        assert_eq!(config.bg_degree, 0);
        assert!(config.peaks.is_empty());
        assert_eq!(config.lm, LmConfig::default());
    }

    #[test]
    fn test_to_function() {
        let config = sample();
        let f = config.peaks[1].to_function();
        assert_eq!(f.peak_type(), PeakType::Raw);
        assert_eq!(f.range(), &Range::new(12.0, 14.0));
        assert_eq!(f.guessed_peak(), Some(XY::new(13.0, 2.0)));
        assert_eq!(f.guessed_fwhm(), Some(0.5));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("peakfit-config-{}.json", std::process::id()));
        sample().save(&path).unwrap();
        let back = FitConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, sample());
    }
}
