//! # peakfit-rs
//!
//! `peakfit-rs` fits background polynomials and peak shapes to measured
//! diffractograms with a Levenberg-Marquardt optimizer.
//!
//! The library provides:
//! - A parameter model with value ranges and per-step/error constraints
//! - Fit functions: polynomials, sums of functions and five peak shapes
//!   (Raw, Gaussian, Lorentzian, two pseudo-Voigt forms)
//! - A Levenberg-Marquardt fitter with analytic derivatives and standard errors
//! - JSON persistence of functions and fit setups
//! - A diffractogram type caching its background and peak fits
//!
//! ## Basic Usage
//!
//! ```
//! use peakfit_rs::{Curve, Dfgram, FitConfig, PeakConfig, PeakType, Range};
//!
//! let curve = Curve::from_fn((0..=400).map(|i| i as f64 * 0.05), |x| {
//!     0.5 + 4.0 * (-0.5 * ((x - 10.0) / 0.7).powi(2)).exp()
//! });
//!
//! let config = FitConfig::new(0)
//!     .with_bg_range(Range::new(0.0, 4.0))
//!     .with_bg_range(Range::new(16.0, 20.0))
//!     .with_peak(PeakConfig::new(Range::new(6.0, 14.0), PeakType::Gaussian));
//!
//! let dfgram = Dfgram::new(curve, config.peaks.len());
//! let info = dfgram.peak_info(&config, 0);
//!
//! assert!((info.center - 10.0).abs() < 1e-4);
//! assert!((info.intensity - 4.0).abs() < 1e-4);
//! ```

pub mod batch;
pub mod config;
pub mod curve;
pub mod dfgram;
pub mod error;
pub mod functions;
pub mod lazy;
pub mod lm;
pub mod parameters;
pub mod range;

// Re-exports for convenience
pub use config::{FitConfig, PeakConfig};
pub use curve::{Curve, XY};
pub use dfgram::{Dfgram, PeakInfo, RawOutcome};
pub use error::{FitError, Result};
pub use functions::{AnyFunction, Function, FunctionType, PeakFunction, PeakType, Polynom, SumFunctions};
pub use lm::{FitReport, LevenbergMarquardt, LmConfig};
pub use parameters::Parameter;
pub use range::{Range, Ranges};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
