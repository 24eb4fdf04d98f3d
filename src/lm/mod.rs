//! Levenberg-Marquardt fitting.
//!
//! This module provides the nonlinear least-squares fitter used for both
//! background polynomials and peaks. It works on any [`Function`] and
//! writes the fitted values and their standard errors back into the
//! function's parameters.
//!
//! [`Function`]: crate::functions::Function

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;

// Re-export key types
pub use algorithm::{FitReport, LevenbergMarquardt};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::LmStep;
