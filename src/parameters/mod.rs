//! # Parameter System
//!
//! Every fit function owns an ordered list of [`Parameter`]s. The list order
//! is the layout of the optimizer's parameter vector.
//!
//! A parameter holds:
//!
//! - **Value and error**: the current estimate and its standard error
//! - **Value range**: the allowed interval, possibly infinite
//! - **Step limits**: optional `maxDelta` / `maxDeltaPercent` bounds on a
//!   single optimizer step
//! - **Error limits**: optional `maxError` / `maxErrorPercent` bounds on the
//!   estimated error
//!
//! ## Example Usage
//!
//! ```rust
//! use peakfit_rs::parameters::Parameter;
//!
//! let mut eta = Parameter::with_range(0.0, 1.0);
//! eta.set_value(0.5, 0.0);
//! eta.set_max_delta(Some(0.1));
//!
//! assert!(eta.check_constraints(0.55, 0.0));
//! assert!(!eta.check_constraints(0.7, 0.0));
//! assert!(!eta.check_constraints(1.2, 0.0));
//! ```

pub mod parameter;


pub use parameter::Parameter;
