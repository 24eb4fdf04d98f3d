//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core fitting loop: it minimizes the sum of
//! squared residuals between a [`Function`] and the samples of a [`Curve`],
//! using the function's analytic derivatives for the Jacobian and consulting
//! every parameter's constraints before a step is accepted.

use log::{debug, trace, warn};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::curve::Curve;
use crate::functions::Function;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;

/// Result of a Levenberg-Marquardt fit.
///
/// The fitted values and their standard errors are written back into the
/// function's parameters; the report only describes how the fit went.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// How the fit ended
    pub status: ConvergenceStatus,

    /// Sum of squared residuals at the solution
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the fit converged
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl FitReport {
    pub(crate) fn not_run(message: impl Into<String>) -> Self {
        Self {
            status: ConvergenceStatus::NotRun,
            cost: 0.0,
            iterations: 0,
            func_evals: 0,
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt fitter.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new fitter with the given configuration.
    pub fn new(config: LmConfig) -> Self {
        Self { config }
    }

    /// Create a new fitter with default configuration.
    pub fn with_default_config() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Fit `f` to the samples of `curve`.
    ///
    /// Starts from the function's current parameter values. A trial step is
    /// rejected, and damping increased, if the cost would not decrease or any
    /// parameter would leave its constraints; values are never clamped. Error
    /// limits are checked against the standard errors at the trial point.
    /// On return the parameters hold the best values found, with standard
    /// errors from the covariance at that point (NaN when it is singular or
    /// there are no more samples than parameters).
    ///
    /// An empty curve or a function without parameters leaves `f` unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakfit_rs::functions::{Function, Polynom};
    /// use peakfit_rs::lm::LevenbergMarquardt;
    /// use peakfit_rs::Curve;
    ///
    /// let curve = Curve::from_fn((0..10).map(f64::from), |x| 1.0 - 2.0 * x);
    /// let mut line = Polynom::new(1);
    /// let report = LevenbergMarquardt::with_default_config().fit(&mut line, &curve);
    ///
    /// assert!(report.success);
    /// assert!((line.coefficients()[1] + 2.0).abs() < 1e-8);
    /// ```
    pub fn fit<F: Function + ?Sized>(&self, f: &mut F, curve: &Curve) -> FitReport {
        let n_params = f.parameter_count();
        if curve.is_empty() {
            return FitReport::not_run("no data points to fit");
        }
        if n_params == 0 {
            return FitReport::not_run("no parameters to fit");
        }

        debug!("Starting fit: {} parameters, {} data points", n_params, curve.len());

        let config = &self.config;
        let criteria = ConvergenceCriteria::new(config.xtol, config.ftol, config.gtol, config.max_iterations);

        // Initialize parameters and damping
        let mut params = f.parameter_values();
        let mut lambda = config.initial_lambda;

        // Evaluate initial residuals and cost
        let mut residuals = compute_residuals(f, curve, &params);
        let mut cost = residuals.dot(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        if !cost.is_finite() {
            warn!("Fit not started: cost at the initial parameters is {}", cost);
            return FitReport {
                status: ConvergenceStatus::NumericalError,
                cost,
                iterations,
                func_evals,
                success: false,
                message: format!("initial cost is {}", cost),
            };
        }

        // Error limits need the standard errors at every trial point
        let error_limited = (0..n_params).any(|i| f.parameter_at(i).has_error_limits());

        let status = 'outer: loop {
            if iterations >= config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let jacobian = compute_jacobian(f, curve, &params);
            let j_t_j = jacobian.t().dot(&jacobian);
            let j_t_r = jacobian.t().dot(&residuals);

            if let Some(status) = criteria.check_gradient(j_t_r.dot(&j_t_r).sqrt()) {
                break status;
            }

            // Try steps with increasing damping until one is acceptable
            loop {
                let trial = LmStep::calculate_step(&j_t_j, &j_t_r, lambda)
                    .map(|step| params.iter().zip(step.iter()).map(|(p, s)| p + s).collect::<Vec<_>>());

                let accepted = trial
                    .and_then(|new_params| {
                        let new_residuals = compute_residuals(&*f, curve, &new_params);
                        func_evals += 1;
                        let new_cost = new_residuals.dot(&new_residuals);
                        // NaN compares false and is rejected
                        (new_cost < cost).then_some((new_params, new_residuals, new_cost))
                    })
                    .filter(|(new_params, _, new_cost)| {
                        let errors = if error_limited {
                            standard_errors(&*f, curve, new_params, *new_cost)
                        } else {
                            vec![0.0; n_params]
                        };
                        admissible(&*f, new_params, &errors)
                    });

                match accepted {
                    Some((new_params, new_residuals, new_cost)) => {
                        iterations += 1;
                        let status = criteria.check_step(&params, &new_params, cost, new_cost, iterations);

                        // Constraint deltas are measured from the last accepted point
                        for (i, &value) in new_params.iter().enumerate() {
                            f.parameter_at_mut(i).set_value(value, 0.0);
                        }
                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;
                        lambda = config.decrease_lambda(lambda);
                        trace!("Iteration {}: cost = {:.6e}, lambda = {:.1e}", iterations, cost, lambda);

                        if let Some(status) = status {
                            break 'outer status;
                        }
                        break;
                    }
                    None => {
                        if lambda >= config.max_lambda {
                            break 'outer ConvergenceStatus::Stalled;
                        }
                        lambda = config.increase_lambda(lambda);
                    }
                }
            }
        };

        let errors = standard_errors(f, curve, &params, cost);
        for (i, (&value, error)) in params.iter().zip(errors).enumerate() {
            f.parameter_at_mut(i).set_value(value, error);
        }

        let success = status.is_converged();
        if success {
            debug!("Fit finished after {} iterations: {} (cost = {:.6e})", iterations, status, cost);
        } else {
            warn!("Fit did not converge after {} iterations: {} (cost = {:.6e})", iterations, status, cost);
        }

        FitReport {
            status,
            cost,
            iterations,
            func_evals,
            success,
            message: status.description().to_string(),
        }
    }
}

/// Model minus data at every sample.
fn compute_residuals<F: Function + ?Sized>(f: &F, curve: &Curve, params: &[f64]) -> Array1<f64> {
    curve.iter().map(|p| f.y(p.x, Some(params)) - p.y).collect()
}

fn compute_jacobian<F: Function + ?Sized>(f: &F, curve: &Curve, params: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((curve.len(), params.len()), |(i, j)| {
        f.dy(curve.x(i), j, Some(params))
    })
}

fn admissible<F: Function + ?Sized>(f: &F, params: &[f64], errors: &[f64]) -> bool {
    params.iter().zip(errors).enumerate().all(|(i, (&value, &error))| {
        value.is_finite() && f.parameter_at(i).check_constraints(value, error)
    })
}

/// Square roots of the covariance diagonal, `inv(J^T J) * cost / (n - p)`.
fn standard_errors<F: Function + ?Sized>(f: &F, curve: &Curve, params: &[f64], cost: f64) -> Vec<f64> {
    let (n, p) = (curve.len(), params.len());
    if n <= p {
        return vec![f64::NAN; p];
    }

    let jacobian = compute_jacobian(f, curve, params);
    let j_t_j = jacobian.t().dot(&jacobian);
    let Some(covar) = LmStep::invert(&j_t_j) else {
        return vec![f64::NAN; p];
    };

    let red_chi = cost / (n - p) as f64;
    (0..p).map(|i| (covar[[i, i]] * red_chi).sqrt()).collect()
}
