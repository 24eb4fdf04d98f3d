//! Convergence criteria for the fitter.
//!
//! This module defines the criteria used to determine when a fit has
//! converged, and the terminal states a fit can end in.

use std::fmt;

/// Possible end states of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The fit was skipped: no samples, no parameters, or a `Raw` peak.
    NotRun,

    /// Converged due to a small parameter change.
    ParameterConvergence,

    /// Converged due to a small relative cost change.
    FunctionValueConvergence,

    /// Converged due to a small gradient.
    GradientConvergence,

    /// Terminated after the maximum number of accepted steps.
    MaxIterationsReached,

    /// Terminated because damping reached its maximum without an acceptable step.
    Stalled,

    /// Terminated because the cost at the starting point is not finite.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the fit has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::NotRun => "Not run: nothing to fit",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small function value change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::Stalled => "Terminated: no acceptable step at maximum damping",
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Criteria for determining when a fit has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for change in parameter values.
    pub xtol: f64,

    /// Tolerance for change in function value.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Checks the gradient at the current point, before a step is tried.
    pub fn check_gradient(&self, gradient_norm: f64) -> Option<ConvergenceStatus> {
        (gradient_norm < self.gtol).then_some(ConvergenceStatus::GradientConvergence)
    }

    /// Checks an accepted step from `params` to `new_params`.
    ///
    /// `iterations` counts accepted steps including this one.
    pub fn check_step(
        &self,
        params: &[f64],
        new_params: &[f64],
        cost: f64,
        new_cost: f64,
        iterations: usize,
    ) -> Option<ConvergenceStatus> {
        let param_change = new_params
            .iter()
            .zip(params.iter())
            .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
            .fold(0.0, f64::max);
        if param_change < self.xtol {
            return Some(ConvergenceStatus::ParameterConvergence);
        }

        let cost_change = (cost - new_cost).abs() / cost.max(1e-10);
        if cost_change < self.ftol {
            return Some(ConvergenceStatus::FunctionValueConvergence);
        }

        if iterations >= self.max_iterations {
            return Some(ConvergenceStatus::MaxIterationsReached);
        }

        None
    }
}
