//! Closed-form peak shapes.
//!
//! Each shape is a row of plain functions over its parameter slice. All
//! shapes share the first two slots, amplitude and position; the rest are
//! width and mixing parameters.

use std::f64::consts::LN_2;

use crate::parameters::Parameter;

pub(crate) const AMPL: usize = 0;
pub(crate) const XSHIFT: usize = 1;

/// Gaussian sigma per unit FWHM, 1 / (2 sqrt(2 ln 2)).
pub(crate) const SIGMA_PER_FWHM: f64 = 0.424661;

pub(crate) struct Shape {
    /// Parameter names, in vector order.
    pub names: &'static [&'static str],
    pub y: fn(&[f64], f64) -> f64,
    pub dy: fn(&[f64], f64, usize) -> f64,
    /// Write the width parameters for a FWHM guess.
    pub seed_fwhm: fn(&mut dyn FnMut(usize, f64), f64),
    pub fwhm: fn(&[f64]) -> f64,
    pub fwhm_error: fn(&[Parameter]) -> f64,
    /// Allowed range of each parameter.
    pub bounds: &'static [(f64, f64)],
}

impl Shape {
    pub fn parameter_count(&self) -> usize {
        self.names.len()
    }
}

const FREE: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
const POSITIVE: (f64, f64) = (0.0, f64::INFINITY);
const FRACTION: (f64, f64) = (0.0, 1.0);

pub(crate) static GAUSSIAN: Shape = Shape {
    names: &["amplitude", "xShift", "sigma"],
    y: gaussian_y,
    dy: gaussian_dy,
    seed_fwhm: |set, fwhm| set(2, fwhm * SIGMA_PER_FWHM),
    fwhm: |p| p[2] / SIGMA_PER_FWHM,
    fwhm_error: |p| p[2].error(),
    bounds: &[POSITIVE, FREE, POSITIVE],
};

pub(crate) static LORENTZIAN: Shape = Shape {
    names: &["amplitude", "xShift", "gamma"],
    y: lorentzian_y,
    dy: lorentzian_dy,
    seed_fwhm: |set, fwhm| set(2, fwhm / 2.0),
    fwhm: |p| p[2] * 2.0,
    fwhm_error: |p| p[2].error(),
    bounds: &[POSITIVE, FREE, POSITIVE],
};

pub(crate) static PSEUDO_VOIGT1: Shape = Shape {
    names: &["amplitude", "xShift", "halfWidth", "eta"],
    y: pseudo_voigt1_y,
    dy: pseudo_voigt1_dy,
    seed_fwhm: |set, fwhm| set(2, fwhm / 2.0),
    fwhm: |p| p[2] * 2.0,
    fwhm_error: |p| p[2].error(),
    bounds: &[POSITIVE, FREE, POSITIVE, FRACTION],
};

pub(crate) static PSEUDO_VOIGT2: Shape = Shape {
    names: &["amplitude", "xShift", "sigmaGauss", "gammaCauchy", "eta"],
    y: pseudo_voigt2_y,
    dy: pseudo_voigt2_dy,
    seed_fwhm: |set, fwhm| {
        set(2, fwhm * SIGMA_PER_FWHM);
        set(3, fwhm / 2.0);
    },
    // no trailing halving, so a seeded FWHM reads back unchanged
    fwhm: |p| {
        let eta = p[4];
        (1.0 - eta) * p[2] / SIGMA_PER_FWHM + eta * p[3] * 2.0
    },
    fwhm_error: |p| p[2].error() + p[3].error(),
    bounds: &[POSITIVE, FREE, POSITIVE, POSITIVE, FRACTION],
};

fn gaussian_y(p: &[f64], x: f64) -> f64 {
    let (ampl, x0, sigma) = (p[0], p[1], p[2]);
    let arg = (x - x0) / sigma;
    ampl * (-0.5 * arg * arg).exp()
}

fn gaussian_dy(p: &[f64], x: f64, i: usize) -> f64 {
    let (ampl, x0, sigma) = (p[0], p[1], p[2]);
    let dx = x - x0;
    let arg = dx / sigma;
    let exa = (-0.5 * arg * arg).exp();
    match i {
        0 => exa,
        1 => ampl * exa * dx / (sigma * sigma),
        2 => ampl * exa * dx * dx / (sigma * sigma * sigma),
        _ => unreachable!("Gaussian has no parameter {}", i),
    }
}

fn lorentzian_y(p: &[f64], x: f64) -> f64 {
    let (ampl, x0, gamma) = (p[0], p[1], p[2]);
    let arg = (x - x0) / gamma;
    ampl / (1.0 + arg * arg)
}

fn lorentzian_dy(p: &[f64], x: f64, i: usize) -> f64 {
    let (ampl, x0, gamma) = (p[0], p[1], p[2]);
    let dx = x - x0;
    let arg = dx / gamma;
    let den = 1.0 + arg * arg;
    match i {
        0 => 1.0 / den,
        1 => 2.0 * ampl * dx / (den * den * gamma * gamma),
        2 => 2.0 * ampl * dx * dx / (den * den * gamma * gamma * gamma),
        _ => unreachable!("Lorentzian has no parameter {}", i),
    }
}

// Gaussian and Lorentzian parts sharing one half-width w
fn pseudo_voigt1_y(p: &[f64], x: f64) -> f64 {
    let (ampl, x0, w, eta) = (p[0], p[1], p[2], p[3]);
    let arg = (x - x0) / w;
    let arg2 = arg * arg;
    let gauss = (-LN_2 * arg2).exp();
    let lorentz = 1.0 / (1.0 + arg2);
    ampl * ((1.0 - eta) * gauss + eta * lorentz)
}

fn pseudo_voigt1_dy(p: &[f64], x: f64, i: usize) -> f64 {
    let (ampl, x0, w, eta) = (p[0], p[1], p[2], p[3]);
    let dx = x - x0;
    let arg = dx / w;
    let arg2 = arg * arg;
    let gauss = (-LN_2 * arg2).exp();
    let den = 1.0 + arg2;
    match i {
        0 => (1.0 - eta) * gauss + eta / den,
        1 => {
            let dgauss = 2.0 * LN_2 * dx / (w * w) * gauss;
            let dlorentz = 2.0 * dx / (den * den * w * w);
            ampl * ((1.0 - eta) * dgauss + eta * dlorentz)
        }
        2 => {
            let dgauss = 2.0 * LN_2 * dx * dx / (w * w * w) * gauss;
            let dlorentz = 2.0 * dx * dx / (den * den * w * w * w);
            ampl * ((1.0 - eta) * dgauss + eta * dlorentz)
        }
        3 => ampl / den - ampl * gauss,
        _ => unreachable!("PseudoVoigt1 has no parameter {}", i),
    }
}

// Gaussian with sigma and Lorentzian with gamma, mixed as in PseudoVoigt1
fn pseudo_voigt2_y(p: &[f64], x: f64) -> f64 {
    let (ampl, x0, sigma, gamma, eta) = (p[0], p[1], p[2], p[3], p[4]);
    let dx = x - x0;
    let gauss = (-LN_2 * (dx / sigma).powi(2)).exp();
    let lorentz = 1.0 / (1.0 + (dx / gamma).powi(2));
    ampl * ((1.0 - eta) * gauss + eta * lorentz)
}

fn pseudo_voigt2_dy(p: &[f64], x: f64, i: usize) -> f64 {
    let (ampl, x0, sigma, gamma, eta) = (p[0], p[1], p[2], p[3], p[4]);
    let dx = x - x0;
    let gauss = (-LN_2 * (dx / sigma).powi(2)).exp();
    let den = 1.0 + (dx / gamma).powi(2);
    match i {
        0 => (1.0 - eta) * gauss + eta / den,
        1 => {
            let dgauss = 2.0 * LN_2 * dx / (sigma * sigma) * gauss;
            let dlorentz = 2.0 * dx / (den * den * gamma * gamma);
            ampl * ((1.0 - eta) * dgauss + eta * dlorentz)
        }
        2 => ampl * (1.0 - eta) * 2.0 * LN_2 * dx * dx / (sigma * sigma * sigma) * gauss,
        3 => ampl * eta * 2.0 * dx * dx / (den * den * gamma * gamma * gamma),
        4 => ampl / den - ampl * gauss,
        _ => unreachable!("PseudoVoigt2 has no parameter {}", i),
    }
}
