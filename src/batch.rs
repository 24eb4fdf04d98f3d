//! Fitting one setup against many curves.
//!
//! Curves are processed one after another, each in its own [`Dfgram`]. The
//! cancel flag is read between curves only; a fit in progress always runs to
//! its end.

use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::FitConfig;
use crate::curve::Curve;
use crate::dfgram::{Dfgram, PeakInfo};

/// Peak rows per processed curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    /// One row list per curve, in input order. Shorter than the input when
    /// the batch was cancelled.
    pub infos: Vec<Vec<PeakInfo>>,
    pub cancelled: bool,
}

impl BatchResult {
    pub fn processed(&self) -> usize {
        self.infos.len()
    }
}

/// Fit every peak of `config` to every curve.
///
/// `progress` is called with `(done, total)` after each curve. Setting
/// `cancel` stops the batch before the next curve.
pub fn fit_all<'a, I>(
    curves: I,
    config: &FitConfig,
    mut progress: impl FnMut(usize, usize),
    cancel: &AtomicBool,
) -> BatchResult
where
    I: IntoIterator<Item = &'a Curve>,
    I::IntoIter: ExactSizeIterator,
{
    let curves = curves.into_iter();
    let total = curves.len();
    let mut result = BatchResult::default();

    for (done, curve) in curves.enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!("Batch cancelled after {} of {} curves", done, total);
            result.cancelled = true;
            break;
        }

        let dfgram = Dfgram::new(curve.clone(), config.peaks.len());
        let infos = (0..config.peaks.len())
            .map(|i| dfgram.peak_info(config, i))
            .collect();
        result.infos.push(infos);

        debug!("Fitted curve {} of {}", done + 1, total);
        progress(done + 1, total);
    }

    result
}
