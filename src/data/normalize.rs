//! Rescales raw benchmark scores so that components of different categories can be
//! summed into one performance figure.

use crate::data::Component;
use log::warn;

/// Min-max scales `performance` into `normalized_performance` across the whole
/// catalog (not per category), leaving the raw score untouched.
///
/// When every raw score is identical the spread is zero and all normalized scores
/// are set to `0.0`. Returns the `(min, max)` raw range, or `None` for an empty slice.
pub fn min_max_normalize(components: &mut [Component]) -> Option<(f64, f64)> {
    let (min, max) = components.iter().fold(None, |range, c| match range {
        None => Some((c.performance, c.performance)),
        Some((lo, hi)) => Some((f64::min(lo, c.performance), f64::max(hi, c.performance))),
    })?;

    let spread = max - min;
    if spread <= 0.0 {
        warn!(
            "All {} components share the raw performance {}; normalized scores collapse to 0",
            components.len(),
            min
        );
    }

    for component in components.iter_mut() {
        component.normalized_performance = if spread > 0.0 {
            (component.performance - min) / spread
        } else {
            0.0
        };
    }

    Some((min, max))
}
