//! Filter parameter derivation
//!
//! Turns an error rate and a minimum match length into the SWIFT filter
//! parameters. Any epsilon-match of length at least `min_length` contains at
//! least `threshold` exact seeds of length `seed_length` inside one
//! parallelogram of width `delta + overlap`, so the filter never loses it.

use std::fmt;

use crate::seed::MAX_SEED_LENGTH;

/// Derived filter parameters, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    pub seed_length: u32,
    pub threshold: u32,
    pub distance_cut: u32,
    pub delta: u32,
    pub log_delta: u32,
    pub overlap: u32,
}

impl FilterParams {
    /// Derive the parameter set for `(epsilon, min_length)`.
    ///
    /// `seed_length` overrides the derived seed length when given. Callers
    /// must ensure the (derived or given) seed length stays below
    /// `1 / epsilon`; [`FilterParams::seed_fits`] checks that.
    pub fn derive(epsilon: f64, min_length: u32, seed_length: Option<u32>) -> Self {
        let min_length = i64::from(min_length);

        let err_min_len = (epsilon * min_length as f64).floor() as i64;
        let n = ((err_min_len + 1) as f64 / epsilon).ceil() as i64;
        let err_n = (epsilon * n as f64).floor() as i64;

        let s_min = std::cmp::min(
            ceil_div(min_length - err_min_len, err_min_len + 1),
            ceil_div(n - err_n, err_n + 1),
        );
        let q = match seed_length {
            Some(q) => i64::from(q),
            None => s_min.min(MAX_SEED_LENGTH as i64),
        };

        let threshold = std::cmp::max(
            1,
            std::cmp::min((n + 1) - q * (err_n + 1), (min_length + 1) - q * (err_min_len + 1)),
        );

        // Only meaningful while q < 1/epsilon; outside that range the value is
        // clamped so the struct stays well formed and `seed_fits` reports it.
        let overlap = ((2 * threshold + q - 3) as f64 / (1.0 / epsilon - q as f64)).floor() as i64;
        let overlap = overlap.clamp(0, i64::from(u16::MAX));
        let distance_cut = (threshold - 1) + q * overlap + q;

        let log_delta = ((overlap + 1) as f64).log2().ceil() as u32;
        let log_delta = log_delta.clamp(4, 31);

        Self {
            seed_length: q as u32,
            threshold: threshold as u32,
            distance_cut: distance_cut as u32,
            delta: 1 << log_delta,
            log_delta,
            overlap: overlap as u32,
        }
    }

    /// True if `seed_length < 1 / epsilon`, the precondition of the overlap formula.
    pub fn seed_fits(seed_length: u32, epsilon: f64) -> bool {
        1.0 / epsilon - f64::from(seed_length) > 0.0
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  seed length     : {}", self.seed_length)?;
        writeln!(f, "  threshold       : {}", self.threshold)?;
        writeln!(f, "  distance cut    : {}", self.distance_cut)?;
        writeln!(f, "  delta           : {}", self.delta)?;
        write!(f, "  overlap         : {}", self.overlap)
    }
}

/// Integer ceil(a / b) for b > 0.
fn ceil_div(a: i64, b: i64) -> i64 {
    (a as f64 / b as f64).ceil() as i64
}
