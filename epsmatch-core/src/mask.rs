//! Masking module for epsmatch
//!
//! Provides high-frequency seed suppression on the query index and
//! low-complexity repeat detection on database sequences.

use crate::seed::SeedIndex;

/// Buckets never get disabled below this many occurrences.
pub const MIN_ABUNDANCE_THRESHOLD: usize = 100;

/// Outcome of one masking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskReport {
    /// Occurrence count a bucket had to exceed to be disabled.
    pub threshold: usize,
    /// Buckets disabled by this pass.
    pub disabled_buckets: usize,
}

/// Disables seeds that occur too often in the query set.
#[derive(Debug, Clone, Copy)]
pub struct AbundanceMasker {
    cut: f64,
}

impl AbundanceMasker {
    /// `cut` is the fraction of the total query length a bucket may hold; 1 disables masking.
    pub fn new(cut: f64) -> Self {
        Self { cut }
    }

    pub fn threshold(&self, total_query_length: usize) -> usize {
        let scaled = (total_query_length as f64 * self.cut).floor() as usize;
        scaled.max(MIN_ABUNDANCE_THRESHOLD)
    }

    /// Disable every enabled bucket holding more than `threshold` occurrences.
    ///
    /// Already disabled buckets are skipped, so applying the masker twice
    /// disables nothing the second time.
    pub fn apply(&self, index: &mut SeedIndex) -> MaskReport {
        let threshold = self.threshold(index.total_length());
        if self.cut >= 1.0 {
            return MaskReport { threshold, disabled_buckets: 0 };
        }

        let mut disabled_buckets = 0;
        for bucket in index.buckets_mut() {
            if bucket.is_enabled() && bucket.count() > threshold {
                bucket.disable();
                disabled_buckets += 1;
            }
        }

        MaskReport { threshold, disabled_buckets }
    }
}

/// A periodic low-complexity region `[begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub begin: usize,
    pub end: usize,
    pub period: usize,
}

impl Repeat {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Find maximal regions of at least `min_length` symbols that repeat with a
/// period between 1 and `max_period`, plus runs of `wildcard` of that length
/// whatever `max_period` is. Overlapping regions are merged.
pub fn find_repeats(sequence: &[u8], min_length: usize, max_period: usize, wildcard: Option<u8>) -> Vec<Repeat> {
    let min_length = min_length.max(1);
    let mut repeats = match wildcard {
        Some(symbol) => wildcard_runs(sequence, symbol, min_length),
        None => Vec::new(),
    };

    for period in 1..=max_period {
        if sequence.len() <= period {
            break;
        }
        let mut run_start: Option<usize> = None;
        for i in period..sequence.len() {
            if sequence[i] == sequence[i - period] {
                run_start.get_or_insert(i - period);
            } else if let Some(start) = run_start.take() {
                if i - start >= min_length {
                    repeats.push(Repeat { begin: start, end: i, period });
                }
            }
        }
        if let Some(start) = run_start {
            if sequence.len() - start >= min_length {
                repeats.push(Repeat { begin: start, end: sequence.len(), period });
            }
        }
    }

    merge_repeats(repeats)
}

fn wildcard_runs(sequence: &[u8], symbol: u8, min_length: usize) -> Vec<Repeat> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in sequence.iter().copied().chain(std::iter::once(!symbol)).enumerate() {
        match (c == symbol, start) {
            (true, None) => start = Some(i),
            (false, Some(begin)) => {
                if i - begin >= min_length {
                    runs.push(Repeat { begin, end: i, period: 1 });
                }
                start = None;
            }
            _ => {}
        }
    }
    runs
}

fn merge_repeats(mut repeats: Vec<Repeat>) -> Vec<Repeat> {
    repeats.sort_by_key(|r| (r.begin, r.end));
    let mut merged: Vec<Repeat> = Vec::with_capacity(repeats.len());
    for repeat in repeats {
        match merged.last_mut() {
            Some(last) if repeat.begin <= last.end => {
                last.end = last.end.max(repeat.end);
            }
            _ => merged.push(repeat),
        }
    }
    merged
}
