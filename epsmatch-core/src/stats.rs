//! Analytic significance of epsilon-matches
//!
//! Karlin-Altschul style bound for nucleotide sequences scored with
//! match = +1 and error = -2.

use crate::types::Alphabet;

/// Karlin-Altschul parameters of the +1/-2 nucleotide scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinParams {
    pub lambda: f64,
    pub k: f64,
}

/// Ungapped +1/-2 values from the NCBI blastn tables.
pub const NUCLEOTIDE_PARAMS: KarlinParams = KarlinParams { lambda: 1.28, k: 0.46 };

pub const MATCH_SCORE: i64 = 1;
pub const ERROR_PENALTY: i64 = -2;

/// Expected number of chance matches scoring at least `score`
/// between sequences of length `m` and `n`: `E = K m n exp(-lambda S)`.
pub fn evalue(score: i64, m: usize, n: usize, params: &KarlinParams) -> f64 {
    params.k * (m as f64) * (n as f64) * (-params.lambda * score as f64).exp()
}

/// Lowest score of an epsilon-match of exactly `min_length` columns.
pub fn min_score(min_length: u32, epsilon: f64) -> i64 {
    let errors = (f64::from(min_length) * epsilon).floor() as i64;
    i64::from(min_length) - 3 * errors
}

/// Run-level significance summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    pub min_score: i64,
    pub evalue: f64,
}

/// E-value bound of the weakest reportable match, for nucleotide alphabets.
pub fn estimate(
    alphabet: Alphabet,
    min_length: u32,
    epsilon: f64,
    max_query_length: usize,
    max_database_length: usize,
) -> Option<Significance> {
    if !alphabet.is_nucleotide() {
        return None;
    }
    let min_score = min_score(min_length, epsilon);
    Some(Significance {
        min_score,
        evalue: evalue(min_score, max_query_length, max_database_length, &NUCLEOTIDE_PARAMS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_score() {
        // 50 * 0.05 = 2.5 -> 2 errors
        assert_eq!(min_score(50, 0.05), 44);
        assert_eq!(min_score(100, 0.0), 100);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = estimate(Alphabet::Dna5, 50, 0.05, 1000, 1000).unwrap();
        let b = estimate(Alphabet::Dna5, 50, 0.05, 1000, 1000).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.min_score, 44);
        let expected = 0.46 * 1e6 * (-1.28f64 * 44.0).exp();
        assert!((a.evalue - expected).abs() <= expected * 1e-12);
    }

    #[test]
    fn test_evalue_strictly_decreases_with_score() {
        let mut previous = f64::INFINITY;
        for score in 0..60 {
            let e = evalue(score, 1000, 1000, &NUCLEOTIDE_PARAMS);
            assert!(e < previous, "score {} gave {} >= {}", score, e, previous);
            previous = e;
        }
    }

    #[test]
    fn test_non_nucleotide_alphabets_skipped() {
        assert!(estimate(Alphabet::Protein, 50, 0.05, 1000, 1000).is_none());
        assert!(estimate(Alphabet::Char, 50, 0.05, 1000, 1000).is_none());
        assert!(estimate(Alphabet::Rna, 50, 0.05, 1000, 1000).is_some());
    }
}
