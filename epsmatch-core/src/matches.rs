//! Local match records and per-query match collections

use std::cmp::{max, min, Ordering};
use std::fmt::Write as _;

use crate::types::{Position, Strand};

/// One alignment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignOp {
    Match,
    Mismatch,
    /// Query symbol without database counterpart.
    Insertion,
    /// Database symbol without query counterpart.
    Deletion,
}

impl AlignOp {
    pub fn is_error(self) -> bool {
        self != AlignOp::Match
    }

    /// Advances the database position.
    pub fn consumes_database(self) -> bool {
        self != AlignOp::Insertion
    }

    /// Advances the query position.
    pub fn consumes_query(self) -> bool {
        self != AlignOp::Deletion
    }

    fn cigar_char(self) -> char {
        match self {
            AlignOp::Match => '=',
            AlignOp::Mismatch => 'X',
            AlignOp::Insertion => 'I',
            AlignOp::Deletion => 'D',
        }
    }
}

/// Run-length encode alignment columns.
pub fn run_length(ops: &[AlignOp]) -> Vec<(AlignOp, u32)> {
    let mut runs: Vec<(AlignOp, u32)> = Vec::new();
    for &op in ops {
        match runs.last_mut() {
            Some((last, n)) if *last == op => *n += 1,
            _ => runs.push((op, 1)),
        }
    }
    runs
}

/// An epsilon-match between one query and one database sequence.
///
/// Database coordinates always refer to the forward strand; `ops` are in
/// the orientation of the searched strand.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatch {
    pub database: usize,
    pub query: usize,
    pub strand: Strand,
    pub db_begin: Position,
    pub db_end: Position,
    pub query_begin: Position,
    pub query_end: Position,
    pub ops: Vec<(AlignOp, u32)>,
    pub errors: u32,
    pub score: i64,
}

impl LocalMatch {
    /// Alignment length in columns.
    pub fn columns(&self) -> u32 {
        self.ops.iter().map(|&(_, n)| n).sum()
    }

    /// Percent identity over all columns.
    pub fn identity(&self) -> f64 {
        let columns = self.columns();
        if columns == 0 {
            return 0.0;
        }
        100.0 * f64::from(columns - self.errors) / f64::from(columns)
    }

    /// Extended CIGAR string (`=`, `X`, `I`, `D`).
    pub fn cigar(&self) -> String {
        let mut out = String::new();
        for &(op, n) in &self.ops {
            let _ = write!(out, "{}{}", n, op.cigar_char());
        }
        out
    }

    /// Constant of the match along its (anti-)diagonal in forward coordinates.
    fn diagonal(&self) -> i64 {
        match self.strand {
            Strand::Forward => self.db_begin as i64 - self.query_begin as i64,
            Strand::Reverse => self.db_end as i64 + self.query_begin as i64,
        }
    }

    /// Same database, strand and diagonal band, overlapping on both sequences.
    pub fn overlaps(&self, other: &LocalMatch) -> bool {
        if self.database != other.database || self.strand != other.strand {
            return false;
        }
        let db_overlap = max(self.db_begin, other.db_begin) < min(self.db_end, other.db_end);
        let query_overlap =
            max(self.query_begin, other.query_begin) < min(self.query_end, other.query_end);
        let band = i64::from(max(self.errors, other.errors));
        db_overlap && query_overlap && (self.diagonal() - other.diagonal()).abs() <= band
    }

    /// Longer first, then fewer errors, then position.
    fn quality_order(&self, other: &LocalMatch) -> Ordering {
        other
            .columns()
            .cmp(&self.columns())
            .then(self.errors.cmp(&other.errors))
            .then(self.output_order(other))
    }

    fn output_order(&self, other: &LocalMatch) -> Ordering {
        (self.database, self.db_begin, self.db_end, self.query_begin, self.strand as u8)
            .cmp(&(other.database, other.db_begin, other.db_end, other.query_begin, other.strand as u8))
    }
}

/// Matches collected for one query.
#[derive(Debug, Clone, Default)]
pub struct QueryMatches {
    matches: Vec<LocalMatch>,
    disabled: bool,
}

impl QueryMatches {
    pub fn matches(&self) -> &[LocalMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn push(&mut self, m: LocalMatch) {
        self.matches.push(m);
    }

    /// Drop overlapping duplicates, keep the best `limit`, restore output order.
    pub fn compact(&mut self, limit: usize) {
        self.matches.sort_by(LocalMatch::quality_order);
        let mut kept: Vec<LocalMatch> = Vec::with_capacity(min(limit, self.matches.len()));
        for m in self.matches.drain(..) {
            if kept.len() == limit {
                break;
            }
            if !kept.iter().any(|k| k.overlaps(&m)) {
                kept.push(m);
            }
        }
        kept.sort_by(LocalMatch::output_order);
        self.matches = kept;
    }

    /// Disable the query and forget its matches.
    pub fn disable(&mut self) {
        self.disabled = true;
        self.matches.clear();
    }
}

/// One [`QueryMatches`] per query, indexed by query number.
#[derive(Debug, Clone)]
pub struct MatchCollection {
    queries: Vec<QueryMatches>,
}

impl MatchCollection {
    pub fn new(query_count: usize) -> Self {
        Self {
            queries: vec![QueryMatches::default(); query_count],
        }
    }

    pub fn query(&self, query: usize) -> &QueryMatches {
        &self.queries[query]
    }

    pub fn query_mut(&mut self, query: usize) -> &mut QueryMatches {
        &mut self.queries[query]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &QueryMatches)> {
        self.queries.iter().enumerate()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub fn total_matches(&self) -> usize {
        self.queries.iter().map(QueryMatches::len).sum()
    }

    pub fn disabled_queries(&self) -> Vec<usize> {
        self.iter().filter(|(_, q)| q.is_disabled()).map(|(i, _)| i).collect()
    }

    pub fn compact_all(&mut self, limit: usize) {
        for q in &mut self.queries {
            q.compact(limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fwd(db_begin: usize, query_begin: usize, len: u32, errors: u32) -> LocalMatch {
        let mut ops = vec![(AlignOp::Match, len - errors)];
        if errors > 0 {
            ops.push((AlignOp::Mismatch, errors));
        }
        LocalMatch {
            database: 0,
            query: 0,
            strand: Strand::Forward,
            db_begin,
            db_end: db_begin + len as usize,
            query_begin,
            query_end: query_begin + len as usize,
            ops,
            errors,
            score: i64::from(len) - 3 * i64::from(errors),
        }
    }

    #[test]
    fn test_run_length() {
        use AlignOp::*;
        let runs = run_length(&[Match, Match, Mismatch, Match, Deletion, Deletion]);
        assert_eq!(runs, vec![(Match, 2), (Mismatch, 1), (Match, 1), (Deletion, 2)]);
    }

    #[test]
    fn test_identity_and_cigar() {
        let m = fwd(0, 0, 100, 4);
        assert_eq!(m.columns(), 100);
        assert!((m.identity() - 96.0).abs() < 1e-9);
        assert_eq!(m.cigar(), "96=4X");
    }

    #[test]
    fn test_overlap_requires_same_diagonal_band() {
        let a = fwd(100, 0, 60, 2);
        let shifted = fwd(110, 10, 60, 2);
        let other_diag = fwd(130, 0, 60, 2);
        assert!(a.overlaps(&shifted));
        assert!(!a.overlaps(&other_diag));

        let mut rev = shifted.clone();
        rev.strand = Strand::Reverse;
        assert!(!a.overlaps(&rev));
    }

    #[test]
    fn test_compact_removes_duplicates_and_caps() {
        let mut q = QueryMatches::default();
        q.push(fwd(110, 10, 50, 1));
        q.push(fwd(100, 0, 80, 2));
        q.push(fwd(1000, 0, 60, 0));
        q.push(fwd(5000, 0, 55, 0));
        q.compact(2);

        let kept: Vec<_> = q.matches().iter().map(|m| m.db_begin).collect();
        assert_eq!(kept, vec![100, 1000]);
    }

    #[test]
    fn test_disable_clears_matches() {
        let mut collection = MatchCollection::new(2);
        collection.query_mut(1).push(fwd(0, 0, 50, 0));
        collection.query_mut(1).disable();
        assert!(collection.query(1).is_empty());
        assert_eq!(collection.disabled_queries(), vec![1]);
        assert_eq!(collection.total_matches(), 0);
    }
}
