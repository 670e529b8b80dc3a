//! Candidate verification
//!
//! Each candidate window from the filter is aligned with a banded dynamic
//! program (match +1, mismatch and gap -2) and cut into epsilon-matches:
//! alignments of at least `min_length` columns whose error count is at most
//! `epsilon` times their length, starting and ending with a match.
//!
//! Coordinates here are relative to the oriented database sequence; the
//! search layer maps reverse-strand results back to forward coordinates.

use crate::config::{SearchConfig, VerificationMethod};
use crate::filter::Candidate;
use crate::matches::AlignOp;
use crate::stats::{ERROR_PENALTY, MATCH_SCORE};

const MATCH: i32 = MATCH_SCORE as i32;
const ERROR: i32 = ERROR_PENALTY as i32;
const NEG: i32 = i32::MIN / 4;

/// Slack when comparing error counts against `epsilon * length`.
const EPS_TOLERANCE: f64 = 1e-9;

/// Parameters shared by all verification strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifyParams {
    pub epsilon: f64,
    pub min_length: usize,
    /// Score drop that stops an extension
    pub x_drop: f64,
    /// Symbol that never counts as a match
    pub wildcard: Option<u8>,
}

impl VerifyParams {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            min_length: config.min_length as usize,
            x_drop: config.x_drop,
            wildcard: config.alphabet.wildcard(),
        }
    }
}

/// A gapped alignment between the oriented database and a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub db_begin: usize,
    pub query_begin: usize,
    pub ops: Vec<AlignOp>,
}

impl Alignment {
    pub fn columns(&self) -> usize {
        self.ops.len()
    }

    pub fn db_end(&self) -> usize {
        self.db_begin + self.ops.iter().filter(|op| op.consumes_database()).count()
    }

    pub fn query_end(&self) -> usize {
        self.query_begin + self.ops.iter().filter(|op| op.consumes_query()).count()
    }

    pub fn errors(&self) -> u32 {
        self.ops.iter().filter(|op| op.is_error()).count() as u32
    }

    /// True if the whole alignment is an epsilon-match of at least `min_length` columns.
    pub fn is_epsilon_match(&self, epsilon: f64, min_length: usize) -> bool {
        self.columns() >= min_length
            && self.ops.first() == Some(&AlignOp::Match)
            && self.ops.last() == Some(&AlignOp::Match)
            && f64::from(self.errors()) <= epsilon * self.columns() as f64 + EPS_TOLERANCE
    }

    /// Columns `begin..end` as a standalone alignment.
    fn slice(&self, begin: usize, end: usize) -> Alignment {
        let prefix = &self.ops[..begin];
        Alignment {
            db_begin: self.db_begin + prefix.iter().filter(|op| op.consumes_database()).count(),
            query_begin: self.query_begin + prefix.iter().filter(|op| op.consumes_query()).count(),
            ops: self.ops[begin..end].to_vec(),
        }
    }

    fn shifted(mut self, db_offset: usize, query_offset: usize) -> Alignment {
        self.db_begin += db_offset;
        self.query_begin += query_offset;
        self
    }

    /// Drop leading and trailing error columns.
    fn trim_to_matches(&mut self) {
        let Some(first) = self.ops.iter().position(|&op| op == AlignOp::Match) else {
            self.ops.clear();
            return;
        };
        let last = self.ops.iter().rposition(|&op| op == AlignOp::Match).unwrap_or(first);
        *self = self.slice(first, last + 1);
    }
}

/// A verification strategy.
pub trait Verifier: Send + Sync {
    fn method(&self) -> VerificationMethod;

    /// Epsilon-matches found in the window of `candidate`.
    fn verify(
        &self,
        candidate: &Candidate,
        query: &[u8],
        database: &[u8],
        params: &VerifyParams,
    ) -> Vec<Alignment>;
}

pub fn create_verifier(method: VerificationMethod) -> Box<dyn Verifier> {
    match method {
        VerificationMethod::Exact => Box::new(ExactVerifier),
        VerificationMethod::BestLocal => Box::new(BestLocalVerifier),
        VerificationMethod::BandedGlobal => Box::new(BandedGlobalVerifier),
        VerificationMethod::BandedGlobalExtend => Box::new(BandedGlobalExtendVerifier),
    }
}

/// Local alignment of the padded window, every epsilon-match inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactVerifier;

impl Verifier for ExactVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Exact
    }

    fn verify(&self, candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Vec<Alignment> {
        let Some(alignment) = local_alignment(candidate, query, database, params) else {
            return Vec::new();
        };
        epsilon_segments(&alignment.ops, params.epsilon, params.min_length)
            .into_iter()
            .map(|(begin, end)| alignment.slice(begin, end))
            .collect()
    }
}

/// Local alignment of the padded window, its longest epsilon-match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestLocalVerifier;

impl Verifier for BestLocalVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::BestLocal
    }

    fn verify(&self, candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Vec<Alignment> {
        local_alignment(candidate, query, database, params)
            .and_then(|alignment| longest_match(&alignment, params))
            .into_iter()
            .collect()
    }
}

/// Global alignment of the hit parallelogram, its longest epsilon-match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandedGlobalVerifier;

impl Verifier for BandedGlobalVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::BandedGlobal
    }

    fn verify(&self, candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Vec<Alignment> {
        global_alignment(candidate, query, database, params)
            .and_then(|alignment| longest_match(&alignment, params))
            .into_iter()
            .collect()
    }
}

/// Global alignment of the hit parallelogram, X-drop extension on both
/// ends, then the longest epsilon-match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandedGlobalExtendVerifier;

impl Verifier for BandedGlobalExtendVerifier {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::BandedGlobalExtend
    }

    fn verify(&self, candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Vec<Alignment> {
        let Some(mut alignment) = global_alignment(candidate, query, database, params) else {
            return Vec::new();
        };
        alignment.trim_to_matches();
        if alignment.ops.is_empty() {
            return Vec::new();
        }
        extend(&mut alignment, query, database, params);
        longest_match(&alignment, params).into_iter().collect()
    }
}

fn longest_match(alignment: &Alignment, params: &VerifyParams) -> Option<Alignment> {
    longest_epsilon_segment(&alignment.ops, params.epsilon, params.min_length)
        .map(|(begin, end)| alignment.slice(begin, end))
}

/// Diagonals an epsilon-match of `min_length` columns can drift by.
///
/// Hits of a long match land on every diagonal it passes through, so the
/// candidate already spans the drift between hits and the band only has to
/// cover what happens within `min_length` of them.
fn drift(params: &VerifyParams) -> i64 {
    (params.epsilon * params.min_length as f64).ceil() as i64 + 1
}

/// Local alignment of the candidate window padded by `min_length`.
fn local_alignment(candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Option<Alignment> {
    Window::around(candidate, params.min_length, drift(params), query.len(), database.len(), Mode::Local)?
        .align(query, database, Mode::Local, params.wildcard)
}

fn global_alignment(candidate: &Candidate, query: &[u8], database: &[u8], params: &VerifyParams) -> Option<Alignment> {
    Window::around(candidate, 0, drift(params), query.len(), database.len(), Mode::Global)?
        .align(query, database, Mode::Global, params.wildcard)
}

/// Sub-rectangle of the dot plot plus a diagonal band local to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    db_begin: usize,
    db_end: usize,
    query_begin: usize,
    query_end: usize,
    diag_min: i64,
    diag_max: i64,
}

impl Window {
    /// Candidate region widened by `pad` on the database and by `slack`
    /// diagonals. Global windows keep the query range of the undrifted
    /// parallelogram so both corners sit on it.
    fn around(
        candidate: &Candidate,
        pad: usize,
        slack: i64,
        query_len: usize,
        db_len: usize,
        mode: Mode,
    ) -> Option<Self> {
        let db_begin = candidate.db_begin.saturating_sub(pad);
        let db_end = db_len.min(candidate.db_end.saturating_add(pad));
        if db_begin >= db_end {
            return None;
        }
        let diag_min = candidate.diag_min - slack;
        let diag_max = candidate.diag_max + slack;

        let (upper, lower) = match mode {
            Mode::Local => (diag_max, diag_min),
            Mode::Global | Mode::Extend(_) => (candidate.diag_max, candidate.diag_min),
        };
        let query_begin = (db_begin as i64 - upper).clamp(0, query_len as i64) as usize;
        let query_end = (db_end as i64 - lower).clamp(0, query_len as i64) as usize;
        if query_begin >= query_end {
            return None;
        }

        let shift = query_begin as i64 - db_begin as i64;
        Some(Self {
            db_begin,
            db_end,
            query_begin,
            query_end,
            diag_min: diag_min + shift,
            diag_max: diag_max + shift,
        })
    }

    fn align(&self, query: &[u8], database: &[u8], mode: Mode, wildcard: Option<u8>) -> Option<Alignment> {
        let db = &database[self.db_begin..self.db_end];
        let q = &query[self.query_begin..self.query_end];
        let band = match mode {
            Mode::Local => (self.diag_min, self.diag_max),
            Mode::Global | Mode::Extend(_) => {
                let corner = db.len() as i64 - q.len() as i64;
                (self.diag_min.min(0).min(corner), self.diag_max.max(0).max(corner))
            }
        };
        banded_align(db, q, band, mode, wildcard).map(|a| a.shifted(self.db_begin, self.query_begin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Local,
    Global,
    /// Anchored at the origin, ending at the best cell; cells more than the
    /// given drop below the best score so far are pruned.
    Extend(f64),
}

fn same(a: u8, b: u8, wildcard: Option<u8>) -> bool {
    a == b && Some(a) != wildcard
}

/// Banded alignment of `db` against `query` restricted to diagonals
/// `band.0..=band.1` (`db index - query index`).
///
/// Cells are stored per database row, one column per diagonal, so memory is
/// linear in `db.len()` for a fixed band.
fn banded_align(db: &[u8], query: &[u8], band: (i64, i64), mode: Mode, wildcard: Option<u8>) -> Option<Alignment> {
    let n = db.len();
    let m = query.len();
    let diag_min = band.0.max(-(m as i64));
    let diag_max = band.1.min(n as i64);
    if diag_min > diag_max {
        return None;
    }
    let width = (diag_max - diag_min + 1) as usize;
    let column = |i: usize, k: usize| i as i64 - diag_min - k as i64;
    let x_drop = match mode {
        Mode::Extend(x_drop) => {
            if diag_min > 0 || diag_max < 0 {
                return None;
            }
            Some(x_drop)
        }
        _ => None,
    };

    let mut score: Vec<i32> = Vec::new();
    let mut trace: Vec<Option<AlignOp>> = Vec::new();
    let mut best = match mode {
        Mode::Extend(_) => (0, 0, (-diag_min) as usize),
        _ => (0, 0, 0),
    };

    for i in 0..=n {
        score.resize((i + 1) * width, NEG);
        trace.resize((i + 1) * width, None);
        let mut alive = false;

        // Descending k is ascending query position within the row.
        for k in (0..width).rev() {
            let j = column(i, k);
            if j < 0 || j > m as i64 {
                continue;
            }
            let j = j as usize;
            let at = i * width + k;
            if i == 0 && j == 0 {
                score[at] = 0;
                alive = true;
                continue;
            }

            let mut s = if mode == Mode::Local { 0 } else { NEG };
            let mut op = None;
            if i > 0 && j > 0 && score[at - width] > NEG {
                let (gain, kind) = if same(db[i - 1], query[j - 1], wildcard) {
                    (MATCH, AlignOp::Match)
                } else {
                    (ERROR, AlignOp::Mismatch)
                };
                if score[at - width] + gain > s {
                    s = score[at - width] + gain;
                    op = Some(kind);
                }
            }
            if i > 0 && k > 0 && score[at - width - 1] > NEG && score[at - width - 1] + ERROR > s {
                s = score[at - width - 1] + ERROR;
                op = Some(AlignOp::Deletion);
            }
            if j > 0 && k + 1 < width && score[at + 1] > NEG && score[at + 1] + ERROR > s {
                s = score[at + 1] + ERROR;
                op = Some(AlignOp::Insertion);
            }

            if let Some(x_drop) = x_drop {
                if s > NEG && f64::from(best.0 - s) > x_drop {
                    s = NEG;
                    op = None;
                }
            }

            score[at] = s;
            trace[at] = op;
            alive |= s > NEG;
            if mode != Mode::Global && s > best.0 {
                best = (s, i, k);
            }
        }

        if x_drop.is_some() && !alive {
            break;
        }
    }

    let (mut i, mut k) = match mode {
        Mode::Extend(_) => (best.1, best.2),
        Mode::Local => {
            if best.0 <= 0 {
                return None;
            }
            (best.1, best.2)
        }
        Mode::Global => {
            let corner = n as i64 - m as i64;
            if corner < diag_min || corner > diag_max {
                return None;
            }
            let k = (corner - diag_min) as usize;
            if score[n * width + k] == NEG {
                return None;
            }
            (n, k)
        }
    };

    let mut ops = Vec::new();
    while let Some(op) = trace[i * width + k] {
        ops.push(op);
        match op {
            AlignOp::Match | AlignOp::Mismatch => i -= 1,
            AlignOp::Deletion => {
                i -= 1;
                k -= 1;
            }
            AlignOp::Insertion => k += 1,
        }
    }
    ops.reverse();

    Some(Alignment {
        db_begin: i,
        query_begin: column(i, k) as usize,
        ops,
    })
}

/// Gapped X-drop extension of both alignment ends.
fn extend(alignment: &mut Alignment, query: &[u8], database: &[u8], params: &VerifyParams) {
    let band = drift(params);
    // A banded path consumes at most `band` more database than query symbols.
    let reach = |query_left: usize| query_left.saturating_add(band as usize);

    let (db_end, query_end) = (alignment.db_end(), alignment.query_end());
    let query_right = &query[query_end..];
    let db_right = &database[db_end..database.len().min(db_end.saturating_add(reach(query_right.len())))];
    let right = xdrop_extend(db_right, query_right, band, params);

    let query_left: Vec<u8> = query[..alignment.query_begin].iter().rev().copied().collect();
    let db_from = alignment.db_begin.saturating_sub(reach(query_left.len()));
    let db_left: Vec<u8> = database[db_from..alignment.db_begin].iter().rev().copied().collect();
    let left = xdrop_extend(&db_left, &query_left, band, params);

    alignment.db_begin -= left.iter().filter(|op| op.consumes_database()).count();
    alignment.query_begin -= left.iter().filter(|op| op.consumes_query()).count();
    let mut ops: Vec<AlignOp> = left.into_iter().rev().collect();
    ops.append(&mut alignment.ops);
    ops.extend(right);
    alignment.ops = ops;
}

/// Columns of the best-scoring banded extension from the start of both
/// sequences, giving up once every cell of a row is `x_drop` below the best.
fn xdrop_extend(db: &[u8], query: &[u8], band: i64, params: &VerifyParams) -> Vec<AlignOp> {
    if db.is_empty() || query.is_empty() {
        return Vec::new();
    }
    banded_align(db, query, (-band, band), Mode::Extend(params.x_drop), params.wildcard)
        .map(|alignment| alignment.ops)
        .unwrap_or_default()
}

/// Longest column range `begin..end` that is an epsilon-match of at least
/// `min_length` columns. Ties go to the leftmost range.
///
/// With `P(x) = errors(0..x) - epsilon * x`, a range qualifies when
/// `P(end) <= P(begin)`; the widest such pair is found in linear time from
/// the prefix maxima of starts and suffix minima of ends.
pub fn longest_epsilon_segment(ops: &[AlignOp], epsilon: f64, min_length: usize) -> Option<(usize, usize)> {
    let n = ops.len();
    if n == 0 || n < min_length {
        return None;
    }

    let mut errors = Vec::with_capacity(n + 1);
    errors.push(0u32);
    for op in ops {
        let last = errors[errors.len() - 1];
        errors.push(last + u32::from(op.is_error()));
    }
    let p = |x: usize| f64::from(errors[x]) - epsilon * x as f64;

    let mut starts = Vec::new();
    let mut ceiling = f64::NEG_INFINITY;
    for a in (0..n).filter(|&a| ops[a] == AlignOp::Match) {
        if p(a) > ceiling {
            ceiling = p(a);
            starts.push(a);
        }
    }

    let mut ends = Vec::new();
    let mut floor = f64::INFINITY;
    for b in (1..=n).rev().filter(|&b| ops[b - 1] == AlignOp::Match) {
        if p(b) < floor {
            floor = p(b);
            ends.push(b);
        }
    }
    ends.reverse();

    let mut best: Option<(usize, usize)> = None;
    let mut reachable = 0;
    for &a in &starts {
        while reachable < ends.len() && p(ends[reachable]) <= p(a) + EPS_TOLERANCE {
            reachable += 1;
        }
        if reachable == 0 {
            continue;
        }
        let b = ends[reachable - 1];
        if b > a && b - a >= min_length && best.map_or(true, |(x, y)| b - a > y - x) {
            best = Some((a, b));
        }
    }
    best
}

/// Disjoint epsilon-matches: the longest one, then recursively the longest
/// in what remains on either side. Sorted by position.
pub fn epsilon_segments(ops: &[AlignOp], epsilon: f64, min_length: usize) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut pending = vec![(0, ops.len())];
    while let Some((lo, hi)) = pending.pop() {
        if hi - lo < min_length.max(1) {
            continue;
        }
        if let Some((a, b)) = longest_epsilon_segment(&ops[lo..hi], epsilon, min_length) {
            found.push((lo + a, lo + b));
            pending.push((lo, lo + a));
            pending.push((lo + b, hi));
        }
    }
    found.sort_unstable();
    found
}
