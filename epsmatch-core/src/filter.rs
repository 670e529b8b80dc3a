//! SWIFT-style parallelogram filter
//!
//! Seed hits between a database sequence and the query index are counted in
//! diagonal buckets of width `delta`, each overlapping its right neighbour by
//! `overlap` diagonals. A run of hits in one bucket ends when the next hit is
//! more than `distance_cut` positions away; runs with at least `threshold`
//! hits become candidate windows for verification.

use std::collections::HashMap;

use crate::mask::Repeat;
use crate::params::FilterParams;
use crate::seed::SeedIndex;
use crate::types::Position;

/// Stale runs are flushed every this many database positions.
const SWEEP_INTERVAL: usize = 1024;

/// A region of one query and one (oriented) database sequence worth verifying.
///
/// Diagonals are `database position - query position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub query: usize,
    /// First database position covered by a hit.
    pub db_begin: Position,
    /// One past the last database position covered by a hit.
    pub db_end: Position,
    pub diag_min: i64,
    pub diag_max: i64,
    pub hits: u32,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    first_db: usize,
    last_db: usize,
    diag_min: i64,
    diag_max: i64,
    hits: u32,
}

impl Run {
    fn start(db: usize, diag: i64) -> Self {
        Self {
            first_db: db,
            last_db: db,
            diag_min: diag,
            diag_max: diag,
            hits: 1,
        }
    }

    fn add(&mut self, db: usize, diag: i64) {
        self.last_db = db;
        self.diag_min = self.diag_min.min(diag);
        self.diag_max = self.diag_max.max(diag);
        self.hits += 1;
    }
}

/// Candidate finder over a masked seed index.
#[derive(Debug)]
pub struct SwiftFilter<'a> {
    index: &'a SeedIndex,
    params: FilterParams,
}

impl<'a> SwiftFilter<'a> {
    pub fn new(index: &'a SeedIndex, params: FilterParams) -> Self {
        Self { index, params }
    }

    /// Scan `database` and return merged candidate windows, ordered by query
    /// then database position.
    ///
    /// Seeds overlapping one of `repeats` (sorted, disjoint) are skipped, as
    /// are hits of queries flagged in `disabled`.
    pub fn find_candidates(&self, database: &[u8], repeats: &[Repeat], disabled: &[bool]) -> Vec<Candidate> {
        let q = self.index.seed_length();
        if database.len() < q {
            return Vec::new();
        }

        let delta = i64::from(self.params.delta);
        let overlap = i64::from(self.params.overlap);
        let distance_cut = self.params.distance_cut as usize;
        let threshold = self.params.threshold;

        let mut runs: HashMap<(usize, i64), Run> = HashMap::new();
        let mut candidates = Vec::new();
        let mut next_repeat = 0;

        for pos in 0..=(database.len() - q) {
            while next_repeat < repeats.len() && repeats[next_repeat].end <= pos {
                next_repeat += 1;
            }
            let in_repeat = repeats
                .get(next_repeat)
                .is_some_and(|r| r.begin < pos + q);

            if pos % SWEEP_INTERVAL == 0 && pos > 0 {
                runs.retain(|&(query, _), run| {
                    if pos - run.last_db > distance_cut {
                        close_run(query, run, q, threshold, &mut candidates);
                        false
                    } else {
                        true
                    }
                });
            }
            if in_repeat {
                continue;
            }

            let Some(hits) = self.index.hits(&database[pos..pos + q]) else {
                continue;
            };
            for occ in hits {
                if disabled.get(occ.query).copied().unwrap_or(false) {
                    continue;
                }
                let diag = pos as i64 - occ.position as i64;
                let bucket = diag.div_euclid(delta);
                let first = if diag - bucket * delta < overlap { bucket - 1 } else { bucket };
                for b in first..=bucket {
                    match runs.get_mut(&(occ.query, b)) {
                        Some(run) if pos - run.last_db <= distance_cut => run.add(pos, diag),
                        Some(run) => {
                            close_run(occ.query, run, q, threshold, &mut candidates);
                            *run = Run::start(pos, diag);
                        }
                        None => {
                            runs.insert((occ.query, b), Run::start(pos, diag));
                        }
                    }
                }
            }
        }

        for (&(query, _), run) in &runs {
            close_run(query, run, q, threshold, &mut candidates);
        }

        merge_candidates(candidates)
    }
}

fn close_run(query: usize, run: &Run, q: usize, threshold: u32, out: &mut Vec<Candidate>) {
    if run.hits >= threshold {
        out.push(Candidate {
            query,
            db_begin: run.first_db,
            db_end: run.last_db + q,
            diag_min: run.diag_min,
            diag_max: run.diag_max,
            hits: run.hits,
        });
    }
}

/// Fuse candidates of the same query whose database ranges and diagonal
/// ranges overlap or touch.
fn merge_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by_key(|c| (c.query, c.db_begin, c.diag_min, c.db_end, c.diag_max));
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if let Some(last) = merged.last_mut() {
            if last.query == c.query
                && c.db_begin <= last.db_end
                && c.diag_min <= last.diag_max + 1
                && c.diag_max + 1 >= last.diag_min
            {
                last.db_end = last.db_end.max(c.db_end);
                last.diag_min = last.diag_min.min(c.diag_min);
                last.diag_max = last.diag_max.max(c.diag_max);
                last.hits = last.hits.max(c.hits);
                continue;
            }
        }
        merged.push(c);
    }
    merged
}
