//! Search orchestration over databases and strands
//!
//! Databases are never modified: the reverse strand is searched on a
//! reverse-complemented copy and hits are mapped back to forward
//! coordinates before they are stored.

use std::borrow::Cow;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::ValidatedConfig;
use crate::filter::{Candidate, SwiftFilter};
use crate::mask::find_repeats;
use crate::matches::{run_length, LocalMatch, MatchCollection};
use crate::params::FilterParams;
use crate::seed::utils::reverse_complement;
use crate::seed::SeedIndex;
use crate::types::{Alphabet, SequenceRecord, Strand};
use crate::verify::{create_verifier, Alignment, Verifier, VerifyParams};

/// Progress hooks invoked during a search.
pub trait SearchObserver {
    fn database_started(&mut self, _index: usize, _record: &SequenceRecord) {}

    fn strand_started(&mut self, _database: usize, _strand: Strand) {}

    fn candidates_found(&mut self, _database: usize, _strand: Strand, _count: usize) {}

    fn query_disabled(&mut self, _query: usize, _record: &SequenceRecord) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Database sequence in the orientation of `strand`.
pub fn oriented(seq: &[u8], strand: Strand, alphabet: Alphabet) -> Cow<'_, [u8]> {
    match strand {
        Strand::Forward => Cow::Borrowed(seq),
        Strand::Reverse => Cow::Owned(reverse_complement(seq, alphabet)),
    }
}

pub struct Searcher<'a> {
    config: &'a ValidatedConfig,
    index: &'a SeedIndex,
    params: FilterParams,
    verifier: Box<dyn Verifier>,
    verify_params: VerifyParams,
}

impl<'a> Searcher<'a> {
    pub fn new(config: &'a ValidatedConfig, index: &'a SeedIndex, params: FilterParams) -> Self {
        Self {
            config,
            index,
            params,
            verifier: create_verifier(config.verification),
            verify_params: VerifyParams::from_config(config),
        }
    }

    /// Strands searched for every database sequence.
    pub fn strands(&self) -> Vec<Strand> {
        let mut strands = Vec::with_capacity(2);
        if self.config.forward {
            strands.push(Strand::Forward);
        }
        if self.config.searches_reverse() {
            strands.push(Strand::Reverse);
        }
        strands
    }

    /// Search every database against the indexed queries.
    pub fn run(
        &self,
        databases: &[SequenceRecord],
        queries: &[SequenceRecord],
        observer: &mut dyn SearchObserver,
    ) -> MatchCollection {
        let mut collection = MatchCollection::new(queries.len());
        let strands = self.strands();
        for (db_index, record) in databases.iter().enumerate() {
            observer.database_started(db_index, record);
            for &strand in &strands {
                observer.strand_started(db_index, strand);
                self.search_strand(db_index, record, strand, queries, &mut collection, observer);
            }
        }
        collection.compact_all(self.config.num_matches);
        collection
    }

    fn search_strand(
        &self,
        db_index: usize,
        record: &SequenceRecord,
        strand: Strand,
        queries: &[SequenceRecord],
        collection: &mut MatchCollection,
        observer: &mut dyn SearchObserver,
    ) {
        let database = oriented(&record.seq, strand, self.config.alphabet);
        let repeats = find_repeats(
            &database,
            self.config.min_repeat_length,
            self.config.max_repeat_period,
            self.config.alphabet.wildcard(),
        );
        if !repeats.is_empty() {
            debug!("{} {}: skipping {} repeat region(s)", record.id, strand, repeats.len());
        }

        let disabled: Vec<bool> = collection.iter().map(|(_, q)| q.is_disabled()).collect();
        let candidates = SwiftFilter::new(self.index, self.params).find_candidates(&database, &repeats, &disabled);
        observer.candidates_found(db_index, strand, candidates.len());

        let verified = self.verify_all(&candidates, queries, &database);

        for (candidate, alignments) in candidates.iter().zip(verified) {
            let query = candidate.query;
            if collection.query(query).is_disabled() {
                continue;
            }
            for alignment in alignments {
                let m = to_local_match(&alignment, db_index, query, strand, database.len());
                collection.query_mut(query).push(m);
            }

            let count = collection.query(query).len();
            match self.config.disable_threshold {
                Some(limit) if count > limit => {
                    collection.query_mut(query).disable();
                    observer.query_disabled(query, &queries[query]);
                }
                _ if count > self.config.compact_threshold => {
                    collection.query_mut(query).compact(self.config.num_matches);
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn verify_all(&self, candidates: &[Candidate], queries: &[SequenceRecord], database: &[u8]) -> Vec<Vec<Alignment>> {
        candidates
            .par_iter()
            .map(|c| self.verifier.verify(c, &queries[c.query].seq, database, &self.verify_params))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn verify_all(&self, candidates: &[Candidate], queries: &[SequenceRecord], database: &[u8]) -> Vec<Vec<Alignment>> {
        candidates
            .iter()
            .map(|c| self.verifier.verify(c, &queries[c.query].seq, database, &self.verify_params))
            .collect()
    }
}

fn to_local_match(alignment: &Alignment, database: usize, query: usize, strand: Strand, db_len: usize) -> LocalMatch {
    let (db_begin, db_end) = match strand {
        Strand::Forward => (alignment.db_begin, alignment.db_end()),
        Strand::Reverse => (db_len - alignment.db_end(), db_len - alignment.db_begin),
    };
    let errors = alignment.errors();
    let columns = alignment.columns() as i64;
    LocalMatch {
        database,
        query,
        strand,
        db_begin,
        db_end,
        query_begin: alignment.query_begin,
        query_end: alignment.query_end(),
        ops: run_length(&alignment.ops),
        errors,
        score: columns - 3 * i64::from(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::random_dna;
    use crate::config::SearchConfig;
    use crate::mask::AbundanceMasker;


    #[derive(Default)]
    struct Recorder {
        strands: Vec<(usize, Strand)>,
        disabled: Vec<usize>,
    }

    impl SearchObserver for Recorder {
        fn strand_started(&mut self, database: usize, strand: Strand) {
            self.strands.push((database, strand));
        }

        fn query_disabled(&mut self, query: usize, _record: &SequenceRecord) {
            self.disabled.push(query);
        }
    }

    fn config(overrides: SearchConfig) -> ValidatedConfig {
        overrides.validate().unwrap()
    }

    fn search(
        config: &ValidatedConfig,
        databases: &[SequenceRecord],
        queries: &[SequenceRecord],
        observer: &mut dyn SearchObserver,
    ) -> MatchCollection {
        let params = FilterParams::derive(config.epsilon, config.min_length, config.seed_length);
        let mut index = SeedIndex::build(queries, params.seed_length as usize, config.alphabet).unwrap();
        AbundanceMasker::new(config.abundance_cut).apply(&mut index);
        Searcher::new(config, &index, params).run(databases, queries, observer)
    }

    fn base_config() -> SearchConfig {
        SearchConfig {
            epsilon: 0.05,
            min_length: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_protein_searches_forward_only() {
        let config = config(SearchConfig { alphabet: Alphabet::Protein, ..base_config() });
        let databases = vec![SequenceRecord::new("db", b"MKVLAAGIVGLLLAQQW".to_vec())];
        let queries = vec![SequenceRecord::new("q", b"MKVLAAGIVG".to_vec())];
        let mut recorder = Recorder::default();
        search(&config, &databases, &queries, &mut recorder);
        assert_eq!(recorder.strands, vec![(0, Strand::Forward)]);
    }

    #[test]
    fn test_finds_both_strands_without_touching_database() {
        let config = config(base_config());
        let core = random_dna(120, 17);
        let mut db = random_dna(300, 1);
        db.extend_from_slice(&core);
        db.extend(random_dna(300, 2));
        db.extend(reverse_complement(&core, Alphabet::Dna5));
        db.extend(random_dna(300, 3));
        let databases = vec![SequenceRecord::new("chr", db)];
        let snapshot = databases.clone();
        let queries = vec![SequenceRecord::new("q", core)];

        let matches = search(&config, &databases, &queries, &mut NoopObserver);
        assert_eq!(databases, snapshot);

        let found = matches.query(0).matches();
        let forward = found.iter().find(|m| m.strand == Strand::Forward).unwrap();
        assert_eq!((forward.db_begin, forward.db_end), (300, 420));
        assert_eq!((forward.query_begin, forward.query_end), (0, 120));
        assert_eq!(forward.errors, 0);

        let reverse = found.iter().find(|m| m.strand == Strand::Reverse).unwrap();
        assert_eq!((reverse.db_begin, reverse.db_end), (720, 840));
        assert_eq!((reverse.query_begin, reverse.query_end), (0, 120));
    }

    #[test]
    fn test_forward_only_config() {
        let config = config(SearchConfig { reverse: false, ..base_config() });
        let core = random_dna(100, 9);
        let mut db = random_dna(200, 4);
        db.extend(reverse_complement(&core, Alphabet::Dna5));
        let databases = vec![SequenceRecord::new("chr", db)];
        let queries = vec![SequenceRecord::new("q", core)];

        let mut recorder = Recorder::default();
        let matches = search(&config, &databases, &queries, &mut recorder);
        assert_eq!(recorder.strands, vec![(0, Strand::Forward)]);
        assert!(matches.query(0).is_empty());
    }

    #[test]
    fn test_query_disabled_past_threshold() {
        let config = config(SearchConfig { disable_threshold: Some(2), reverse: false, ..base_config() });
        let core = random_dna(80, 21);
        let mut db = Vec::new();
        for i in 0..4 {
            db.extend(random_dna(200, 100 + i));
            db.extend_from_slice(&core);
        }
        let databases = vec![SequenceRecord::new("chr", db)];
        let queries = vec![
            SequenceRecord::new("repetitive", core),
            SequenceRecord::new("absent", random_dna(80, 999)),
        ];

        let mut recorder = Recorder::default();
        let matches = search(&config, &databases, &queries, &mut recorder);
        assert_eq!(recorder.disabled, vec![0]);
        assert!(matches.query(0).is_disabled());
        assert!(matches.query(0).is_empty());
        assert!(!matches.query(1).is_disabled());
    }

    #[test]
    fn test_num_matches_caps_output() {
        let config = config(SearchConfig { num_matches: 2, reverse: false, ..base_config() });
        let core = random_dna(80, 33);
        let mut db = Vec::new();
        for i in 0..4 {
            db.extend(random_dna(200, 200 + i));
            db.extend_from_slice(&core);
        }
        let databases = vec![SequenceRecord::new("chr", db)];
        let queries = vec![SequenceRecord::new("q", core)];

        let matches = search(&config, &databases, &queries, &mut NoopObserver);
        assert_eq!(matches.query(0).len(), 2);
    }
}
