//! End-to-end driver: import, index, search, write

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::{ConfigError, ValidatedConfig};
use crate::error::{Error, Result};
use crate::io::{import_sequences, write_disabled_queries, ImportedSequences, MatchWriter};
use crate::mask::{AbundanceMasker, MaskReport};
use crate::matches::MatchCollection;
use crate::params::FilterParams;
use crate::search::{SearchObserver, Searcher};
use crate::seed::SeedIndex;
use crate::stats::{estimate, Significance};
use crate::types::{max_length, SequenceRecord};

/// Wall-clock time spent per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub import: Duration,
    pub index: Duration,
    pub search: Duration,
    pub output: Duration,
}

impl Timings {
    pub fn total(&self) -> Duration {
        self.import + self.index + self.search + self.output
    }
}

/// Result of an in-memory search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub params: FilterParams,
    pub mask: MaskReport,
    pub significance: Option<Significance>,
    pub matches: MatchCollection,
}

/// Summary of a complete run, for presentation by the caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub params: FilterParams,
    pub mask: MaskReport,
    pub significance: Option<Significance>,
    pub databases: usize,
    pub queries: usize,
    pub matches: usize,
    pub disabled_queries: usize,
    pub output: PathBuf,
    /// Set when the disabled-queries file was written.
    pub disabled_output: Option<PathBuf>,
    pub timings: Timings,
}

pub struct Pipeline {
    config: ValidatedConfig,
}

impl Pipeline {
    pub fn new(config: ValidatedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Filter parameters for this configuration; a derived seed length that
    /// does not stay below `1/epsilon` is a configuration error.
    pub fn filter_params(&self) -> Result<FilterParams> {
        let params = FilterParams::derive(self.config.epsilon, self.config.min_length, self.config.seed_length);
        if !FilterParams::seed_fits(params.seed_length, self.config.epsilon) {
            return Err(ConfigError::SeedTooLong {
                seed_length: params.seed_length,
                epsilon: self.config.epsilon,
            }
            .into());
        }
        Ok(params)
    }

    /// Index `queries`, mask abundant seeds and search every database.
    pub fn search(
        &self,
        databases: &[SequenceRecord],
        queries: &[SequenceRecord],
        observer: &mut dyn SearchObserver,
    ) -> Result<SearchOutcome> {
        let (params, index, mask) = self.build_index(queries)?;
        let matches = Searcher::new(&self.config, &index, params).run(databases, queries, observer);
        Ok(SearchOutcome {
            params,
            mask,
            significance: self.significance(databases, queries),
            matches,
        })
    }

    /// Import both files, search and write every configured output.
    pub fn run(&self, database: &Path, query: &Path, observer: &mut dyn SearchObserver) -> Result<RunReport> {
        let mut timings = Timings::default();

        let start = Instant::now();
        let databases = import(database, &self.config)?;
        let queries = import(query, &self.config)?;
        timings.import = start.elapsed();
        debug!(
            "imported {} database and {} query sequence(s)",
            databases.records.len(),
            queries.records.len()
        );

        let start = Instant::now();
        let (params, index, mask) = self.build_index(&queries.records)?;
        timings.index = start.elapsed();

        let start = Instant::now();
        let matches = Searcher::new(&self.config, &index, params).run(&databases.records, &queries.records, observer);
        timings.search = start.elapsed();

        let start = Instant::now();
        let path = &self.config.output;
        let mut out = create(path)?;
        MatchWriter::new(&databases.records, &queries.records, self.config.alphabet)
            .write(&mut out, self.config.output_format(), &matches)
            .and_then(|_| out.flush())
            .map_err(|e| Error::io(path, e))?;

        let disabled_output = match self.config.disable_threshold {
            Some(_) => {
                let path = &self.config.disabled_queries_output;
                let mut out = create(path)?;
                write_disabled_queries(&mut out, &matches, &queries.records)
                    .and_then(|_| out.flush())
                    .map_err(|e| Error::io(path, e))?;
                Some(path.clone())
            }
            None => None,
        };
        timings.output = start.elapsed();

        Ok(RunReport {
            params,
            mask,
            significance: self.significance(&databases.records, &queries.records),
            databases: databases.records.len(),
            queries: queries.records.len(),
            matches: matches.total_matches(),
            disabled_queries: matches.disabled_queries().len(),
            output: path.clone(),
            disabled_output,
            timings,
        })
    }

    fn build_index(&self, queries: &[SequenceRecord]) -> Result<(FilterParams, SeedIndex, MaskReport)> {
        let params = self.filter_params()?;
        debug!("filter parameters: {}", params);
        let mut index = SeedIndex::build(queries, params.seed_length as usize, self.config.alphabet)?;
        let mask = AbundanceMasker::new(self.config.abundance_cut).apply(&mut index);
        debug!(
            "indexed {} distinct seed(s), {} disabled above {} occurrences",
            index.bucket_count(),
            mask.disabled_buckets,
            mask.threshold
        );
        Ok((params, index, mask))
    }

    fn significance(&self, databases: &[SequenceRecord], queries: &[SequenceRecord]) -> Option<Significance> {
        estimate(
            self.config.alphabet,
            self.config.min_length,
            self.config.epsilon,
            max_length(queries),
            max_length(databases),
        )
    }
}

fn import(path: &Path, config: &ValidatedConfig) -> Result<ImportedSequences> {
    let imported = import_sequences(path, config.alphabet)?;
    if !imported.all_unique {
        warn!(
            "{}: {} record(s) reuse an identifier prefix; matches may be hard to tell apart",
            path.display(),
            imported.duplicates
        );
    }
    Ok(imported)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path, e))
}
