//! Log-based presentation of search progress and results

use epsmatch_core::{RunReport, SearchObserver, SequenceRecord, Strand, ValidatedConfig};
use log::{debug, info, warn};

/// Reports search progress through the `log` facade.
pub struct LogObserver {
    verbose: bool,
}

impl LogObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl SearchObserver for LogObserver {
    fn database_started(&mut self, index: usize, record: &SequenceRecord) {
        if self.verbose {
            info!("Database {}: {} ({} bp)", index + 1, record.id, record.len());
        }
    }

    fn strand_started(&mut self, _database: usize, strand: Strand) {
        debug!("  strand {}", strand);
    }

    fn candidates_found(&mut self, _database: usize, strand: Strand, count: usize) {
        debug!("  {} candidate window(s) on strand {}", count, strand);
    }

    fn query_disabled(&mut self, query: usize, record: &SequenceRecord) {
        warn!("Query {} ({}) exceeded the disable threshold and was disabled", query + 1, record.id);
    }
}

pub fn log_settings(config: &ValidatedConfig) {
    info!(
        "epsilon = {}, min length = {}, verification = {}",
        config.epsilon, config.min_length, config.verification
    );
    debug!(
        "alphabet = {}, x-drop = {}, strands = {}{}, num matches = {}, sort threshold = {}",
        config.alphabet,
        config.x_drop,
        if config.forward { "+" } else { "" },
        if config.searches_reverse() { "-" } else { "" },
        config.num_matches,
        config.compact_threshold
    );
    if config.reverse && !config.searches_reverse() {
        info!("Reverse strand skipped for {} alphabet", config.alphabet);
    }
}

pub fn log_summary(report: &RunReport, config: &ValidatedConfig) {
    let p = &report.params;
    if config.verbose {
        info!(
            "Filter: seed length {}, threshold {}, distance cut {}, delta {}, overlap {}",
            p.seed_length, p.threshold, p.distance_cut, p.delta, p.overlap
        );
    }
    if report.mask.disabled_buckets > 0 {
        info!(
            "Masked {} abundant seed(s) occurring more than {} times",
            report.mask.disabled_buckets, report.mask.threshold
        );
    }
    if let Some(significance) = report.significance {
        info!(
            "E-value of the weakest reportable match (score {}): {:e}",
            significance.min_score, significance.evalue
        );
    }

    info!(
        "{} match(es) between {} quer(ies) and {} database sequence(s) written to {}",
        report.matches,
        report.queries,
        report.databases,
        report.output.display()
    );
    if let Some(path) = &report.disabled_output {
        info!("{} disabled quer(ies) written to {}", report.disabled_queries, path.display());
    }

    if !config.suppress_runtime {
        let t = &report.timings;
        info!(
            "Time: import {:.3}s, index {:.3}s, search {:.3}s, output {:.3}s, total {:.3}s",
            t.import.as_secs_f64(),
            t.index.as_secs_f64(),
            t.search.as_secs_f64(),
            t.output.as_secs_f64(),
            t.total().as_secs_f64()
        );
    }
}
