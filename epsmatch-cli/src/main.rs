use anyhow::{Context, Result};
use clap::Parser;
use epsmatch_core::*;
use std::ffi::OsString;
use std::path::PathBuf;

mod report;

use report::LogObserver;

#[derive(Parser, Debug)]
#[command(name = "epsmatch")]
#[command(about = "epsmatch - find all local epsilon-matches between queries and a database")]
#[command(version)]
struct Cli {
    /// Database FASTA/FASTQ file (optionally gzipped)
    database: PathBuf,

    /// Query FASTA/FASTQ file (optionally gzipped)
    query: PathBuf,

    /// TOML file with default settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximal error rate
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Minimal match length
    #[arg(short = 'l', long, alias = "minLength")]
    min_length: Option<u32>,

    /// Maximal score drop during X-drop extension
    #[arg(short = 'x', long, alias = "xDrop")]
    x_drop: Option<f64>,

    /// Seed length (derived from epsilon and min length if omitted)
    #[arg(short = 'k', long = "kmer")]
    seed_length: Option<u32>,

    /// Search only the forward database strand
    #[arg(short, long)]
    forward: bool,

    /// Search only the reverse complement of the database
    #[arg(short, long)]
    reverse: bool,

    /// Alphabet (dna, dna5, rna, rna5, protein, char)
    #[arg(short, long)]
    alphabet: Option<Alphabet>,

    /// Verification strategy (exact, bestLocal, bandedGlobal, bandedGlobalExtend)
    #[arg(long)]
    verification: Option<VerificationMethod>,

    /// Disable queries with more matches than this
    #[arg(short = 't', long = "disable-thresh", alias = "disableThresh")]
    disable_threshold: Option<usize>,

    /// Matches kept per query
    #[arg(short = 'n', long, alias = "numMatches")]
    num_matches: Option<usize>,

    /// Match count that triggers compaction of a query's matches
    #[arg(short = 's', long = "sort-thresh", alias = "sortThresh")]
    compact_threshold: Option<usize>,

    /// Longest period of database repeats to skip
    #[arg(long, alias = "repeatPeriod")]
    repeat_period: Option<usize>,

    /// Shortest database repeat to skip
    #[arg(long, alias = "repeatLength")]
    repeat_length: Option<usize>,

    /// Fraction of the total query length above which a seed is masked
    #[arg(short = 'c', long, alias = "abundanceCut")]
    abundance_cut: Option<f64>,

    /// Match output file (.gff or .txt)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output format, overriding the file extension
    #[arg(long)]
    output_format: Option<OutputFormat>,

    /// FASTA file receiving disabled queries
    #[arg(long, alias = "outDisabled")]
    out_disabled: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Do not print timings
    #[arg(long = "suppress-runtime-printing", alias = "no-rt")]
    suppress_runtime: bool,
}

/// Rewrite the single-dash `-no-rt` spelling, which clap would read as `-n o-rt`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| if arg == "-no-rt" { OsString::from("--no-rt") } else { arg })
        .collect()
}

impl Cli {
    /// Config file (or defaults) with every explicitly given flag applied.
    fn search_config(&self) -> Result<ValidatedConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SearchConfig::default(),
        };

        if let Some(v) = self.epsilon {
            config.epsilon = v;
        }
        if let Some(v) = self.min_length {
            config.min_length = v;
        }
        if let Some(v) = self.x_drop {
            config.x_drop = v;
        }
        if self.seed_length.is_some() {
            config.seed_length = self.seed_length;
        }
        if self.forward != self.reverse {
            config.forward = self.forward;
            config.reverse = self.reverse;
        }
        if let Some(v) = self.alphabet {
            config.alphabet = v;
        }
        if let Some(v) = self.verification {
            config.verification = v;
        }
        if self.disable_threshold.is_some() {
            config.disable_threshold = self.disable_threshold;
        }
        if let Some(v) = self.num_matches {
            config.num_matches = v;
        }
        if let Some(v) = self.compact_threshold {
            config.compact_threshold = v;
        }
        if let Some(v) = self.repeat_period {
            config.max_repeat_period = v;
        }
        if let Some(v) = self.repeat_length {
            config.min_repeat_length = v;
        }
        if let Some(v) = self.abundance_cut {
            config.abundance_cut = v;
        }
        if let Some(v) = &self.out {
            config.output = v.clone();
        }
        if self.output_format.is_some() {
            config.output_format = self.output_format;
        }
        if let Some(v) = &self.out_disabled {
            config.disabled_queries_output = v.clone();
        }
        config.verbose |= self.verbose;
        config.suppress_runtime |= self.suppress_runtime;

        config.validate().context("Invalid configuration")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = cli.search_config()?;
    report::log_settings(&config);

    log::info!("Searching {} against {}", cli.query.display(), cli.database.display());
    let pipeline = Pipeline::new(config);
    let mut observer = LogObserver::new(pipeline.config().verbose);
    let summary = pipeline
        .run(&cli.database, &cli.query, &mut observer)
        .context("Search failed")?;

    report::log_summary(&summary, pipeline.config());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["epsmatch", "db.fa", "q.fa"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(normalize_args(argv.into_iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).search_config().unwrap();
        assert_eq!(config.epsilon, 0.05);
        assert!(config.forward && config.reverse);
        assert_eq!(config.output_format(), OutputFormat::Gff);
    }

    #[test]
    fn test_single_strand_flags() {
        let config = parse(&["-r"]).search_config().unwrap();
        assert!(!config.forward && config.reverse);

        let config = parse(&["-f", "-r"]).search_config().unwrap();
        assert!(config.forward && config.reverse);
    }

    #[test]
    fn test_flags_override_config_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "epsilon = 0.1\nmin_length = 40\nverification = \"bestLocal\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--config", &path, "-l", "60", "--verification", "bandedGlobal"])
            .search_config()
            .unwrap();
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.min_length, 60);
        assert_eq!(config.verification, VerificationMethod::BandedGlobal);
    }

    #[test]
    fn test_established_short_flags() {
        let cli = parse(&[
            "-e", "0.1", "-l", "50", "-x", "10", "-k", "7", "-n", "5000", "-s", "10000", "-v", "-no-rt",
        ]);
        assert!(cli.verbose && cli.suppress_runtime);
        let config = cli.search_config().unwrap();
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.min_length, 50);
        assert_eq!(config.x_drop, 10.0);
        assert_eq!(config.seed_length, Some(7));
        assert_eq!(config.num_matches, 5000);
        assert_eq!(config.compact_threshold, 10000);
    }

    #[test]
    fn test_camel_case_long_flags() {
        let cli = parse(&[
            "--alphabet", "dna", "--forward",
            "--epsilon", "0.05", "--minLength", "20", "--xDrop", "10", "--kmer", "7",
            "--numMatches", "5000", "--sortThresh", "10000", "--verbose", "--suppress-runtime-printing",
            "--out", "minLen20.gff",
        ]);
        let config = cli.search_config().unwrap();
        assert_eq!(config.alphabet, Alphabet::Dna);
        assert!(config.forward && !config.reverse);
        assert_eq!(config.min_length, 20);
        assert_eq!(config.x_drop, 10.0);
        assert_eq!(config.num_matches, 5000);
        assert_eq!(config.compact_threshold, 10000);
        assert!(config.suppress_runtime);

        let config = parse(&["--disableThresh", "3", "--repeatPeriod", "2", "--no-rt"]).search_config().unwrap();
        assert_eq!(config.disable_threshold, Some(3));
        assert_eq!(config.max_repeat_period, 2);
        assert!(config.suppress_runtime);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse(&["-e", "0.5"]).search_config().is_err());
        assert!(parse(&["-o", "out.bed"]).search_config().is_err());
        assert!(Cli::try_parse_from(["epsmatch", "db.fa", "q.fa", "--verification", "fuzzy"]).is_err());
        assert!(Cli::try_parse_from(["epsmatch", "db.fa", "q.fa", "-a", "klingon"]).is_err());
    }
}
