//! Search configuration
//!
//! Supports loading defaults from a TOML file; the CLI overrides individual
//! fields afterwards. Only a [`ValidatedConfig`] is accepted by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::params::FilterParams;
use crate::seed::MAX_SEED_LENGTH;
use crate::types::Alphabet;

/// Largest accepted error rate.
pub const MAX_EPSILON: f64 = 0.25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("epsilon must be in (0, {}], got {0}", MAX_EPSILON)]
    InvalidEpsilon(f64),

    #[error("minimum match length must be at least 1")]
    InvalidMinLength,

    #[error("seed length must be between 1 and {}, got {0}", MAX_SEED_LENGTH)]
    InvalidSeedLength(u32),

    #[error("seed length {seed_length} must be lower than 1/epsilon (epsilon = {epsilon})")]
    SeedTooLong { seed_length: u32, epsilon: f64 },

    #[error("num-matches ({num_matches}) must be at least 1 and not above sort-thresh ({compact_threshold})")]
    MatchLimits { num_matches: usize, compact_threshold: usize },

    #[error("abundance cut must be in (0, 1], got {0}")]
    InvalidAbundanceCut(f64),

    #[error("x-drop must be non-negative, got {0}")]
    InvalidXDrop(f64),

    #[error("at least one database strand must be searched")]
    NoStrand,

    #[error("cannot infer output format from {}, use .gff or .txt or set the format explicitly", .0.display())]
    UnknownOutputFormat(PathBuf),

    #[error("unknown verification method '{0}' (expected exact, bestLocal, bandedGlobal or bandedGlobalExtend)")]
    UnknownVerification(String),

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Seed verification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VerificationMethod {
    /// Every epsilon-match inside the candidate window.
    #[default]
    #[serde(rename = "exact")]
    Exact,
    /// The longest epsilon-match of each candidate window.
    #[serde(rename = "bestLocal")]
    BestLocal,
    /// Banded global alignment of the seed region.
    #[serde(rename = "bandedGlobal")]
    BandedGlobal,
    /// Banded global alignment followed by X-drop extension.
    #[serde(rename = "bandedGlobalExtend")]
    BandedGlobalExtend,
}

impl VerificationMethod {
    pub const ALL: [VerificationMethod; 4] = [
        VerificationMethod::Exact,
        VerificationMethod::BestLocal,
        VerificationMethod::BandedGlobal,
        VerificationMethod::BandedGlobalExtend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VerificationMethod::Exact => "exact",
            VerificationMethod::BestLocal => "bestLocal",
            VerificationMethod::BandedGlobal => "bandedGlobal",
            VerificationMethod::BandedGlobalExtend => "bandedGlobalExtend",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VerificationMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerificationMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigError::UnknownVerification(s.to_string()))
    }
}

/// Match file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gff,
    Txt,
}

impl OutputFormat {
    /// Format implied by the file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("gff") {
            Some(OutputFormat::Gff)
        } else if ext.eq_ignore_ascii_case("txt") {
            Some(OutputFormat::Txt)
        } else {
            None
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gff" => Ok(OutputFormat::Gff),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(format!("unknown output format '{}' (expected gff or txt)", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Maximal error rate of a match
    pub epsilon: f64,

    /// Minimal length of a match
    pub min_length: u32,

    /// Maximal score drop tolerated during X-drop extension
    pub x_drop: f64,

    /// Seed length; derived from epsilon and min_length when unset
    pub seed_length: Option<u32>,

    /// Search the forward strand of the database
    pub forward: bool,

    /// Search the reverse complement of the database
    pub reverse: bool,

    pub verification: VerificationMethod,

    /// Queries with more matches than this are disabled; unset means never
    pub disable_threshold: Option<usize>,

    /// Matches kept per query
    pub num_matches: usize,

    /// Collection size that triggers compaction of a query's matches
    pub compact_threshold: usize,

    /// Longest period of a database repeat to skip
    pub max_repeat_period: usize,

    /// Shortest database repeat to skip
    pub min_repeat_length: usize,

    /// Fraction of total query length above which a seed is disabled
    pub abundance_cut: f64,

    pub alphabet: Alphabet,

    pub output: PathBuf,

    /// Inferred from the output extension when unset
    pub output_format: Option<OutputFormat>,

    pub disabled_queries_output: PathBuf,

    pub verbose: bool,

    /// Omit wall-clock timings from reports
    pub suppress_runtime: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.05,
            min_length: 100,
            x_drop: 5.0,
            seed_length: None,
            forward: true,
            reverse: true,
            verification: VerificationMethod::Exact,
            disable_threshold: None,
            num_matches: 50,
            compact_threshold: 500,
            max_repeat_period: 1,
            min_repeat_length: 1000,
            abundance_cut: 1.0,
            alphabet: Alphabet::Dna5,
            output: PathBuf::from("epsmatch.gff"),
            output_format: None,
            disabled_queries_output: PathBuf::from("epsmatch.disabled.fasta"),
            verbose: false,
            suppress_runtime: false,
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every field and resolve the output format.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if !(self.epsilon > 0.0 && self.epsilon <= MAX_EPSILON) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        if self.min_length == 0 {
            return Err(ConfigError::InvalidMinLength);
        }
        if let Some(q) = self.seed_length {
            if q == 0 || q as usize > MAX_SEED_LENGTH {
                return Err(ConfigError::InvalidSeedLength(q));
            }
            if !FilterParams::seed_fits(q, self.epsilon) {
                return Err(ConfigError::SeedTooLong { seed_length: q, epsilon: self.epsilon });
            }
        }
        if self.num_matches == 0 || self.num_matches > self.compact_threshold {
            return Err(ConfigError::MatchLimits {
                num_matches: self.num_matches,
                compact_threshold: self.compact_threshold,
            });
        }
        if !(self.abundance_cut > 0.0 && self.abundance_cut <= 1.0) {
            return Err(ConfigError::InvalidAbundanceCut(self.abundance_cut));
        }
        if !(self.x_drop >= 0.0) {
            return Err(ConfigError::InvalidXDrop(self.x_drop));
        }
        if !self.forward && !self.reverse {
            return Err(ConfigError::NoStrand);
        }

        let output_format = match self.output_format {
            Some(format) => format,
            None => OutputFormat::from_path(&self.output)
                .ok_or_else(|| ConfigError::UnknownOutputFormat(self.output.clone()))?,
        };

        Ok(ValidatedConfig { config: self, output_format })
    }
}

/// A configuration that passed [`SearchConfig::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    config: SearchConfig,
    output_format: OutputFormat,
}

impl ValidatedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// True if the reverse strand is actually searched for this alphabet.
    pub fn searches_reverse(&self) -> bool {
        self.config.reverse && self.config.alphabet.is_nucleotide()
    }

    pub fn into_inner(self) -> SearchConfig {
        self.config
    }
}

impl Deref for ValidatedConfig {
    type Target = SearchConfig;

    fn deref(&self) -> &SearchConfig {
        &self.config
    }
}
