//! Sequence import and match export

pub mod fasta;
pub mod output;

pub use fasta::{import_reader, import_sequences, ImportedSequences};
pub use output::{write_disabled_queries, MatchWriter};
