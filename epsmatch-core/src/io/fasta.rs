//! FASTA/FASTQ import
//!
//! Parsing is delegated to needletail, which also transparently handles
//! gzip-compressed input. Symbols are normalised onto the configured
//! alphabet and identifiers are checked for short-form collisions.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use needletail::errors::ParseErrorKind;
use needletail::parse_fastx_reader;

use crate::error::{Error, Result};
use crate::ids::IdDeduplicator;
use crate::types::{Alphabet, SequenceRecord};

/// Records of one input file.
#[derive(Debug, Clone)]
pub struct ImportedSequences {
    pub records: Vec<SequenceRecord>,
    /// False if two records share a short identifier.
    pub all_unique: bool,
    pub duplicates: usize,
}

impl ImportedSequences {
    pub fn total_length(&self) -> usize {
        self.records.iter().map(SequenceRecord::len).sum()
    }
}

/// Read every record of `path`.
pub fn import_sequences<P: AsRef<Path>>(path: P, alphabet: Alphabet) -> Result<ImportedSequences> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    import_reader(file, alphabet, path)
}

/// Read every record from `reader`; `path` only labels errors.
pub fn import_reader<R: Read + Send>(reader: R, alphabet: Alphabet, path: &Path) -> Result<ImportedSequences> {
    let mut fastx = parse_fastx_reader(reader).map_err(|e| match e.kind {
        ParseErrorKind::EmptyFile => Error::EmptyInput { path: path.to_path_buf() },
        _ => Error::parse(path, e.to_string()),
    })?;

    let mut records = Vec::new();
    let mut ids = IdDeduplicator::new();
    while let Some(record) = fastx.next() {
        let record = record.map_err(|e| Error::parse(path, e.to_string()))?;
        let id = String::from_utf8_lossy(record.id()).into_owned();
        ids.observe(&id);
        records.push(SequenceRecord::with_alphabet(id, &record.seq(), alphabet));
    }

    if records.is_empty() {
        return Err(Error::EmptyInput { path: path.to_path_buf() });
    }

    Ok(ImportedSequences {
        records,
        all_unique: ids.all_unique(),
        duplicates: ids.duplicates(),
    })
}
