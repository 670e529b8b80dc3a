//! Match and disabled-query writers

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::config::OutputFormat;
use crate::ids::short_id;
use crate::matches::{AlignOp, LocalMatch, MatchCollection};
use crate::seed::utils::reverse_complement;
use crate::stats::{evalue, NUCLEOTIDE_PARAMS};
use crate::types::{Alphabet, SequenceRecord, Strand};

/// Columns per aligned row in text output.
const TXT_WIDTH: usize = 60;

/// Writes a [`MatchCollection`] in one of the supported formats.
pub struct MatchWriter<'a> {
    databases: &'a [SequenceRecord],
    queries: &'a [SequenceRecord],
    alphabet: Alphabet,
}

impl<'a> MatchWriter<'a> {
    pub fn new(databases: &'a [SequenceRecord], queries: &'a [SequenceRecord], alphabet: Alphabet) -> Self {
        Self { databases, queries, alphabet }
    }

    /// Write every match, grouped by query in input order.
    pub fn write<W: Write>(&self, out: &mut W, format: OutputFormat, matches: &MatchCollection) -> io::Result<()> {
        let mut number = 0;
        for (_, query) in matches.iter() {
            for m in query.matches() {
                number += 1;
                match format {
                    OutputFormat::Gff => self.write_gff(out, m)?,
                    OutputFormat::Txt => self.write_txt(out, number, m)?,
                }
            }
        }
        Ok(())
    }

    fn write_gff<W: Write>(&self, out: &mut W, m: &LocalMatch) -> io::Result<()> {
        let database = &self.databases[m.database];
        let query = &self.queries[m.query];
        write!(
            out,
            "{}\tepsmatch\teps-matches\t{}\t{}\t{:.4}\t{}\t.\t{};seq2Range={},{}",
            short_id(&database.id),
            m.db_begin + 1,
            m.db_end,
            m.identity(),
            char::from(m.strand),
            short_id(&query.id),
            m.query_begin + 1,
            m.query_end,
        )?;
        if self.alphabet.is_nucleotide() {
            let e = evalue(m.score, query.len(), database.len(), &NUCLEOTIDE_PARAMS);
            write!(out, ";eValue={:e}", e)?;
        }
        write!(out, ";cigar={}", m.cigar())?;
        let mutations = mutations(m, &query.seq);
        if !mutations.is_empty() {
            write!(out, ";mutations={}", mutations)?;
        }
        writeln!(out)
    }

    fn write_txt<W: Write>(&self, out: &mut W, number: usize, m: &LocalMatch) -> io::Result<()> {
        let database = &self.databases[m.database];
        let query = &self.queries[m.query];
        let (db_row, marks, query_row) = self.aligned_rows(m);

        writeln!(out, "Match {}", number)?;
        writeln!(
            out,
            "  database: {} [{}..{}] strand {}",
            short_id(&database.id),
            m.db_begin + 1,
            m.db_end,
            char::from(m.strand)
        )?;
        writeln!(out, "  query:    {} [{}..{}]", short_id(&query.id), m.query_begin + 1, m.query_end)?;
        writeln!(
            out,
            "  length {}, errors {}, identity {:.2}%",
            m.columns(),
            m.errors,
            m.identity()
        )?;
        for start in (0..db_row.len()).step_by(TXT_WIDTH) {
            let end = (start + TXT_WIDTH).min(db_row.len());
            writeln!(out)?;
            writeln!(out, "  db     {}", &db_row[start..end])?;
            writeln!(out, "         {}", &marks[start..end])?;
            writeln!(out, "  query  {}", &query_row[start..end])?;
        }
        writeln!(out)
    }

    /// Database row, match marks and query row of an alignment.
    fn aligned_rows(&self, m: &LocalMatch) -> (String, String, String) {
        let db_seq = &self.databases[m.database].seq[m.db_begin..m.db_end];
        let db_seq = match m.strand {
            Strand::Forward => db_seq.to_vec(),
            Strand::Reverse => reverse_complement(db_seq, self.alphabet),
        };
        let query_seq = &self.queries[m.query].seq[m.query_begin..m.query_end];

        let columns = m.columns() as usize;
        let (mut db_row, mut marks, mut query_row) =
            (String::with_capacity(columns), String::with_capacity(columns), String::with_capacity(columns));
        let (mut i, mut j) = (0, 0);
        for &(op, n) in &m.ops {
            for _ in 0..n {
                let d = if op.consumes_database() {
                    i += 1;
                    char::from(db_seq[i - 1])
                } else {
                    '-'
                };
                let q = if op.consumes_query() {
                    j += 1;
                    char::from(query_seq[j - 1])
                } else {
                    '-'
                };
                db_row.push(d);
                query_row.push(q);
                marks.push(if op == AlignOp::Match { '|' } else { ' ' });
            }
        }
        (db_row, marks, query_row)
    }
}

/// Query-side differences: 1-based offset within the match plus the query
/// symbol, or `-` where the query has a gap.
fn mutations(m: &LocalMatch, query: &[u8]) -> String {
    let mut out = String::new();
    let mut offset = 0;
    for &(op, n) in &m.ops {
        for _ in 0..n {
            if op.is_error() {
                if !out.is_empty() {
                    out.push(',');
                }
                let symbol = if op.consumes_query() {
                    char::from(query[m.query_begin + offset])
                } else {
                    '-'
                };
                let _ = write!(out, "{}{}", offset + 1, symbol);
            }
            if op.consumes_query() {
                offset += 1;
            }
        }
    }
    out
}

/// FASTA records of every disabled query.
pub fn write_disabled_queries<W: Write>(
    out: &mut W,
    matches: &MatchCollection,
    queries: &[SequenceRecord],
) -> io::Result<usize> {
    let disabled = matches.disabled_queries();
    for &index in &disabled {
        let record = &queries[index];
        writeln!(out, ">{}", record.id)?;
        out.write_all(&record.seq)?;
        writeln!(out)?;
    }
    Ok(disabled.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::run_length;

    fn fixture() -> (Vec<SequenceRecord>, Vec<SequenceRecord>, MatchCollection) {
        let databases = vec![SequenceRecord::new("chr1 assembled", b"TTTTACGTACGTTT".to_vec())];
        let queries = vec![
            SequenceRecord::new("read1", b"ACGAACGT".to_vec()),
            SequenceRecord::new("read2 noisy", b"GGGG".to_vec()),
        ];
        let ops = vec![
            AlignOp::Match,
            AlignOp::Match,
            AlignOp::Match,
            AlignOp::Mismatch,
            AlignOp::Match,
            AlignOp::Match,
            AlignOp::Match,
            AlignOp::Match,
        ];
        let mut collection = MatchCollection::new(2);
        collection.query_mut(0).push(LocalMatch {
            database: 0,
            query: 0,
            strand: Strand::Forward,
            db_begin: 4,
            db_end: 12,
            query_begin: 0,
            query_end: 8,
            ops: run_length(&ops),
            errors: 1,
            score: 5,
        });
        collection.query_mut(1).disable();
        (databases, queries, collection)
    }

    #[test]
    fn test_gff_line() {
        let (databases, queries, collection) = fixture();
        let mut out = Vec::new();
        MatchWriter::new(&databases, &queries, Alphabet::Dna5)
            .write(&mut out, OutputFormat::Gff, &collection)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let fields: Vec<&str> = text.trim_end().split('\t').collect();

        assert_eq!(fields.len(), 9);
        assert_eq!(&fields[..8], &["chr1", "epsmatch", "eps-matches", "5", "12", "87.5000", "+", "."]);
        assert!(fields[8].starts_with("read1;seq2Range=1,8;eValue="));
        assert!(fields[8].ends_with(";cigar=3=1X4=;mutations=4A"));
    }

    #[test]
    fn test_txt_block() {
        let (databases, queries, collection) = fixture();
        let mut out = Vec::new();
        MatchWriter::new(&databases, &queries, Alphabet::Dna5)
            .write(&mut out, OutputFormat::Txt, &collection)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Match 1\n  database: chr1 [5..12] strand +\n"));
        assert!(text.contains("  db     ACGTACGT\n"));
        assert!(text.contains("         ||| ||||\n"));
        assert!(text.contains("  query  ACGAACGT\n"));
    }

    #[test]
    fn test_disabled_queries_fasta() {
        let (_, queries, collection) = fixture();
        let mut out = Vec::new();
        let written = write_disabled_queries(&mut out, &collection, &queries).unwrap();
        assert_eq!(written, 1);
        assert_eq!(String::from_utf8(out).unwrap(), ">read2 noisy\nGGGG\n");
    }
}
