use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 0-based sequence coordinate.
pub type Position = usize;

/// Symbol alphabet of the input sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    Dna,
    #[default]
    Dna5,
    Rna,
    Rna5,
    Protein,
    Char,
}

impl Alphabet {
    pub const ALL: [Alphabet; 6] = [
        Alphabet::Dna,
        Alphabet::Dna5,
        Alphabet::Rna,
        Alphabet::Rna5,
        Alphabet::Protein,
        Alphabet::Char,
    ];

    /// Reverse complement and nucleotide statistics only make sense here.
    pub fn is_nucleotide(self) -> bool {
        matches!(self, Alphabet::Dna | Alphabet::Dna5 | Alphabet::Rna | Alphabet::Rna5)
    }

    /// Symbol excluded from seeds, if the alphabet has one.
    pub fn wildcard(self) -> Option<u8> {
        match self {
            Alphabet::Dna5 | Alphabet::Rna5 => Some(b'N'),
            Alphabet::Protein => Some(b'X'),
            Alphabet::Dna | Alphabet::Rna | Alphabet::Char => None,
        }
    }

    /// Map a raw input byte onto the alphabet.
    pub fn normalize(self, symbol: u8) -> u8 {
        let upper = symbol.to_ascii_uppercase();
        match self {
            Alphabet::Dna => match upper {
                b'A' | b'C' | b'G' | b'T' => upper,
                b'U' => b'T',
                _ => b'A',
            },
            Alphabet::Dna5 => match upper {
                b'A' | b'C' | b'G' | b'T' => upper,
                b'U' => b'T',
                _ => b'N',
            },
            Alphabet::Rna => match upper {
                b'A' | b'C' | b'G' | b'U' => upper,
                b'T' => b'U',
                _ => b'A',
            },
            Alphabet::Rna5 => match upper {
                b'A' | b'C' | b'G' | b'U' => upper,
                b'T' => b'U',
                _ => b'N',
            },
            Alphabet::Protein => {
                if upper.is_ascii_uppercase() && !matches!(upper, b'J' | b'O' | b'U') {
                    upper
                } else if upper == b'*' {
                    upper
                } else {
                    b'X'
                }
            }
            Alphabet::Char => symbol,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Alphabet::Dna => "dna",
            Alphabet::Dna5 => "dna5",
            Alphabet::Rna => "rna",
            Alphabet::Rna5 => "rna5",
            Alphabet::Protein => "protein",
            Alphabet::Char => "char",
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Alphabet::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown alphabet '{}' (expected dna, dna5, rna, rna5, protein or char)", s))
    }
}

/// Orientation of a database sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl From<bool> for Strand {
    fn from(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl From<Strand> for char {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

/// One imported sequence: identifier plus normalised symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Full header line (without the leading '>').
    pub id: String,
    pub seq: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        Self { id: id.into(), seq: seq.into() }
    }

    /// Build a record, normalising every symbol onto `alphabet`.
    pub fn with_alphabet(id: impl Into<String>, raw: &[u8], alphabet: Alphabet) -> Self {
        Self {
            id: id.into(),
            seq: raw.iter().map(|&b| alphabet.normalize(b)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Longest sequence in a set, 0 for an empty set.
pub fn max_length(records: &[SequenceRecord]) -> usize {
    records.iter().map(SequenceRecord::len).max().unwrap_or(0)
}
