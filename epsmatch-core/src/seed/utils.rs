//! Shared sequence helpers for seeding and strand handling

use crate::types::Alphabet;

/// Get complement of a single nucleotide under `alphabet`
pub fn complement_nucleotide(nucleotide: u8, alphabet: Alphabet) -> u8 {
    let rna = matches!(alphabet, Alphabet::Rna | Alphabet::Rna5);
    match nucleotide {
        b'A' if rna => b'U',
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        _ => nucleotide, // N and anything unexpected stay as-is
    }
}

/// Generate reverse complement of a sequence
pub fn reverse_complement(sequence: &[u8], alphabet: Alphabet) -> Vec<u8> {
    sequence
        .iter()
        .rev()
        .map(|&nucleotide| complement_nucleotide(nucleotide, alphabet))
        .collect()
}

/// True if `window` contains the alphabet's wildcard symbol
pub fn has_wildcard(window: &[u8], alphabet: Alphabet) -> bool {
    match alphabet.wildcard() {
        Some(w) => window.contains(&w),
        None => false,
    }
}
