mod faidx;
mod fasta;

// Re-export public API
pub use faidx::{CatalogEntry, SequenceCatalog};
pub use fasta::{open_reader, parse_records, read_records, write_record, write_wrapped, FastaRecord, LINE_LENGTH};

/// Returns the reverse complement of a DNA sequence. Symbols other than
/// A/C/G/T (gaps, N, IUPAC codes) are kept as they are.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&c| match c {
            b'A' => b'T',
            b'T' => b'A',
            b'G' => b'C',
            b'C' => b'G',
            _ => c,
        })
        .collect()
}

/// Copy of `seq` with gap columns removed.
pub fn without_gaps(seq: &[u8]) -> Vec<u8> {
    seq.iter().copied().filter(|&c| c != b'-').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_complement_passes_unknown_symbols() {
        assert_eq!(reverse_complement(b"AACGTN-"), b"-NACGTT");
    }

    #[test]
    fn reverse_complement_round_trips() {
        let allele = b"GATTACA".to_vec();
        assert_eq!(reverse_complement(&reverse_complement(&allele)), allele);
    }

    #[test]
    fn strips_gaps() {
        assert_eq!(without_gaps(b"A--C-G"), b"ACG");
    }
}
