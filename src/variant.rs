use std::fmt;

/// Printed in place of a value that is not known for a variant.
pub const UNKNOWN: &str = ".";

/// A substitution, insertion or deletion between the reference and a contig.
///
/// `None` always means "unknown"; an allele of `Some("")` is a real empty
/// allele (e.g. a deletion at the left edge of an alignment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub reference_chr_id: Option<String>,
    pub reference_pos: Option<i64>,
    pub contig_id: String,
    pub assembly_pos: Option<usize>,
    pub reference_allele: Option<String>,
    pub assembly_allele: Option<String>,
    pub reference_context: Option<String>,
    pub assembly_context: Option<String>,
    pub synteny_block_id: Option<u32>,
}

impl Variant {
    /// Contig stretch not covered by any reference-anchored block.
    /// `assembly_pos` is 0-based.
    pub fn insertion(contig_id: &str, assembly_pos: usize, bases: &[u8]) -> Self {
        Variant {
            reference_chr_id: None,
            reference_pos: None,
            contig_id: contig_id.to_string(),
            assembly_pos: Some(assembly_pos),
            reference_allele: None,
            assembly_allele: Some(String::from_utf8_lossy(bases).to_ascii_uppercase()),
            reference_context: None,
            assembly_context: None,
            synteny_block_id: None,
        }
    }

    pub fn sort_key(&self) -> (Option<&str>, Option<i64>) {
        (self.reference_chr_id.as_deref(), self.reference_pos)
    }
}

pub(crate) fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or(UNKNOWN)
}

/// Row of the tab-delimited variant report:
/// POS, REF_ALLELE, ALT_ALLELE, BLOCK_ID, CONTIG_ID, REF_CONTEXT, ALT_CONTEXT.
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.reference_pos.map_or_else(|| UNKNOWN.to_string(), |p| p.to_string());
        let block = self.synteny_block_id.map_or_else(|| UNKNOWN.to_string(), |b| b.to_string());
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            pos,
            or_unknown(self.reference_allele.as_deref()),
            or_unknown(self.assembly_allele.as_deref()),
            block,
            self.contig_id,
            or_unknown(self.reference_context.as_deref()),
            or_unknown(self.assembly_context.as_deref()),
        )
    }
}
