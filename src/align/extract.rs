use std::ops::Range;

use super::{AlignedPair, Segment, GAP};
use crate::blocks::Strand;
use crate::sequence::{reverse_complement, without_gaps};
use crate::variant::Variant;

/// Number of alignment columns of flanking context taken on each side of a
/// variant.
pub const CONTEXT_WINDOW: usize = 30;

/// Where an aligned pair sits: the reference instance it was aligned from
/// and the contig on the other side.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionTarget<'a> {
    pub reference_chr_id: &'a str,
    pub contig_id: &'a str,
    pub reference_start: i64,
    pub reference_strand: Strand,
    pub block_id: u32,
}

/// Reference coordinate of every alignment column. Gap columns repeat the
/// coordinate of the next reference base.
pub fn reference_coordinates(row: &[u8], start: i64, strand: Strand) -> Vec<i64> {
    let step = strand.direction();
    let mut position = start;
    row.iter()
        .map(|&symbol| {
            let here = position;
            if symbol != GAP {
                position += step;
            }
            here
        })
        .collect()
}

/// Turn every mismatch segment of `pair` into a variant, in segment order.
pub fn extract_variants(pair: &AlignedPair, segments: &[Segment], target: &ExtractionTarget) -> Vec<Variant> {
    let coordinates = reference_coordinates(pair.reference(), target.reference_start, target.reference_strand);

    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| !segment.is_match)
        .map(|(idx, segment)| {
            let Segment { start, end, .. } = *segment;
            let substitution = end - start == 1 && pair.reference()[start] != GAP && pair.assembly()[start] != GAP;
            // Indels carry the preceding base as an anchor
            let shift = if start == 0 || substitution { 0 } else { 1 };

            let mut reference_allele = without_gaps(&pair.reference()[start - shift..end]);
            let mut assembly_allele = without_gaps(&pair.assembly()[start - shift..end]);
            if target.reference_strand == Strand::Reverse {
                reference_allele = reverse_complement(&reference_allele);
                assembly_allele = reverse_complement(&assembly_allele);
            }

            let (reference_context, assembly_context) = context(pair, segments, idx);
            Variant {
                reference_chr_id: Some(target.reference_chr_id.to_string()),
                reference_pos: Some(coordinates[start] - shift as i64),
                contig_id: target.contig_id.to_string(),
                assembly_pos: None,
                reference_allele: Some(to_upper_string(&reference_allele)),
                assembly_allele: Some(to_upper_string(&assembly_allele)),
                reference_context: Some(reference_context),
                assembly_context: Some(assembly_context),
                synteny_block_id: Some(target.block_id),
            }
        })
        .collect()
}

/// Up to `CONTEXT_WINDOW` columns of the neighbouring segments around
/// `segments[idx]`, gaps removed, for both rows.
fn context(pair: &AlignedPair, segments: &[Segment], idx: usize) -> (String, String) {
    let before: Option<Range<usize>> = idx
        .checked_sub(1)
        .map(|i| segments[i])
        .map(|s| s.end - s.len().min(CONTEXT_WINDOW)..s.end);
    let after: Option<Range<usize>> = segments
        .get(idx + 1)
        .map(|s| s.start..s.start + s.len().min(CONTEXT_WINDOW));
    let own = segments[idx].start..segments[idx].end;

    let build = |row: &[u8]| {
        let mut bases = Vec::new();
        for range in before.iter().chain(std::iter::once(&own)).chain(after.iter()) {
            bases.extend(without_gaps(&row[range.clone()]));
        }
        to_upper_string(&bases)
    };
    (build(pair.reference()), build(pair.assembly()))
}

fn to_upper_string(bases: &[u8]) -> String {
    String::from_utf8_lossy(bases).to_ascii_uppercase()
}
