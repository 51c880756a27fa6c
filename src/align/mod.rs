mod extract;
mod runner;
mod segment;

pub use extract::{extract_variants, reference_coordinates, ExtractionTarget, CONTEXT_WINDOW};
pub use runner::{AlignerCommand, AlignerConfig, AlignmentRunner, BlockResult};
pub use segment::{segment, segment_with_threshold, Segment, MINIMUM_CONTEXT_SIZE};

use crate::blocks::BlockInstance;

/// Gap symbol used by the aligner.
pub const GAP: u8 = b'-';

/// Two rows of a pairwise alignment, reference first. Both rows have the same
/// length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    reference: Vec<u8>,
    assembly: Vec<u8>,
}

impl AlignedPair {
    /// Returns `None` when the rows differ in length.
    pub fn new(reference: Vec<u8>, assembly: Vec<u8>) -> Option<Self> {
        (reference.len() == assembly.len()).then_some(AlignedPair { reference, assembly })
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn assembly(&self) -> &[u8] {
        &self.assembly
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    pub fn is_match(&self, column: usize) -> bool {
        self.reference[column] == self.assembly[column]
    }
}

/// One aligned row together with the block instance it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub body: Vec<u8>,
    pub instance: BlockInstance,
}
