//! Variant calling between a reference genome and assembled contigs from
//! synteny blocks: each block shared by the reference and one contig is
//! realigned with an external aligner, and the mismatching stretches of the
//! alignment are reported as substitutions, insertions and deletions.

pub mod align;
pub mod blocks;
pub mod coverage;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sequence;
pub mod variant;

pub use error::{Error, Result};
