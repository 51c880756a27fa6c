use std::collections::HashSet;

use super::{BlockGroup, BlockInstance};

/// A block present exactly once on the reference and once on an assembly.
#[derive(Debug, Clone, Copy)]
pub struct UniquePair<'a> {
    pub reference: &'a BlockInstance,
    pub assembly: &'a BlockInstance,
}

/// Decide whether `group` is eligible for variant calling.
///
/// Eligible groups have exactly two instances, one on a reference sequence
/// and one elsewhere, both at least `min_block_size` bases long.
pub fn select_pair<'a>(
    group: &'a BlockGroup,
    reference_ids: &HashSet<String>,
    min_block_size: u64,
) -> Option<UniquePair<'a>> {
    if group.instances.len() != 2 {
        return None;
    }
    let reference = group.instances.iter().find(|i| reference_ids.contains(&i.seq_id))?;
    let assembly = group.instances.iter().find(|i| !reference_ids.contains(&i.seq_id))?;
    if reference.size() < min_block_size || assembly.size() < min_block_size {
        return None;
    }
    Some(UniquePair { reference, assembly })
}
