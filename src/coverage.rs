use log::warn;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::blocks::BlockGroup;
use crate::sequence::SequenceCatalog;

/// Per-base record of which synteny block covers each position of every
/// sequence. `None` marks an uncovered base.
#[derive(Debug)]
pub struct CoverageTracker {
    arrays: HashMap<String, Vec<Option<u32>>>,
}

impl CoverageTracker {
    pub fn new(catalog: &SequenceCatalog) -> Self {
        CoverageTracker {
            arrays: catalog
                .entries()
                .map(|entry| (entry.id.clone(), vec![None; entry.bases.len()]))
                .collect(),
        }
    }

    /// Mark every instance of `group` as covered, provided the block links
    /// the reference to at least one non-reference sequence.
    pub fn update(&mut self, group: &BlockGroup, reference_ids: &HashSet<String>) {
        let on_reference = group
            .instances
            .iter()
            .filter(|i| reference_ids.contains(&i.seq_id))
            .count();
        if on_reference == 0 || on_reference == group.instances.len() {
            return;
        }

        for instance in &group.instances {
            let Some(array) = self.arrays.get_mut(&instance.seq_id) else {
                warn!("Block {} refers to unknown sequence '{}'", group.id, instance.seq_id);
                continue;
            };
            let (start, end) = instance.span();
            if end > array.len() {
                warn!(
                    "Block {} exceeds '{}' ({} > {}), clipping",
                    group.id,
                    instance.seq_id,
                    end,
                    array.len()
                );
            }
            let end = end.min(array.len());
            let start = start.min(end);
            array[start..end].fill(Some(group.id));
        }
    }

    pub fn get(&self, seq_id: &str) -> Option<&[Option<u32>]> {
        self.arrays.get(seq_id).map(Vec::as_slice)
    }

    /// Maximal uncovered stretches of `seq_id` that are at least `min_len`
    /// bases long.
    pub fn uncovered_runs(&self, seq_id: &str, min_len: usize) -> Vec<Range<usize>> {
        let Some(array) = self.arrays.get(seq_id) else {
            return Vec::new();
        };
        let mut runs = Vec::new();
        let mut run_start = None;
        for (pos, cover) in array.iter().enumerate() {
            match (cover, run_start) {
                (None, None) => run_start = Some(pos),
                (Some(_), Some(start)) => {
                    runs.push(start..pos);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            runs.push(start..array.len());
        }
        runs.retain(|r| r.len() >= min_len.max(1));
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockInstance, Strand};

    fn catalog() -> SequenceCatalog {
        SequenceCatalog::from_sequences(
            vec![("chr".to_string(), vec![b'A'; 20])],
            vec![("ctg".to_string(), vec![b'C'; 12]), ("ctg2".to_string(), vec![b'G'; 5])],
        )
        .unwrap()
    }

    fn instance(seq_id: &str, strand: Strand, start: i64, end: i64) -> BlockInstance {
        BlockInstance {
            block_id: 4,
            seq_id: seq_id.to_string(),
            seq_index: 0,
            strand,
            start,
            end,
            bases: Vec::new(),
        }
    }

    fn refs() -> HashSet<String> {
        HashSet::from(["chr".to_string()])
    }

    #[test]
    fn marks_reference_and_assembly_spans() {
        let mut coverage = CoverageTracker::new(&catalog());
        let group = BlockGroup {
            id: 4,
            instances: vec![
                instance("chr", Strand::Forward, 3, 8),
                instance("ctg", Strand::Reverse, 10, 5),
            ],
        };
        coverage.update(&group, &refs());

        let chr = coverage.get("chr").unwrap();
        assert_eq!(chr.len(), 20);
        assert_eq!(chr[1], None);
        assert!(chr[2..8].iter().all(|c| *c == Some(4)));
        assert_eq!(chr[8], None);

        let ctg = coverage.get("ctg").unwrap();
        assert!(ctg[4..10].iter().all(|c| *c == Some(4)));
        assert_eq!(coverage.uncovered_runs("ctg", 1), vec![0..4, 10..12]);
        assert_eq!(coverage.uncovered_runs("ctg", 3), vec![0..4]);
    }

    #[test]
    fn single_sided_blocks_do_not_count() {
        let mut coverage = CoverageTracker::new(&catalog());
        let reference_only = BlockGroup {
            id: 1,
            instances: vec![instance("chr", Strand::Forward, 1, 5), instance("chr", Strand::Forward, 10, 14)],
        };
        let assembly_only = BlockGroup {
            id: 2,
            instances: vec![instance("ctg", Strand::Forward, 1, 5), instance("ctg2", Strand::Forward, 1, 5)],
        };
        coverage.update(&reference_only, &refs());
        coverage.update(&assembly_only, &refs());
        assert!(coverage.get("chr").unwrap().iter().all(Option::is_none));
        assert_eq!(coverage.uncovered_runs("ctg2", 1), vec![0..5]);
    }

    #[test]
    fn lengths_survive_out_of_range_blocks() {
        let mut coverage = CoverageTracker::new(&catalog());
        let group = BlockGroup {
            id: 7,
            instances: vec![instance("chr", Strand::Forward, 15, 40), instance("ctg2", Strand::Forward, 1, 9)],
        };
        coverage.update(&group, &refs());
        assert_eq!(coverage.get("chr").unwrap().len(), 20);
        assert_eq!(coverage.get("ctg2").unwrap().len(), 5);
        assert_eq!(coverage.get("chr").unwrap()[19], Some(7));
    }
}
