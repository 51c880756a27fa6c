use super::AlignedPair;

/// Match runs shorter than this between two mismatches are folded into a
/// single mismatch segment.
pub const MINIMUM_CONTEXT_SIZE: usize = 30;

/// Half-open run of alignment columns `[start, end)` that either all match
/// or contain the mismatching columns of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub is_match: bool,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub fn segment(pair: &AlignedPair) -> Vec<Segment> {
    segment_with_threshold(pair, MINIMUM_CONTEXT_SIZE)
}

/// Partition `[0, pair.len())` into alternating match/mismatch segments.
///
/// A match run closing at a mismatch is kept only if it is the first run or
/// at least `min_context` columns long; otherwise it is merged, together with
/// the preceding mismatch segment, into the run that follows.
pub fn segment_with_threshold(pair: &AlignedPair, min_context: usize) -> Vec<Segment> {
    if pair.is_empty() {
        return Vec::new();
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut last_match = pair.is_match(0);
    let mut start = 0;

    for column in 1..pair.len() {
        let now_match = pair.is_match(column);
        if now_match == last_match {
            continue;
        }
        if !last_match || column - start >= min_context || start == 0 {
            segments.push(Segment {
                start,
                end: column,
                is_match: last_match,
            });
            start = column;
        } else if let Some(previous) = segments.pop() {
            start = previous.start;
        }
        last_match = now_match;
    }

    segments.push(Segment {
        start,
        end: pair.len(),
        is_match: last_match,
    });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(reference: &str, assembly: &str) -> AlignedPair {
        AlignedPair::new(reference.as_bytes().to_vec(), assembly.as_bytes().to_vec()).unwrap()
    }

    fn seg(start: usize, end: usize, is_match: bool) -> Segment {
        Segment { start, end, is_match }
    }

    fn assert_partition(segments: &[Segment], len: usize) {
        let mut expected_start = 0;
        for s in segments {
            assert_eq!(s.start, expected_start);
            assert!(s.end > s.start);
            expected_start = s.end;
        }
        assert_eq!(expected_start, len);
    }

    #[test]
    fn identical_rows_give_one_match_segment() {
        let segments = segment(&pair("ACGTACGT", "ACGTACGT"));
        assert_eq!(segments, vec![seg(0, 8, true)]);
    }

    #[test]
    fn single_substitution() {
        let segments = segment(&pair("ACGTACGTAC", "ACGAACGTAC"));
        let mismatches: Vec<_> = segments.iter().filter(|s| !s.is_match).collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!((mismatches[0].start, mismatches[0].end), (3, 4));
        assert_partition(&segments, 10);
    }

    #[test]
    fn fuses_mismatches_across_short_match_runs() {
        let assembly = format!("AAXAA{}YY{}ZZ", "A".repeat(10), "A".repeat(40));
        let reference = "A".repeat(assembly.len());
        let segments = segment(&pair(&reference, &assembly));
        assert_eq!(
            segments,
            vec![
                seg(0, 2, true),
                seg(2, 17, false),
                seg(17, 57, true),
                seg(57, 59, false),
            ]
        );
    }

    #[test]
    fn match_run_at_threshold_is_kept() {
        let assembly = format!("X{}Y", "A".repeat(30));
        let reference = "A".repeat(assembly.len());
        let segments = segment(&pair(&reference, &assembly));
        assert_eq!(segments.iter().filter(|s| !s.is_match).count(), 2);
        assert_partition(&segments, assembly.len());
    }

    #[test]
    fn leading_mismatch_absorbs_short_gap() {
        let segments = segment_with_threshold(&pair("AAAAAA", "XAAYAA"), 3);
        assert_eq!(
            segments,
            vec![
                seg(0, 4, false),
                seg(4, 6, true),
            ]
        );
    }

    #[test]
    fn partition_is_exact_for_every_prefix() {
        let reference = b"ACGT-ACGTTTGCA-AGGCTA";
        let assembly = b"ACCTAAC-TTTGGAAAGGCTT";
        for len in 1..=reference.len() {
            let p = AlignedPair::new(reference[..len].to_vec(), assembly[..len].to_vec()).unwrap();
            for threshold in [1, 2, 5, 30] {
                assert_partition(&segment_with_threshold(&p, threshold), len);
            }
        }
    }

    #[test]
    fn empty_alignment_has_no_segments() {
        assert!(segment(&pair("", "")).is_empty());
    }
}
