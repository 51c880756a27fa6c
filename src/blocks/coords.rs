use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;

use super::{BlockCatalog, BlockInstance, Strand};
use crate::error::{Error, Result};
use crate::sequence::open_reader;

/// Numeric sequence index <-> sequence id, as assigned by the detector.
#[derive(Debug, Default, Clone)]
pub struct SequenceTable {
    by_index: BTreeMap<usize, String>,
    by_id: HashMap<String, usize>,
}

impl SequenceTable {
    pub fn insert(&mut self, index: usize, id: String) {
        self.by_id.insert(id.clone(), index);
        self.by_index.insert(index, id);
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn id_of(&self, index: usize) -> Option<&str> {
        self.by_index.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

pub fn read_block_coords(path: &Path) -> Result<(SequenceTable, BlockCatalog)> {
    parse_block_coords(open_reader(path)?, path)
}

/// Parse the detector's coordinate file: a sequence table, then one group per
/// block, groups separated by lines starting with `-`.
///
/// ```text
/// Seq_id  Size    Description
/// 1       5000    chr
/// --------------------------------
/// Block #1
/// Seq_id  Strand  Start   End     Length
/// 1       +       101     600     500
/// ```
///
/// The returned catalog holds coordinates only; instance bases are empty.
pub fn parse_block_coords<R: BufRead>(reader: R, path: &Path) -> Result<(SequenceTable, BlockCatalog)> {
    let parse_error = |line: usize, message: String| Error::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut groups: Vec<Vec<(usize, String)>> = vec![Vec::new()];
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('-') {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push((line_idx + 1, line.to_string()));
        }
    }

    let mut table = SequenceTable::default();
    for (line_no, line) in groups[0].iter().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(parse_error(*line_no, format!("malformed sequence table line '{line}'")));
        }
        let index = fields[0]
            .parse()
            .map_err(|_| parse_error(*line_no, format!("invalid sequence index '{}'", fields[0])))?;
        table.insert(index, fields[2].to_string());
    }

    let mut catalog = BlockCatalog::default();
    for group in groups.iter().skip(1).filter(|g| !g.is_empty()) {
        let (line_no, title) = &group[0];
        let block_id: u32 = title
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.trim_start_matches('#').parse().ok())
            .ok_or_else(|| parse_error(*line_no, format!("expected 'Block #<id>', found '{title}'")))?;

        for (line_no, line) in group.iter().skip(2) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(parse_error(*line_no, format!("malformed block instance line '{line}'")));
            }
            let seq_index: usize = fields[0]
                .parse()
                .map_err(|_| parse_error(*line_no, format!("invalid sequence index '{}'", fields[0])))?;
            let seq_id = table
                .id_of(seq_index)
                .ok_or_else(|| parse_error(*line_no, format!("unknown sequence index {seq_index}")))?
                .to_string();
            let strand = Strand::parse(fields[1])
                .ok_or_else(|| parse_error(*line_no, format!("invalid strand '{}'", fields[1])))?;
            let coord = |s: &str| {
                s.parse::<i64>()
                    .map_err(|_| parse_error(*line_no, format!("invalid coordinate '{s}'")))
            };
            catalog.push(BlockInstance {
                block_id,
                seq_id,
                seq_index,
                strand,
                start: coord(fields[2])?,
                end: coord(fields[3])?,
                bases: Vec::new(),
            });
        }
    }

    Ok((table, catalog))
}
