mod coords;
mod select;

pub use coords::{parse_block_coords, read_block_coords, SequenceTable};
pub use select::{select_pair, UniquePair};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::sequence::FastaRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }

    /// Step taken along the sequence for each aligned base.
    pub fn direction(self) -> i64 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        })
    }
}

/// One occurrence of a synteny block on one sequence. `start`/`end` are the
/// detector's 1-based inclusive coordinates; on the reverse strand `start`
/// may be the larger of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInstance {
    pub block_id: u32,
    pub seq_id: String,
    pub seq_index: usize,
    pub strand: Strand,
    pub start: i64,
    pub end: i64,
    pub bases: Vec<u8>,
}

impl BlockInstance {
    pub fn size(&self) -> u64 {
        (self.end - self.start).unsigned_abs() + 1
    }

    /// 0-based half-open span on the sequence, smaller coordinate first.
    pub fn span(&self) -> (usize, usize) {
        let low = self.start.min(self.end).max(1);
        let high = self.start.max(self.end).max(0);
        ((low - 1) as usize, high as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGroup {
    pub id: u32,
    pub instances: Vec<BlockInstance>,
}

/// Synteny block instances grouped by block id, in discovery order.
#[derive(Debug, Default)]
pub struct BlockCatalog {
    groups: Vec<BlockGroup>,
    by_id: HashMap<u32, usize>,
}

impl BlockCatalog {
    pub fn push(&mut self, instance: BlockInstance) {
        match self.by_id.get(&instance.block_id) {
            Some(&idx) => self.groups[idx].instances.push(instance),
            None => {
                self.by_id.insert(instance.block_id, self.groups.len());
                self.groups.push(BlockGroup {
                    id: instance.block_id,
                    instances: vec![instance],
                });
            }
        }
    }

    pub fn groups(&self) -> &[BlockGroup] {
        &self.groups
    }

    pub fn get(&self, block_id: u32) -> Option<&BlockGroup> {
        self.by_id.get(&block_id).map(|&idx| &self.groups[idx])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Build the catalog from the detector's block-sequence FASTA, whose
    /// descriptions carry `Seq=..,Strand=..,Block_id=..,Start=..,End=..`.
    pub fn from_records(records: Vec<FastaRecord>, table: &SequenceTable, path: &Path) -> Result<Self> {
        let mut catalog = BlockCatalog::default();
        for (record_idx, record) in records.into_iter().enumerate() {
            let header = parse_block_header(&record.description).map_err(|message| Error::Parse {
                path: path.to_path_buf(),
                line: record_idx + 1,
                message,
            })?;
            let seq_index = table
                .index_of(&header.seq_id)
                .ok_or_else(|| Error::UnknownSequence(header.seq_id.clone()))?;
            catalog.push(BlockInstance {
                block_id: header.block_id,
                seq_id: header.seq_id,
                seq_index,
                strand: header.strand,
                start: header.start,
                end: header.end,
                bases: record.bases,
            });
        }
        Ok(catalog)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub seq_id: String,
    pub strand: Strand,
    pub block_id: u32,
    pub start: i64,
    pub end: i64,
}

/// Parse a block-sequence description line into its key=value fields.
/// Values may be wrapped in single or double quotes.
pub fn parse_block_header(description: &str) -> std::result::Result<BlockHeader, String> {
    let mut fields = HashMap::new();
    for item in description.split(',') {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, found '{item}'"))?;
        let value: String = value.chars().filter(|&c| c != '\'' && c != '"').collect();
        fields.insert(key.trim(), value);
    }

    let get = |key: &str| {
        fields
            .get(key)
            .map(|v| v.trim())
            .ok_or_else(|| format!("missing '{key}' in '{description}'"))
    };
    let number = |key: &str| -> std::result::Result<i64, String> {
        let value = get(key)?;
        value.parse().map_err(|_| format!("invalid {key} '{value}'"))
    };

    let strand = get("Strand")?;
    Ok(BlockHeader {
        seq_id: get("Seq")?.to_string(),
        strand: Strand::parse(strand).ok_or_else(|| format!("invalid strand '{strand}'"))?,
        block_id: u32::try_from(number("Block_id")?).map_err(|e| format!("invalid Block_id: {e}"))?,
        start: number("Start")?,
        end: number("End")?,
    })
}
