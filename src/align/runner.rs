use log::debug;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{self, Command, Stdio};

use super::{extract_variants, segment, AlignedPair, AlignmentRecord, ExtractionTarget};
use crate::blocks::{select_pair, BlockGroup, BlockInstance};
use crate::error::{Error, Result};
use crate::sequence::{read_records, write_record};
use crate::variant::Variant;

/// An external aligner: `program [args_before...] <fasta files...> [args_after...]`,
/// writing a multi-FASTA alignment to standard output.
#[derive(Debug, Clone)]
pub struct AlignerCommand {
    pub program: PathBuf,
    pub args_before: Vec<OsString>,
    pub args_after: Vec<OsString>,
}

impl AlignerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        AlignerCommand {
            program: program.into(),
            args_before: Vec::new(),
            args_after: Vec::new(),
        }
    }

    pub fn arg_before(mut self, arg: impl Into<OsString>) -> Self {
        self.args_before.push(arg.into());
        self
    }

    pub fn arg_after(mut self, arg: impl Into<OsString>) -> Self {
        self.args_after.push(arg.into());
        self
    }
}

/// Aligners used for unique reference/assembly pairs and for every other
/// block, plus environment variables set on each spawned aligner only.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    pub pairwise: AlignerCommand,
    pub multiple: AlignerCommand,
    pub env: Vec<(OsString, OsString)>,
}

impl AlignerConfig {
    /// LAGAN installed under `lagan_dir`: `lagan.pl ... -mfa` for pairs and
    /// `mlagan` otherwise.
    pub fn lagan(lagan_dir: &Path) -> io::Result<Self> {
        let lagan_dir = std::path::absolute(lagan_dir)?;
        Ok(AlignerConfig {
            pairwise: AlignerCommand::new("perl")
                .arg_before(lagan_dir.join("lagan.pl"))
                .arg_after("-mfa"),
            multiple: AlignerCommand::new(lagan_dir.join("mlagan")),
            env: vec![("LAGAN_DIR".into(), lagan_dir.into_os_string())],
        })
    }
}

/// Everything one block contributes to the run's output.
#[derive(Debug, Clone, Default)]
pub struct BlockResult {
    pub block_id: u32,
    pub variants: Vec<Variant>,
    pub alignments: Vec<AlignmentRecord>,
}

/// Realigns block groups with the external aligner and calls variants on the
/// unique reference/assembly pairs. Each call works in its own scratch
/// directory under `work_dir`, so any number of calls may run at once.
#[derive(Debug)]
pub struct AlignmentRunner {
    config: AlignerConfig,
    work_dir: PathBuf,
    reference_ids: HashSet<String>,
    min_block_size: u64,
}

impl AlignmentRunner {
    pub fn new(
        config: AlignerConfig,
        work_dir: impl Into<PathBuf>,
        reference_ids: HashSet<String>,
        min_block_size: u64,
    ) -> Self {
        AlignmentRunner {
            config,
            work_dir: work_dir.into(),
            reference_ids,
            min_block_size,
        }
    }

    pub fn run(&self, group: &BlockGroup) -> Result<BlockResult> {
        if group.instances.len() < 2 {
            debug!("Block {}: single instance, archived without alignment", group.id);
            return Ok(BlockResult {
                block_id: group.id,
                variants: Vec::new(),
                alignments: group
                    .instances
                    .iter()
                    .map(|instance| AlignmentRecord {
                        body: instance.bases.to_ascii_uppercase(),
                        instance: instance.clone(),
                    })
                    .collect(),
            });
        }

        let pair = select_pair(group, &self.reference_ids, self.min_block_size);
        // Unique pairs go reference first so row 0 of the alignment is the reference
        let instances: Vec<&BlockInstance> = match pair {
            Some(pair) => vec![pair.reference, pair.assembly],
            None => group.instances.iter().collect(),
        };
        let command = if pair.is_some() { &self.config.pairwise } else { &self.config.multiple };

        // Removed on drop, whichever way this function returns
        let scratch = tempfile::Builder::new()
            .prefix(&format!("synvar_{}_{}_", process::id(), group.id))
            .tempdir_in(&self.work_dir)?;

        let mut file_names = Vec::with_capacity(instances.len());
        for (idx, instance) in instances.iter().enumerate() {
            let file_name = format!("{idx}block.fasta");
            let mut writer = BufWriter::new(File::create(scratch.path().join(&file_name))?);
            write_record(&mut writer, &format!("{}:{}", instance.seq_id, instance.start), &instance.bases)?;
            writer.flush()?;
            file_names.push(file_name);
        }

        let alignment_path = scratch.path().join("align.fasta");
        let alignment_file = File::create(&alignment_path)?;
        debug!(
            "Block {}: aligning {} instances with {}",
            group.id,
            instances.len(),
            command.program.display()
        );
        let output = Command::new(&command.program)
            .args(&command.args_before)
            .args(&file_names)
            .args(&command.args_after)
            .envs(self.config.env.iter().map(|(k, v)| (k, v)))
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(alignment_file))
            .stderr(Stdio::piped())
            .output()?;
        if !output.status.success() {
            return Err(Error::ExternalTool {
                tool: format!("{} (block {})", command.program.display(), group.id),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let rows: Vec<Vec<u8>> = read_records(&alignment_path)?
            .into_iter()
            .map(|record| record.bases.to_ascii_uppercase())
            .collect();
        if rows.len() != instances.len() {
            return Err(Error::MalformedAlignment {
                block_id: group.id,
                message: format!("expected {} aligned rows, found {}", instances.len(), rows.len()),
            });
        }

        let variants = match pair {
            Some(pair) => {
                let aligned = AlignedPair::new(rows[0].clone(), rows[1].clone()).ok_or_else(|| {
                    Error::MalformedAlignment {
                        block_id: group.id,
                        message: format!("rows differ in length ({} vs {})", rows[0].len(), rows[1].len()),
                    }
                })?;
                let target = ExtractionTarget {
                    reference_chr_id: &pair.reference.seq_id,
                    contig_id: &pair.assembly.seq_id,
                    reference_start: pair.reference.start,
                    reference_strand: pair.reference.strand,
                    block_id: group.id,
                };
                extract_variants(&aligned, &segment(&aligned), &target)
            }
            None => Vec::new(),
        };
        debug!("Block {}: {} variants", group.id, variants.len());

        let mut alignments: Vec<AlignmentRecord> = rows
            .into_iter()
            .zip(instances)
            .map(|(body, instance)| AlignmentRecord {
                body,
                instance: instance.clone(),
            })
            .collect();
        // Archive rows in the order the block file lists the instances
        if pair.is_some_and(|pair| !std::ptr::eq(pair.reference, &group.instances[0])) {
            alignments.reverse();
        }

        Ok(BlockResult {
            block_id: group.id,
            variants,
            alignments,
        })
    }
}
