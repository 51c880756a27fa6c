use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::align::{AlignerConfig, AlignmentRecord, AlignmentRunner, BlockResult};
use crate::blocks::{read_block_coords, BlockCatalog, SequenceTable};
use crate::coverage::CoverageTracker;
use crate::error::{Error, Result};
use crate::output;
use crate::sequence::{read_records, SequenceCatalog};
use crate::variant::Variant;

/// Block sequences written by the detector into its output directory.
pub const BLOCKS_FILE: &str = "blocks_sequences.fasta";

/// How to invoke the synteny block detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub program: PathBuf,
    pub parameters: String,
    pub max_iterations: u32,
    pub min_block_size: u64,
}

#[derive(Debug, Clone)]
pub struct CallerConfig {
    pub min_block_size: u64,
    pub threads: usize,
    /// Drop blocks whose alignment fails instead of aborting the run
    pub keep_going: bool,
    pub aligner: AlignerConfig,
}

/// Parsed detector output: the sequence table, block coordinates and the
/// block instances with their bases.
#[derive(Debug)]
pub struct DetectorOutput {
    pub table: SequenceTable,
    pub coordinates: BlockCatalog,
    pub blocks: BlockCatalog,
}

#[derive(Debug, Default)]
pub struct CallSet {
    pub variants: Vec<Variant>,
    pub insertions: Vec<Variant>,
    pub alignments: Vec<Vec<AlignmentRecord>>,
    pub failed_blocks: Vec<u32>,
}

pub fn run_detector(config: &DetectorConfig, genomes: &[PathBuf], out_dir: &Path) -> Result<()> {
    debug!("Running {} on {} genome files", config.program.display(), genomes.len());
    let output = Command::new(&config.program)
        .args(genomes)
        .args(["-q", "--correctboundaries", "--nopostprocess", "--allstages", "--lastk", "30"])
        .arg("-m")
        .arg(config.min_block_size.to_string())
        .arg("-o")
        .arg(out_dir)
        .arg("-s")
        .arg(&config.parameters)
        .arg("-i")
        .arg(config.max_iterations.to_string())
        .arg("-r")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;
    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: config.program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn is_coords_file(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("blocks_coords") else {
        return false;
    };
    let rest = rest.strip_suffix(".gz").unwrap_or(rest);
    rest.strip_suffix(".txt")
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_digit()))
}

fn find_in(dir: &Path, candidates: &[PathBuf], what: &str) -> Result<PathBuf> {
    candidates.iter().find(|p| p.exists()).cloned().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {what} found in '{}'", dir.display()),
        ))
    })
}

/// Read the detector's coordinate file and block sequences from `dir`.
/// With several `blocks_coords*.txt` files the first by name is used.
pub fn load_detector_output(dir: &Path) -> Result<DetectorOutput> {
    let mut coords_files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_coords_file))
        .map(|entry| entry.path())
        .collect();
    coords_files.sort();
    let coords_path = find_in(dir, &coords_files, "blocks_coords*.txt")?;
    let blocks_path = find_in(
        dir,
        &[dir.join(BLOCKS_FILE), dir.join(format!("{BLOCKS_FILE}.gz"))],
        BLOCKS_FILE,
    )?;

    let (table, coordinates) = read_block_coords(&coords_path)?;
    let blocks = BlockCatalog::from_records(read_records(&blocks_path)?, &table, &blocks_path)?;
    info!(
        "Loaded {} sequences and {} synteny blocks from '{}'",
        table.len(),
        blocks.len(),
        dir.display()
    );
    if coordinates.len() != blocks.len() {
        warn!(
            "{} lists {} blocks but {} has sequences for {}",
            coords_path.display(),
            coordinates.len(),
            blocks_path.display(),
            blocks.len()
        );
    }
    Ok(DetectorOutput {
        table,
        coordinates,
        blocks,
    })
}

/// Realign every block in parallel, call variants on the unique pairs and
/// derive insertions from assembly stretches no block covers.
pub fn call_variants(
    catalog: &SequenceCatalog,
    detector: &DetectorOutput,
    config: &CallerConfig,
    work_dir: &Path,
) -> Result<CallSet> {
    let reference_ids = catalog.reference_ids();
    let runner = AlignmentRunner::new(
        config.aligner.clone(),
        work_dir,
        reference_ids.clone(),
        config.min_block_size,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let groups = detector.blocks.groups();
    let mut call_set = CallSet::default();
    let results: Vec<BlockResult> = if config.keep_going {
        let results: Vec<Result<BlockResult>> =
            pool.install(|| groups.par_iter().map(|group| runner.run(group)).collect());
        let mut succeeded = Vec::with_capacity(results.len());
        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(block) => succeeded.push(block),
                Err(e) => {
                    warn!("Skipping block {}: {}", group.id, e);
                    call_set.failed_blocks.push(group.id);
                }
            }
        }
        succeeded
    } else {
        // Collecting into a Result stops handing out blocks after the first failure
        pool.install(|| groups.par_iter().map(|group| runner.run(group)).collect::<Result<_>>())?
    };
    for block in results {
        call_set.variants.extend(block.variants);
        call_set.alignments.push(block.alignments);
    }

    let mut coverage = CoverageTracker::new(catalog);
    for group in detector.coordinates.groups() {
        coverage.update(group, &reference_ids);
    }
    let min_insertion = usize::try_from(config.min_block_size).unwrap_or(usize::MAX);
    for entry in catalog.entries().filter(|e| !e.is_reference) {
        for run in coverage.uncovered_runs(&entry.id, min_insertion) {
            call_set
                .insertions
                .push(Variant::insertion(&entry.id, run.start, &entry.bases[run]));
        }
    }

    info!(
        "Called {} variants and {} insertions from {} blocks",
        call_set.variants.len(),
        call_set.insertions.len(),
        call_set.alignments.len()
    );
    Ok(call_set)
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    debug!("Writing {}", path.display());
    Ok(BufWriter::new(File::create(path)?))
}

/// Write all reports of `call_set` into `out_dir`.
pub fn write_outputs(
    out_dir: &Path,
    alignment_file: &Path,
    catalog: &SequenceCatalog,
    call_set: &CallSet,
) -> Result<()> {
    let mut variants = call_set.variants.clone();
    variants.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut writer = create_output(&out_dir.join("variants.txt"))?;
    output::write_variant_report(&mut writer, &variants)?;
    writer.flush()?;

    match catalog.first_reference() {
        Some(reference) => {
            let mut writer = create_output(&out_dir.join("variants.vcf"))?;
            output::write_vcf_header(&mut writer, &reference.id)?;
            output::write_variants_vcf(&mut writer, &variants)?;
            writer.flush()?;

            let mut writer = create_output(&out_dir.join("insertions.vcf"))?;
            output::write_vcf_header(&mut writer, &reference.id)?;
            output::write_insertions_vcf(&mut writer, &call_set.insertions, &reference.id, &reference.bases)?;
            writer.flush()?;
        }
        None => warn!("No reference sequence loaded, skipping VCF output"),
    }

    let mut writer = create_output(&out_dir.join("insertions.fasta"))?;
    output::write_insertions_fasta(&mut writer, &call_set.insertions)?;
    writer.flush()?;

    let mut writer = create_output(&out_dir.join("insertions.txt"))?;
    output::write_insertions_text(&mut writer, &call_set.insertions)?;
    writer.flush()?;

    let mut writer = create_output(&out_dir.join(alignment_file))?;
    output::write_alignments_xmfa(&mut writer, &call_set.alignments)?;
    writer.flush()?;
    Ok(())
}
