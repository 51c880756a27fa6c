use clap::Parser;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use synvar::align::AlignerConfig;
use synvar::pipeline::{call_variants, load_detector_output, run_detector, write_outputs, CallerConfig, DetectorConfig};
use synvar::sequence::SequenceCatalog;

/// Compare assembled contigs against a reference genome through synteny blocks
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Assembly FASTA file(s)
    #[arg(required = true)]
    assembly: Vec<PathBuf>,

    /// Reference genome FASTA file (repeat for several files)
    #[arg(short = 'r', long = "reference", required = true)]
    reference: Vec<PathBuf>,

    /// Minimum size of a synteny block
    #[arg(short = 'm', long = "min-block-size", default_value_t = 500)]
    min_block_size: u64,

    /// Number of blocks aligned in parallel
    #[arg(
        short = 't',
        long = "threads",
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    threads: usize,

    /// Parameter set used by the block detector ("loose" gives fewer, larger blocks)
    #[arg(short = 's', long = "parameters", default_value = "fine", value_parser = ["loose", "fine"])]
    parameters: String,

    /// Maximum number of iterations during a stage of simplification
    #[arg(short = 'i', long = "max-iterations", default_value_t = 4)]
    max_iterations: u32,

    /// Output file for storing alignments in XMFA format
    #[arg(short = 'a', long = "alignment", default_value = "alignment.xmfa")]
    alignment: PathBuf,

    /// Directory for output files
    #[arg(short = 'o', long = "outdir", default_value = ".")]
    outdir: PathBuf,

    /// Directory for temporary files (kept after the run)
    #[arg(long = "tempdir")]
    tempdir: Option<PathBuf>,

    /// Reuse synteny blocks from an earlier detector run in this directory
    #[arg(long = "blocks-dir")]
    blocks_dir: Option<PathBuf>,

    /// Synteny block detector executable
    #[arg(long = "sibelia", default_value = "Sibelia")]
    sibelia: PathBuf,

    /// LAGAN installation directory
    #[arg(long = "lagan-dir", default_value = "lagan")]
    lagan_dir: PathBuf,

    /// Skip blocks the aligner fails on instead of stopping
    #[arg(long = "keep-going")]
    keep_going: bool,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[arg(short, long, default_value = "0")]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    setup_logger(args.verbose);

    let start = Instant::now();
    if let Err(e) = run(&args) {
        error!("An error occurred: {}", e);
        std::process::exit(1);
    }
    info!("Finished in {:.2?}", start.elapsed());
}

/// Initialize logger based on verbosity
fn setup_logger(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn run(args: &Args) -> synvar::Result<()> {
    fs::create_dir_all(&args.outdir)?;

    let catalog = SequenceCatalog::build(&args.reference, &args.assembly)?;
    info!("Loaded {:?}", catalog);

    // Without --tempdir everything goes to a directory removed when `scoped` drops
    let scoped;
    let work_dir: &Path = match &args.tempdir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => {
            scoped = tempfile::Builder::new()
                .prefix("synvar_")
                .tempdir_in(&args.outdir)?;
            scoped.path()
        }
    };

    let blocks_dir = match &args.blocks_dir {
        Some(dir) => dir.as_path(),
        None => {
            info!("Calculating synteny blocks...");
            let detector = DetectorConfig {
                program: args.sibelia.clone(),
                parameters: args.parameters.clone(),
                max_iterations: args.max_iterations,
                min_block_size: args.min_block_size,
            };
            let genomes: Vec<PathBuf> = args.reference.iter().chain(&args.assembly).cloned().collect();
            run_detector(&detector, &genomes, work_dir)?;
            work_dir
        }
    };
    let detector_output = load_detector_output(blocks_dir)?;

    info!("Performing alignment...");
    let config = CallerConfig {
        min_block_size: args.min_block_size,
        threads: args.threads,
        keep_going: args.keep_going,
        aligner: AlignerConfig::lagan(&args.lagan_dir)?,
    };
    let call_set = call_variants(&catalog, &detector_output, &config, work_dir)?;
    if !call_set.failed_blocks.is_empty() {
        info!("{} blocks could not be aligned", call_set.failed_blocks.len());
    }

    write_outputs(&args.outdir, &args.alignment, &catalog, &call_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_is_rejected() {
        assert!(Args::try_parse_from(["synvar", "-r", "ref.fa", "asm.fa", "-t", "0"]).is_err());
        let args = Args::try_parse_from(["synvar", "-r", "ref.fa", "asm.fa", "-t", "4"]).unwrap();
        assert_eq!(args.threads, 4);
    }
}
