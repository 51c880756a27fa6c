use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An external program (detector or aligner) exited with a non-zero status
    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Found duplicated sequence id \"{0}\"")]
    DuplicatedSequenceId(String),

    #[error("Sequence \"{0}\" is not present in the sequence table")]
    UnknownSequence(String),

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Malformed alignment for block {block_id}: {message}")]
    MalformedAlignment { block_id: u32, message: String },

    #[error(transparent)]
    Faidx(#[from] rust_htslib::errors::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
