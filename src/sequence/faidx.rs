use log::{debug, info};
use rust_htslib::faidx::Reader as FastaReader;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::fasta::scan_ids;
use crate::error::{Error, Result};

pub struct CatalogEntry {
    pub id: String,
    pub bases: Vec<u8>,
    pub is_reference: bool,
}

/// Every genome sequence taking part in the run, keyed by id. Read-only once
/// built.
pub struct SequenceCatalog {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, usize>,
}

impl fmt::Debug for SequenceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceCatalog")
            .field("num_sequences", &self.entries.len())
            .field("num_reference", &self.entries.iter().filter(|e| e.is_reference).count())
            .finish_non_exhaustive()
    }
}

impl SequenceCatalog {
    /// Load every record of the reference and assembly FASTA files.
    pub fn build(reference_files: &[PathBuf], assembly_files: &[PathBuf]) -> Result<Self> {
        let mut reference = Vec::new();
        for path in reference_files {
            reference.extend(load_fasta(path)?);
        }
        let mut assembly = Vec::new();
        for path in assembly_files {
            assembly.extend(load_fasta(path)?);
        }
        Self::from_sequences(reference, assembly)
    }

    pub fn from_sequences(
        reference: Vec<(String, Vec<u8>)>,
        assembly: Vec<(String, Vec<u8>)>,
    ) -> Result<Self> {
        let mut catalog = SequenceCatalog {
            entries: Vec::with_capacity(reference.len() + assembly.len()),
            by_id: HashMap::new(),
        };
        let tagged = reference
            .into_iter()
            .map(|s| (s, true))
            .chain(assembly.into_iter().map(|s| (s, false)));
        for ((id, mut bases), is_reference) in tagged {
            if catalog.by_id.contains_key(&id) {
                return Err(Error::DuplicatedSequenceId(id));
            }
            bases.make_ascii_uppercase();
            catalog.by_id.insert(id.clone(), catalog.entries.len());
            catalog.entries.push(CatalogEntry {
                id,
                bases,
                is_reference,
            });
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn reference_ids(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|e| e.is_reference)
            .map(|e| e.id.clone())
            .collect()
    }

    /// The first reference sequence in load order; it names the VCF reference.
    pub fn first_reference(&self) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.is_reference)
    }
}

/// Read all sequences of a FASTA file through its faidx index, creating the
/// `.fai` next to the file when it is missing.
fn load_fasta(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    // htslib silently drops repeated names while indexing, so look for them first
    let mut seen = HashSet::new();
    for id in scan_ids(path)? {
        if !seen.insert(id.clone()) {
            return Err(Error::DuplicatedSequenceId(id));
        }
    }

    let fai_path = PathBuf::from(format!("{}.fai", path.display()));
    if !fai_path.exists() {
        info!("Creating FASTA index for '{}'...", path.display());
    }
    let reader = FastaReader::from_path(path)?;
    let fai_content = fs::read_to_string(&fai_path)?;

    let mut sequences = Vec::new();
    for (line_idx, line) in fai_content.lines().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let Some(name) = fields.first().map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let length: usize = fields
            .get(1)
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| Error::Parse {
                path: fai_path.clone(),
                line: line_idx + 1,
                message: format!("missing sequence length for '{name}'"),
            })?;
        if length == 0 {
            sequences.push((name.to_string(), Vec::new()));
            continue;
        }
        let raw_seq = reader.fetch_seq(name, 0, length - 1)?;
        let seq_vec = raw_seq.to_vec();
        unsafe { libc::free(raw_seq.as_ptr() as *mut std::ffi::c_void) };
        debug!("Loaded {} ({} bp) from '{}'", name, seq_vec.len(), path.display());
        sequences.push((name.to_string(), seq_vec));
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn seq(id: &str, bases: &str) -> (String, Vec<u8>) {
        (id.to_string(), bases.as_bytes().to_vec())
    }

    #[test]
    fn tags_reference_sequences() {
        let catalog = SequenceCatalog::from_sequences(
            vec![seq("chr", "acgt")],
            vec![seq("ctg1", "GG"), seq("ctg2", "TT")],
        )
        .unwrap();
        assert_eq!(catalog.get("chr").unwrap().bases, b"ACGT");
        assert!(catalog.get("chr").unwrap().is_reference);
        assert!(!catalog.get("ctg2").unwrap().is_reference);
        assert_eq!(catalog.reference_ids(), HashSet::from(["chr".to_string()]));
        assert_eq!(catalog.first_reference().unwrap().id, "chr");
    }

    #[test]
    fn rejects_duplicated_ids_across_genomes() {
        let err = SequenceCatalog::from_sequences(vec![seq("x", "A")], vec![seq("x", "C")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatedSequenceId(id) if id == "x"));
    }

    #[test]
    fn rejects_duplicated_ids_within_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.fa");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, ">a\nACGT\n>a\nTTTT").unwrap();
        drop(file);

        let err = SequenceCatalog::build(&[path], &[]).unwrap_err();
        assert!(matches!(err, Error::DuplicatedSequenceId(_)));
    }

    #[test]
    fn loads_sequences_through_faidx() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.fa");
        let assembly = dir.path().join("asm.fa");
        fs::write(&reference, ">chr1\nACGTACGTAC\nGG\n").unwrap();
        fs::write(&assembly, ">ctg1\nttttcccc\n>ctg2\nA\n").unwrap();

        let catalog = SequenceCatalog::build(&[reference], &[assembly]).unwrap();
        assert_eq!(catalog.get("chr1").unwrap().bases, b"ACGTACGTACGG");
        assert_eq!(catalog.get("ctg1").unwrap().bases, b"TTTTCCCC");
        assert_eq!(catalog.get("ctg2").unwrap().bases, b"A");
        assert_eq!(catalog.entries().count(), 3);
    }
}
