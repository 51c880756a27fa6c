use bio::io::fasta;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

/// Width of sequence lines in every FASTA-like file we write.
pub const LINE_LENGTH: usize = 60;

/// A single FASTA record. `id` is the first whitespace-delimited token of the
/// description line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub description: String,
    pub bases: Vec<u8>,
}

/// Open a text file, decompressing it on the fly when it ends in `.gz`/`.bgz`.
pub fn open_reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let name = path.to_string_lossy();
    if name.ends_with(".gz") || name.ends_with(".bgz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse every record of a (possibly gzipped) FASTA file.
pub fn read_records(path: &Path) -> io::Result<Vec<FastaRecord>> {
    parse_records(open_reader(path)?)
}

pub fn parse_records<R: Read>(reader: R) -> io::Result<Vec<FastaRecord>> {
    fasta::Reader::new(reader)
        .records()
        .map(|record| {
            let record = record.map_err(io::Error::other)?;
            let description = match record.desc() {
                Some(desc) => format!("{} {}", record.id(), desc),
                None => record.id().to_string(),
            };
            Ok(FastaRecord {
                id: record.id().to_string(),
                description,
                bases: record.seq().to_vec(),
            })
        })
        .collect()
}

/// Collect the ids of all records in file order.
pub fn scan_ids(path: &Path) -> io::Result<Vec<String>> {
    fasta::Reader::new(open_reader(path)?)
        .records()
        .map(|record| record.map(|r| r.id().to_string()).map_err(io::Error::other))
        .collect()
}

/// Write `text` in lines of `LINE_LENGTH`; `bio`'s FASTA writer puts the
/// whole sequence on one line.
pub fn write_wrapped<W: Write>(writer: &mut W, text: &[u8]) -> io::Result<()> {
    for chunk in text.chunks(LINE_LENGTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

pub fn write_record<W: Write>(writer: &mut W, description: &str, bases: &[u8]) -> io::Result<()> {
    writeln!(writer, ">{description}")?;
    write_wrapped(writer, bases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Cursor;

    #[test]
    fn parses_multiline_records() {
        let text = ">chr1 some description\nACGT\nacgt\n>chr2\nTT\n";
        let records = parse_records(Cursor::new(text)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "chr1");
        assert_eq!(records[0].description, "chr1 some description");
        assert_eq!(records[0].bases, b"ACGTacgt");
        assert_eq!(records[1].id, "chr2");
        assert_eq!(records[1].bases, b"TT");
    }

    #[test]
    fn text_before_first_header_is_an_error() {
        assert!(parse_records(Cursor::new("junk\n>chr1\nACGT\n")).is_err());
    }

    #[test]
    fn wraps_long_sequences() {
        let mut out = Vec::new();
        let bases = vec![b'A'; LINE_LENGTH + 5];
        write_record(&mut out, "x", &bases).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![">x", &"A".repeat(LINE_LENGTH), "AAAAA"]);
    }

    #[test]
    fn reads_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.fasta.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">a\nAC\n>b\nGT\n").unwrap();
        encoder.finish().unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].bases, b"GT");
        assert_eq!(scan_ids(&path).unwrap(), vec!["a", "b"]);
    }
}
