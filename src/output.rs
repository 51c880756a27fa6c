use std::io::{self, Write};

use crate::align::AlignmentRecord;
use crate::sequence::{write_record, write_wrapped};
use crate::variant::{or_unknown, Variant, UNKNOWN};

pub const VARIANT_REPORT_HEADER: [&str; 7] = [
    "POS",
    "REF_ALLELE",
    "ALT_ALLELE",
    "BLOCK_ID",
    "CONTIG_ID",
    "REF_CONTEXT",
    "ALT_CONTEXT",
];

/// Reduce NCBI-style `gi|123|ref|NC_000913.2|` ids to the bare accession
/// (`NC_000913`); other ids are returned unchanged.
pub fn strip_chr_id(chr_id: &str) -> &str {
    let parts: Vec<&str> = chr_id.split('|').collect();
    if parts.len() == 5 {
        parts[3].split('.').next().unwrap_or(parts[3])
    } else {
        chr_id
    }
}

pub fn write_variant_report<W: Write>(writer: &mut W, variants: &[Variant]) -> io::Result<()> {
    writeln!(writer, "{}", VARIANT_REPORT_HEADER.join("\t"))?;
    for variant in variants {
        writeln!(writer, "{variant}")?;
    }
    Ok(())
}

pub fn write_vcf_header<W: Write>(writer: &mut W, reference_id: &str) -> io::Result<()> {
    writeln!(writer, "##fileformat=VCFv4.1")?;
    writeln!(writer, "##source={} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "##reference={}", strip_chr_id(reference_id))?;
    writeln!(writer, "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">")?;
    writeln!(writer, "##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description=\"Imprecise structural variation\">")?;
    writeln!(
        writer,
        "##INFO=<ID=CIPOS,Number=2,Type=Integer,Description=\"Confidence interval around POS for imprecise variants\">"
    )?;
    writeln!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")
}

pub fn vcf_record(variant: &Variant) -> String {
    let pos = variant
        .reference_pos
        .map_or_else(|| UNKNOWN.to_string(), |p| p.to_string());
    [
        strip_chr_id(or_unknown(variant.reference_chr_id.as_deref())),
        pos.as_str(),
        UNKNOWN,
        or_unknown(variant.reference_allele.as_deref()),
        or_unknown(variant.assembly_allele.as_deref()),
        UNKNOWN,
        UNKNOWN,
        UNKNOWN,
    ]
    .join("\t")
}

pub fn write_variants_vcf<W: Write>(writer: &mut W, variants: &[Variant]) -> io::Result<()> {
    for variant in variants {
        writeln!(writer, "{}", vcf_record(variant))?;
    }
    Ok(())
}

/// Two breakend records per insertion, joining the reference to the inserted
/// contig stretch. The reference side is imprecise over the whole sequence.
pub fn write_insertions_vcf<W: Write>(
    writer: &mut W,
    insertions: &[Variant],
    reference_id: &str,
    reference_bases: &[u8],
) -> io::Result<()> {
    let reference_chr = strip_chr_id(reference_id);
    let ref_allele = reference_bases.first().map_or('N', |&b| b as char);
    let info = format!("IMPRECISE;SVTYPE=BND;CIPOS=0,{}", reference_bases.len());

    for (index, variant) in insertions.iter().enumerate() {
        let contig = &variant.contig_id;
        let assembly_start = variant.assembly_pos.unwrap_or(0) + 1;
        let assembly_end = assembly_start + variant.assembly_allele.as_deref().map_or(0, str::len);
        let start_alt = format!("{ref_allele}[{contig}:{assembly_start}[");
        let end_alt = format!("]{contig}:{assembly_end}]{ref_allele}");
        for (id, alt) in [(index * 2, start_alt), (index * 2 + 1, end_alt)] {
            writeln!(
                writer,
                "{reference_chr}\t1\tbnd_{id}\t{ref_allele}\t{alt}\t{UNKNOWN}\t{UNKNOWN}\t{info}"
            )?;
        }
    }
    Ok(())
}

/// XMFA-like archive: per block one `>chrNum:start-end strand chrId` header and
/// wrapped row per instance, blocks terminated by `=`.
pub fn write_alignments_xmfa<W: Write>(writer: &mut W, blocks: &[Vec<AlignmentRecord>]) -> io::Result<()> {
    for block in blocks {
        for record in block {
            let instance = &record.instance;
            writeln!(
                writer,
                ">{}:{}-{} {} {}",
                instance.seq_index, instance.start, instance.end, instance.strand, instance.seq_id
            )?;
            write_wrapped(writer, &record.body)?;
        }
        writeln!(writer, "=")?;
    }
    Ok(())
}

pub fn write_insertions_fasta<W: Write>(writer: &mut W, insertions: &[Variant]) -> io::Result<()> {
    for variant in insertions {
        let allele = variant.assembly_allele.as_deref().unwrap_or_default();
        let start = variant.assembly_pos.unwrap_or(0) + 1;
        let end = variant.assembly_pos.unwrap_or(0) + allele.len();
        let description = format!("Seq=\"{}\",Start={}\",End={}", variant.contig_id, start, end);
        write_record(writer, &description, allele.as_bytes())?;
    }
    Ok(())
}

pub fn write_insertions_text<W: Write>(writer: &mut W, insertions: &[Variant]) -> io::Result<()> {
    writeln!(writer, "SEQ_ID\tPOS\tFRAGMENT")?;
    for variant in insertions {
        let pos = variant
            .assembly_pos
            .map_or_else(|| UNKNOWN.to_string(), |p| (p + 1).to_string());
        writeln!(
            writer,
            "{}\t{}\t{}",
            variant.contig_id,
            pos,
            or_unknown(variant.assembly_allele.as_deref())
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockInstance, Strand};

    fn snp() -> Variant {
        Variant {
            reference_chr_id: Some("gi|49175990|ref|NC_000913.2|".to_string()),
            reference_pos: Some(104),
            contig_id: "ctg".to_string(),
            assembly_pos: None,
            reference_allele: Some("T".to_string()),
            assembly_allele: Some("A".to_string()),
            reference_context: Some("ACGTA".to_string()),
            assembly_context: Some("ACGAA".to_string()),
            synteny_block_id: Some(2),
        }
    }

    fn text<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn strips_accession_wrapper() {
        assert_eq!(strip_chr_id("gi|49175990|ref|NC_000913.2|"), "NC_000913");
        assert_eq!(strip_chr_id("chr1"), "chr1");
        assert_eq!(strip_chr_id("a|b"), "a|b");
    }

    #[test]
    fn report_has_header_and_rows() {
        let out = text(|w| write_variant_report(w, &[snp()]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "POS\tREF_ALLELE\tALT_ALLELE\tBLOCK_ID\tCONTIG_ID\tREF_CONTEXT\tALT_CONTEXT");
        assert_eq!(lines[1], "104\tT\tA\t2\tctg\tACGTA\tACGAA");
    }

    #[test]
    fn vcf_rows_use_stripped_chromosome() {
        let out = text(|w| {
            write_vcf_header(w, "gi|49175990|ref|NC_000913.2|")?;
            write_variants_vcf(w, &[snp()])
        });
        assert!(out.starts_with("##fileformat=VCFv4.1\n##source=synvar "));
        assert!(out.contains("##reference=NC_000913\n"));
        assert!(out.contains("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"));
        assert!(out.ends_with("NC_000913\t104\t.\tT\tA\t.\t.\t.\n"));
    }

    #[test]
    fn insertions_become_breakend_pairs() {
        let insertion = Variant::insertion("ctg", 9, b"GGG");
        let out = text(|w| write_insertions_vcf(w, &[insertion], "chr", b"ACGTACGT"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "chr\t1\tbnd_0\tA\tA[ctg:10[\t.\t.\tIMPRECISE;SVTYPE=BND;CIPOS=0,8");
        assert_eq!(lines[1], "chr\t1\tbnd_1\tA\t]ctg:13]A\t.\t.\tIMPRECISE;SVTYPE=BND;CIPOS=0,8");
    }

    #[test]
    fn insertion_fasta_and_table() {
        let insertion = Variant::insertion("ctg", 9, b"GGG");
        let fasta = text(|w| write_insertions_fasta(w, std::slice::from_ref(&insertion)));
        assert_eq!(fasta, ">Seq=\"ctg\",Start=10\",End=12\nGGG\n");
        let table = text(|w| write_insertions_text(w, &[insertion]));
        assert_eq!(table, "SEQ_ID\tPOS\tFRAGMENT\nctg\t10\tGGG\n");
    }

    #[test]
    fn xmfa_blocks_are_terminated() {
        let record = AlignmentRecord {
            body: b"AC-GT".to_vec(),
            instance: BlockInstance {
                block_id: 1,
                seq_id: "chr".to_string(),
                seq_index: 1,
                strand: Strand::Reverse,
                start: 10,
                end: 7,
                bases: Vec::new(),
            },
        };
        let out = text(|w| write_alignments_xmfa(w, &[vec![record]]));
        assert_eq!(out, ">1:10-7 - chr\nAC-GT\n=\n");
    }
}
