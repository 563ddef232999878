// sequence.rs - Sequence records, FASTA loading, filtering and segmentation

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bio::io::fasta;
use regex::Regex;

/// FASTA file extensions picked up when loading a directory
pub const FASTA_EXTENSIONS: &[&str] = &["fasta", "fa", "fas", "fna"];

/// One input sequence, upper-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            sequence,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Load sequences from a FASTA file (every record) or a directory of FASTA
/// files (first record of each, named after the file stem, files in name order).
pub fn load_sequences(path: &Path) -> Result<Vec<SequenceRecord>, String> {
    if !path.exists() {
        return Err(format!("Input not found: {}", path.display()));
    }

    let records = if path.is_dir() {
        load_directory(path)?
    } else {
        println!("🧬 Loading sequences from file: {}", path.display());
        read_fasta(path)?
    };

    if records.is_empty() {
        return Err(format!("No sequences found in {}", path.display()));
    }
    Ok(records)
}

fn load_directory(dir: &Path) -> Result<Vec<SequenceRecord>, String> {
    println!("🧬 Loading sequences from directory: {}", dir.display());

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|s| s.to_str())
                    .map(|ext| FASTA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(format!("No FASTA files found in directory {}", dir.display()));
    }

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Invalid filename: {}", path.display()))?
            .to_string();

        match read_fasta(&path)?.into_iter().next() {
            Some(first) => records.push(SequenceRecord::new(name, first.sequence)),
            None => log::warn!("{}: no FASTA records, skipped", path.display()),
        }
    }
    Ok(records)
}

fn read_fasta(path: &Path) -> Result<Vec<SequenceRecord>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open FASTA file {}: {}", path.display(), e))?;
    let reader = fasta::Reader::new(BufReader::new(file));

    let mut records = Vec::new();
    for record_result in reader.records() {
        let record = record_result.map_err(|e| format!("Invalid FASTA record in {}: {}", path.display(), e))?;
        records.push(SequenceRecord::new(record.id(), record.seq().to_ascii_uppercase()));
    }

    log::debug!("{}: {} records", path.display(), records.len());
    Ok(records)
}

/// Sequence selection by identifier, built from the CLI filter options
#[derive(Debug, Clone, Default)]
pub struct SequenceFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    pub include_set: Option<HashSet<String>>,
    pub exclude_set: Option<HashSet<String>>,
}

impl SequenceFilter {
    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none() && self.include_set.is_none() && self.exclude_set.is_none()
    }

    /// Include rules must all match, any exclude rule removes the id
    pub fn keeps(&self, id: &str) -> bool {
        self.include.as_ref().map_or(true, |re| re.is_match(id))
            && self.include_set.as_ref().map_or(true, |set| set.contains(id))
            && !self.exclude.as_ref().map_or(false, |re| re.is_match(id))
            && !self.exclude_set.as_ref().map_or(false, |set| set.contains(id))
    }
}

/// Keep the records the filter accepts, preserving order
pub fn filter_records(records: Vec<SequenceRecord>, filter: &SequenceFilter) -> Vec<SequenceRecord> {
    if filter.is_empty() {
        return records;
    }

    let before = records.len();
    let kept: Vec<SequenceRecord> = records.into_iter().filter(|record| filter.keeps(&record.id)).collect();
    log::info!("Sequence filters kept {} of {} sequences", kept.len(), before);
    kept
}

/// Split every record into consecutive bins of `bin_size` symbols.
///
/// A trailing partial bin is dropped. Segment ids are `<id>:<start>-<end>`,
/// 1-based and inclusive.
pub fn segment_sequences(records: &[SequenceRecord], bin_size: usize) -> Result<Vec<SequenceRecord>, String> {
    if bin_size == 0 {
        return Err("Segment size must be at least 1".to_string());
    }

    let mut segments = Vec::new();
    for record in records {
        let whole = record.len() / bin_size;
        if whole == 0 {
            log::warn!(
                "{}: length {} is shorter than the segment size {}, no segments",
                record.id,
                record.len(),
                bin_size
            );
        }
        for (i, chunk) in record.sequence.chunks_exact(bin_size).enumerate() {
            let start = i * bin_size + 1;
            let end = start + bin_size - 1;
            segments.push(SequenceRecord::new(format!("{}:{}-{}", record.id, start, end), chunk.to_vec()));
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kcorr_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_multi_record_file_uppercases() {
        let dir = temp_dir("file");
        let path = dir.join("all.fasta");
        let mut file = File::create(&path).unwrap();
        writeln!(file, ">seq1 first\nacgtNN\nACGT\n>seq2\nTTTT").unwrap();

        let records = load_sequences(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].sequence, b"ACGTNNACGT".to_vec());
        assert_eq!(records[1].sequence, b"TTTT".to_vec());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_directory_sorted_by_name() {
        let dir = temp_dir("dir");
        std::fs::write(dir.join("b.fa"), ">x\nAAAA\n>y\nCCCC\n").unwrap();
        std::fs::write(dir.join("a.fasta"), ">z\nGGGG\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let records = load_sequences(&dir).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(records[1].sequence, b"AAAA".to_vec());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_input() {
        assert!(load_sequences(Path::new("/nonexistent/kcorr/input.fasta")).is_err());
    }

    #[test]
    fn test_filter_records() {
        let records = vec![
            SequenceRecord::new("chr1", b"A".to_vec()),
            SequenceRecord::new("chr2", b"C".to_vec()),
            SequenceRecord::new("chr3", b"T".to_vec()),
            SequenceRecord::new("plasmid", b"G".to_vec()),
        ];
        let filter = SequenceFilter {
            include: Some(Regex::new("^chr").unwrap()),
            exclude: Some(Regex::new("2$").unwrap()),
            exclude_set: Some(["chr3".to_string()].into_iter().collect()),
            ..Default::default()
        };
        let kept = filter_records(records.clone(), &filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "chr1");

        assert_eq!(filter_records(records, &SequenceFilter::default()).len(), 4);
    }

    #[test]
    fn test_segmentation_drops_partial_bin() {
        let records = vec![SequenceRecord::new("s", b"AACCGGT".to_vec())];
        let segments = segment_sequences(&records, 3).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, "s:1-3");
        assert_eq!(segments[0].sequence, b"AAC".to_vec());
        assert_eq!(segments[1].id, "s:4-6");
        assert_eq!(segments[1].sequence, b"CGG".to_vec());
        assert!(segment_sequences(&records, 0).is_err());
    }
}
