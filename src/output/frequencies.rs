// frequencies.rs - Per-word relative frequency table

use std::io::Write;

use crate::core::{FrequencyVector, WordSpace};
use crate::output::create_writer;

/// Tab-delimited table with one row per word in word-space order and one
/// column per sequence. Values are count / vector sum, 0 for empty vectors.
pub fn write_frequencies<W: Write>(writer: W, space: &WordSpace, vectors: &[FrequencyVector]) -> Result<(), String> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    let mut header = vec!["word".to_string()];
    header.extend(vectors.iter().map(|v| v.id().to_string()));
    csv_writer
        .write_record(&header)
        .map_err(|e| format!("Failed to write frequency header: {}", e))?;

    let relative: Vec<Vec<f64>> = vectors.iter().map(|v| v.relative()).collect();
    for (position, word) in space.words().enumerate() {
        let mut record = vec![String::from_utf8_lossy(word).into_owned()];
        record.extend(relative.iter().map(|column| format!("{:.6}", column[position])));
        csv_writer
            .write_record(&record)
            .map_err(|e| format!("Failed to write frequency row: {}", e))?;
    }

    csv_writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Write the frequency table to a file
pub fn write_frequency_table(file_path: &str, space: &WordSpace, vectors: &[FrequencyVector]) -> Result<(), String> {
    let writer = create_writer(file_path)?;
    write_frequencies(writer, space, vectors)?;
    println!(
        "✅ Word frequencies written to: {} ({} words x {} sequences)",
        file_path,
        space.len(),
        vectors.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{count_words, Alphabet};

    #[test]
    fn test_frequency_table() {
        let space = WordSpace::new(Alphabet::dna(), 1).unwrap();
        let vectors = vec![count_words("s1", b"AATG", &space), count_words("s2", b"NN", &space)];
        let mut buffer = Vec::new();
        write_frequencies(&mut buffer, &space, &vectors).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "word\ts1\ts2");
        assert_eq!(lines[1], "A\t0.500000\t0.000000");
        assert_eq!(lines[2], "T\t0.250000\t0.000000");
        assert_eq!(lines[3], "C\t0.000000\t0.000000");
        assert_eq!(lines[4], "G\t0.250000\t0.000000");
    }
}
