// counter.rs - Sliding-window word counting into dense frequency vectors

use rayon::prelude::*;

use crate::core::error::{KcorrError, Result};
use crate::core::words::{Alphabet, WordSpace, WordSpaceKey};
use crate::data::SequenceRecord;

/// Dense per-sequence word counts aligned to a word space.
///
/// Built once by [`count_words`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyVector {
    id: String,
    key: WordSpaceKey,
    counts: Vec<u64>,
    windows: usize,
    total: u64,
}

impl FrequencyVector {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &WordSpaceKey {
        &self.key
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of candidate windows (sequence length - k + 1, or 0)
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Number of windows that were counted, i.e. the vector sum
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Windows skipped because they contained a non-alphabet character
    pub fn rejected(&self) -> usize {
        self.windows - self.total as usize
    }

    /// Counts as floating point values for the correlation kernels
    pub fn as_f64(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    /// Counts divided by the vector sum; all zeros when nothing was counted
    pub fn relative(&self) -> Vec<f64> {
        if self.total == 0 {
            return vec![0.0; self.counts.len()];
        }
        let total = self.total as f64;
        self.counts.iter().map(|&c| c as f64 / total).collect()
    }
}

/// Count every length-k window of `sequence` into a vector over `space`.
///
/// Windows holding a character outside the alphabet are skipped, unseen
/// words stay at zero.
pub fn count_words(id: &str, sequence: &[u8], space: &WordSpace) -> FrequencyVector {
    let k = space.k();
    let alphabet = space.alphabet();
    let mut counts = vec![0u64; space.len()];
    let windows = if sequence.len() >= k {
        sequence.len() - k + 1
    } else {
        0
    };

    let mut total = 0u64;
    for window in sequence.windows(k) {
        if !alphabet.accepts(window) {
            continue;
        }
        if let Some(position) = space.index_of(window) {
            counts[position] += 1;
            total += 1;
        }
    }

    FrequencyVector {
        id: id.to_string(),
        key: space.key(),
        counts,
        windows,
        total,
    }
}

/// Count every record in parallel, preserving input order
pub fn count_all(records: &[SequenceRecord], space: &WordSpace) -> Vec<FrequencyVector> {
    let vectors: Vec<FrequencyVector> = records
        .par_iter()
        .map(|record| count_words(&record.id, &record.sequence, space))
        .collect();

    for vector in &vectors {
        if vector.rejected() > 0 {
            log::debug!(
                "{}: {} of {} windows skipped (non-alphabet characters)",
                vector.id(),
                vector.rejected(),
                vector.windows()
            );
        }
        if vector.total() == 0 {
            log::warn!(
                "{}: no valid {}-mer windows, its correlations will be undefined",
                vector.id(),
                space.k()
            );
        }
    }

    vectors
}

/// Reject vector sets that do not share one word space
pub fn ensure_same_space(vectors: &[FrequencyVector]) -> Result<()> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };

    for vector in &vectors[1..] {
        if vector.key != first.key || vector.counts.len() != first.counts.len() {
            return Err(KcorrError::MismatchedWordSpace {
                expected: first.key.to_string(),
                found: vector.key.to_string(),
                id: vector.id.clone(),
            });
        }
    }
    Ok(())
}

/// Mean over sequences of log_|alphabet|(length).
///
/// Advisory only: callers decide how to round it into a word length.
pub fn suggest_k(lengths: &[usize], alphabet: &Alphabet) -> Result<f64> {
    if lengths.is_empty() {
        return Err(KcorrError::EmptyInput("no sequences to suggest a word length for".to_string()));
    }
    if alphabet.len() < 2 {
        return Err(KcorrError::InvalidParameter(
            "default word length needs an alphabet of at least 2 symbols".to_string(),
        ));
    }
    if lengths.iter().any(|&l| l == 0) {
        return Err(KcorrError::InvalidParameter(
            "default word length is undefined for empty sequences".to_string(),
        ));
    }

    let base = (alphabet.len() as f64).ln();
    let sum: f64 = lengths.iter().map(|&l| (l as f64).ln() / base).sum();
    Ok(sum / lengths.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna_space(k: usize) -> WordSpace {
        WordSpace::new(Alphabet::dna(), k).unwrap()
    }

    #[test]
    fn test_count_atatat() {
        let space = dna_space(2);
        let vector = count_words("s", b"ATATAT", &space);

        assert_eq!(vector.len(), 16);
        assert_eq!(vector.counts()[space.index_of(b"AT").unwrap()], 3);
        assert_eq!(vector.counts()[space.index_of(b"TA").unwrap()], 2);
        let nonzero = vector.counts().iter().filter(|&&c| c > 0).count();
        assert_eq!(nonzero, 2);
        assert_eq!(vector.total(), 5);
        assert_eq!(vector.windows(), 5);
        assert_eq!(vector.rejected(), 0);
    }

    #[test]
    fn test_invalid_windows_skipped() {
        let space = dna_space(3);
        let vector = count_words("s", b"ACGNACG", &space);

        // ACG, CGN, GNA, NAC, ACG
        assert_eq!(vector.windows(), 5);
        assert_eq!(vector.total(), 2);
        assert_eq!(vector.rejected(), 3);
        assert_eq!(vector.counts()[space.index_of(b"ACG").unwrap()], 2);
    }

    #[test]
    fn test_short_sequence() {
        let space = dna_space(4);
        let vector = count_words("s", b"ACG", &space);
        assert_eq!(vector.windows(), 0);
        assert_eq!(vector.total(), 0);
        assert_eq!(vector.len(), 256);
        assert!(vector.relative().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_relative_frequencies_sum_to_one() {
        let space = dna_space(2);
        let vector = count_words("s", b"ACGTTGCAAGCT", &space);
        let sum: f64 = vector.relative().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_spaces_rejected() {
        let a = count_words("a", b"ACGTACGT", &dna_space(2));
        let b = count_words("b", b"ACGTACGT", &dna_space(3));
        match ensure_same_space(&[a.clone(), b]) {
            Err(KcorrError::MismatchedWordSpace { id, .. }) => assert_eq!(id, "b"),
            other => panic!("expected MismatchedWordSpace, got {:?}", other),
        }
        assert!(ensure_same_space(&[a.clone(), a]).is_ok());
    }

    #[test]
    fn test_suggest_k() {
        let alphabet = Alphabet::dna();
        let k = suggest_k(&[16, 256], &alphabet).unwrap();
        assert!((k - 3.0).abs() < 1e-12);
        assert!(suggest_k(&[], &alphabet).is_err());
        assert!(suggest_k(&[0], &alphabet).is_err());
    }
}
