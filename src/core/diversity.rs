// diversity.rs - Word richness and optimal word length per sequence

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::core::error::{KcorrError, Result};
use crate::core::words::Alphabet;
use crate::data::SequenceRecord;

/// Richness curve and best word length for one sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalK {
    pub id: String,
    /// Best k; the smallest one on ties
    pub k: usize,
    /// richness[i] is the richness at k = i + 1
    pub richness: Vec<usize>,
}

/// Number of distinct valid k-mers occurring at least twice in `sequence`
pub fn richness(sequence: &[u8], k: usize, alphabet: &Alphabet) -> usize {
    if k == 0 || sequence.len() < k {
        return 0;
    }

    let mut seen: HashMap<&[u8], u32> = HashMap::new();
    for window in sequence.windows(k) {
        if alphabet.accepts(window) {
            *seen.entry(window).or_insert(0) += 1;
        }
    }
    seen.values().filter(|&&count| count >= 2).count()
}

/// Richness for k = 1 .. max_k - 1 and the first k reaching the maximum
pub fn optimal_k_for(id: &str, sequence: &[u8], max_k: usize, alphabet: &Alphabet) -> Result<OptimalK> {
    if max_k < 2 {
        return Err(KcorrError::InvalidParameter(format!(
            "max_k must be at least 2 to scan any word length, got {}",
            max_k
        )));
    }

    let curve: Vec<usize> = (1..max_k).map(|k| richness(sequence, k, alphabet)).collect();

    // Strict comparison keeps the first occurrence of the maximum
    let mut best = 0;
    for (i, &value) in curve.iter().enumerate() {
        if value > curve[best] {
            best = i;
        }
    }

    Ok(OptimalK {
        id: id.to_string(),
        k: best + 1,
        richness: curve,
    })
}

/// Optimal k for every record, in input order
pub fn optimal_k(records: &[SequenceRecord], max_k: usize, alphabet: &Alphabet) -> Result<Vec<OptimalK>> {
    if records.is_empty() {
        return Err(KcorrError::EmptyInput("no sequences to scan for an optimal k".to_string()));
    }

    let results = records
        .par_iter()
        .map(|record| optimal_k_for(&record.id, &record.sequence, max_k, alphabet))
        .collect::<Result<Vec<_>>>()?;

    for result in &results {
        log::debug!("{}: optimal k = {} (richness {:?})", result.id, result.k, result.richness);
    }
    Ok(results)
}
