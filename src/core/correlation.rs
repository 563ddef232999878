// correlation.rs - Pearson, Spearman and Kendall correlation matrices

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::counter::{ensure_same_space, FrequencyVector};
use crate::core::error::{KcorrError, Result};
use crate::core::progress_bar;

/// Correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Spearman,
    Kendall,
    Pearson,
}

impl Method {
    /// Layer order used when every method is requested
    pub const ALL: [Method; 3] = [Method::Spearman, Method::Kendall, Method::Pearson];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Spearman => "spearman",
            Method::Kendall => "kendall",
            Method::Pearson => "pearson",
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Method::Spearman => "S",
            Method::Kendall => "T",
            Method::Pearson => "P",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which coefficients to compute: one, or all three in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MethodSelector {
    Single(Method),
    All,
}

impl MethodSelector {
    pub fn methods(&self) -> Vec<Method> {
        match self {
            MethodSelector::Single(method) => vec![*method],
            MethodSelector::All => Method::ALL.to_vec(),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            MethodSelector::Single(method) => method.token(),
            MethodSelector::All => "ALL",
        }
    }

    pub fn description(&self) -> String {
        match self {
            MethodSelector::Single(method) => method.name().to_string(),
            MethodSelector::All => "spearman + kendall + pearson".to_string(),
        }
    }
}

impl FromStr for MethodSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "P" | "PEARSON" => Ok(MethodSelector::Single(Method::Pearson)),
            "S" | "SPEARMAN" => Ok(MethodSelector::Single(Method::Spearman)),
            "T" | "KENDALL" => Ok(MethodSelector::Single(Method::Kendall)),
            "ALL" => Ok(MethodSelector::All),
            _ => Err(format!(
                "Invalid correlation method: {}. Use: P (Pearson), S (Spearman), T (Kendall), ALL",
                s
            )),
        }
    }
}

impl TryFrom<String> for MethodSelector {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodSelector> for String {
    fn from(selector: MethodSelector) -> Self {
        selector.token().to_string()
    }
}

// ---------------------------------------------------------------------------
// Kernels. All return NaN when a coefficient is undefined (zero variance or
// fewer than two observations).
// ---------------------------------------------------------------------------

/// Pearson product-moment correlation
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// 1-based ranks, ties receive the average of the ranks they span
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share ranks start+1 ..= end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall tau-b, O(n log n) via Knight's merge-sort algorithm
pub fn kendall(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]).then(y[a].total_cmp(&y[b])));

    let mut x_ties = 0u64;
    let mut joint_ties = 0u64;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && x[order[end]] == x[order[start]] {
            end += 1;
        }
        x_ties += tie_pairs(end - start);

        let mut inner = start;
        while inner < end {
            let mut stop = inner + 1;
            while stop < end && y[order[stop]] == y[order[inner]] {
                stop += 1;
            }
            joint_ties += tie_pairs(stop - inner);
            inner = stop;
        }
        start = end;
    }

    let mut ys: Vec<f64> = order.iter().map(|&i| y[i]).collect();
    let mut buffer = vec![0.0; n];
    let discordant = merge_count_inversions(&mut ys, &mut buffer);

    let mut y_ties = 0u64;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && ys[end] == ys[start] {
            end += 1;
        }
        y_ties += tie_pairs(end - start);
        start = end;
    }

    let total = tie_pairs(n);
    let x_untied = (total - x_ties) as f64;
    let y_untied = (total - y_ties) as f64;
    if x_untied == 0.0 || y_untied == 0.0 {
        return f64::NAN;
    }

    let balance = total as f64 - x_ties as f64 - y_ties as f64 + joint_ties as f64
        - 2.0 * discordant as f64;
    (balance / (x_untied * y_untied).sqrt()).clamp(-1.0, 1.0)
}

#[inline]
fn tie_pairs(size: usize) -> u64 {
    let size = size as u64;
    size * size.saturating_sub(1) / 2
}

/// Sorts `values` ascending and returns the number of strictly inverted pairs
fn merge_count_inversions(values: &mut [f64], buffer: &mut [f64]) -> u64 {
    let n = values.len();
    if n < 2 {
        return 0;
    }
    let mid = n / 2;
    let mut swaps = {
        let (left, right) = values.split_at_mut(mid);
        let (left_buf, right_buf) = buffer.split_at_mut(mid);
        merge_count_inversions(left, left_buf) + merge_count_inversions(right, right_buf)
    };

    let (mut i, mut j, mut out) = (0, mid, 0);
    while i < mid && j < n {
        if values[i] <= values[j] {
            buffer[out] = values[i];
            i += 1;
        } else {
            buffer[out] = values[j];
            swaps += (mid - i) as u64;
            j += 1;
        }
        out += 1;
    }
    buffer[out..out + (mid - i)].copy_from_slice(&values[i..mid]);
    out += mid - i;
    buffer[out..out + (n - j)].copy_from_slice(&values[j..n]);
    values.copy_from_slice(&buffer[..n]);
    swaps
}

/// Values of one vector plus its ranks when Spearman is requested, so ranks
/// are computed once per vector rather than once per pair.
#[derive(Debug, Clone)]
pub struct PreparedVector {
    values: Vec<f64>,
    ranks: Option<Vec<f64>>,
}

impl PreparedVector {
    pub fn new(values: Vec<f64>, methods: &[Method]) -> Self {
        let ranks = methods
            .contains(&Method::Spearman)
            .then(|| average_ranks(&values));
        Self { values, ranks }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Every requested coefficient for one pair, in `methods` order
pub fn correlate_prepared(x: &PreparedVector, y: &PreparedVector, methods: &[Method]) -> Vec<f64> {
    methods
        .iter()
        .map(|method| match method {
            Method::Pearson => pearson(&x.values, &y.values),
            Method::Kendall => kendall(&x.values, &y.values),
            Method::Spearman => match (&x.ranks, &y.ranks) {
                (Some(rx), Some(ry)) => pearson(rx, ry),
                _ => spearman(&x.values, &y.values),
            },
        })
        .collect()
}

/// Every requested coefficient for one pair of raw vectors
pub fn correlate(x: &[f64], y: &[f64], methods: &[Method]) -> Vec<f64> {
    let px = PreparedVector::new(x.to_vec(), methods);
    let py = PreparedVector::new(y.to_vec(), methods);
    correlate_prepared(&px, &py, methods)
}

/// How a consumer should read one matrix cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrelationEntry {
    /// Self-correlation of a well-defined vector
    Diagonal(f64),
    Value(f64),
    /// Zero-variance input: the coefficient does not exist
    Undefined,
}

/// One N×N symmetric matrix for a single method, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationLayer {
    pub method: Method,
    size: usize,
    values: Vec<f64>,
}

impl CorrelationLayer {
    fn new(method: Method, size: usize) -> Self {
        Self {
            method,
            size,
            values: vec![f64::NAN; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn entry(&self, i: usize, j: usize) -> CorrelationEntry {
        let value = self.get(i, j);
        if value.is_nan() {
            CorrelationEntry::Undefined
        } else if i == j {
            CorrelationEntry::Diagonal(value)
        } else {
            CorrelationEntry::Value(value)
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// NaN-aware symmetry check
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| {
            (0..i).all(|j| {
                let (a, b) = (self.get(i, j), self.get(j, i));
                a == b || (a.is_nan() && b.is_nan())
            })
        })
    }
}

/// Stack of one or three correlation layers over the same sequences
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub ids: Vec<String>,
    pub selector: MethodSelector,
    pub layers: Vec<CorrelationLayer>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn layer(&self, method: Method) -> Option<&CorrelationLayer> {
        self.layers.iter().find(|layer| layer.method == method)
    }

    pub fn get(&self, method: Method, i: usize, j: usize) -> Option<f64> {
        self.layer(method).map(|layer| layer.get(i, j))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// Number of undefined off-diagonal pairs per layer
    pub fn undefined_pairs(&self) -> Vec<(Method, usize)> {
        self.layers
            .iter()
            .map(|layer| {
                let count = (0..layer.size)
                    .flat_map(|i| (0..i).map(move |j| (i, j)))
                    .filter(|&(i, j)| layer.get(i, j).is_nan())
                    .count();
                (layer.method, count)
            })
            .collect()
    }
}

/// Builds correlation matrices from frequency vectors
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    selector: MethodSelector,
}

impl CorrelationEngine {
    pub fn new(selector: MethodSelector) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> MethodSelector {
        self.selector
    }

    /// Correlate every pair. Only i >= j is evaluated; the upper triangle is
    /// mirrored from it.
    pub fn compute(&self, vectors: &[FrequencyVector]) -> Result<CorrelationMatrix> {
        if vectors.is_empty() {
            return Err(KcorrError::EmptyInput("no frequency vectors to correlate".to_string()));
        }
        ensure_same_space(vectors)?;

        let methods = self.selector.methods();
        let n = vectors.len();
        let prepared: Vec<PreparedVector> = vectors
            .par_iter()
            .map(|vector| PreparedVector::new(vector.as_f64(), &methods))
            .collect();

        let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).collect();
        let total = pairs.len();
        log::info!(
            "Correlating {} sequences ({} evaluations, {})",
            n,
            total,
            self.selector.description()
        );

        let start = Instant::now();
        let pb = progress_bar(total as u64);
        let update_interval = std::cmp::max(1, total / 100);
        let completed = AtomicUsize::new(0);

        let evaluated: Vec<(usize, usize, Vec<f64>)> = pairs
            .into_par_iter()
            .map(|(i, j)| {
                let values = correlate_prepared(&prepared[i], &prepared[j], &methods);
                let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if count % update_interval == 0 {
                    pb.set_position(count as u64);
                }
                (i, j, values)
            })
            .collect();
        pb.finish_and_clear();

        let mut layers: Vec<CorrelationLayer> = methods.iter().map(|&m| CorrelationLayer::new(m, n)).collect();
        for (i, j, values) in evaluated {
            for (layer, value) in layers.iter_mut().zip(values) {
                layer.set_symmetric(i, j, value);
            }
        }

        log::info!("Correlation matrix computed in {:.2}s", start.elapsed().as_secs_f64());

        Ok(CorrelationMatrix {
            ids: vectors.iter().map(|v| v.id().to_string()).collect(),
            selector: self.selector,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counter::count_words;
    use crate::core::words::{Alphabet, WordSpace};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_pearson_perfect_anticorrelation() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]);
        assert!((r + 1.0).abs() < EPS);
    }

    #[test]
    fn test_constant_vector_is_undefined() {
        let x = [2.0, 2.0, 2.0, 2.0];
        let y = [1.0, 3.0, 2.0, 5.0];
        assert!(pearson(&x, &y).is_nan());
        assert!(spearman(&x, &y).is_nan());
        assert!(kendall(&x, &y).is_nan());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_spearman_monotone() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert!((spearman(&x, &y) - 1.0).abs() < EPS);
        assert!(pearson(&x, &y) < 1.0);
    }

    #[test]
    fn test_kendall_without_ties() {
        // 6 concordant, 4 discordant of 10 pairs -> 0.2
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 1.0, 4.0, 5.0, 2.0];
        assert!((kendall(&x, &y) - 0.2).abs() < EPS);
        assert!((kendall(&x, &x) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_kendall_tau_b_with_ties() {
        // Brute force tau-b for comparison
        let x: [f64; 6] = [1.0, 1.0, 2.0, 3.0, 3.0, 4.0];
        let y: [f64; 6] = [2.0, 1.0, 2.0, 2.0, 5.0, 3.0];
        let (mut c, mut d, mut tx, mut ty) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for i in 0..x.len() {
            for j in (i + 1)..x.len() {
                let sx = (x[i] - x[j]).signum() * if x[i] == x[j] { 0.0 } else { 1.0 };
                let sy = (y[i] - y[j]).signum() * if y[i] == y[j] { 0.0 } else { 1.0 };
                if sx == 0.0 && sy == 0.0 {
                    continue;
                } else if sx == 0.0 {
                    tx += 1.0;
                } else if sy == 0.0 {
                    ty += 1.0;
                } else if sx == sy {
                    c += 1.0;
                } else {
                    d += 1.0;
                }
            }
        }
        let expected = (c - d) / ((c + d + tx) * (c + d + ty)).sqrt();
        assert!((kendall(&x, &y) - expected).abs() < EPS);
    }

    #[test]
    fn test_merge_count_inversions() {
        let mut values = vec![3.0, 1.0, 2.0, 2.0, 0.0];
        let mut buffer = vec![0.0; values.len()];
        // (3,1) (3,2) (3,2) (3,0) (1,0) (2,0) (2,0)
        assert_eq!(merge_count_inversions(&mut values, &mut buffer), 7);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_method_selector_tokens() {
        assert_eq!("P".parse::<MethodSelector>().unwrap(), MethodSelector::Single(Method::Pearson));
        assert_eq!("s".parse::<MethodSelector>().unwrap(), MethodSelector::Single(Method::Spearman));
        assert_eq!("T".parse::<MethodSelector>().unwrap(), MethodSelector::Single(Method::Kendall));
        assert_eq!("ALL".parse::<MethodSelector>().unwrap(), MethodSelector::All);
        assert!("PT".parse::<MethodSelector>().is_err());
        assert_eq!(MethodSelector::All.methods(), Method::ALL.to_vec());
    }

    #[test]
    fn test_matrix_symmetry_and_diagonal() {
        let space = WordSpace::new(Alphabet::dna(), 2).unwrap();
        let sequences = [
            ("a", "ACGTACGTTTGACCAGT"),
            ("b", "GGGCCCATATATCGCGA"),
            ("c", "ACGTTGCAACGTAGCTA"),
            ("d", "TTTTTTTTTT"),
        ];
        let vectors: Vec<_> = sequences
            .iter()
            .map(|(id, seq)| count_words(id, seq.as_bytes(), &space))
            .collect();

        let matrix = CorrelationEngine::new(MethodSelector::All).compute(&vectors).unwrap();
        assert_eq!(matrix.layers.len(), 3);
        for layer in &matrix.layers {
            assert!(layer.is_symmetric());
            for i in 0..3 {
                assert!((layer.get(i, i) - 1.0).abs() < EPS);
                assert!(matches!(layer.entry(i, i), CorrelationEntry::Diagonal(_)));
            }
        }

        // "d" has a single word TT: not constant, so it stays defined
        let pearson_layer = matrix.layer(Method::Pearson).unwrap();
        assert!(!pearson_layer.get(3, 0).is_nan());
    }

    #[test]
    fn test_degenerate_vector_propagates_nan() {
        let space = WordSpace::new(Alphabet::dna(), 2).unwrap();
        let vectors = vec![
            count_words("ok", b"ACGTTGCAAC", &space),
            count_words("empty", b"NNNNNNNN", &space),
        ];
        let matrix = CorrelationEngine::new(MethodSelector::Single(Method::Pearson))
            .compute(&vectors)
            .unwrap();
        let layer = matrix.layer(Method::Pearson).unwrap();
        assert_eq!(layer.entry(1, 0), CorrelationEntry::Undefined);
        assert_eq!(layer.entry(1, 1), CorrelationEntry::Undefined);
        assert!(matches!(layer.entry(0, 0), CorrelationEntry::Diagonal(_)));
        assert_eq!(matrix.undefined_pairs(), vec![(Method::Pearson, 1)]);
    }

    #[test]
    fn test_mismatched_space_rejected_before_work() {
        let v2 = count_words("a", b"ACGTACGT", &WordSpace::new(Alphabet::dna(), 2).unwrap());
        let v3 = count_words("b", b"ACGTACGT", &WordSpace::new(Alphabet::dna(), 3).unwrap());
        let result = CorrelationEngine::new(MethodSelector::All).compute(&[v2, v3]);
        assert!(matches!(result, Err(KcorrError::MismatchedWordSpace { .. })));
    }
}
