// bootstrap.rs - Percentile and BCa bootstrap intervals over resampled word positions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::correlation::{correlate_prepared, CorrelationMatrix, Method, PreparedVector};
use crate::core::counter::{ensure_same_space, FrequencyVector};
use crate::core::error::{KcorrError, Result};
use crate::core::normal;
use crate::core::progress_bar;

/// Absorbs representation error in B·α before rounding to an index
const INDEX_EPSILON: f64 = 1e-9;

/// Bootstrap settings, fixed for a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Significance level; the two-sided interval covers 1 - 2α
    pub alpha: f64,
    /// Largest accepted deviation of a resampled vector sum from the original
    pub tolerance: u64,
    pub replicates: usize,
    /// BCa when true, plain percentile otherwise
    pub bca: bool,
    /// Draws allowed per replicate before the pair is given up
    pub max_attempts: usize,
    pub seed: u64,
    /// Identifier of the reference sequence; the first sequence when unset
    pub reference: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            alpha: 0.04549,
            tolerance: 10,
            replicates: 1000,
            bca: true,
            max_attempts: 10_000,
            seed: 42,
            reference: None,
        }
    }
}

impl BootstrapConfig {
    /// Check parameters before any resampling or output happens
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 0.5) {
            return Err(KcorrError::InvalidParameter(format!(
                "alpha must lie in (0, 0.5), got {}",
                self.alpha
            )));
        }
        if self.max_attempts == 0 {
            return Err(KcorrError::InvalidParameter(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.replicates < 2 {
            return Err(KcorrError::InsufficientReplicates {
                replicates: self.replicates,
                alpha: self.alpha,
                reason: "at least 2 replicates are needed".to_string(),
            });
        }
        if floor_index(self.replicates as f64 * self.alpha) < 1 {
            return Err(KcorrError::InsufficientReplicates {
                replicates: self.replicates,
                alpha: self.alpha,
                reason: format!(
                    "lower percentile index floor(B·α) rounds to 0; use at least {} replicates",
                    (1.0 / self.alpha).ceil() as usize
                ),
            });
        }
        Ok(())
    }

    pub fn mode_name(&self) -> &'static str {
        if self.bca {
            "BCa"
        } else {
            "percentile"
        }
    }
}

/// Lower bound, upper bound and point estimate for one (pair, method)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    pub point: f64,
}

impl Interval {
    pub fn undefined(point: f64) -> Self {
        Self {
            lower: f64::NAN,
            upper: f64::NAN,
            point,
        }
    }

    pub fn is_defined(&self) -> bool {
        !(self.lower.is_nan() || self.upper.is_nan() || self.point.is_nan())
    }

    pub fn contains_point(&self) -> bool {
        self.is_defined() && self.lower <= self.point && self.point <= self.upper
    }
}

#[inline]
fn floor_index(x: f64) -> usize {
    (x + INDEX_EPSILON).floor().max(0.0) as usize
}

#[inline]
fn ceil_index(x: f64) -> usize {
    (x - INDEX_EPSILON).ceil().max(0.0) as usize
}

/// Pick sorted[lower-1] and sorted[upper-1] after clamping both into [1, B]
fn pick(sorted: &[f64], lower: usize, upper: usize, point: f64) -> Interval {
    let b = sorted.len();
    let lower = lower.clamp(1, b);
    let upper = upper.clamp(1, b);
    Interval {
        lower: sorted[lower - 1],
        upper: sorted[upper - 1],
        point,
    }
}

/// 1-based percentile indices floor(B·α) and ceil(B·(1-α)), clamped to [1, B]
pub fn percentile_indices(replicates: usize, alpha: f64) -> (usize, usize) {
    let b = replicates as f64;
    let upper_bound = replicates.max(1);
    (
        floor_index(b * alpha).clamp(1, upper_bound),
        ceil_index(b * (1.0 - alpha)).clamp(1, upper_bound),
    )
}

fn has_undefined(sorted: &[f64], point: f64) -> bool {
    sorted.is_empty() || point.is_nan() || sorted.iter().any(|v| v.is_nan())
}

/// Plain percentile interval over ascending replicates
pub fn percentile_interval(sorted: &[f64], point: f64, alpha: f64) -> Interval {
    if has_undefined(sorted, point) {
        return Interval::undefined(point);
    }
    let (lower, upper) = percentile_indices(sorted.len(), alpha);
    pick(sorted, lower, upper, point)
}

/// Bias-corrected and accelerated interval over ascending replicates.
///
/// The acceleration comes from leave-one-out means over the replicates
/// themselves: pseudo_i = (Σv - v_i) / (B - 1).
pub fn bca_interval(sorted: &[f64], point: f64, alpha: f64) -> Interval {
    let b = sorted.len();
    if b < 2 || has_undefined(sorted, point) {
        return Interval::undefined(point);
    }
    let n = b as f64;

    let total: f64 = sorted.iter().sum();
    let pseudo: Vec<f64> = sorted.iter().map(|v| (total - v) / (n - 1.0)).collect();
    let mean = pseudo.iter().sum::<f64>() / n;
    let (cubes, squares) = pseudo.iter().fold((0.0, 0.0), |(c, s), p| {
        let d = mean - p;
        (c + d * d * d, s + d * d)
    });
    let acceleration = if squares > 0.0 {
        cubes / (6.0 * squares.powf(1.5))
    } else {
        0.0
    };

    let below = sorted.iter().filter(|&&v| v < point).count();
    let z0 = normal::quantile(below as f64 / n);

    let adjust = |zq: f64| -> f64 {
        if z0.is_infinite() {
            // Every replicate on one side of the point estimate
            return if z0 > 0.0 { 1.0 } else { 0.0 };
        }
        let shifted = z0 + zq;
        normal::cdf(z0 + shifted / (1.0 - acceleration * shifted))
    };
    let lower_p = adjust(normal::quantile(alpha));
    let upper_p = adjust(normal::quantile(1.0 - alpha));

    if !lower_p.is_finite() || !upper_p.is_finite() {
        log::warn!(
            "BCa percentiles not finite (z0 = {}, a = {}), interval left undefined",
            z0,
            acceleration
        );
        return Interval::undefined(point);
    }

    pick(sorted, floor_index(lower_p * n), ceil_index(upper_p * n), point)
}

/// Intervals of one (reference, other) pair, in method order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairIntervals {
    pub reference: String,
    pub other: String,
    pub intervals: Vec<(Method, Interval)>,
}

impl PairIntervals {
    pub fn get(&self, method: Method) -> Option<Interval> {
        self.intervals
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, interval)| *interval)
    }
}

/// A pair whose resampling gave up
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub reference: String,
    pub other: String,
    pub error: KcorrError,
}

/// Everything a bootstrap run produced
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub reference: String,
    pub methods: Vec<Method>,
    pub config: BootstrapConfig,
    /// One row per non-reference sequence, in input order
    pub rows: Vec<PairIntervals>,
    pub failures: Vec<PairFailure>,
}

impl BootstrapReport {
    pub fn defined_intervals(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.intervals.iter())
            .filter(|(_, interval)| interval.is_defined())
            .count()
    }
}

/// Paired word-position bootstrap between a reference and every other sequence
#[derive(Debug, Clone)]
pub struct BootstrapEstimator {
    config: BootstrapConfig,
}

impl BootstrapEstimator {
    pub fn new(config: BootstrapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Draw B accepted paired resamples and return the ascending replicate
    /// list of every method.
    pub fn replicates(
        &self,
        reference: &FrequencyVector,
        other: &FrequencyVector,
        methods: &[Method],
        stream: u64,
    ) -> Result<Vec<Vec<f64>>> {
        let n = reference.len();
        if n == 0 || other.len() != n {
            return Err(KcorrError::MismatchedWordSpace {
                expected: reference.key().to_string(),
                found: other.key().to_string(),
                id: other.id().to_string(),
            });
        }

        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(self.config.seed.wrapping_add(stream));
        let (r_counts, o_counts) = (reference.counts(), other.counts());
        let (r_total, o_total) = (reference.total(), other.total());
        let tolerance = self.config.tolerance;

        let mut draw = vec![0usize; n];
        let mut replicates: Vec<Vec<f64>> = vec![Vec::with_capacity(self.config.replicates); methods.len()];

        for replicate in 0..self.config.replicates {
            let mut accepted = false;
            for _ in 0..self.config.max_attempts {
                let (mut r_sum, mut o_sum) = (0u64, 0u64);
                for slot in draw.iter_mut() {
                    let position = rng.gen_range(0..n);
                    *slot = position;
                    r_sum += r_counts[position];
                    o_sum += o_counts[position];
                }
                if r_sum.abs_diff(r_total) <= tolerance && o_sum.abs_diff(o_total) <= tolerance {
                    accepted = true;
                    break;
                }
            }

            if !accepted {
                return Err(KcorrError::ResampleAcceptanceExhausted {
                    reference: reference.id().to_string(),
                    other: other.id().to_string(),
                    tolerance,
                    max_attempts: self.config.max_attempts,
                    replicate,
                });
            }

            let r_prime = PreparedVector::new(draw.iter().map(|&p| r_counts[p] as f64).collect(), methods);
            let o_prime = PreparedVector::new(draw.iter().map(|&p| o_counts[p] as f64).collect(), methods);
            for (list, value) in replicates.iter_mut().zip(correlate_prepared(&r_prime, &o_prime, methods)) {
                list.push(value);
            }
        }

        for list in replicates.iter_mut() {
            list.sort_by(f64::total_cmp);
        }
        Ok(replicates)
    }

    /// Interval for every method of one pair, given the matrix point estimates
    pub fn estimate_pair(
        &self,
        reference: &FrequencyVector,
        other: &FrequencyVector,
        points: &[(Method, f64)],
        stream: u64,
    ) -> Result<PairIntervals> {
        let methods: Vec<Method> = points.iter().map(|(m, _)| *m).collect();
        let mut pair = PairIntervals {
            reference: reference.id().to_string(),
            other: other.id().to_string(),
            intervals: points.iter().map(|&(m, p)| (m, Interval::undefined(p))).collect(),
        };

        // Degenerate pair: nothing to resample
        if points.iter().all(|(_, p)| p.is_nan()) {
            log::debug!("{} vs {}: undefined point estimates, skipping resampling", pair.reference, pair.other);
            return Ok(pair);
        }

        let replicates = self.replicates(reference, other, &methods, stream)?;
        for ((_, interval), sorted) in pair.intervals.iter_mut().zip(&replicates) {
            let point = interval.point;
            *interval = if self.config.bca {
                bca_interval(sorted, point, self.config.alpha)
            } else {
                percentile_interval(sorted, point, self.config.alpha)
            };
        }
        Ok(pair)
    }

    /// Bootstrap the reference against every other sequence.
    ///
    /// Point estimates are read from `matrix`, whose rows must follow the
    /// order of `vectors`. A pair that exhausts its attempts gets undefined
    /// intervals and an entry in `failures`; the other pairs are unaffected.
    pub fn run(&self, vectors: &[FrequencyVector], matrix: &CorrelationMatrix) -> Result<BootstrapReport> {
        if vectors.len() < 2 {
            return Err(KcorrError::EmptyInput(
                "bootstrap needs a reference and at least one other sequence".to_string(),
            ));
        }
        ensure_same_space(vectors)?;
        if matrix.size() != vectors.len()
            || matrix.ids.iter().zip(vectors).any(|(id, v)| id != v.id())
        {
            return Err(KcorrError::InvalidParameter(
                "correlation matrix does not match the frequency vectors".to_string(),
            ));
        }

        let reference_index = match &self.config.reference {
            Some(id) => vectors.iter().position(|v| v.id() == id).ok_or_else(|| {
                KcorrError::InvalidParameter(format!("reference sequence '{}' not found", id))
            })?,
            None => 0,
        };
        let reference = &vectors[reference_index];
        let methods: Vec<Method> = matrix.layers.iter().map(|layer| layer.method).collect();

        let others: Vec<usize> = (0..vectors.len()).filter(|&i| i != reference_index).collect();
        let total = others.len();
        log::info!(
            "Bootstrapping {} pairs against '{}' ({} replicates, {}, alpha = {}, tolerance = {})",
            total,
            reference.id(),
            self.config.replicates,
            self.config.mode_name(),
            self.config.alpha,
            self.config.tolerance
        );

        let start = Instant::now();
        let pb = progress_bar(total as u64);
        let update_interval = std::cmp::max(1, total / 100);
        let completed = AtomicUsize::new(0);

        let outcomes: Vec<(usize, Result<PairIntervals>)> = others
            .par_iter()
            .map(|&other_index| {
                let points: Vec<(Method, f64)> = matrix
                    .layers
                    .iter()
                    .map(|layer| (layer.method, layer.get(other_index, reference_index)))
                    .collect();
                let outcome = self.estimate_pair(reference, &vectors[other_index], &points, other_index as u64);

                let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if count % update_interval == 0 {
                    pb.set_position(count as u64);
                }
                (other_index, outcome)
            })
            .collect();
        pb.finish_and_clear();

        let mut rows = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (other_index, outcome) in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(error) => {
                    let other = vectors[other_index].id().to_string();
                    log::warn!("{} vs {}: {}", reference.id(), other, error);
                    rows.push(PairIntervals {
                        reference: reference.id().to_string(),
                        other: other.clone(),
                        intervals: matrix
                            .layers
                            .iter()
                            .map(|layer| (layer.method, Interval::undefined(layer.get(other_index, reference_index))))
                            .collect(),
                    });
                    failures.push(PairFailure {
                        reference: reference.id().to_string(),
                        other,
                        error,
                    });
                }
            }
        }

        log::info!(
            "Bootstrap finished in {:.2}s ({} failed pairs)",
            start.elapsed().as_secs_f64(),
            failures.len()
        );

        Ok(BootstrapReport {
            reference: reference.id().to_string(),
            methods,
            config: self.config.clone(),
            rows,
            failures,
        })
    }
}
