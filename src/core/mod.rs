// mod.rs - Core logic module

pub mod analysis;
pub mod bootstrap;
pub mod correlation;
pub mod counter;
pub mod diversity;
pub mod error;
pub mod normal;
pub mod words;

use indicatif::{ProgressBar, ProgressStyle};

// Re-export main types for convenience
pub use analysis::{run_analysis, AnalysisConfig, AnalysisResult};
pub use bootstrap::{
    bca_interval, percentile_indices, percentile_interval, BootstrapConfig, BootstrapEstimator,
    BootstrapReport, Interval, PairFailure, PairIntervals,
};
pub use correlation::{
    correlate, kendall, pearson, spearman, CorrelationEngine, CorrelationEntry, CorrelationLayer,
    CorrelationMatrix, Method, MethodSelector,
};
pub use counter::{count_all, count_words, ensure_same_space, suggest_k, FrequencyVector};
pub use diversity::{optimal_k, optimal_k_for, richness, OptimalK};
pub use error::{KcorrError, Result};
pub use words::{Alphabet, WordSpace, WordSpaceKey, DNA_ALPHABET};

/// Progress bar shared by the long parallel loops
pub(crate) fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
