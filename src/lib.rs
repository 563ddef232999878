// lib.rs - kcorr library root

//! # kcorr - Alignment-free sequence comparison by k-mer composition correlation
//!
//! Every sequence becomes a dense vector of word (k-mer) counts over a fixed
//! word space. Vectors are correlated pairwise (Pearson, Spearman, Kendall)
//! and each correlation against a reference sequence gets a bootstrap
//! confidence interval from paired resampling of word positions.
//!
//! ## Features
//!
//! - **Word spaces**: deterministic Cartesian enumeration with hashed reverse lookup
//! - **Counting**: sliding windows, windows with non-alphabet characters skipped
//! - **Optimal k**: word richness scan per sequence
//! - **Correlation**: lower-triangle parallel computation, undefined pairs kept as NaN
//! - **Bootstrap**: percentile and BCa intervals, seeded and reproducible
//! - **Multiple formats**: TSV, CSV, PHYLIP, NEXUS matrices and a delimited interval table
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kcorr::prelude::*;
//!
//! let records = load_sequences(std::path::Path::new("genomes.fasta"))?;
//!
//! let config = AnalysisConfig::new(6, MethodSelector::All)
//!     .with_bootstrap(BootstrapConfig::default());
//! let result = run_analysis(&records, &config).map_err(|e| e.to_string())?;
//!
//! if let Some(report) = &result.bootstrap {
//!     write_interval_file("conf_int.tsv", report)?;
//! }
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{run_analysis, AnalysisConfig, AnalysisResult};
    pub use crate::core::{Alphabet, FrequencyVector, WordSpace};
    pub use crate::core::{BootstrapConfig, BootstrapEstimator, BootstrapReport, Interval};
    pub use crate::core::{CorrelationEngine, CorrelationMatrix, Method, MethodSelector};
    pub use crate::core::KcorrError;
    pub use crate::data::{load_sequences, SequenceRecord};
    pub use crate::output::{write_interval_file, write_matrix, OutputFormat};
}

// Re-export main types at the root level for convenience
pub use crate::cli::{Args, ValidationResult};
pub use crate::core::{AnalysisConfig, BootstrapConfig, CorrelationMatrix, KcorrError, MethodSelector};
pub use crate::data::SequenceRecord;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "kcorr v{} - Alignment-free k-mer correlation with bootstrap confidence intervals",
        VERSION
    )
}
