// error.rs - Error kinds raised by the analysis core

use thiserror::Error;

/// Errors produced by word-space, correlation and bootstrap operations.
///
/// Invalid alphabet characters inside a window and zero-variance vectors are
/// not errors: the first is skipped during counting, the second becomes a NaN
/// correlation value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KcorrError {
    /// Frequency vectors built from different word spaces were mixed
    #[error("frequency vector '{id}' was built for {found}, expected {expected}")]
    MismatchedWordSpace {
        expected: String,
        found: String,
        id: String,
    },

    /// The acceptance-rejection loop ran out of attempts for one replicate
    #[error(
        "no resample of '{reference}' vs '{other}' within tolerance ±{tolerance} after \
         {max_attempts} attempts (replicate {replicate}); relax the tolerance or raise max attempts"
    )]
    ResampleAcceptanceExhausted {
        reference: String,
        other: String,
        tolerance: u64,
        max_attempts: usize,
        replicate: usize,
    },

    /// Replicate count too small for the requested interval extraction
    #[error("insufficient bootstrap replicates (B = {replicates}, alpha = {alpha}): {reason}")]
    InsufficientReplicates {
        replicates: usize,
        alpha: f64,
        reason: String,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("empty input: {0}")]
    EmptyInput(String),
}

pub type Result<T> = std::result::Result<T, KcorrError>;
