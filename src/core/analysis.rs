// analysis.rs - Analysis configuration and the count → correlate → bootstrap pipeline

use serde::{Deserialize, Serialize};

use crate::core::bootstrap::{BootstrapConfig, BootstrapEstimator, BootstrapReport};
use crate::core::correlation::{CorrelationEngine, CorrelationMatrix, MethodSelector};
use crate::core::counter::{count_all, FrequencyVector};
use crate::core::error::{KcorrError, Result};
use crate::core::words::{Alphabet, WordSpace};
use crate::data::SequenceRecord;

/// Immutable settings for one analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub alphabet: Alphabet,
    pub k: usize,
    pub method: MethodSelector,
    /// Confidence intervals are computed only when present
    pub bootstrap: Option<BootstrapConfig>,
}

impl AnalysisConfig {
    pub fn new(k: usize, method: MethodSelector) -> Self {
        Self {
            alphabet: Alphabet::dna(),
            k,
            method,
            bootstrap: None,
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > WordSpace::MAX_K {
            return Err(KcorrError::InvalidParameter(format!(
                "word length k must be within 1..={}, got {}",
                WordSpace::MAX_K,
                self.k
            )));
        }
        if let Some(bootstrap) = &self.bootstrap {
            bootstrap.validate()?;
        }
        Ok(())
    }
}

/// Products of one analysis session
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub space: WordSpace,
    pub vectors: Vec<FrequencyVector>,
    pub matrix: CorrelationMatrix,
    pub bootstrap: Option<BootstrapReport>,
}

/// Run counting, correlation and, when configured, the bootstrap.
///
/// Parameters are validated before any counting so an invalid replicate
/// count fails before anything is produced.
pub fn run_analysis(records: &[SequenceRecord], config: &AnalysisConfig) -> Result<AnalysisResult> {
    config.validate()?;
    if records.is_empty() {
        return Err(KcorrError::EmptyInput("no sequences to analyse".to_string()));
    }

    let estimator = config
        .bootstrap
        .clone()
        .map(BootstrapEstimator::new)
        .transpose()?;

    let space = WordSpace::new(config.alphabet.clone(), config.k)?;
    let vectors = count_all(records, &space);
    let matrix = CorrelationEngine::new(config.method).compute(&vectors)?;

    let bootstrap = match estimator {
        Some(estimator) => Some(estimator.run(&vectors, &matrix)?),
        None => None,
    };

    Ok(AnalysisResult {
        space,
        vectors,
        matrix,
        bootstrap,
    })
}
