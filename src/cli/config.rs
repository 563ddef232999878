// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,
    pub frequencies: Option<String>,

    // Words and correlation
    pub method: Option<String>,
    pub k: Option<usize>,
    pub alphabet: Option<String>,
    pub optimal_k: Option<usize>,
    pub optimal_k_output: Option<String>,
    pub segment: Option<usize>,

    // Performance
    pub threads: Option<usize>,

    // Sequence filtering
    pub include_samples: Option<String>,
    pub exclude_samples: Option<String>,
    pub include_samples_list: Option<String>,
    pub exclude_samples_list: Option<String>,

    // Bootstrap
    pub bootstrap_output: Option<String>,
    pub reference: Option<String>,
    pub alpha: Option<f64>,
    pub tolerance: Option<u64>,
    pub replicates: Option<usize>,
    pub no_bca: Option<bool>,
    pub max_attempts: Option<usize>,
    pub seed: Option<u64>,

    // Flags
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# kcorr.toml - Configuration file for kcorr
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# FASTA file (every record) or directory of FASTA files (first record each)
input = "/path/to/sequences.fasta"

# Output correlation matrix; with method = "ALL" the method name is inserted
# before the extension (correlation.spearman.tsv, ...)
output = "correlation.tsv"

# Output format: tsv, csv, phylip, nexus
format = "tsv"

# Per-word relative frequencies of every sequence
# frequencies = "frequencies.tsv"

# =============================================================================
# WORDS AND CORRELATION
# =============================================================================

# Correlation method: P (Pearson), S (Spearman), T (Kendall), ALL
method = "ALL"

# Word length (omit to use the rounded mean of log_|alphabet|(length))
k = 6

# Alphabet, in word enumeration order
alphabet = "ATCG"

# Scan word lengths 1..optimal_k-1 and report the best k per sequence
# optimal_k = 12
# optimal_k_output = "optimal_k.json"

# Split sequences into non-overlapping bins before counting
# segment = 1000

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
threads = 8

# =============================================================================
# SEQUENCE FILTERING
# =============================================================================

# Include only sequences whose identifier matches regex pattern
# include_samples = "chr.*"

# Exclude sequences whose identifier matches regex pattern
# exclude_samples = "plasmid.*"

# Include / exclude sequences listed in a file (one identifier per line)
# include_samples_list = "keep.txt"
# exclude_samples_list = "drop.txt"

# =============================================================================
# BOOTSTRAP
# =============================================================================

# Confidence-interval table (the bootstrap runs only when this is set)
bootstrap_output = "conf_int.tsv"

# Reference sequence identifier (omit for the first sequence)
# reference = "seq1"

# Significance level
alpha = 0.04549

# Accepted deviation of a resampled vector sum from the original
tolerance = 10

# Number of bootstrap replicates
replicates = 1000

# Plain percentile intervals instead of BCa
no_bca = false

# Resampling attempts per replicate before a pair is given up
max_attempts = 10000

# Master seed for resampling
seed = 42

# =============================================================================
# FLAGS
# =============================================================================

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.method.as_deref(), Some("ALL"));
        assert_eq!(config.k, Some(6));
        assert_eq!(config.alpha, Some(0.04549));
        assert_eq!(config.replicates, Some(1000));
        assert_eq!(config.no_bca, Some(false));
        assert!(config.reference.is_none());
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join(format!("kcorr_config_{}.toml", std::process::id()));
        let config = Config {
            input: Some("seqs.fasta".to_string()),
            tolerance: Some(25),
            ..Default::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();
    }
}
