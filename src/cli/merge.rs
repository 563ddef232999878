// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.frequencies.is_none() {
            self.frequencies = config.frequencies;
        }

        // Core settings (only override defaults, not explicit CLI values)
        if let Some(format) = config.format.filter(|_| self.format == "tsv") {
            self.format = format;
        }
        if let Some(method) = config.method.filter(|_| self.method == "ALL") {
            self.method = method;
        }
        if let Some(alphabet) = config.alphabet.filter(|_| self.alphabet == "ATCG") {
            self.alphabet = alphabet;
        }
        if self.k.is_none() {
            self.k = config.k;
        }
        if self.optimal_k.is_none() {
            self.optimal_k = config.optimal_k;
        }
        if self.optimal_k_output.is_none() {
            self.optimal_k_output = config.optimal_k_output;
        }
        if self.segment.is_none() {
            self.segment = config.segment;
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Sequence filtering
        if self.include_samples.is_none() {
            self.include_samples = config.include_samples;
        }
        if self.exclude_samples.is_none() {
            self.exclude_samples = config.exclude_samples;
        }
        if self.include_samples_list.is_none() {
            self.include_samples_list = config.include_samples_list;
        }
        if self.exclude_samples_list.is_none() {
            self.exclude_samples_list = config.exclude_samples_list;
        }

        // Bootstrap (only override defaults)
        if self.bootstrap_output.is_none() {
            self.bootstrap_output = config.bootstrap_output;
        }
        if self.reference.is_none() {
            self.reference = config.reference;
        }
        if let Some(alpha) = config.alpha.filter(|_| self.alpha == 0.04549) {
            self.alpha = alpha;
        }
        if let Some(tolerance) = config.tolerance.filter(|_| self.tolerance == 10) {
            self.tolerance = tolerance;
        }
        if let Some(replicates) = config.replicates.filter(|_| self.replicates == 1000) {
            self.replicates = replicates;
        }
        if let Some(max_attempts) = config.max_attempts.filter(|_| self.max_attempts == 10_000) {
            self.max_attempts = max_attempts;
        }
        if let Some(seed) = config.seed.filter(|_| self.seed == 42) {
            self.seed = seed;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.no_bca && config.no_bca.unwrap_or(false) {
            self.no_bca = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
