// validation.rs - Input validation utilities

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str::FromStr;

use regex::Regex;

use crate::cli::args::Args;
use crate::core::{Alphabet, BootstrapConfig, MethodSelector, WordSpace};
use crate::data::SequenceFilter;
use crate::output::OutputFormat;

pub struct ValidationResult {
    pub method: MethodSelector,
    pub format: OutputFormat,
    pub alphabet: Alphabet,
    pub filter: SequenceFilter,
    /// Present only when a confidence-interval table was requested
    pub bootstrap: Option<BootstrapConfig>,
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    if args.input.is_none() {
        return Err("--input is required (FASTA file or directory)".to_string());
    }

    let nothing_requested = args.output.is_none()
        && args.bootstrap_output.is_none()
        && args.frequencies.is_none()
        && args.optimal_k.is_none();
    if nothing_requested && !args.dry_run {
        return Err(
            "Nothing to do: give at least one of --output, --bootstrap-output, --frequencies, --optimal-k".to_string(),
        );
    }

    let method = MethodSelector::from_str(&args.method)?;
    let format = OutputFormat::from_str(&args.format)?;
    let alphabet = Alphabet::new(args.alphabet.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| format!("Invalid alphabet '{}': {}", args.alphabet, e))?;

    if let Some(k) = args.k {
        if k == 0 || k > WordSpace::MAX_K {
            return Err(format!("--k must be between 1 and {}, got {}", WordSpace::MAX_K, k));
        }
    }
    if let Some(max_k) = args.optimal_k {
        if max_k < 2 || max_k > WordSpace::MAX_K + 1 {
            return Err(format!(
                "--optimal-k must be between 2 and {}, got {}",
                WordSpace::MAX_K + 1,
                max_k
            ));
        }
    }
    if args.optimal_k_output.is_some() && args.optimal_k.is_none() {
        return Err("--optimal-k-output requires --optimal-k".to_string());
    }
    if args.segment == Some(0) {
        return Err("--segment must be at least 1".to_string());
    }
    if args.threads == Some(0) {
        return Err("--threads must be at least 1".to_string());
    }

    // Bootstrap parameters are checked even before any sequence is read
    let bootstrap = match &args.bootstrap_output {
        Some(_) => {
            let config = BootstrapConfig {
                alpha: args.alpha,
                tolerance: args.tolerance,
                replicates: args.replicates,
                bca: !args.no_bca,
                max_attempts: args.max_attempts,
                seed: args.seed,
                reference: args.reference.clone(),
            };
            config.validate().map_err(|e| e.to_string())?;
            Some(config)
        }
        None => None,
    };

    // Compile regex patterns
    let include = if let Some(pattern) = &args.include_samples {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_samples regex: {}", e))?)
    } else {
        None
    };

    let exclude = if let Some(pattern) = &args.exclude_samples {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid exclude_samples regex: {}", e))?)
    } else {
        None
    };

    // Load filter sets from files
    let include_set = if let Some(file_path) = &args.include_samples_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    let exclude_set = if let Some(file_path) = &args.exclude_samples_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    Ok(ValidationResult {
        method,
        format,
        alphabet,
        filter: SequenceFilter {
            include,
            exclude,
            include_set,
            exclude_set,
        },
        bootstrap,
    })
}

/// Sequence identifiers from a list file: one per line, `#` starts a comment
fn load_set_from_file(file_path: &str) -> Result<HashSet<String>, String> {
    let file = File::open(file_path).map_err(|e| format!("Failed to open sample list '{}': {}", file_path, e))?;

    let mut ids = HashSet::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read line {} of '{}': {}", line_num + 1, file_path, e))?;
        let id = line.split('#').next().unwrap_or_default().trim();
        if !id.is_empty() {
            ids.insert(id.to_string());
        }
    }

    println!("📋 {} sequence identifiers listed in '{}'", ids.len(), file_path);
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Method;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["kcorr"], args).unwrap()
    }

    #[test]
    fn test_valid_arguments() {
        let args = parse(&["--input", "x.fasta", "--output", "out.tsv", "--method", "T", "--format", "csv"]);
        let result = validate_args(&args).unwrap();
        assert_eq!(result.method, MethodSelector::Single(Method::Kendall));
        assert_eq!(result.format, OutputFormat::Csv);
        assert_eq!(result.alphabet.symbols(), b"ATCG");
        assert!(result.bootstrap.is_none());
        assert!(result.filter.is_empty());
    }

    #[test]
    fn test_bootstrap_settings_collected() {
        let args = parse(&[
            "--input", "x.fasta", "--bootstrap-output", "ci.tsv", "--replicates", "200", "--no-bca", "--reference", "s2",
        ]);
        let bootstrap = validate_args(&args).unwrap().bootstrap.unwrap();
        assert_eq!(bootstrap.replicates, 200);
        assert!(!bootstrap.bca);
        assert_eq!(bootstrap.reference.as_deref(), Some("s2"));
    }

    #[test]
    fn test_insufficient_replicates_rejected_up_front() {
        let args = parse(&["--input", "x.fasta", "--bootstrap-output", "ci.tsv", "--replicates", "10"]);
        let error = validate_args(&args).err().unwrap();
        assert!(error.contains("insufficient bootstrap replicates"));
    }

    #[test]
    fn test_sample_list_skips_comments() {
        let path = std::env::temp_dir().join(format!("kcorr_list_{}.txt", std::process::id()));
        std::fs::write(&path, "# samples to drop\nchr2\n\n  chr7  # low coverage\n").unwrap();

        let ids = load_set_from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains("chr2"));
        assert!(ids.contains("chr7"));
        assert!(!ids.iter().any(|id| id.starts_with('#')));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(validate_args(&parse(&["--output", "out.tsv"])).is_err());
        assert!(validate_args(&parse(&["--input", "x.fasta"])).is_err());
        assert!(validate_args(&parse(&["--input", "x.fasta", "--output", "o", "--method", "Q"])).is_err());
        assert!(validate_args(&parse(&["--input", "x.fasta", "--output", "o", "--k", "0"])).is_err());
        assert!(validate_args(&parse(&["--input", "x.fasta", "--output", "o", "--alphabet", "AAT"])).is_err());
        assert!(validate_args(&parse(&["--input", "x.fasta", "--output", "o", "--include-samples", "("])).is_err());
    }
}
