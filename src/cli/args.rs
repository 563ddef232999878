// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// kcorr - Alignment-free k-mer composition correlation with bootstrap confidence intervals
pub struct Args {
    /// FASTA file (every record) or directory of FASTA files (first record each)
    #[argh(option)]
    pub input: Option<String>,

    /// output correlation matrix file; with --method ALL one file per method
    #[argh(option)]
    pub output: Option<String>,

    /// output format: tsv, csv, phylip, nexus (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// correlation method: P (Pearson), S (Spearman), T (Kendall), ALL (default: ALL)
    #[argh(option, default = "String::from(\"ALL\")")]
    pub method: String,

    /// word length k (default: rounded mean of log_|alphabet|(sequence length))
    #[argh(option)]
    pub k: Option<usize>,

    /// alphabet symbols in word enumeration order (default: ATCG)
    #[argh(option, default = "String::from(\"ATCG\")")]
    pub alphabet: String,

    /// scan word lengths 1..max_k-1 and report the optimal k per sequence
    #[argh(option)]
    pub optimal_k: Option<usize>,

    /// write the optimal k report as JSON to this file
    #[argh(option)]
    pub optimal_k_output: Option<String>,

    /// split sequences into non-overlapping bins of this length before counting
    #[argh(option)]
    pub segment: Option<usize>,

    /// write per-word relative frequencies of every sequence to this file
    #[argh(option)]
    pub frequencies: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// include only sequences whose identifier matches regex pattern
    #[argh(option)]
    pub include_samples: Option<String>,

    /// exclude sequences whose identifier matches regex pattern
    #[argh(option)]
    pub exclude_samples: Option<String>,

    /// include only sequences listed in a file (one identifier per line)
    #[argh(option)]
    pub include_samples_list: Option<String>,

    /// exclude sequences listed in a file (one identifier per line)
    #[argh(option)]
    pub exclude_samples_list: Option<String>,

    /// run the bootstrap and write the confidence-interval table to this file
    #[argh(option)]
    pub bootstrap_output: Option<String>,

    /// bootstrap reference sequence identifier (default: first sequence)
    #[argh(option)]
    pub reference: Option<String>,

    /// significance level alpha (default: 0.04549)
    #[argh(option, default = "0.04549")]
    pub alpha: f64,

    /// accepted deviation of a resampled vector sum from the original (default: 10)
    #[argh(option, default = "10")]
    pub tolerance: u64,

    /// number of bootstrap replicates (default: 1000)
    #[argh(option, default = "1000")]
    pub replicates: usize,

    /// use plain percentile intervals instead of BCa
    #[argh(switch)]
    pub no_bca: bool,

    /// resampling attempts per replicate before a pair is given up (default: 10000)
    #[argh(option, default = "10000")]
    pub max_attempts: usize,

    /// master seed for resampling (default: 42)
    #[argh(option, default = "42")]
    pub seed: u64,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
