// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;

use kcorr::cli::Config;
use kcorr::core::{count_all, optimal_k, suggest_k, AnalysisConfig, WordSpace};
use kcorr::data::{filter_records, load_sequences, segment_sequences, SequenceRecord};
use kcorr::output::{
    print_failure_summary, write_frequency_table, write_interval_file, write_matrix, write_optimal_k_json,
};
use kcorr::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    // Validate all arguments before touching any input
    let validation_result = validate_args(&args)?;
    let input = args.input.clone().ok_or("--input is required")?;

    println!("🚀 kcorr v{}", env!("CARGO_PKG_VERSION"));
    println!("⚡ Strategy: k-mer counting → lower-triangle correlation → paired word bootstrap");

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }

    let total_start = Instant::now();

    // Load, filter and optionally segment sequences
    let records = load_sequences(Path::new(&input))?;
    let loaded = records.len();
    let mut records = filter_records(records, &validation_result.filter);
    if let Some(bin_size) = args.segment {
        records = segment_sequences(&records, bin_size)?;
        println!("✂️  Segmented into {} bins of {} symbols", records.len(), bin_size);
    }
    if records.is_empty() {
        return Err(format!("No sequences left after filtering ({} loaded)", loaded));
    }
    print_sequence_summary(&records, loaded);

    // Default-k advisory
    let alphabet = validation_result.alphabet.clone();
    let lengths: Vec<usize> = records.iter().map(|r| r.len()).collect();
    let advisory = match suggest_k(&lengths, &alphabet) {
        Ok(value) => {
            println!("💡 Suggested k = log_{}(mean length) ≈ {:.2}", alphabet.len(), value);
            Some(value)
        }
        Err(e) => {
            log::warn!("No default k advisory: {}", e);
            None
        }
    };
    let k = match (args.k, advisory) {
        (Some(k), _) => k,
        (None, Some(value)) => (value.round() as usize).clamp(1, WordSpace::MAX_K),
        (None, None) => return Err("Cannot derive a default k, pass --k explicitly".to_string()),
    };
    println!(
        "🔤 Word length k = {} over '{}'{}",
        k,
        alphabet,
        if args.k.is_none() { " [default]" } else { "" }
    );

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        println!("📊 {} sequences ready, method {}", records.len(), validation_result.method.description());
        return Ok(());
    }

    // Optimal word length scan
    if let Some(max_k) = args.optimal_k {
        println!("\n📈 === OPTIMAL WORD LENGTH (k = 1..{}) ===", max_k - 1);
        let results = optimal_k(&records, max_k, &alphabet).map_err(|e| e.to_string())?;
        for result in &results {
            println!("  • {}: k* = {} (richness {:?})", result.id, result.k, result.richness);
        }
        if let Some(path) = &args.optimal_k_output {
            write_optimal_k_json(path, &results)?;
        }
    }

    let needs_matrix = args.output.is_some() || validation_result.bootstrap.is_some();
    if !needs_matrix {
        if let Some(path) = &args.frequencies {
            let space = WordSpace::new(alphabet.clone(), k).map_err(|e| e.to_string())?;
            let vectors = count_all(&records, &space);
            write_frequency_table(path, &space, &vectors)?;
        }
        println!("\n⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
        return Ok(());
    }

    println!("\n🎯 Correlation method: {}", validation_result.method.description());
    if let Some(bootstrap) = &validation_result.bootstrap {
        println!(
            "🎲 Bootstrap: {} replicates, {} intervals, alpha = {}, tolerance = ±{}, seed = {}",
            bootstrap.replicates,
            bootstrap.mode_name(),
            bootstrap.alpha,
            bootstrap.tolerance,
            bootstrap.seed
        );
    }

    let mut analysis = AnalysisConfig::new(k, validation_result.method);
    analysis.alphabet = alphabet;
    analysis.bootstrap = validation_result.bootstrap.clone();

    let result = run_analysis(&records, &analysis).map_err(|e| e.to_string())?;

    for (method, undefined) in result.matrix.undefined_pairs() {
        if undefined > 0 {
            println!("⚠️  {}: {} pair(s) undefined (zero-variance vectors), written as NA", method, undefined);
        }
    }

    if let Some(path) = &args.frequencies {
        write_frequency_table(path, &result.space, &result.vectors)?;
    }
    if let Some(output) = &args.output {
        write_matrix(output, validation_result.format, &result.matrix, k, &command_line)?;
    }
    if let (Some(path), Some(report)) = (&args.bootstrap_output, &result.bootstrap) {
        write_interval_file(path, report)?;
        print_failure_summary(report);
        println!(
            "📊 {} of {} intervals defined",
            report.defined_intervals(),
            report.rows.len() * report.methods.len()
        );
    }

    println!("\n⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn print_sequence_summary(records: &[SequenceRecord], loaded: usize) {
    let lengths: Vec<usize> = records.iter().map(|r| r.len()).collect();
    let min = lengths.iter().min().copied().unwrap_or(0);
    let max = lengths.iter().max().copied().unwrap_or(0);
    let mean = lengths.iter().sum::<usize>() as f64 / lengths.len().max(1) as f64;

    println!(
        "✅ {} sequences ready ({} loaded); length min {} / mean {:.1} / max {}",
        records.len(),
        loaded,
        min,
        mean,
        max
    );
}
