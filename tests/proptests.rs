use kcorr::core::{
    bca_interval, count_words, kendall, Alphabet, BootstrapConfig, BootstrapEstimator, CorrelationEngine, Method,
    MethodSelector, WordSpace,
};
use kcorr::output::write_interval_table;
use proptest::prelude::*;

fn dna_sequence(min: usize, max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), min..max)
}

/// Quadratic tau-b used as a baseline for the merge-sort implementation.
fn naive_tau_b(x: &[f64], y: &[f64]) -> f64 {
    let (mut concordant, mut discordant, mut x_only, mut y_only) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for i in 0..x.len() {
        for j in (i + 1)..x.len() {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                continue;
            } else if dx == 0.0 {
                x_only += 1.0;
            } else if dy == 0.0 {
                y_only += 1.0;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1.0;
            } else {
                discordant += 1.0;
            }
        }
    }
    let denominator = ((concordant + discordant + x_only) * (concordant + discordant + y_only)).sqrt();
    if denominator == 0.0 {
        f64::NAN
    } else {
        (concordant - discordant) / denominator
    }
}

proptest! {
    #[test]
    fn prop_word_space_is_a_bijection(k in 1usize..=5) {
        let space = WordSpace::new(Alphabet::dna(), k).unwrap();
        prop_assert_eq!(space.len(), 4usize.pow(k as u32));
        for position in 0..space.len() {
            let word = space.word(position).unwrap();
            prop_assert_eq!(space.index_of(word), Some(position));
        }
    }

    #[test]
    fn prop_counter_sum_bounded_by_windows(
        k in 1usize..=4,
        seq in prop::collection::vec(prop::sample::select(b"ACGTN".to_vec()), 0..200)
    ) {
        let space = WordSpace::new(Alphabet::dna(), k).unwrap();
        let vector = count_words("s", &seq, &space);
        let windows = seq.len().saturating_sub(k - 1);
        let sum: u64 = vector.counts().iter().sum();

        prop_assert_eq!(vector.len(), space.len());
        prop_assert_eq!(vector.windows(), windows);
        prop_assert!(sum as usize <= windows);
        let has_invalid_window = seq.windows(k).any(|w| w.contains(&b'N'));
        prop_assert_eq!(sum as usize == windows, !has_invalid_window);
    }

    #[test]
    fn prop_kendall_matches_quadratic_baseline(
        pairs in prop::collection::vec((0u8..6, 0u8..6), 2..60)
    ) {
        let x: Vec<f64> = pairs.iter().map(|p| p.0 as f64).collect();
        let y: Vec<f64> = pairs.iter().map(|p| p.1 as f64).collect();
        let fast = kendall(&x, &y);
        let slow = naive_tau_b(&x, &y);
        if slow.is_nan() {
            prop_assert!(fast.is_nan());
        } else {
            prop_assert!((fast - slow).abs() < 1e-9, "fast {} slow {}", fast, slow);
        }
    }

    #[test]
    fn prop_correlation_matrix_is_symmetric(
        seqs in prop::collection::vec(dna_sequence(5, 80), 2..7)
    ) {
        let space = WordSpace::new(Alphabet::dna(), 2).unwrap();
        let vectors: Vec<_> = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| count_words(&format!("s{}", i), s, &space))
            .collect();
        let matrix = CorrelationEngine::new(MethodSelector::All).compute(&vectors).unwrap();

        for layer in &matrix.layers {
            prop_assert!(layer.is_symmetric());
            for i in 0..matrix.size() {
                let diagonal = layer.get(i, i);
                prop_assert!(diagonal.is_nan() || (diagonal - 1.0).abs() < 1e-9);
                for j in 0..matrix.size() {
                    let value = layer.get(i, j);
                    prop_assert!(value.is_nan() || (-1.0..=1.0).contains(&value));
                }
            }
        }
    }

    #[test]
    fn prop_bca_brackets_point_on_symmetric_replicates(
        theta in -0.9f64..0.9,
        offsets in prop::collection::vec(0.001f64..1.0, 20..200)
    ) {
        let mut replicates: Vec<f64> = offsets
            .iter()
            .flat_map(|d| [theta - d, theta + d])
            .collect();
        replicates.sort_by(f64::total_cmp);

        let interval = bca_interval(&replicates, theta, 0.04549);
        prop_assert!(interval.is_defined());
        prop_assert!(interval.lower <= theta, "lower {} > {}", interval.lower, theta);
        prop_assert!(theta <= interval.upper, "upper {} < {}", interval.upper, theta);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_bootstrap_table_is_byte_reproducible(
        seqs in prop::collection::vec(dna_sequence(40, 120), 2..5),
        seed in any::<u64>()
    ) {
        let space = WordSpace::new(Alphabet::dna(), 2).unwrap();
        let vectors: Vec<_> = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| count_words(&format!("s{}", i), s, &space))
            .collect();
        let matrix = CorrelationEngine::new(MethodSelector::All).compute(&vectors).unwrap();
        let config = BootstrapConfig {
            replicates: 60,
            tolerance: u64::MAX,
            seed,
            ..Default::default()
        };

        let render = || {
            let report = BootstrapEstimator::new(config.clone()).unwrap().run(&vectors, &matrix).unwrap();
            let mut buffer = Vec::new();
            write_interval_table(&mut buffer, &report).unwrap();
            (report, buffer)
        };
        let (report, first) = render();
        let (_, second) = render();

        prop_assert_eq!(first, second);
        // Unbounded tolerance accepts the first draw of every replicate
        prop_assert!(report.failures.is_empty());
        prop_assert_eq!(report.rows.len(), vectors.len() - 1);
    }
}

#[test]
fn percentile_mode_uses_fifth_and_ninety_fifth_replicates() {
    let space = WordSpace::new(Alphabet::dna(), 2).unwrap();
    let vectors = vec![
        count_words("ref", b"ACGTTGCAACGTAGCTAGGCTTACGATCGATCGGATCCA", &space),
        count_words("other", b"GGGGCCCCAAAATTTTGGGGCCCCAAAATTTTACGTACG", &space),
    ];
    let matrix = CorrelationEngine::new(MethodSelector::Single(Method::Pearson))
        .compute(&vectors)
        .unwrap();
    let config = BootstrapConfig {
        alpha: 0.05,
        replicates: 100,
        tolerance: u64::MAX,
        bca: false,
        ..Default::default()
    };
    let estimator = BootstrapEstimator::new(config).unwrap();

    let sorted = estimator.replicates(&vectors[0], &vectors[1], &[Method::Pearson], 1).unwrap();
    let report = estimator.run(&vectors, &matrix).unwrap();
    let interval = report.rows[0].get(Method::Pearson).unwrap();

    assert_eq!(interval.lower, sorted[0][4]);
    assert_eq!(interval.upper, sorted[0][94]);
}
