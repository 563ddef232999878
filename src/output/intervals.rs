// intervals.rs - Confidence-interval table writer

use std::io::Write;

use crate::core::{BootstrapReport, Method, PairIntervals};
use crate::output::create_writer;

/// Column order of the confidence-interval table
pub const INTERVAL_COLUMNS: [&str; 9] = [
    "SpearCIlow",
    "SpearCIup",
    "Spear",
    "KenCIlow",
    "KenCIup",
    "Ken",
    "PearCIL",
    "PearCIup",
    "Pear",
];

fn cell(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn row_cells(row: &PairIntervals) -> Vec<String> {
    Method::ALL
        .iter()
        .flat_map(|&method| match row.get(method) {
            Some(interval) => [cell(interval.lower), cell(interval.upper), cell(interval.point)],
            None => [cell(f64::NAN), cell(f64::NAN), cell(f64::NAN)],
        })
        .collect()
}

/// Write the table: header row, then one row per non-reference sequence in
/// input order. Methods that were not computed are filled with `nan`.
///
/// Output depends only on the report, so equal reports give equal bytes.
pub fn write_interval_table<W: Write>(writer: W, report: &BootstrapReport) -> Result<(), String> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    csv_writer
        .write_record(INTERVAL_COLUMNS)
        .map_err(|e| format!("Failed to write interval header: {}", e))?;
    for row in &report.rows {
        csv_writer
            .write_record(row_cells(row))
            .map_err(|e| format!("Failed to write interval row for '{}': {}", row.other, e))?;
    }
    csv_writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Write the confidence-interval table to a file
pub fn write_interval_file(file_path: &str, report: &BootstrapReport) -> Result<(), String> {
    let writer = create_writer(file_path)?;
    write_interval_table(writer, report)?;
    println!(
        "✅ Confidence intervals written to: {} ({} pairs against '{}')",
        file_path,
        report.rows.len(),
        report.reference
    );
    Ok(())
}

/// Row order and failed pairs, printed next to the table
pub fn print_failure_summary(report: &BootstrapReport) {
    println!("📋 Interval rows (reference '{}'):", report.reference);
    for (i, row) in report.rows.iter().enumerate() {
        println!("   {:>4}  {}", i + 1, row.other);
    }

    if report.failures.is_empty() {
        return;
    }
    println!("⚠️  {} pair(s) failed and were written as nan:", report.failures.len());
    for failure in &report.failures {
        println!("   {} vs {}: {}", failure.reference, failure.other, failure.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BootstrapConfig, Interval};

    fn report(intervals: Vec<(Method, Interval)>) -> BootstrapReport {
        BootstrapReport {
            reference: "ref".to_string(),
            methods: intervals.iter().map(|(m, _)| *m).collect(),
            config: BootstrapConfig::default(),
            rows: vec![PairIntervals {
                reference: "ref".to_string(),
                other: "other".to_string(),
                intervals,
            }],
            failures: Vec::new(),
        }
    }

    fn render(report: &BootstrapReport) -> String {
        let mut buffer = Vec::new();
        write_interval_table(&mut buffer, report).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_header_and_single_method_fill() {
        let interval = Interval {
            lower: 0.25,
            upper: 0.75,
            point: 0.5,
        };
        let text = render(&report(vec![(Method::Kendall, interval)]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "SpearCIlow\tSpearCIup\tSpear\tKenCIlow\tKenCIup\tKen\tPearCIL\tPearCIup\tPear"
        );
        assert_eq!(lines[1], "nan\tnan\tnan\t0.250000\t0.750000\t0.500000\tnan\tnan\tnan");
    }

    #[test]
    fn test_column_order_follows_methods() {
        let make = |v: f64| Interval {
            lower: v,
            upper: v + 0.1,
            point: v + 0.05,
        };
        // Layer order in the report does not change column order
        let text = render(&report(vec![
            (Method::Pearson, make(0.7)),
            (Method::Spearman, make(0.1)),
            (Method::Kendall, make(0.4)),
        ]));
        let cells: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(cells[0], "0.100000");
        assert_eq!(cells[3], "0.400000");
        assert_eq!(cells[8], "0.750000");
    }

    #[test]
    fn test_undefined_interval_keeps_point() {
        let text = render(&report(vec![(Method::Pearson, Interval::undefined(-0.5))]));
        assert!(text.lines().nth(1).unwrap().ends_with("nan\tnan\t-0.500000"));
    }
}
