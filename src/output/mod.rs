// mod.rs - Output formatters module

pub mod frequencies;
pub mod intervals;

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::core::{CorrelationLayer, CorrelationMatrix, Method, OptimalK};

pub use frequencies::write_frequency_table;
pub use intervals::{print_failure_summary, write_interval_file, write_interval_table, INTERVAL_COLUMNS};

/// Ensure parent directory exists before creating file
pub(crate) fn ensure_parent_dir(file_path: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(file_path).parent() {
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

pub(crate) fn create_writer(file_path: &str) -> Result<BufWriter<File>, String> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| format!("Failed to create output file '{}': {}", file_path, e))?;
    Ok(BufWriter::new(file))
}

fn write_error(e: std::io::Error) -> String {
    format!("Write error: {}", e)
}

/// Matrix file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Phylip,
    Nexus,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Phylip => "phy",
            OutputFormat::Nexus => "nex",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tab-separated square matrix",
            OutputFormat::Csv => "comma-separated square matrix",
            OutputFormat::Phylip => "PHYLIP lower triangle",
            OutputFormat::Nexus => "NEXUS lower triangle",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "phylip" => Ok(OutputFormat::Phylip),
            "nexus" => Ok(OutputFormat::Nexus),
            _ => Err(format!("Unsupported output format: {}. Use: tsv, csv, phylip, nexus", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Phylip => "phylip",
            OutputFormat::Nexus => "nexus",
        };
        f.write_str(name)
    }
}

/// Correlation value as written in matrix files; undefined becomes `NA`
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// Provenance lines written at the top (or bottom, for PHYLIP) of a matrix
#[derive(Debug, Clone)]
pub struct MatrixHeader {
    pub command_line: String,
    pub generated: String,
    pub method: Method,
    pub k: usize,
}

impl MatrixHeader {
    pub fn new(command_line: &str, method: Method, k: usize) -> Self {
        Self {
            command_line: command_line.to_string(),
            generated: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            method,
            k,
        }
    }

    fn lines(&self) -> Vec<String> {
        vec![
            format!("Command: {}", self.command_line),
            format!("Generated: {}", self.generated),
            format!("kcorr v{}", env!("CARGO_PKG_VERSION")),
            format!("Method: {}, k = {}", self.method, self.k),
        ]
    }
}

/// Write one correlation layer in the given format
pub fn write_layer<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    ids: &[String],
    layer: &CorrelationLayer,
    header: &MatrixHeader,
) -> Result<(), String> {
    match format {
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = if format == OutputFormat::Tsv { '\t' } else { ',' };
            for line in header.lines() {
                writeln!(writer, "# {}", line).map_err(write_error)?;
            }

            write!(writer, "Sequence").map_err(write_error)?;
            for id in ids {
                write!(writer, "{}{}", sep, id).map_err(write_error)?;
            }
            writeln!(writer).map_err(write_error)?;

            for (i, id) in ids.iter().enumerate() {
                write!(writer, "{}", id).map_err(write_error)?;
                for value in layer.row(i) {
                    write!(writer, "{}{}", sep, format_value(*value)).map_err(write_error)?;
                }
                writeln!(writer).map_err(write_error)?;
            }
        }
        OutputFormat::Phylip => {
            writeln!(writer, "    {}", ids.len()).map_err(write_error)?;
            for (i, id) in ids.iter().enumerate() {
                write!(writer, "{:<10}", id).map_err(write_error)?;
                for j in 0..=i {
                    write!(writer, "  {}", format_value(layer.get(i, j))).map_err(write_error)?;
                }
                writeln!(writer).map_err(write_error)?;
            }

            // PHYLIP has no comment syntax; provenance goes after the matrix
            writeln!(writer).map_err(write_error)?;
            for line in header.lines() {
                writeln!(writer, "# {}", line).map_err(write_error)?;
            }
        }
        OutputFormat::Nexus => {
            writeln!(writer, "#NEXUS").map_err(write_error)?;
            for line in header.lines() {
                writeln!(writer, "[{}]", line).map_err(write_error)?;
            }
            writeln!(writer, "BEGIN DISTANCES;").map_err(write_error)?;
            writeln!(writer, "    DIMENSIONS NTAX={};", ids.len()).map_err(write_error)?;
            writeln!(writer, "    FORMAT LABELS LOWER DIAGONAL MISSING=?;").map_err(write_error)?;
            writeln!(writer, "    MATRIX").map_err(write_error)?;
            for (i, id) in ids.iter().enumerate() {
                write!(writer, "        {}", id).map_err(write_error)?;
                for j in 0..=i {
                    let value = layer.get(i, j);
                    let cell = if value.is_nan() { "?".to_string() } else { format!("{:.6}", value) };
                    write!(writer, " {}", cell).map_err(write_error)?;
                }
                writeln!(writer).map_err(write_error)?;
            }
            writeln!(writer, "    ;").map_err(write_error)?;
            writeln!(writer, "END;").map_err(write_error)?;
        }
    }
    Ok(())
}

/// Path of one layer file: `out.tsv` stays as is for a single layer and
/// becomes `out.<method>.tsv` when several layers are written.
pub fn layer_path(output: &str, method: Method, several: bool) -> String {
    if !several {
        return output.to_string();
    }
    let path = Path::new(output);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("correlation");
    let file_name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}.{}.{}", stem, method.name(), ext),
        None => format!("{}.{}", stem, method.name()),
    };
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name).to_string_lossy().into_owned(),
        _ => file_name,
    }
}

/// Write every layer of the matrix, returning the files written
pub fn write_matrix(
    output: &str,
    format: OutputFormat,
    matrix: &CorrelationMatrix,
    k: usize,
    command_line: &str,
) -> Result<Vec<String>, String> {
    let several = matrix.layers.len() > 1;
    let mut written = Vec::with_capacity(matrix.layers.len());

    for layer in &matrix.layers {
        let file_path = layer_path(output, layer.method, several);
        let mut writer = create_writer(&file_path)?;
        let header = MatrixHeader::new(command_line, layer.method, k);
        write_layer(&mut writer, format, &matrix.ids, layer, &header)?;
        writer.flush().map_err(|e| format!("Flush error: {}", e))?;

        println!("✅ {} matrix written to: {} ({})", layer.method, file_path, format.description());
        written.push(file_path);
    }
    Ok(written)
}

/// Optimal word length per sequence as pretty-printed JSON
pub fn write_optimal_k_json(file_path: &str, results: &[OptimalK]) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    serde_json::to_writer_pretty(&mut writer, results)
        .map_err(|e| format!("Failed to serialize optimal k report: {}", e))?;
    writeln!(writer).map_err(write_error)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ Optimal k report written to: {}", file_path);
    Ok(())
}
