use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{Metadata, ReferenceOperand, Series, SOURCE_KEY};
use super::text::{from_text, to_text, ParseMode};
use crate::error::SeriesError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Csv,
}

impl Format {
    fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Format::Json,
            "csv" => Format::Csv,
            _ => Format::Text,
        }
    }
}

/// Load a series from a file with the default (permissive) parsing.
///
/// Supported formats, chosen by extension:
/// * `.json` – `{ "x": [...], "y": [...], "metadata": {...} }`
/// * `.csv`  – header-less `x,y` rows, other two-field rows are metadata
/// * anything else – the text format (metadata block + `x y` lines)
///
/// The series' `filepath` metadata is set to `path` unless the file itself
/// records one.
pub fn load_series(path: &Path) -> Result<Series> {
    load_series_with(path, ParseMode::Permissive)
}

/// [`load_series`] with an explicit [`ParseMode`] for the text format.
pub fn load_series_with(path: &Path, mode: ParseMode) -> Result<Series> {
    let source = path.to_string_lossy();
    match Format::of(path) {
        Format::Json => load_json(path),
        Format::Csv => load_csv(path),
        Format::Text => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            from_text(&source, &text, mode)
                .with_context(|| format!("parsing {}", path.display()))
        }
    }
}

/// Write a series to `path`, in the format implied by its extension.
pub fn save_series(series: &Series, path: &Path) -> Result<()> {
    match Format::of(path) {
        Format::Json => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, series).context("writing JSON")?;
            writer.flush().context("flushing JSON")?;
        }
        Format::Csv => save_csv(series, path)?,
        Format::Text => std::fs::write(path, to_text(series))
            .with_context(|| format!("writing {}", path.display()))?,
    }
    log::debug!("wrote {} samples to {}", series.len(), path.display());
    Ok(())
}

/// Interpret a command-line token as either an existing file (loaded as a
/// series) or a bare number.
///
/// Commas are accepted as decimal points. Anything else is a
/// [`SeriesError::TypeMismatch`].
pub fn resolve_reference_operand(token: &str) -> Result<ReferenceOperand> {
    let path = Path::new(token);
    if path.is_file() {
        return Ok(ReferenceOperand::Series(load_series(path)?));
    }
    token
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(ReferenceOperand::Scalar)
        .map_err(|_| SeriesError::TypeMismatch(token.to_string()).into())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let mut series: Series = serde_json::from_str(&text).context("parsing JSON")?;
    series
        .metadata_mut()
        .entry(SOURCE_KEY.to_string())
        .or_insert_with(|| path.to_string_lossy().into_owned());
    Ok(series)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: no header row. Rows whose first two fields are numbers are
/// samples; any other row with at least two fields is `key,value...`
/// metadata.
fn load_csv(path: &Path) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), path.to_string_lossy().into_owned());
    let mut x = Vec::new();
    let mut y = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let (Some(first), Some(second)) = (record.get(0), record.get(1)) else {
            continue;
        };
        match (first.parse::<f64>(), second.parse::<f64>()) {
            (Ok(xv), Ok(yv)) => {
                x.push(xv);
                y.push(yv);
            }
            _ => {
                let value = record.iter().skip(1).collect::<Vec<_>>().join(",");
                metadata.insert(first.to_string(), value);
            }
        }
    }

    Series::new(x, y, Some(metadata)).context("building series from CSV")
}

fn save_csv(series: &Series, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context("creating CSV")?;
    for (key, value) in series.metadata() {
        writer.write_record([key.as_str(), value.as_str()])?;
    }
    for (x, y) in series.points() {
        writer.write_record([format!("{x:.6}"), format!("{y:.6}")])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::of(Path::new("a.JSON")), Format::Json);
        assert_eq!(Format::of(Path::new("a.csv")), Format::Csv);
        assert_eq!(Format::of(Path::new("a.dat")), Format::Text);
        assert_eq!(Format::of(Path::new("noext")), Format::Text);
    }

    #[test]
    fn bare_numbers_resolve_to_scalars() {
        assert_eq!(
            resolve_reference_operand("2,5").unwrap(),
            ReferenceOperand::Scalar(2.5)
        );
        assert_eq!(
            resolve_reference_operand("-1e3").unwrap(),
            ReferenceOperand::Scalar(-1000.0)
        );
    }

    #[test]
    fn unknown_tokens_are_type_mismatches() {
        let err = resolve_reference_operand("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeriesError>(),
            Some(SeriesError::TypeMismatch(_))
        ));
    }
}
