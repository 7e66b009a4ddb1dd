//! CSV storage layer for slot datasets.
//!
//! One file is one dataset. Known headers are parsed into typed
//! [`SlotRecord`] fields, unknown headers are carried through untouched, and
//! the original column order is kept on write.

use eyre::{eyre, Context, Result};
use std::path::{Path, PathBuf};

use crate::types::{
    Column, ColumnKind, EnrichedDataset, Header, OutputOptions, RawDataset, SlotRecord,
    REG_HIGH_CONFIDENCE_THEFT, SP_HIGH_CONFIDENCE_THEFT, SURROUNDING_MAX_BID, VANILLA_BLOCK,
};

/// File name prefix of enriched datasets.
pub const PROCESSED_PREFIX: &str = "processed_";

/// Reads one CSV dataset.
///
/// Empty cells become `None`. Flag cells accept `true`/`false` in any case;
/// other values are treated as unknown.
///
/// # Errors
/// Returns error if the file cannot be opened, a row is malformed, the
/// header has no `slot` column, or a slot is not an unsigned integer.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_dataset(path: &Path) -> Result<RawDataset> {
    let mut reader = csv::Reader::from_path(path)
        .wrap_err_with(|| format!("failed to open dataset {}", path.display()))?;

    let headers: Vec<Header> = reader
        .headers()
        .wrap_err_with(|| format!("failed to read header of {}", path.display()))?
        .iter()
        .map(Header::parse)
        .collect();

    if !headers.contains(&Header::Known(Column::Slot)) {
        return Err(eyre!("dataset {} has no slot column", path.display()));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record =
            result.wrap_err_with(|| format!("failed to read line {} of {}", line, path.display()))?;
        let row = parse_row(&headers, &record)
            .wrap_err_with(|| format!("invalid line {} of {}", line, path.display()))?;
        rows.push(row);
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(dataset = %name, rows = rows.len(), columns = headers.len(), "dataset loaded");

    Ok(RawDataset {
        name,
        headers,
        rows,
    })
}

fn parse_row(headers: &[Header], record: &csv::StringRecord) -> Result<SlotRecord<String>> {
    let mut row = SlotRecord::<String>::default();

    for (position, (header, cell)) in headers.iter().zip(record.iter()).enumerate() {
        let column = match header {
            Header::Known(column) => *column,
            Header::Other(_) => {
                row.extra.insert(position, cell.to_string());
                continue;
            }
        };

        let value = (!cell.is_empty()).then(|| cell.to_string());
        match column.kind() {
            ColumnKind::Key => {
                row.slot = cell
                    .trim()
                    .parse::<u64>()
                    .wrap_err_with(|| format!("slot {:?} is not an unsigned integer", cell))?;
            }
            ColumnKind::Flag => {
                if let Some(flag) = row.flag_mut(column) {
                    *flag = parse_flag(column, cell);
                }
            }
            ColumnKind::Text => {
                if let Some(text) = row.text_mut(column) {
                    *text = value;
                }
            }
            ColumnKind::Amount => {
                if let Some(amount) = row.amount_mut(column) {
                    *amount = value;
                }
            }
        }
    }

    Ok(row)
}

fn parse_flag(column: Column, cell: &str) -> Option<bool> {
    let trimmed = cell.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        if !trimmed.is_empty() {
            tracing::debug!(column = %column, value = trimmed, "unrecognized flag value treated as unknown");
        }
        None
    }
}

/// Writes an enriched dataset.
///
/// Original columns come first in their input order, followed by
/// `vanilla_block`, `sp_high-confidence_theft`, `reg_high-confidence_theft`
/// and, when enabled, `surrounding_max_bid`.
///
/// # Errors
/// Returns error if the file cannot be created or written.
#[tracing::instrument(skip_all, fields(path = %path.display(), rows = dataset.len()))]
pub fn write_dataset(path: &Path, dataset: &EnrichedDataset, options: OutputOptions) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    let mut header_row: Vec<&str> = dataset.headers.iter().map(Header::name).collect();
    header_row.extend([VANILLA_BLOCK, SP_HIGH_CONFIDENCE_THEFT, REG_HIGH_CONFIDENCE_THEFT]);
    if options.surrounding_max_bid {
        header_row.push(SURROUNDING_MAX_BID);
    }
    writer
        .write_record(&header_row)
        .wrap_err_with(|| format!("failed to write header of {}", path.display()))?;

    let style = options.flag_style;
    for row in &dataset.rows {
        let mut cells: Vec<String> = dataset
            .headers
            .iter()
            .enumerate()
            .map(|(position, header)| render_cell(position, header, &row.record))
            .collect();

        cells.push(style.render(row.vanilla_block).to_string());
        cells.push(style.render(row.theft.sp_high_confidence_theft()).to_string());
        cells.push(style.render(row.theft.reg_high_confidence_theft()).to_string());
        if options.surrounding_max_bid {
            cells.push(row.surrounding_max_bid.map(format_eth).unwrap_or_default());
        }

        writer
            .write_record(&cells)
            .wrap_err_with(|| format!("failed to write slot {} to {}", row.record.slot, path.display()))?;
    }

    writer
        .flush()
        .wrap_err_with(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn render_cell(position: usize, header: &Header, record: &SlotRecord<f64>) -> String {
    let column = match header {
        Header::Known(column) => *column,
        Header::Other(_) => return record.extra.get(&position).cloned().unwrap_or_default(),
    };

    match column.kind() {
        ColumnKind::Key => record.slot.to_string(),
        ColumnKind::Flag => record
            .flag(column)
            .map(|flag| flag.to_string())
            .unwrap_or_default(),
        ColumnKind::Text => record.text(column).map(str::to_string).unwrap_or_default(),
        ColumnKind::Amount => record
            .amount(column)
            .map(|value| format_eth(*value))
            .unwrap_or_default(),
    }
}

/// Formats an ETH amount with at most 8 decimals.
///
/// Trailing zeros are trimmed but one fractional digit is always kept:
/// - `1.0` -> `"1.0"`
/// - `0.123` -> `"0.123"`
/// - `0.00000001` -> `"0.00000001"`
pub fn format_eth(value: f64) -> String {
    // Avoid "-0.0" for values that rounded to zero from below.
    let value = if value == 0.0 { 0.0 } else { value };
    let mut text = format!("{value:.8}");
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}

/// Lists the `.csv` datasets in `dir`, sorted by path.
///
/// # Errors
/// Returns error if the directory cannot be read.
pub fn discover_datasets(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("failed to read source directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .wrap_err_with(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Destination of the enriched copy of `source` inside `destination_dir`.
pub fn processed_path(destination_dir: &Path, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination_dir.join(format!("{PROCESSED_PREFIX}{name}"))
}
