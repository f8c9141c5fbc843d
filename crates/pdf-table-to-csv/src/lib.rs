//! Infers tables from positioned page text and writes them as CSV.
//!
//! Pages flow through a fixed pipeline: tokens are normalized, grouped into rows by
//! quantized y, the row whose column anchors recur most across the page supplies the
//! layout, and every row is projected onto that layout. A page with fewer than
//! two consecutive aligned rows or fewer than three columns yields no table.

mod cells;
mod columns;
mod csv_out;
mod error;
mod merge;
mod model;
mod options;
mod pdf_reader;
mod rows;
mod structure;
mod table_detect;
mod token;
mod warning;

use std::path::Path;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::merge::merge_tables;
use crate::table_detect::detect_tables;

pub use columns::ColumnLayout;
pub use csv_out::{BYTE_ORDER_MARK, CSV_MIME_TYPE, CsvDocument, csv_file_name};
pub use error::ExtractError;
pub use model::{DetectedTable, PageItems, RawTextItem, TableRow};
pub use options::{ExtractOptions, PageSelection, YAxis};
pub use pdf_reader::{read_pdf_pages, read_pdf_pages_from_bytes};
pub use token::{DEFAULT_LINE_HEIGHT, Token};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub table_count: usize,
    pub row_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

/// Normalized tokens of one page, as the table heuristics see them.
#[must_use]
pub fn normalize_page(page: &PageItems) -> Vec<Token> {
    token::normalize_tokens(&page.items)
}

/// Detects tables on every page, in page order.
///
/// Pages that fail a threshold are skipped and explained in the report warnings.
///
/// # Errors
///
/// Returns [`ExtractError::NoTableFound`] when no page yields a table, or
/// [`ExtractError::InvalidOption`] for unusable thresholds.
pub fn extract_tables(
    pages: &[PageItems],
    options: &ExtractOptions,
) -> Result<(Vec<DetectedTable>, ExtractionReport), ExtractError> {
    options.validate()?;

    let mut warnings = Vec::new();
    let tables = detect_tables(pages, options, &mut warnings).inspect_err(|_| {
        tracing::info!(pages = pages.len(), skipped = warnings.len(), "no table found");
    })?;

    let report = ExtractionReport {
        page_count: pages.len(),
        table_count: tables.len(),
        row_count: tables.iter().map(|table| table.rows.len()).sum(),
        warnings,
    };
    Ok((tables, report))
}

/// Encodes detected tables using the layout selected by `options.annotate`.
///
/// # Errors
///
/// Fails only if the CSV writer does.
pub fn tables_to_csv(
    tables: &[DetectedTable],
    options: &ExtractOptions,
) -> Result<CsvDocument, ExtractError> {
    write_csv_to_string(&merge_tables(tables, options.annotate))
}

/// Runs detection and encoding over already extracted pages.
///
/// # Errors
///
/// See [`extract_tables`].
pub fn extract_pages_to_csv_string(
    pages: &[PageItems],
    options: &ExtractOptions,
) -> Result<(CsvDocument, ExtractionReport), ExtractError> {
    let (tables, report) = extract_tables(pages, options)?;
    let csv = tables_to_csv(&tables, options)?;
    Ok((csv, report))
}

/// Reads a PDF, detects its tables and writes BOM-prefixed CSV to `output_csv`.
///
/// # Errors
///
/// Propagates source decoding failures unchanged; see also [`extract_tables`].
pub fn extract_pdf_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.validate()?;

    let pages = read_pdf_pages(input_pdf, options.pages.as_ref())?;
    let (tables, report) = extract_tables(&pages, options)?;
    write_csv(output_csv, &merge_tables(&tables, options.annotate))?;

    Ok(report)
}

/// Detects the tables of an in-memory PDF.
///
/// # Errors
///
/// Propagates source decoding failures unchanged; see also [`extract_tables`].
pub fn extract_pdf_bytes_tables(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(Vec<DetectedTable>, ExtractionReport), ExtractError> {
    options.validate()?;

    let pages = read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    extract_tables(&pages, options)
}

/// In-memory variant of [`extract_pdf_to_csv`].
///
/// # Errors
///
/// See [`extract_pdf_bytes_tables`].
pub fn extract_pdf_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(CsvDocument, ExtractionReport), ExtractError> {
    let (tables, report) = extract_pdf_bytes_tables(input_pdf, options)?;
    let csv = tables_to_csv(&tables, options)?;
    Ok((csv, report))
}
