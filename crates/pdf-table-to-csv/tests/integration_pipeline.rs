mod common;

use std::process::Command;

use common::{fragment, grid};
use pdf_table_to_csv::{
    ExtractError, ExtractOptions, PageSelection, extract_pdf_bytes_to_csv_string,
    extract_pdf_to_csv,
};
use tempfile::tempdir;

const XS: [i64; 4] = [72, 172, 272, 372];

fn inventory() -> Vec<common::Fragment<'static>> {
    grid(
        700,
        20,
        &XS,
        &[
            &["Item", "Qty", "Price", "Total"],
            &["Pen", "3", "1.50", "4.50"],
            &["Book", "1", "9.90", "9.90"],
            &["Lamp", "2", "12.00", "24.00"],
        ],
    )
}

fn narrative() -> Vec<common::Fragment<'static>> {
    vec![
        fragment(72, 700, "Quarterly summary"),
        fragment(72, 680, "Sales were flat."),
    ]
}

#[test]
fn extracts_grid_to_bom_prefixed_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("grid.pdf");
    let output = dir.path().join("grid.csv");

    common::create_test_pdf(&input, &[inventory()]).expect("PDF fixture should be created");

    let report = extract_pdf_to_csv(&input, &output, &ExtractOptions::default())
        .expect("extraction should succeed");

    let bytes = std::fs::read(&output).expect("CSV should be readable");
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
    let csv = String::from_utf8(bytes[3..].to_vec()).expect("CSV should be UTF-8");
    assert_eq!(
        csv,
        "\"Item\",\"Qty\",\"Price\",\"Total\"\n\
         \"Pen\",\"3\",\"1.50\",\"4.50\"\n\
         \"Book\",\"1\",\"9.90\",\"9.90\"\n\
         \"Lamp\",\"2\",\"12.00\",\"24.00\""
    );
    assert_eq!(report.table_count, 1);
    assert_eq!(report.row_count, 4);
}

#[test]
fn skips_pages_without_tables() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("multi.pdf");
    let output = dir.path().join("multi.csv");

    common::create_test_pdf(&input, &[inventory(), narrative(), inventory()])
        .expect("PDF fixture should be created");

    let report = extract_pdf_to_csv(&input, &output, &ExtractOptions::default())
        .expect("extraction should succeed");

    assert_eq!(report.page_count, 3);
    assert_eq!(report.table_count, 2);
    assert_eq!(report.row_count, 8);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].page, Some(2));
}

#[test]
fn annotated_output_names_pages_and_tables() {
    let pdf = common::create_test_pdf_bytes(&[narrative(), inventory()])
        .expect("PDF fixture should be created");
    let options = ExtractOptions {
        annotate: true,
        ..ExtractOptions::default()
    };

    let (csv, _) = extract_pdf_bytes_to_csv_string(&pdf, &options).expect("extraction");
    let mut lines = csv.as_str().lines();
    assert_eq!(
        lines.next(),
        Some("\"page\",\"table_id\",\"col_1\",\"col_2\",\"col_3\",\"col_4\"")
    );
    assert_eq!(
        lines.next(),
        Some("\"2\",\"1\",\"Item\",\"Qty\",\"Price\",\"Total\"")
    );
}

#[test]
fn escapes_quotes_and_commas_in_cells() {
    let page = grid(
        500,
        20,
        &[72, 200, 330],
        &[
            &["Metric", "Value", "Unit"],
            &["Revenue, \"Q1\"", "12", "kEUR"],
        ],
    );
    let pdf = common::create_test_pdf_bytes(&[page]).expect("PDF fixture should be created");

    let (csv, _) =
        extract_pdf_bytes_to_csv_string(&pdf, &ExtractOptions::default()).expect("extraction");
    let second = csv.as_str().lines().nth(1).expect("two rows expected");
    assert_eq!(second, "\"Revenue, \"\"Q1\"\"\",\"12\",\"kEUR\"");
}

#[test]
fn reports_no_table_for_sparse_document() {
    let pdf = common::create_test_pdf_bytes(&[vec![
        fragment(72, 700, "Hello"),
        fragment(200, 700, "world"),
    ]])
    .expect("PDF fixture should be created");

    let err = extract_pdf_bytes_to_csv_string(&pdf, &ExtractOptions::default())
        .expect_err("no table expected");
    assert!(matches!(err, ExtractError::NoTableFound));
}

#[test]
fn page_selection_limits_detection() {
    let pdf = common::create_test_pdf_bytes(&[inventory(), narrative()])
        .expect("PDF fixture should be created");
    let options = ExtractOptions {
        pages: Some("2".parse::<PageSelection>().expect("selection should parse")),
        ..ExtractOptions::default()
    };

    let err = extract_pdf_bytes_to_csv_string(&pdf, &options).expect_err("page 2 has no table");
    assert!(matches!(err, ExtractError::NoTableFound));

    let options = ExtractOptions {
        pages: Some("9".parse::<PageSelection>().expect("selection should parse")),
        ..ExtractOptions::default()
    };
    let err = extract_pdf_bytes_to_csv_string(&pdf, &options).expect_err("no such page");
    assert!(matches!(err, ExtractError::NoPagesSelected));
}

#[test]
fn malformed_document_is_a_source_error() {
    let err = extract_pdf_bytes_to_csv_string(b"not a pdf", &ExtractOptions::default())
        .expect_err("garbage should not parse");
    assert!(err.is_source_error(), "unexpected error: {err:?}");
}

#[test]
fn cli_writes_next_to_input_by_default() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("report.pdf");

    common::create_test_pdf(&input, &[inventory()]).expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_pdf2csv"))
        .args(["extract", "-i", &input.to_string_lossy()])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    assert!(dir.path().join("report.csv").exists());
}

#[test]
fn cli_exits_with_code_2_when_no_table() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli-empty.pdf");
    let output = dir.path().join("cli-empty.csv");

    common::create_test_pdf(&input, &[narrative()]).expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_pdf2csv"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
    assert!(!output.exists());
}

#[test]
fn cli_lists_tokens() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tokens.pdf");

    common::create_test_pdf(&input, &[narrative()]).expect("PDF fixture should be created");

    let output = Command::new(env!("CARGO_BIN_EXE_pdf2csv"))
        .args(["tokens", "-i", &input.to_string_lossy()])
        .output()
        .expect("CLI should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let first = stdout.lines().next().expect("one line per token");
    assert!(first.starts_with("1\t72.00\t700.00\t"), "got {first:?}");
    assert!(first.ends_with("Quarterly summary"), "got {first:?}");
}

#[test]
fn cli_rejects_bad_page_selection() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("pages.pdf");

    common::create_test_pdf(&input, &[inventory()]).expect("PDF fixture should be created");

    let output = Command::new(env!("CARGO_BIN_EXE_pdf2csv"))
        .args(["extract", "-i", &input.to_string_lossy(), "--pages", "3-1"])
        .output()
        .expect("CLI should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be UTF-8");
    assert!(stderr.contains("invalid page selection"), "got {stderr:?}");
}
