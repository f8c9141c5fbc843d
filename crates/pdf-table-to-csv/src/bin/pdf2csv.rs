use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdf_table_to_csv::{
    ExtractError, ExtractOptions, ExtractionReport, PageSelection, YAxis, csv_file_name,
    extract_pdf_to_csv, normalize_page, read_pdf_pages,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2csv",
    version,
    about = "Infer tables from positioned PDF text and export them as CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect tables and write them as CSV.
    Extract(ExtractArgs),
    /// Print the positioned text fragments the detector works on.
    Tokens(TokensArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path. Defaults to the input path with a .csv extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Prefix rows with page and table id under a page,table_id,col_N header.
    #[arg(long)]
    annotate: bool,

    /// Vertical distance that maps to one row key.
    #[arg(long, default_value_t = 1.0)]
    row_quantum: f64,

    /// Treat y as growing down the page instead of up.
    #[arg(long)]
    y_down: bool,

    /// Minimum gap between column anchors detected in a row.
    #[arg(long, default_value_t = 10.0)]
    column_separation: f64,

    /// Maximum x-distance for a fragment to count as aligned with a column.
    #[arg(long, default_value_t = 5.0)]
    alignment_tolerance: f64,

    /// Share of columns another row must hit to vote for a layout.
    #[arg(long, default_value_t = 0.70)]
    alignment_ratio: f64,

    /// Maximum x-distance for placing a fragment into a cell.
    #[arg(long, default_value_t = 20.0)]
    assignment_tolerance: f64,

    /// Minimum number of columns a table must have.
    #[arg(long, default_value_t = 3)]
    min_columns: usize,

    /// Print every skipped-page warning.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct TokensArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,
}

fn parse_pages(pages: Option<&str>) -> Result<Option<PageSelection>> {
    pages
        .map(PageSelection::from_str)
        .transpose()
        .context("failed to parse --pages")
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let options = ExtractOptions {
        pages: parse_pages(args.pages.as_deref())?,
        row_quantum: args.row_quantum,
        y_axis: if args.y_down { YAxis::Down } else { YAxis::Up },
        column_separation: args.column_separation,
        alignment_tolerance: args.alignment_tolerance,
        alignment_ratio: args.alignment_ratio,
        assignment_tolerance: args.assignment_tolerance,
        min_columns: args.min_columns,
        annotate: args.annotate,
        ..ExtractOptions::default()
    };
    options.validate()?;
    Ok(options)
}

fn output_path(args: &ExtractArgs) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        PathBuf::from(csv_file_name(&args.input.to_string_lossy()))
    })
}

fn log_report(report: &ExtractionReport, output: &std::path::Path, verbose: bool) {
    eprintln!(
        "wrote {} row(s) from {} table(s) to '{}'",
        report.row_count,
        report.table_count,
        output.display()
    );

    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} page(s) skipped", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {} page={:?}: {}",
                warning.code.as_str(),
                warning.page,
                warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExitCode> {
    let options = parse_options(args)?;
    let output = output_path(args);
    match extract_pdf_to_csv(&args.input, &output, &options) {
        Ok(report) => {
            log_report(&report, &output, args.verbose);
            Ok(ExitCode::SUCCESS)
        }
        Err(ExtractError::NoTableFound) => {
            eprintln!("no tables found in '{}'", args.input.display());
            Ok(ExitCode::from(2))
        }
        Err(error) => Err(error)
            .with_context(|| format!("failed to extract tables from '{}'", args.input.display())),
    }
}

fn run_tokens(args: &TokensArgs) -> Result<ExitCode> {
    let selection = parse_pages(args.pages.as_deref())?;
    let pages = read_pdf_pages(&args.input, selection.as_ref())
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    for page in &pages {
        for token in normalize_page(page) {
            println!(
                "{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{}",
                page.page_number, token.x, token.y, token.width, token.height, token.text
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf_table_to_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Tokens(args) => run_tokens(args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
