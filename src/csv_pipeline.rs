use std::collections::HashMap;
use std::sync::LazyLock;

use pdf_table_to_csv::{
    CsvDocument, ExtractOptions, ExtractionReport, PageSelection, extract_pages_to_csv_string,
    extract_pdf_bytes_tables, extract_pdf_bytes_to_csv_string,
};
use regex::Regex;
use url::Url;
use worker::Fetch;

use crate::cache;
use crate::error::ApiError;
use crate::models::{DEFAULT_DOWNLOAD_NAME, TablesResponse, TokensRequest};

pub const CSV_CACHE_TTL_SECONDS: u32 = 7 * 24 * 60 * 60;
pub const CSV_CACHE_KEY_PREFIX: &str = "csv:url:v1:";
pub const TABLES_CACHE_KEY_PREFIX: &str = "tables:url:v1:";

static UNSAFE_FILE_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9._\- ]+").expect("hardcoded file name regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvCacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CsvCacheStatus {
    pub const fn as_header_value(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

pub fn parse_flag(query: &HashMap<String, String>, name: &str) -> bool {
    query.get(name).is_some_and(|value| {
        let lowered = value.trim().to_ascii_lowercase();
        lowered == "true" || lowered == "1" || lowered == "yes"
    })
}

/// Builds extraction options from the `pages` and `annotate` query parameters.
pub fn options_from_query(query: &HashMap<String, String>) -> Result<ExtractOptions, ApiError> {
    let pages = match query.get("pages").map(|raw| raw.trim()) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<PageSelection>()?),
        _ => None,
    };

    let options = ExtractOptions {
        pages,
        annotate: parse_flag(query, "annotate"),
        ..ExtractOptions::default()
    };
    options.validate()?;
    Ok(options)
}

/// Cache key suffix for the options a client can vary.
fn options_fingerprint(query: &HashMap<String, String>) -> String {
    let pages = query.get("pages").map_or("", |raw| raw.trim());
    let annotate = u8::from(parse_flag(query, "annotate"));
    format!("a{annotate}:p{pages}")
}

pub fn csv_cache_key(pdf_url: &Url, query: &HashMap<String, String>) -> String {
    format!(
        "{CSV_CACHE_KEY_PREFIX}{}:{pdf_url}",
        options_fingerprint(query)
    )
}

pub fn tables_cache_key(pdf_url: &Url, query: &HashMap<String, String>) -> String {
    format!(
        "{TABLES_CACHE_KEY_PREFIX}{}:{pdf_url}",
        options_fingerprint(query)
    )
}

/// Client-supplied name made safe for a `Content-Disposition` header, with a `.csv` extension.
pub fn download_file_name(requested: Option<&str>) -> String {
    let cleaned = requested
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .map(|name| UNSAFE_FILE_NAME_CHARS.replace_all(name, "_"))
        .map(|name| name.trim().trim_start_matches('.').to_string())
        .unwrap_or_default();

    if cleaned.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        pdf_table_to_csv::csv_file_name(&cleaned)
    }
}

/// Last path segment of the PDF URL, used as the download name.
pub fn file_name_from_url(pdf_url: &Url) -> String {
    let segment = pdf_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| urlencoding::decode(segment).map_or_else(|_| segment.into(), |s| s))
        .filter(|segment| !segment.is_empty());
    download_file_name(segment.as_deref())
}

pub fn check_upload_size(len: usize, max_bytes: usize) -> Result<(), ApiError> {
    if len == 0 {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }
    if len > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "upload of {len} bytes exceeds the limit of {max_bytes} bytes"
        )));
    }
    Ok(())
}

/// Rejects a body early when its declared `Content-Length` is already over the limit.
pub fn check_declared_size(
    content_length: Option<&str>,
    max_bytes: usize,
) -> Result<(), ApiError> {
    let declared = content_length.and_then(|value| value.trim().parse::<usize>().ok());
    match declared {
        Some(len) if len > max_bytes => check_upload_size(len, max_bytes),
        _ => Ok(()),
    }
}

pub fn convert_pdf_bytes(
    pdf_bytes: &[u8],
    options: &ExtractOptions,
) -> Result<(CsvDocument, ExtractionReport), ApiError> {
    let (csv, report) = extract_pdf_bytes_to_csv_string(pdf_bytes, options)?;
    log_report("pdf", &report);
    Ok((csv, report))
}

pub fn summarize_pdf_bytes(
    pdf_bytes: &[u8],
    options: &ExtractOptions,
) -> Result<TablesResponse, ApiError> {
    let (tables, report) = extract_pdf_bytes_tables(pdf_bytes, options)?;
    log_report("tables", &report);
    Ok(TablesResponse::new(&tables, &report))
}

pub fn convert_token_request(
    request: TokensRequest,
    options: &ExtractOptions,
) -> Result<(CsvDocument, ExtractionReport), ApiError> {
    let pages = request.into_pages()?;
    let (csv, report) = extract_pages_to_csv_string(&pages, options)?;
    log_report("tokens", &report);
    Ok((csv, report))
}

fn log_report(source: &str, report: &ExtractionReport) {
    // Console bindings only resolve inside the Workers runtime.
    if cfg!(target_arch = "wasm32") {
        worker::console_log!(
            "{source} extraction completed: pages={}, tables={}, rows={}, skipped={}",
            report.page_count,
            report.table_count,
            report.row_count,
            report.warnings.len()
        );
    }
}

pub async fn get_or_build_csv_for_url(
    pdf_url: &Url,
    query: &HashMap<String, String>,
    options: &ExtractOptions,
    force: bool,
    max_bytes: usize,
) -> Result<(Vec<u8>, CsvCacheStatus), ApiError> {
    let cache_key = csv_cache_key(pdf_url, query);
    if !force {
        if let Some(cached) = cache::get_bytes(&cache_key).await? {
            return Ok((cached, CsvCacheStatus::Hit));
        }
    }

    let pdf_bytes = fetch_pdf_bytes(pdf_url, max_bytes).await?;
    let (csv, _) = convert_pdf_bytes(&pdf_bytes, options)?;
    let bytes = csv.to_bytes();
    cache::put_bytes(
        &cache_key,
        bytes.clone(),
        CSV_CACHE_TTL_SECONDS,
        pdf_table_to_csv::CSV_MIME_TYPE,
    )
    .await?;

    let status = if force {
        CsvCacheStatus::Bypass
    } else {
        CsvCacheStatus::Miss
    };
    Ok((bytes, status))
}

pub async fn get_or_build_tables_for_url(
    pdf_url: &Url,
    query: &HashMap<String, String>,
    options: &ExtractOptions,
    force: bool,
    max_bytes: usize,
) -> Result<TablesResponse, ApiError> {
    let cache_key = tables_cache_key(pdf_url, query);
    if !force {
        if let Some(mut cached) = cache::get_json::<TablesResponse>(&cache_key).await? {
            cached.cached = true;
            return Ok(cached);
        }
    }

    let pdf_bytes = fetch_pdf_bytes(pdf_url, max_bytes).await?;
    let response = summarize_pdf_bytes(&pdf_bytes, options)?;
    cache::put_json(&cache_key, &response, CSV_CACHE_TTL_SECONDS).await?;
    Ok(response)
}

async fn fetch_pdf_bytes(pdf_url: &Url, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let mut response = Fetch::Url(pdf_url.clone()).send().await?;
    let status = response.status_code();
    if status >= 400 {
        return Err(ApiError::Upstream(format!(
            "failed to fetch PDF source: status {status}"
        )));
    }

    let declared = response.headers().get("Content-Length")?;
    check_declared_size(declared.as_deref(), max_bytes)?;

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(ApiError::Upstream("fetched PDF is empty".to_string()));
    }
    check_upload_size(bytes.len(), max_bytes)?;
    Ok(bytes)
}
