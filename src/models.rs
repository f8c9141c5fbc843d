use pdf_table_to_csv::{DetectedTable, ExtractWarning, ExtractionReport, PageItems, RawTextItem};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_DOWNLOAD_NAME: &str = "tables.csv";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSummary {
    pub page: u32,
    pub columns: Vec<f64>,
    pub rows: Vec<Vec<String>>,
}

impl From<&DetectedTable> for TableSummary {
    fn from(table: &DetectedTable) -> Self {
        Self {
            page: table.page,
            columns: table.columns.anchors().to_vec(),
            rows: table.rows.iter().map(|row| row.cells.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarningSummary {
    pub code: String,
    pub page: Option<u32>,
    pub message: String,
}

impl From<&ExtractWarning> for WarningSummary {
    fn from(warning: &ExtractWarning) -> Self {
        Self {
            code: warning.code.as_str().to_string(),
            page: warning.page,
            message: warning.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TablesResponse {
    pub page_count: usize,
    pub table_count: usize,
    pub row_count: usize,
    pub tables: Vec<TableSummary>,
    pub warnings: Vec<WarningSummary>,
    pub cached: bool,
}

impl TablesResponse {
    pub fn new(tables: &[DetectedTable], report: &ExtractionReport) -> Self {
        Self {
            page_count: report.page_count,
            table_count: report.table_count,
            row_count: report.row_count,
            tables: tables.iter().map(TableSummary::from).collect(),
            warnings: report.warnings.iter().map(WarningSummary::from).collect(),
            cached: false,
        }
    }
}

/// One positioned fragment as sent by a client-side text extractor.
///
/// Either `transform` or both `x` and `y` must be present; pdf.js style `str` is
/// accepted for `text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenItemPayload {
    #[serde(default)]
    pub transform: Option<[f64; 6]>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(alias = "str")]
    pub text: String,
}

impl TokenItemPayload {
    fn into_raw(self, page_number: u32) -> Result<RawTextItem, ApiError> {
        let transform = match (self.transform, self.x, self.y) {
            (Some(transform), _, _) => transform,
            (None, Some(x), Some(y)) => [1.0, 0.0, 0.0, 1.0, x, y],
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "item on page {page_number} needs either transform or x and y"
                )));
            }
        };

        Ok(RawTextItem {
            transform,
            width: self.width,
            height: self.height,
            text: self.text,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPagePayload {
    #[serde(default)]
    pub page_number: Option<u32>,
    pub items: Vec<TokenItemPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokensRequest {
    pub pages: Vec<TokenPagePayload>,
}

impl TokensRequest {
    /// Pages without an explicit number are numbered by position, starting at 1.
    pub fn into_pages(self) -> Result<Vec<PageItems>, ApiError> {
        if self.pages.is_empty() {
            return Err(ApiError::BadRequest(
                "request must contain at least one page".to_string(),
            ));
        }

        (1_u32..)
            .zip(self.pages)
            .map(|(position, page)| {
                let page_number = page.page_number.unwrap_or(position);
                let items = page
                    .items
                    .into_iter()
                    .map(|item| item.into_raw(page_number))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PageItems { page_number, items })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
