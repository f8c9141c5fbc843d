use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to decode source document: {0}")]
    SourceDecode(#[from] lopdf::Error),

    #[error("failed to decode content of page {page}: {message}")]
    PageContent { page: u32, message: String },

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("no tables found in the document")]
    NoTableFound,
}

impl ExtractError {
    /// True for failures raised by the positioned-text source rather than the table heuristics.
    #[must_use]
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::SourceDecode(_) | Self::PageContent { .. })
    }
}
