#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    EmptyPage,
    TooFewTokens,
    NoAlignedRows,
    TooFewColumns,
    NoConsecutiveRows,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyPage => "empty_page",
            Self::TooFewTokens => "too_few_tokens",
            Self::NoAlignedRows => "no_aligned_rows",
            Self::TooFewColumns => "too_few_columns",
            Self::NoConsecutiveRows => "no_consecutive_rows",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}
