use crate::columns::ColumnLayout;

/// One positioned text record as produced by a text-extraction source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTextItem {
    /// Text rendering matrix `[a b c d e f]`; `e` and `f` are the origin.
    pub transform: [f64; 6],
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: String,
}

impl RawTextItem {
    #[must_use]
    pub fn at(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            transform: [1.0, 0.0, 0.0, 1.0, x, y],
            width: None,
            height: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageItems {
    pub page_number: u32,
    pub items: Vec<RawTextItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Quantized y of the source row.
    pub y: f64,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub page: u32,
    pub columns: ColumnLayout,
    pub rows: Vec<TableRow>,
}

impl DetectedTable {
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedOutput {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    pub table_count: usize,
    pub row_count: usize,
}
