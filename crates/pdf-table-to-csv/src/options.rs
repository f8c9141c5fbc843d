use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ExtractError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn parse_page_list(input: &str) -> Result<BTreeSet<u32>, String> {
    let mut pages = BTreeSet::new();
    for token in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range start: '{start}'"))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range end: '{end}'"))?;
            if start == 0 || end == 0 {
                return Err("pages are 1-based".to_string());
            }
            if end < start {
                return Err(format!(
                    "invalid range '{token}': end is smaller than start"
                ));
            }
            pages.extend(start..=end);
        } else {
            let page: u32 = token
                .parse()
                .map_err(|_| format!("invalid page number: '{token}'"))?;
            if page == 0 {
                return Err("pages are 1-based".to_string());
            }
            pages.insert(page);
        }
    }

    if pages.is_empty() {
        return Err("page selection cannot be empty".to_string());
    }

    Ok(pages)
}

impl FromStr for PageSelection {
    type Err = ExtractError;

    /// Parses `1-3,5` style selections; pages are 1-based.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_page_list(input)
            .map(|pages| Self { pages })
            .map_err(ExtractError::InvalidPageSelection)
    }
}

/// Direction in which page y-coordinates grow.
///
/// PDF user space grows upward, so the top of the page has the largest y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YAxis {
    #[default]
    Up,
    Down,
}

/// Thresholds for the row/column heuristics and the output layout.
///
/// All distances are in page layout units (points for PDF input).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    /// Rows are keyed by `round(y / row_quantum)`.
    pub row_quantum: f64,
    pub y_axis: YAxis,
    /// Minimum gap between two column anchors detected in one row.
    pub column_separation: f64,
    /// Maximum x-distance for a token to count as sitting on an anchor while scoring.
    pub alignment_tolerance: f64,
    /// Share of a candidate's anchor count another row must hit to count as aligned.
    pub alignment_ratio: f64,
    /// Maximum x-distance (exclusive) for placing a token into a cell.
    pub assignment_tolerance: f64,
    pub min_candidate_tokens: usize,
    pub min_columns: usize,
    pub min_tokens: usize,
    pub min_consecutive_rows: usize,
    /// Prefix every output row with page and table id, padded under a header row.
    pub annotate: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            row_quantum: 1.0,
            y_axis: YAxis::Up,
            column_separation: 10.0,
            alignment_tolerance: 5.0,
            alignment_ratio: 0.70,
            assignment_tolerance: 20.0,
            min_candidate_tokens: 3,
            min_columns: 3,
            min_tokens: 6,
            min_consecutive_rows: 2,
            annotate: false,
        }
    }
}

impl ExtractOptions {
    /// Rejects thresholds the heuristics cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidOption`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !(self.row_quantum.is_finite() && self.row_quantum > 0.0) {
            return Err(ExtractError::InvalidOption(
                "row_quantum must be a positive number".to_string(),
            ));
        }

        for (name, value) in [
            ("column_separation", self.column_separation),
            ("alignment_tolerance", self.alignment_tolerance),
            ("assignment_tolerance", self.assignment_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        if !(self.alignment_ratio > 0.0 && self.alignment_ratio <= 1.0) {
            return Err(ExtractError::InvalidOption(
                "alignment_ratio must be within (0, 1]".to_string(),
            ));
        }

        if self.min_columns < 2 {
            return Err(ExtractError::InvalidOption(
                "min_columns must be at least 2".to_string(),
            ));
        }

        if self.min_consecutive_rows == 0 {
            return Err(ExtractError::InvalidOption(
                "min_consecutive_rows must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
