use crate::columns::{ColumnLayout, detect_columns};
use crate::options::ExtractOptions;
use crate::rows::Row;

/// The column layout voted most consistent across a page's rows.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableStructure {
    pub layout: ColumnLayout,
    /// Index of the row the anchors were taken from.
    pub source_row: usize,
    /// Number of other rows aligned with `layout`.
    pub score: usize,
}

/// Scores every sufficiently wide row's anchors against all other rows.
///
/// Candidates are visited in row order and only a strictly higher score replaces the
/// current best, so ties go to the topmost candidate. A layout no other row agrees with is
/// never a structure.
pub(crate) fn find_table_structure(
    rows: &[Row],
    options: &ExtractOptions,
) -> Option<TableStructure> {
    let mut best: Option<TableStructure> = None;

    for (index, row) in rows.iter().enumerate() {
        if row.len() < options.min_candidate_tokens {
            continue;
        }

        let layout = detect_columns(&row.tokens, options.column_separation);
        let score = rows
            .iter()
            .enumerate()
            .filter(|(other_index, other)| {
                *other_index != index
                    && layout.matches_row(
                        &other.tokens,
                        options.alignment_tolerance,
                        options.alignment_ratio,
                    )
            })
            .count();

        tracing::trace!(row = index, anchors = layout.len(), score, "scored column candidate");

        if score > 0 && best.as_ref().is_none_or(|current| score > current.score) {
            best = Some(TableStructure {
                layout,
                source_row: index,
                score,
            });
        }
    }

    best
}
