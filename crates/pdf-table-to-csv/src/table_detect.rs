use crate::cells::assign_cells;
use crate::columns::ColumnLayout;
use crate::error::ExtractError;
use crate::model::{DetectedTable, PageItems, TableRow};
use crate::options::ExtractOptions;
use crate::rows::{Row, group_rows};
use crate::structure::find_table_structure;
use crate::token::normalize_tokens;
use crate::warning::{ExtractWarning, WarningCode};

fn is_table_shaped(row: &Row, layout: &ColumnLayout, options: &ExtractOptions) -> bool {
    row.len() >= options.min_candidate_tokens
        && layout.matches_row(
            &row.tokens,
            options.alignment_tolerance,
            options.alignment_ratio,
        )
}

fn longest_table_run(rows: &[Row], layout: &ColumnLayout, options: &ExtractOptions) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for row in rows {
        if is_table_shaped(row, layout, options) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Runs the row/column heuristics over one page.
///
/// Threshold failures are not errors: the page yields no table and a warning says why.
fn detect_table_in_page(
    page: &PageItems,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<DetectedTable> {
    let page_number = page.page_number;
    let tokens = normalize_tokens(&page.items);
    if tokens.is_empty() {
        warnings.push(
            ExtractWarning::new(WarningCode::EmptyPage, "page has no text").with_page(page_number),
        );
        return None;
    }

    if tokens.len() < options.min_tokens {
        warnings.push(
            ExtractWarning::new(
                WarningCode::TooFewTokens,
                format!(
                    "page has {} text fragments; at least {} are needed for a table",
                    tokens.len(),
                    options.min_tokens
                ),
            )
            .with_page(page_number),
        );
        return None;
    }

    let rows = group_rows(&tokens, options.row_quantum, options.y_axis);
    let Some(structure) = find_table_structure(&rows, options) else {
        warnings.push(
            ExtractWarning::new(
                WarningCode::NoAlignedRows,
                "no row layout is shared by another row",
            )
            .with_page(page_number),
        );
        return None;
    };
    if structure.layout.len() < options.min_columns {
        warnings.push(
            ExtractWarning::new(
                WarningCode::TooFewColumns,
                format!("no row layout with at least {} columns", options.min_columns),
            )
            .with_page(page_number),
        );
        return None;
    }

    let run = longest_table_run(&rows, &structure.layout, options);
    if run < options.min_consecutive_rows {
        warnings.push(
            ExtractWarning::new(
                WarningCode::NoConsecutiveRows,
                format!(
                    "longest run of aligned rows is {run}; {} needed",
                    options.min_consecutive_rows
                ),
            )
            .with_page(page_number),
        );
        return None;
    }

    let table_rows = rows
        .iter()
        .filter_map(|row| {
            assign_cells(&row.tokens, &structure.layout, options.assignment_tolerance)
                .map(|cells| TableRow { y: row.y, cells })
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        page = page_number,
        columns = structure.layout.len(),
        rows = table_rows.len(),
        score = structure.score,
        "table detected"
    );

    Some(DetectedTable {
        page: page_number,
        columns: structure.layout,
        rows: table_rows,
    })
}

/// Detects at most one table per page, in page order.
///
/// # Errors
///
/// Returns [`ExtractError::NoTableFound`] when no page yields a table.
pub(crate) fn detect_tables(
    pages: &[PageItems],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<DetectedTable>, ExtractError> {
    let tables = pages
        .iter()
        .filter_map(|page| detect_table_in_page(page, options, warnings))
        .collect::<Vec<_>>();

    if tables.is_empty() {
        return Err(ExtractError::NoTableFound);
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::{detect_table_in_page, detect_tables};
    use crate::error::ExtractError;
    use crate::model::{PageItems, RawTextItem};
    use crate::options::ExtractOptions;
    use crate::warning::WarningCode;

    const XS: [f64; 4] = [0.0, 100.0, 200.0, 300.0];
    const YS: [f64; 4] = [500.0, 480.0, 460.0, 440.0];

    fn grid_page(page_number: u32) -> PageItems {
        let mut items = Vec::new();
        for (row, y) in YS.iter().enumerate() {
            for (col, x) in XS.iter().enumerate() {
                items.push(RawTextItem::at(*x, *y, format!("r{row}c{col}")));
            }
        }
        PageItems { page_number, items }
    }

    #[test]
    fn four_by_four_grid_top_row_first() {
        let mut warnings = Vec::new();
        let table = detect_table_in_page(&grid_page(1), &ExtractOptions::default(), &mut warnings)
            .expect("grid should be a table");

        assert!(warnings.is_empty());
        assert_eq!(table.columns.anchors(), &XS);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].y, 500.0);
        assert_eq!(table.rows[0].cells, vec!["r0c0", "r0c1", "r0c2", "r0c3"]);
        assert_eq!(table.rows[3].cells, vec!["r3c0", "r3c1", "r3c2", "r3c3"]);
        assert!(table.rows.iter().all(|row| row.cells.len() == table.width()));
    }

    #[test]
    fn input_order_does_not_change_row_order() {
        let mut page = grid_page(1);
        page.items.reverse();
        let mut warnings = Vec::new();
        let table = detect_table_in_page(&page, &ExtractOptions::default(), &mut warnings)
            .expect("grid should be a table");
        let ys = table.rows.iter().map(|row| row.y).collect::<Vec<_>>();
        assert_eq!(ys, YS);
    }

    #[test]
    fn two_tokens_are_not_a_table() {
        let page = PageItems {
            page_number: 1,
            items: vec![RawTextItem::at(0.0, 10.0, "a"), RawTextItem::at(100.0, 10.0, "b")],
        };
        let mut warnings = Vec::new();
        assert!(detect_table_in_page(&page, &ExtractOptions::default(), &mut warnings).is_none());
        assert_eq!(warnings[0].code, WarningCode::TooFewTokens);

        let err = detect_tables(&[page], &ExtractOptions::default(), &mut warnings)
            .expect_err("no table expected");
        assert!(matches!(err, ExtractError::NoTableFound));
    }

    #[test]
    fn two_column_layout_is_rejected() {
        let items = [500.0, 480.0, 460.0]
            .iter()
            .flat_map(|y| {
                [
                    RawTextItem::at(0.0, *y, "k"),
                    RawTextItem::at(5.0, *y, "k2"),
                    RawTextItem::at(100.0, *y, "v"),
                ]
            })
            .collect();
        let page = PageItems {
            page_number: 2,
            items,
        };
        let mut warnings = Vec::new();
        assert!(detect_table_in_page(&page, &ExtractOptions::default(), &mut warnings).is_none());
        assert_eq!(warnings[0].code, WarningCode::TooFewColumns);
        assert_eq!(warnings[0].page, Some(2));
    }

    #[test]
    fn aligned_rows_must_be_consecutive() {
        let mut items = Vec::new();
        for x in [0.0, 100.0, 200.0] {
            items.push(RawTextItem::at(x, 500.0, "top"));
            items.push(RawTextItem::at(x, 400.0, "bottom"));
        }
        items.push(RawTextItem::at(50.0, 450.0, "a paragraph between"));
        let page = PageItems {
            page_number: 1,
            items,
        };

        let mut warnings = Vec::new();
        assert!(detect_table_in_page(&page, &ExtractOptions::default(), &mut warnings).is_none());
        assert_eq!(warnings[0].code, WarningCode::NoConsecutiveRows);
    }

    #[test]
    fn single_wide_line_is_not_a_table() {
        let mut items = vec![
            RawTextItem::at(0.0, 500.0, "Name"),
            RawTextItem::at(100.0, 500.0, "Qty"),
            RawTextItem::at(200.0, 500.0, "Price"),
        ];
        for (x, y) in [(50.0, 480.0), (150.0, 460.0), (250.0, 440.0)] {
            items.push(RawTextItem::at(x, y, "prose"));
        }
        let page = PageItems {
            page_number: 4,
            items,
        };
        let options = ExtractOptions {
            min_consecutive_rows: 1,
            ..ExtractOptions::default()
        };

        let mut warnings = Vec::new();
        assert!(detect_table_in_page(&page, &options, &mut warnings).is_none());
        assert_eq!(warnings[0].code, WarningCode::NoAlignedRows);
        assert_eq!(warnings[0].page, Some(4));
    }

    #[test]
    fn rows_without_assigned_text_are_dropped() {
        let mut page = grid_page(1);
        page.items.push(RawTextItem::at(150.0, 300.0, "footnote"));
        let mut warnings = Vec::new();
        let table = detect_table_in_page(&page, &ExtractOptions::default(), &mut warnings)
            .expect("grid should be a table");
        assert_eq!(table.rows.len(), 4);
    }

    #[test]
    fn partial_success_keeps_table_pages() {
        let empty = PageItems {
            page_number: 1,
            items: vec![RawTextItem::at(0.0, 0.0, "   ")],
        };
        let mut warnings = Vec::new();
        let tables = detect_tables(
            &[empty, grid_page(2)],
            &ExtractOptions::default(),
            &mut warnings,
        )
        .expect("second page has a table");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::EmptyPage);
    }
}
