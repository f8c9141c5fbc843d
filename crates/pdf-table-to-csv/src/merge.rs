use crate::model::{DetectedTable, MergedOutput};

fn padded(cells: &[String], width: usize) -> impl Iterator<Item = String> + '_ {
    cells
        .iter()
        .cloned()
        .chain(std::iter::repeat_n(String::new(), width.saturating_sub(cells.len())))
}

/// Concatenates the rows of all tables in page order.
///
/// With `annotate`, a `page,table_id,col_N` header is added and every row is prefixed with
/// its page and 1-based table id, padded to the widest table.
pub(crate) fn merge_tables(tables: &[DetectedTable], annotate: bool) -> MergedOutput {
    let row_count = tables.iter().map(|table| table.rows.len()).sum();

    if !annotate {
        let rows = tables
            .iter()
            .flat_map(|table| table.rows.iter().map(|row| row.cells.clone()))
            .collect();
        return MergedOutput {
            headers: None,
            rows,
            table_count: tables.len(),
            row_count,
        };
    }

    let width = tables.iter().map(DetectedTable::width).max().unwrap_or(0);
    let mut headers = vec!["page".to_string(), "table_id".to_string()];
    headers.extend((1..=width).map(|index| format!("col_{index}")));

    let mut rows = Vec::with_capacity(row_count);
    for (index, table) in tables.iter().enumerate() {
        let table_id = index + 1;
        for data_row in &table.rows {
            let mut row = Vec::with_capacity(width + 2);
            row.push(table.page.to_string());
            row.push(table_id.to_string());
            row.extend(padded(&data_row.cells, width));
            rows.push(row);
        }
    }

    MergedOutput {
        headers: Some(headers),
        rows,
        table_count: tables.len(),
        row_count,
    }
}
