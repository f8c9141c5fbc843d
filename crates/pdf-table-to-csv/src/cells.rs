use crate::columns::ColumnLayout;
use crate::token::Token;

/// Places each token into the slot of its nearest anchor.
///
/// A token is placed only when it is strictly closer than `tolerance` and the slot is
/// still empty; tokens are taken in row order, so the first one claims a contested slot.
/// Returns `None` when no slot received text.
pub(crate) fn assign_cells(
    tokens: &[Token],
    layout: &ColumnLayout,
    tolerance: f64,
) -> Option<Vec<String>> {
    let mut cells = vec![String::new(); layout.len()];

    for token in tokens {
        let Some((index, distance)) = layout.nearest(token.x) else {
            continue;
        };
        if distance >= tolerance {
            continue;
        }

        let slot = &mut cells[index];
        if slot.is_empty() {
            slot.clone_from(&token.text);
        } else {
            tracing::trace!(
                column = index,
                kept = %slot,
                dropped = %token.text,
                "column slot already filled"
            );
        }
    }

    cells.iter().any(|cell| !cell.is_empty()).then_some(cells)
}
