use std::collections::BTreeMap;

use crate::options::YAxis;
use crate::token::Token;

/// Tokens sharing one quantized vertical position.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: i64,
    pub y: f64,
    pub tokens: Vec<Token>,
}

impl Row {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn row_key(y: f64, quantum: f64) -> i64 {
    (y / quantum).round() as i64
}

/// Groups tokens into rows ordered from the top of the page down.
///
/// Tokens keep their input order inside each row.
pub(crate) fn group_rows(tokens: &[Token], quantum: f64, y_axis: YAxis) -> Vec<Row> {
    let mut groups: BTreeMap<i64, Vec<Token>> = BTreeMap::new();
    for token in tokens {
        groups
            .entry(row_key(token.y, quantum))
            .or_default()
            .push(token.clone());
    }

    #[allow(clippy::cast_precision_loss)]
    let rows = groups.into_iter().map(|(key, tokens)| Row {
        key,
        y: key as f64 * quantum,
        tokens,
    });

    match y_axis {
        YAxis::Up => rows.rev().collect(),
        YAxis::Down => rows.collect(),
    }
}
