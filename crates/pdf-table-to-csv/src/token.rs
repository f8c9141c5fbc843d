use crate::model::RawTextItem;

pub const DEFAULT_LINE_HEIGHT: f64 = 12.0;

/// A positioned text fragment in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl Token {
    #[must_use]
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width: 0.0,
            height: DEFAULT_LINE_HEIGHT,
            text: text.into(),
        }
    }
}

fn normalize_token(item: &RawTextItem) -> Option<Token> {
    let text = item.text.trim();
    if text.is_empty() {
        return None;
    }

    let x = item.transform[4];
    let y = item.transform[5];
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    Some(Token {
        x,
        y,
        width: item.width.unwrap_or(0.0),
        height: item.height.unwrap_or(DEFAULT_LINE_HEIGHT),
        text: text.to_string(),
    })
}

/// Converts raw source records into tokens, dropping blank text and unplaceable records.
pub(crate) fn normalize_tokens(items: &[RawTextItem]) -> Vec<Token> {
    items.iter().filter_map(normalize_token).collect()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LINE_HEIGHT, normalize_tokens};
    use crate::model::RawTextItem;

    #[test]
    fn trims_text_and_reads_origin_from_transform() {
        let mut item = RawTextItem::at(72.5, 700.0, "  Total \t").with_size(40.0, 10.0);
        item.transform[0] = 12.0;
        item.transform[3] = 12.0;

        let tokens = normalize_tokens(&[item]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].x, 72.5);
        assert_eq!(tokens[0].y, 700.0);
        assert_eq!(tokens[0].width, 40.0);
        assert_eq!(tokens[0].height, 10.0);
        assert_eq!(tokens[0].text, "Total");
    }

    #[test]
    fn drops_blank_tokens() {
        let tokens = normalize_tokens(&[
            RawTextItem::at(0.0, 0.0, "   "),
            RawTextItem::at(10.0, 0.0, ""),
            RawTextItem::at(20.0, 0.0, "kept"),
        ]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "kept");
    }

    #[test]
    fn defaults_missing_size() {
        let tokens = normalize_tokens(&[RawTextItem::at(1.0, 2.0, "a")]);
        assert_eq!(tokens[0].width, 0.0);
        assert_eq!(tokens[0].height, DEFAULT_LINE_HEIGHT);
    }

    #[test]
    fn drops_non_finite_positions() {
        let tokens = normalize_tokens(&[
            RawTextItem::at(f64::NAN, 2.0, "a"),
            RawTextItem::at(1.0, f64::INFINITY, "b"),
        ]);
        assert!(tokens.is_empty());
    }
}
