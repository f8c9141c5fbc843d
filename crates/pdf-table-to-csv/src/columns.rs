use crate::token::Token;

/// Ascending left-edge x positions of the inferred columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnLayout {
    anchors: Vec<f64>,
}

impl ColumnLayout {
    #[must_use]
    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// True when `x` lies within `tolerance` (inclusive) of any anchor.
    #[must_use]
    pub fn is_aligned(&self, x: f64, tolerance: f64) -> bool {
        self.anchors
            .iter()
            .any(|anchor| (x - anchor).abs() <= tolerance)
    }

    /// Index and distance of the closest anchor; the leftmost wins on equal distance.
    #[must_use]
    pub fn nearest(&self, x: f64) -> Option<(usize, f64)> {
        self.anchors
            .iter()
            .enumerate()
            .map(|(index, anchor)| (index, (x - anchor).abs()))
            .fold(None, |best, candidate| match best {
                Some((_, distance)) if distance <= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    /// Number of `tokens` sitting on some anchor.
    #[must_use]
    pub fn aligned_count(&self, tokens: &[Token], tolerance: f64) -> usize {
        tokens
            .iter()
            .filter(|token| self.is_aligned(token.x, tolerance))
            .count()
    }

    /// A row matches the layout when its aligned tokens reach `ratio` of the anchor count.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn matches_row(&self, tokens: &[Token], tolerance: f64, ratio: f64) -> bool {
        if self.anchors.is_empty() {
            return false;
        }
        self.aligned_count(tokens, tolerance) as f64 >= self.anchors.len() as f64 * ratio
    }
}

/// Collapses the x positions of one row into anchors at least `min_separation` apart.
pub(crate) fn detect_columns(tokens: &[Token], min_separation: f64) -> ColumnLayout {
    let mut positions = tokens.iter().map(|token| token.x).collect::<Vec<_>>();
    positions.sort_by(f64::total_cmp);

    let mut anchors: Vec<f64> = Vec::new();
    for x in positions {
        if anchors.last().is_none_or(|last| x - last > min_separation) {
            anchors.push(x);
        }
    }

    ColumnLayout { anchors }
}

#[cfg(test)]
impl ColumnLayout {
    pub(crate) fn from_anchors(anchors: Vec<f64>) -> Self {
        Self { anchors }
    }
}
