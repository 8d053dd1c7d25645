use std::collections::BTreeMap;

use folio_core::{BoundingBox, Token};

/// Tokens sharing one vertical bin, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    tokens: Vec<Token>,
}

impl Line {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::union_all(self.tokens.iter().map(|t| &t.bbox))
    }
}

/// Groups one page's tokens into lines by `round(y0 / bin_height)`.
///
/// Lines come back top to bottom. Rows closer than about one bin can merge;
/// that is not corrected here.
pub fn reconstruct_lines(tokens: Vec<Token>, bin_height: f64) -> Vec<Line> {
    let mut bins: BTreeMap<i64, Vec<Token>> = BTreeMap::new();
    for token in tokens {
        let bin = (token.bbox.y0 / bin_height).round_ties_even() as i64;
        bins.entry(bin).or_default().push(token);
    }
    bins.into_values().map(Line::new).collect()
}
