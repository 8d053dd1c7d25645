use serde::{Deserialize, Serialize};

/// Rectangle in page space: origin at the top-left corner, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// `x0 <= x1 && y0 <= y1`, all coordinates finite.
    pub fn is_normalized(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1].iter().all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Smallest box covering every box in `boxes`; `None` for an empty input.
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }

    /// Coordinates rounded to `decimals` places, expressed as integers so the
    /// result can be hashed. Ties round to even.
    pub fn rounded_key(&self, decimals: u32) -> [i64; 4] {
        let scale = 10f64.powi(decimals as i32);
        [self.x0, self.y0, self.x1, self.y1].map(|v| (v * scale).round_ties_even() as i64)
    }
}

/// One extracted word with its position on a page (pages are 1-indexed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub bbox: BoundingBox,
    pub page: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, page: u32) -> Self {
        Self { text: text.into(), bbox, page }
    }
}
