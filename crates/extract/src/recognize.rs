use std::sync::OnceLock;

use folio_core::{Amount, Transaction};
use regex::Regex;

use crate::lines::Line;

// ── Patterns ─────────────────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Day and month of 1-2 digits, one separator repeated, 2 or 4 digit year.
re!(re_date_token,
    r"^\d{1,2}(?:\.\d{1,2}\.|/\d{1,2}/|,\d{1,2},)(?:\d{4}|\d{2})$");
re!(re_period_range,
    r"\d{1,2}(?:\.\d{1,2}\.|/\d{1,2}/|,\d{1,2},)(?:\d{4}|\d{2})\s*-\s*\d{1,2}(?:\.\d{1,2}\.|/\d{1,2}/|,\d{1,2},)(?:\d{4}|\d{2})");
re!(re_amount_token,
    r"^-?\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?-?$");

// ── Recognition ──────────────────────────────────────────────────────────────

/// A "from - to" statement period line.
pub fn is_period_header(text: &str) -> bool {
    re_period_range().is_match(text)
}

/// Any line mentioning TOTAL, including SUBTOTAL and lowercase variants.
pub fn is_summary_row(text: &str) -> bool {
    text.to_uppercase().contains("TOTAL")
}

pub fn is_date_token(text: &str) -> bool {
    re_date_token().is_match(text)
}

pub fn is_amount_token(text: &str) -> bool {
    re_amount_token().is_match(text)
}

/// Turns one reconstructed line into a transaction, or `None` to skip it.
///
/// The date is the first date-shaped token, the amount the last amount-shaped
/// token, and the merchant everything strictly between them in either order.
/// The box spans every token of the line.
pub fn recognize(line: &Line, page: u32) -> Option<Transaction> {
    let text = line.text();
    if is_period_header(&text) || is_summary_row(&text) {
        return None;
    }

    let words: Vec<&str> = line.tokens().iter().map(|t| t.text.as_str()).collect();
    let date_at = words.iter().position(|w| is_date_token(w))?;
    let amount_at = words.iter().rposition(|w| is_amount_token(w))?;

    let between = if date_at < amount_at {
        &words[date_at + 1..amount_at]
    } else {
        &words[amount_at + 1..date_at]
    };
    let merchant = between.join(" ");
    if merchant.trim().is_empty() {
        return None;
    }

    let amount = Amount::parse_localized(words[amount_at]).ok()?;
    let bbox = line.bbox()?;
    Transaction::new(page, words[date_at], merchant, amount, bbox)
}
