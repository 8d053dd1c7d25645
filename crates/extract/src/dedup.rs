use std::collections::HashSet;

use folio_core::Transaction;

/// Drops transactions whose page and rounded box were already seen.
///
/// The first occurrence in input order survives.
pub fn deduplicate(transactions: Vec<Transaction>, decimals: u32) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    transactions
        .into_iter()
        .filter(|tx| seen.insert((tx.page, tx.bbox.rounded_key(decimals))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Amount, BoundingBox};
    use std::str::FromStr;

    fn tx(page: u32, merchant: &str, y0: f64) -> Transaction {
        Transaction::new(
            page,
            "01/02/2024",
            merchant,
            Amount::from_str("1.00").unwrap(),
            BoundingBox::new(10.0, y0, 200.0, y0 + 10.0),
        )
        .unwrap()
    }

    #[test]
    fn near_identical_boxes_collapse_to_first() {
        let out = deduplicate(vec![tx(1, "first", 100.01), tx(1, "second", 100.02)], 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].merchant, "first");
    }

    #[test]
    fn same_box_on_another_page_is_kept() {
        let out = deduplicate(vec![tx(1, "a", 100.0), tx(2, "b", 100.0)], 1);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn precision_controls_what_counts_as_equal() {
        let input = vec![tx(1, "a", 100.0), tx(1, "b", 100.3)];
        assert_eq!(deduplicate(input.clone(), 1).len(), 2);
        assert_eq!(deduplicate(input, 0).len(), 1);
    }

    #[test]
    fn output_keys_are_unique_and_order_is_kept() {
        let input = vec![
            tx(1, "a", 100.0),
            tx(1, "b", 120.0),
            tx(1, "a-dup", 100.0),
            tx(2, "c", 100.0),
            tx(1, "b-dup", 120.04),
        ];
        let out = deduplicate(input, 1);
        let merchants: Vec<_> = out.iter().map(|t| t.merchant.as_str()).collect();
        assert_eq!(merchants, vec!["a", "b", "c"]);
        let keys: HashSet<_> = out.iter().map(|t| (t.page, t.bbox.rounded_key(1))).collect();
        assert_eq!(keys.len(), out.len());
    }
}
