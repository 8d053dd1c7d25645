use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::geometry::BoundingBox;

/// One itemized statement line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub page: u32,
    /// Date text exactly as printed on the statement.
    pub date: String,
    pub merchant: String,
    pub amount: Amount,
    pub bbox: BoundingBox,
}

impl Transaction {
    /// Returns `None` when the merchant is blank or the box is inverted.
    pub fn new(
        page: u32,
        date: impl Into<String>,
        merchant: impl AsRef<str>,
        amount: Amount,
        bbox: BoundingBox,
    ) -> Option<Self> {
        let merchant = merchant.as_ref().trim();
        if merchant.is_empty() || !bbox.is_normalized() {
            return None;
        }
        Some(Transaction {
            page,
            date: date.into(),
            merchant: merchant.to_string(),
            amount,
            bbox,
        })
    }
}

/// Deduplicated transactions of one document plus their aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn total_charges(&self) -> Amount {
        self.transactions
            .iter()
            .map(|t| t.amount)
            .filter(|a| a.is_charge())
            .sum()
    }

    pub fn total_credits(&self) -> Amount {
        self.transactions
            .iter()
            .map(|t| t.amount)
            .filter(|a| a.is_credit())
            .sum()
    }

    pub fn balance(&self) -> Amount {
        self.total_charges() + self.total_credits()
    }
}
