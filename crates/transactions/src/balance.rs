use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionKind};

/// Per-user totals: `balance = income - expense`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl Balance {
    pub fn from_totals(income: f64, expense: f64) -> Self {
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }

    /// Fold a set of transactions (used by stores without SQL aggregation).
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (income, expense) = transactions.into_iter().fold((0.0, 0.0), |(inc, exp), t| match t.kind {
            TransactionKind::Income => (inc + t.amount, exp),
            TransactionKind::Expense => (inc, exp + t.amount),
        });
        Self::from_totals(income, expense)
    }
}
