use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fintrack_core::{DomainError, DomainResult, TransactionId, UserId};

pub const MAX_CATEGORY_LENGTH: usize = 64;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "" => Err(DomainError::validation("type is required")),
            _ => Err(DomainError::validation("type must be 'income' or 'expense'")),
        }
    }
}

/// A stored transaction, always owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or fully replacing a transaction.
///
/// Carries no owner: the owner always comes from the authenticated request,
/// never from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

impl TransactionDraft {
    /// Validate raw fields.
    ///
    /// - `amount` must be finite and strictly positive (direction is `kind`)
    /// - `kind` must be `income` or `expense`
    /// - blank `category`/`description` collapse to `None`
    /// - `date` falls back to `default_date` when absent
    pub fn new(
        amount: Option<f64>,
        kind: Option<&str>,
        category: Option<String>,
        description: Option<String>,
        date: Option<DateTime<Utc>>,
        default_date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let kind: TransactionKind = kind.unwrap_or_default().parse()?;

        let amount = match amount {
            None => return Err(DomainError::validation("amount is required")),
            Some(a) if !a.is_finite() => return Err(DomainError::validation("amount must be a finite number")),
            Some(a) if a <= 0.0 => return Err(DomainError::validation("amount must be greater than zero")),
            Some(a) => a,
        };

        Ok(Self {
            amount,
            kind,
            category: normalize_text("category", category, MAX_CATEGORY_LENGTH)?,
            description: normalize_text("description", description, MAX_DESCRIPTION_LENGTH)?,
            date: date.unwrap_or(default_date),
        })
    }
}

fn normalize_text(field: &str, value: Option<String>, max: usize) -> DomainResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!("{field} must be at most {max} characters")));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn valid_draft_keeps_fields() {
        let date = now() - chrono::Duration::days(3);
        let d = TransactionDraft::new(
            Some(12.5),
            Some("expense"),
            Some(" food ".into()),
            Some("lunch".into()),
            Some(date),
            now(),
        )
        .unwrap();

        assert_eq!(d.amount, 12.5);
        assert_eq!(d.kind, TransactionKind::Expense);
        assert_eq!(d.category.as_deref(), Some("food"));
        assert_eq!(d.description.as_deref(), Some("lunch"));
        assert_eq!(d.date, date);
    }

    #[test]
    fn missing_date_defaults() {
        let d = TransactionDraft::new(Some(1.0), Some("income"), None, None, None, now()).unwrap();
        assert_eq!(d.date, now());
        assert_eq!(d.category, None);
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        let d = TransactionDraft::new(Some(1.0), Some("income"), Some("   ".into()), Some(String::new()), None, now())
            .unwrap();
        assert_eq!(d.category, None);
        assert_eq!(d.description, None);
    }

    #[test]
    fn rejects_missing_or_unknown_type() {
        for kind in [None, Some(""), Some("transfer")] {
            let err = TransactionDraft::new(Some(1.0), kind, None, None, None, now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{kind:?}");
        }
    }

    #[test]
    fn type_is_case_insensitive() {
        let d = TransactionDraft::new(Some(1.0), Some("INCOME"), None, None, None, now()).unwrap();
        assert_eq!(d.kind, TransactionKind::Income);
    }

    #[test]
    fn rejects_bad_amounts() {
        for amount in [None, Some(0.0), Some(-5.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let err = TransactionDraft::new(amount, Some("income"), None, None, None, now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{amount:?}");
        }
    }

    #[test]
    fn rejects_overlong_category() {
        let long = "c".repeat(MAX_CATEGORY_LENGTH + 1);
        assert!(TransactionDraft::new(Some(1.0), Some("income"), Some(long), None, None, now()).is_err());
    }

    #[test]
    fn kind_serializes_as_type_field() {
        let t = Transaction {
            id: TransactionId::new(1),
            user_id: UserId::new(2),
            amount: 3.0,
            kind: TransactionKind::Income,
            category: None,
            description: None,
            date: now(),
            created_at: now(),
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["user_id"], 2);
        assert!(json.get("kind").is_none());
    }

    proptest! {
        #[test]
        fn any_positive_finite_amount_is_accepted(amount in 0.01f64..1.0e12) {
            let d = TransactionDraft::new(Some(amount), Some("expense"), None, None, None, now()).unwrap();
            prop_assert_eq!(d.amount, amount);
        }
    }
}
