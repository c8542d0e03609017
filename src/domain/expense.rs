use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, Currency, ParticipantId};

pub type ExpenseId = Uuid;

/// A shared trip expense. Expenses are immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Amount in `currency` (always positive)
    pub amount: Amount,
    pub currency: Currency,
    /// Who paid the bill
    pub paid_by_id: ParticipantId,
    /// Who shares the cost, split evenly. Never empty for a recorded expense.
    pub participant_ids: Vec<ParticipantId>,
    /// When the expense was recorded
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Build an expense. Duplicate participant ids are collapsed, keeping the
    /// first occurrence. Validation against the roster is done by the ledger.
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        currency: Currency,
        paid_by_id: impl Into<ParticipantId>,
        participant_ids: Vec<ParticipantId>,
        date: DateTime<Utc>,
    ) -> Self {
        let mut unique: Vec<ParticipantId> = Vec::with_capacity(participant_ids.len());
        for id in participant_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            currency,
            paid_by_id: paid_by_id.into(),
            participant_ids: unique,
            date,
        }
    }

    /// Returns true if `participant_id` shares the cost of this expense.
    pub fn is_shared_by(&self, participant_id: &str) -> bool {
        self.participant_ids.iter().any(|id| id == participant_id)
    }

    /// Returns true if `participant_id` paid for or shares this expense.
    pub fn involves(&self, participant_id: &str) -> bool {
        self.paid_by_id == participant_id || self.is_shared_by(participant_id)
    }

    /// Returns true if the payer is the only one sharing the cost.
    pub fn is_solo(&self) -> bool {
        self.participant_ids.len() == 1 && self.participant_ids[0] == self.paid_by_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ParticipantId> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicate_participants_are_collapsed() {
        let expense = Expense::new(
            "Seafood dinner",
            90_000.0,
            Currency::Krw,
            "1",
            ids(&["1", "2", "1", "3", "2"]),
            Utc::now(),
        );
        assert_eq!(expense.participant_ids, ids(&["1", "2", "3"]));
    }

    #[test]
    fn test_is_solo() {
        let solo = Expense::new("Coffee", 5_000.0, Currency::Krw, "1", ids(&["1"]), Utc::now());
        assert!(solo.is_solo());

        let treat = Expense::new("Coffee", 5_000.0, Currency::Krw, "1", ids(&["2"]), Utc::now());
        assert!(!treat.is_solo());
        assert!(treat.is_shared_by("2"));
        assert!(!treat.is_shared_by("1"));
        assert!(treat.involves("1"));
        assert!(!treat.involves("3"));
    }

    #[test]
    fn test_serde_roundtrip_keeps_fields() {
        let expense = Expense::new(
            "T-money top-up",
            500.0,
            Currency::Twd,
            "2",
            ids(&["1", "2"]),
            Utc::now(),
        );
        let json = serde_json::to_string(&expense).unwrap();
        assert!(json.contains("\"currency\":\"TWD\""));
        let back: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expense);
    }
}
