use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Amount, Currency, ExchangeRate, Expense, Participant, ParticipantId};

/// Signed net position per participant, in the reference currency.
/// Positive: the group owes them. Negative: they owe the group.
pub type Balances = HashMap<ParticipantId, Amount>;

/// Input for recording a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: Amount,
    pub currency: Currency,
    pub paid_by_id: ParticipantId,
    /// `None` splits the cost across every participant on the roster.
    pub participant_ids: Option<Vec<ParticipantId>>,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        currency: Currency,
        paid_by_id: impl Into<ParticipantId>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            currency,
            paid_by_id: paid_by_id.into(),
            participant_ids: None,
            date: Utc::now(),
        }
    }

    pub fn split_between(mut self, participant_ids: Vec<ParticipantId>) -> Self {
        self.participant_ids = Some(participant_ids);
        self
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// The ordered collection of every expense recorded for the trip.
/// Expenses are kept in insertion order; display order is a separate concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    expenses: Vec<Expense>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Self { expenses }
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn into_expenses(self) -> Vec<Expense> {
        self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Most recently recorded first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().rev()
    }

    /// Validate and append a new expense. Nothing else in the ledger changes.
    pub fn add_expense(
        &mut self,
        new_expense: NewExpense,
        participants: &[Participant],
    ) -> Result<&Expense, LedgerError> {
        let description = new_expense.description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let participant_ids = new_expense
            .participant_ids
            .unwrap_or_else(|| participants.iter().map(|p| p.id.clone()).collect());

        let expense = Expense::new(
            description,
            new_expense.amount,
            new_expense.currency,
            new_expense.paid_by_id,
            participant_ids,
            new_expense.date,
        );
        validate_expense(&expense, participants)?;

        self.expenses.push(expense);
        Ok(&self.expenses[self.expenses.len() - 1])
    }

    pub fn total_spend(&self, rate: &ExchangeRate) -> TotalSpend {
        total_spend(&self.expenses, rate)
    }

    pub fn compute_balances(
        &self,
        participants: &[Participant],
        rate: &ExchangeRate,
        reference: Currency,
    ) -> Result<Balances, LedgerError> {
        compute_balances(&self.expenses, participants, rate, reference)
    }
}

/// Check the invariants of a single expense against the roster.
pub fn validate_expense(expense: &Expense, participants: &[Participant]) -> Result<(), LedgerError> {
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(expense.amount));
    }
    if expense.participant_ids.is_empty() {
        return Err(LedgerError::EmptySplit);
    }

    let known = |id: &str| participants.iter().any(|p| p.id == id);
    if !known(expense.paid_by_id.as_str()) {
        return Err(LedgerError::UnknownPayer(expense.paid_by_id.clone()));
    }
    if let Some(unknown) = expense.participant_ids.iter().find(|id| !known(id.as_str())) {
        return Err(LedgerError::UnknownParticipant(unknown.clone()));
    }
    Ok(())
}

/// Trip total, expressed in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalSpend {
    pub total_krw: Amount,
    pub total_twd: Amount,
}

impl TotalSpend {
    pub fn in_currency(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Krw => self.total_krw,
            Currency::Twd => self.total_twd,
        }
    }
}

/// Sum every expense in KRW and report the same total in TWD.
pub fn total_spend(expenses: &[Expense], rate: &ExchangeRate) -> TotalSpend {
    let total_krw: Amount = expenses
        .iter()
        .map(|e| rate.convert(e.amount, e.currency, Currency::Krw))
        .sum();

    TotalSpend {
        total_krw,
        total_twd: rate.convert(total_krw, Currency::Krw, Currency::Twd),
    }
}

/// Compute every participant's net balance in `reference`.
///
/// The payer is credited the full converted amount and every listed participant,
/// the payer included, is debited an even share. Balances always sum to zero.
pub fn compute_balances(
    expenses: &[Expense],
    participants: &[Participant],
    rate: &ExchangeRate,
    reference: Currency,
) -> Result<Balances, LedgerError> {
    let mut balances: Balances = participants.iter().map(|p| (p.id.clone(), 0.0)).collect();

    for expense in expenses {
        validate_expense(expense, participants)?;

        let converted = rate.convert(expense.amount, expense.currency, reference);
        let share = converted / expense.participant_ids.len() as Amount;

        *balances.entry(expense.paid_by_id.clone()).or_insert(0.0) += converted;
        for id in &expense.participant_ids {
            *balances.entry(id.clone()).or_insert(0.0) -= share;
        }
    }

    Ok(balances)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("expense description is required")]
    EmptyDescription,

    #[error("expense amount must be a positive number, got {0}")]
    InvalidAmount(Amount),

    #[error("an expense must be split between at least one participant")]
    EmptySplit,

    #[error("payer is not a trip participant: {0}")]
    UnknownPayer(ParticipantId),

    #[error("not a trip participant: {0}")]
    UnknownParticipant(ParticipantId),
}
