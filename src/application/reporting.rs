use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, Currency, Expense, LedgerError, Participant, SettlementTransfer, TotalSpend,
    compute_balances, plan_settlement, total_spend,
};

use super::TripConfig;

/// A participant's net position, in the reference currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub participant: Participant,
    pub balance: Amount,
}

impl BalanceEntry {
    /// True when the group owes this participant (or they are even).
    pub fn is_owed(&self) -> bool {
        self.balance >= 0.0
    }
}

/// Everything the expense screen shows: totals, balances, who pays whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub expense_count: usize,
    pub totals: TotalSpend,
    pub reference: Currency,
    /// In roster order
    pub balances: Vec<BalanceEntry>,
    pub settlement: Vec<SettlementTransfer>,
}

impl ExpenseSummary {
    pub fn build(
        expenses: &[Expense],
        participants: &[Participant],
        config: &TripConfig,
    ) -> Result<Self, LedgerError> {
        let balances = compute_balances(expenses, participants, &config.rate, config.reference)?;
        let settlement = plan_settlement(&balances, participants);

        let entries = participants
            .iter()
            .map(|p| BalanceEntry {
                participant: p.clone(),
                balance: balances.get(&p.id).copied().unwrap_or(0.0),
            })
            .collect();

        Ok(Self {
            expense_count: expenses.len(),
            totals: total_spend(expenses, &config.rate),
            reference: config.reference,
            balances: entries,
            settlement,
        })
    }

    pub fn balance_of(&self, participant_id: &str) -> Option<Amount> {
        self.balances
            .iter()
            .find(|e| e.participant.id == participant_id)
            .map(|e| e.balance)
    }
}
