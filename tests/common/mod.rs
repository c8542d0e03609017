// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use busango::application::{TripConfig, TripService};
use busango::domain::{Currency, NewExpense, Participant, ParticipantId};
use tempfile::TempDir;

pub const EPS: f64 = 1e-6;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(TripService, TempDir)> {
    test_service_with(TripConfig::default()).await
}

pub async fn test_service_with(config: TripConfig) -> Result<(TripService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = TripService::init(db_path.to_str().unwrap(), config).await?;
    Ok((service, temp_dir))
}

/// Path of the database inside a test directory, for reconnecting
pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// Test fixture: A, B and C travelling together
pub fn abc() -> Vec<Participant> {
    vec![
        Participant::new("a", "A"),
        Participant::new("b", "B"),
        Participant::new("c", "C"),
    ]
}

pub fn ids(raw: &[&str]) -> Vec<ParticipantId> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Record an expense split between `split` (everyone when empty)
pub async fn spend(
    service: &TripService,
    description: &str,
    amount: f64,
    currency: Currency,
    payer: &str,
    split: &[&str],
) -> Result<()> {
    let mut expense = NewExpense::new(description, amount, currency, payer);
    if !split.is_empty() {
        expense = expense.split_between(ids(split));
    }
    service.add_expense(expense).await?;
    Ok(())
}
