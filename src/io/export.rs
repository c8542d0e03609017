use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{ExpenseSummary, TripService};
use crate::domain::{Booking, DailyItinerary, ExchangeRate, Expense, Participant};
use crate::storage::DOCUMENT_VERSION;

/// Full trip snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub krw_to_twd: ExchangeRate,
    pub participants: Vec<Participant>,
    pub expenses: Vec<Expense>,
    pub itinerary: Vec<DailyItinerary>,
    pub bookings: Vec<Booking>,
    pub summary: ExpenseSummary,
}

/// Exporter for converting trip data to various formats
pub struct Exporter<'a> {
    service: &'a TripService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a TripService) -> Self {
        Self { service }
    }

    /// Export expenses to CSV format, oldest first
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let ledger = self.service.load_ledger().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "description",
            "amount",
            "currency",
            "paid_by",
            "split_between",
        ])?;

        let name_of = |id: &str| {
            self.service
                .get_participant(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|_| id.to_string())
        };

        let mut count = 0;
        for expense in ledger.expenses() {
            let split: Vec<String> = expense
                .participant_ids
                .iter()
                .map(|id| name_of(id.as_str()))
                .collect();
            csv_writer.write_record([
                expense.id.to_string(),
                expense.date.to_rfc3339(),
                expense.description.clone(),
                expense.amount.to_string(),
                expense.currency.as_str().to_string(),
                name_of(expense.paid_by_id.as_str()),
                split.join(";"),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summary = self.service.expense_summary().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["participant", "currency", "balance"])?;

        let mut count = 0;
        for entry in &summary.balances {
            let balance = format!("{:.2}", entry.balance);
            csv_writer.write_record([
                entry.participant.name.as_str(),
                summary.reference.as_str(),
                balance.as_str(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the whole trip as JSON
    pub async fn export_full_json<W: Write>(&self, writer: W) -> Result<()> {
        let snapshot = self.snapshot().await?;
        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<TripSnapshot> {
        let ledger = self.service.load_ledger().await?;
        let itinerary = self.service.load_itinerary().await?;
        let bookings = self.service.list_bookings().await?;
        let summary = self.service.expense_summary().await?;

        Ok(TripSnapshot {
            version: DOCUMENT_VERSION,
            exported_at: Utc::now(),
            krw_to_twd: self.service.config().rate,
            participants: self.service.participants().to_vec(),
            expenses: ledger.into_expenses(),
            itinerary: itinerary.into_days(),
            bookings,
            summary,
        })
    }
}
