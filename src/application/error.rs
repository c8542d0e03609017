use thiserror::Error;

use crate::domain::{ItineraryError, LedgerError, ParseAmountError, RateError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] ParseAmountError),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(#[from] RateError),

    #[error("Invalid expense: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid itinerary change: {0}")]
    Itinerary(#[from] ItineraryError),

    #[error("Invalid booking: {0}")]
    InvalidBooking(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
