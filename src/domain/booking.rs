use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookingId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Flight,
    Hotel,
    Other,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Flight => "flight",
            BookingKind::Hotel => "hotel",
            BookingKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flight" => Some(BookingKind::Flight),
            "hotel" => Some(BookingKind::Hotel),
            "other" => Some(BookingKind::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flight, hotel or other reservation for the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub kind: BookingKind,
    pub title: String,
    pub details: String,
    pub confirmation_code: Option<String>,
    /// Local time at the destination
    pub date: NaiveDateTime,
}

impl Booking {
    pub fn new(
        kind: BookingKind,
        title: impl Into<String>,
        details: impl Into<String>,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            details: details.into(),
            confirmation_code: None,
            date,
        }
    }

    pub fn with_confirmation_code(mut self, code: impl Into<String>) -> Self {
        self.confirmation_code = Some(code.into());
        self
    }
}

/// The reservations a new trip starts with.
pub fn default_bookings() -> Vec<Booking> {
    let at = |hour, minute| {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap_or_default()
    };

    vec![
        Booking::new(
            BookingKind::Flight,
            "TPE -> PUS",
            "Air Busan BX794 | Terminal 1",
            at(7, 15),
        )
        .with_confirmation_code("ABC123XYZ"),
        Booking::new(
            BookingKind::Hotel,
            "Fairfield by Marriott Busan",
            "1400 Haeundae-ro, Haeundae-gu",
            at(15, 0),
        )
        .with_confirmation_code("RSV-887766"),
    ]
}
