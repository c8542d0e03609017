use crate::domain::{Currency, ExchangeRate};

/// Environment variable overriding the KRW -> TWD rate.
pub const RATE_ENV_VAR: &str = "BUSANGO_KRW_TO_TWD";

/// Settings injected into the trip service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripConfig {
    /// Fixed conversion rate used for totals and balances
    pub rate: ExchangeRate,
    /// Currency balances and settlements are reported in
    pub reference: Currency,
}

impl TripConfig {
    pub fn new(rate: ExchangeRate) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    pub fn with_reference(mut self, reference: Currency) -> Self {
        self.reference = reference;
        self
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            rate: ExchangeRate::default(),
            reference: Currency::Twd,
        }
    }
}
