use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amounts are kept as plain floating-point values. Splitting a bill three ways
/// and converting between currencies both produce fractions, so callers compare
/// results within [`AMOUNT_EPSILON`].
pub type Amount = f64;

/// Tolerance used when deciding whether two amounts are equal.
pub const AMOUNT_EPSILON: Amount = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// South Korean won
    Krw,
    /// New Taiwan dollar
    Twd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Krw => "KRW",
            Currency::Twd => "TWD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "KRW" => Some(Currency::Krw),
            "TWD" => Some(Currency::Twd),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Krw => "₩",
            Currency::Twd => "NT$",
        }
    }

    /// Render an amount with this currency's symbol, rounded to whole units.
    pub fn format(&self, amount: Amount) -> String {
        format!("{} {}", self.symbol(), format_amount(amount, 0))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed KRW -> TWD conversion rate, injected wherever amounts in different
/// currencies are combined. Serialized as the bare KRW -> TWD factor;
/// deserializing goes through [`ExchangeRate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate {
    krw_to_twd: f64,
}

impl ExchangeRate {
    /// 1 KRW = 0.024 TWD, approximately.
    pub const DEFAULT_KRW_TO_TWD: f64 = 0.024;

    pub fn new(krw_to_twd: f64) -> Result<Self, RateError> {
        if !krw_to_twd.is_finite() || krw_to_twd <= 0.0 {
            return Err(RateError::NotPositive(krw_to_twd));
        }
        Ok(Self { krw_to_twd })
    }

    pub fn krw_to_twd(&self) -> f64 {
        self.krw_to_twd
    }

    /// Convert `amount` expressed in `from` into `to`.
    pub fn convert(&self, amount: Amount, from: Currency, to: Currency) -> Amount {
        match (from, to) {
            (Currency::Krw, Currency::Twd) => amount * self.krw_to_twd,
            (Currency::Twd, Currency::Krw) => amount / self.krw_to_twd,
            _ => amount,
        }
    }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = RateError;

    fn try_from(krw_to_twd: f64) -> Result<Self, Self::Error> {
        Self::new(krw_to_twd)
    }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.krw_to_twd
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self {
            krw_to_twd: Self::DEFAULT_KRW_TO_TWD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("exchange rate must be a positive number, got {0}")]
    NotPositive(f64),
}

/// Format an amount with thousands separators and a fixed number of decimals.
/// Example: (1234567.0, 0) -> "1,234,567", (-3333.333, 2) -> "-3,333.33"
pub fn format_amount(amount: Amount, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (units, fraction) = match formatted.split_once('.') {
        Some((units, fraction)) => (units, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    // Don't print "-0" for values that round to zero
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if amount < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Parse a user-entered amount. Thousands separators are accepted.
/// Empty, non-numeric, non-finite and non-positive input is rejected.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let cleaned: String = input.chars().filter(|c| *c != ',').collect();
    let amount: Amount = cleaned
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat(input.to_string()))?;

    if !amount.is_finite() {
        return Err(ParseAmountError::InvalidFormat(input.to_string()));
    }
    if amount <= 0.0 {
        return Err(ParseAmountError::NotPositive);
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("amount is required")]
    Empty,
    #[error("invalid amount: {0}")]
    InvalidFormat(String),
    #[error("amount must be positive")]
    NotPositive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_roundtrip() {
        for currency in [Currency::Krw, Currency::Twd] {
            assert_eq!(Currency::from_str(currency.as_str()), Some(currency));
        }
        assert_eq!(Currency::from_str("twd"), Some(Currency::Twd));
        assert_eq!(Currency::from_str("USD"), None);
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let json = serde_json::to_string(&Currency::Krw).unwrap();
        assert_eq!(json, "\"KRW\"");
    }

    #[test]
    fn test_convert_krw_to_twd() {
        let rate = ExchangeRate::default();
        let twd = rate.convert(10_000.0, Currency::Krw, Currency::Twd);
        assert!((twd - 240.0).abs() < AMOUNT_EPSILON);
    }

    #[test]
    fn test_convert_roundtrip() {
        for krw_to_twd in [0.024, 0.0231, 1.0, 3.5] {
            let rate = ExchangeRate::new(krw_to_twd).unwrap();
            for amount in [1.0, 999.99, 10_000.0, 1_234_567.0] {
                let twd = rate.convert(amount, Currency::Krw, Currency::Twd);
                let back = rate.convert(twd, Currency::Twd, Currency::Krw);
                assert!((back - amount).abs() < 1e-6 * amount.max(1.0));
            }
        }
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rate = ExchangeRate::default();
        assert_eq!(rate.convert(42.5, Currency::Twd, Currency::Twd), 42.5);
        assert_eq!(rate.convert(42.5, Currency::Krw, Currency::Krw), 42.5);
    }

    #[test]
    fn test_rate_rejects_non_positive() {
        assert!(ExchangeRate::new(0.0).is_err());
        assert!(ExchangeRate::new(-0.024).is_err());
        assert!(ExchangeRate::new(f64::NAN).is_err());
        assert!(ExchangeRate::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rate_deserialize_is_validated() {
        let rate: ExchangeRate = serde_json::from_str("0.03").unwrap();
        assert_eq!(rate.krw_to_twd(), 0.03);
        assert_eq!(serde_json::to_string(&rate).unwrap(), "0.03");

        assert!(serde_json::from_str::<ExchangeRate>("0.0").is_err());
        assert!(serde_json::from_str::<ExchangeRate>("-0.024").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0, 0), "0");
        assert_eq!(format_amount(999.0, 0), "999");
        assert_eq!(format_amount(1000.0, 0), "1,000");
        assert_eq!(format_amount(1_234_567.0, 0), "1,234,567");
        assert_eq!(format_amount(6666.666, 2), "6,666.67");
        assert_eq!(format_amount(-3333.333, 2), "-3,333.33");
        assert_eq!(format_amount(-0.4, 0), "0");
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::Krw.format(10_000.0), "₩ 10,000");
        assert_eq!(Currency::Twd.format(240.4), "NT$ 240");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10000"), Ok(10_000.0));
        assert_eq!(parse_amount(" 12.5 "), Ok(12.5));
        assert_eq!(parse_amount("1,234,567"), Ok(1_234_567.0));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("   "), Err(ParseAmountError::Empty));
        assert!(matches!(
            parse_amount("abc"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("inf"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert_eq!(parse_amount("0"), Err(ParseAmountError::NotPositive));
        assert_eq!(parse_amount("-5"), Err(ParseAmountError::NotPositive));
    }
}
