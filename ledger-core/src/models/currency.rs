use super::{LedgerFailure, money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// A 3-letter ISO 4217 currency code, the identity of a currency.
///
/// Codes are validated and uppercased at construction; a code referenced
/// by a monetary record is immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and normalize a currency code (3 ASCII letters, uppercased).
    pub fn new(code: impl AsRef<str>) -> Result<Self, LedgerFailure> {
        let code = code.as_ref().trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(LedgerFailure::invalid(format!(
                "currency code must be 3 letters, got {code:?}"
            )))
        }
    }

    /// The normalized code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// A currency known to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// The 3-letter code identifying this currency.
    pub code: CurrencyCode,
    /// Display symbol, e.g. `$` or `€`.
    pub symbol: String,
    /// Inactive currencies are kept for historical records but excluded
    /// from new quotes.
    pub active: bool,
}

/// Distinguishes parallel quotation regimes for the same currency pair
/// and date (e.g. official vs. informal market).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteKind {
    /// The official market quotation.
    Official,
    /// The informal ("parallel") market quotation.
    Parallel,
}

impl QuoteKind {
    /// Stable string form used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            QuoteKind::Official => "official",
            QuoteKind::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuoteKind {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "official" => Ok(QuoteKind::Official),
            "parallel" => Ok(QuoteKind::Parallel),
            other => Err(LedgerFailure::invalid(format!(
                "unknown quote kind {other:?}"
            ))),
        }
    }
}

/// A dated conversion factor between two currencies.
///
/// Identity is the tuple (from, to, kind, day); the day is always a civil
/// date (midnight-normalized). `value` is to-currency units per 1
/// from-currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Currency being converted from.
    pub from: CurrencyCode,
    /// Currency being converted to.
    pub to: CurrencyCode,
    /// Quotation regime of this rate.
    pub kind: QuoteKind,
    /// Civil date the rate applies to.
    pub day: Date,
    /// To-currency units per 1 from-currency unit.
    pub value: Decimal,
    /// Label of whoever supplied the rate.
    pub source: Option<String>,
}

/// The outcome of a currency conversion, with enough detail to disclose
/// which rate was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// The converted, rounded amount.
    pub amount: Decimal,
    /// The rate that was applied (1 for identity conversions).
    pub rate: Decimal,
    /// The day the applied rate was quoted for, when a lookup occurred.
    pub day: Option<Date>,
    /// Where the rate came from (`parity` for identity conversions).
    pub source: String,
}

impl Conversion {
    /// An identity conversion: same currency on both sides, no rate lookup.
    pub fn identity(amount: Decimal) -> Self {
        Self {
            amount: money::round(amount),
            rate: Decimal::ONE,
            day: None,
            source: "parity".into(),
        }
    }
}

/// One entry of a bulk rate refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Currency being converted from.
    pub from: CurrencyCode,
    /// Currency being converted to.
    pub to: CurrencyCode,
    /// To-currency units per 1 from-currency unit.
    pub value: Decimal,
    /// Label of whoever supplied the rate.
    pub source: Option<String>,
}

/// An entry skipped during a bulk rate refresh, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRate {
    /// Currency pair of the skipped entry.
    pub from: CurrencyCode,
    /// Currency pair of the skipped entry.
    pub to: CurrencyCode,
    /// Why the entry was not applied.
    pub reason: LedgerFailure,
}

/// Result of a bulk rate refresh. Skips are reported, never fatal: a bulk
/// refresh favors partial progress over all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRateOutcome {
    /// Number of rates inserted or updated.
    pub applied: usize,
    /// Entries that could not be applied.
    pub skipped: Vec<SkippedRate>,
}
