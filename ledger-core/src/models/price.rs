use super::{ActorId, CurrencyCode, ItemId, LedgerFailure, Map, PriceVersionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// The two kinds of catalog item that carry a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A physical or resellable product.
    Product,
    /// A billable service.
    Service,
}

impl ItemKind {
    /// Stable string form used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Service => "service",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ItemKind::Product),
            "service" => Ok(ItemKind::Service),
            other => Err(LedgerFailure::invalid(format!(
                "unknown item kind {other:?}"
            ))),
        }
    }
}

/// A reference to a catalog item: a product XOR a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// Which catalog the item lives in.
    pub kind: ItemKind,
    /// The item's identifier within that catalog.
    pub id: ItemId,
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// One link of an item's temporal price chain.
///
/// For a given (item, currency) pair at most one version is *open*
/// (`valid_until = None`); that version is the price currently in force.
/// Versions are never mutated price-in-place: every change closes the open
/// version and inserts a new one in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVersion {
    /// Identifier of this version.
    pub id: PriceVersionId,
    /// The item this version prices.
    pub item: ItemRef,
    /// The currency the price is quoted in.
    pub currency: CurrencyCode,
    /// The price, rounded to currency scale.
    pub price: Decimal,
    /// Inclusive start of validity.
    #[serde(with = "time::serde::rfc3339")]
    pub valid_from: OffsetDateTime,
    /// Exclusive end of validity; `None` while the version is in force.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,
    /// Why the price changed.
    pub reason: String,
    /// Who recorded the change.
    pub editor: ActorId,
    /// Cleared when the version is closed.
    pub active: bool,
}

impl PriceVersion {
    /// Whether this is the version currently in force.
    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }
}

/// An item together with its currently-open price, as fed to bulk
/// repricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    /// The item carrying the price.
    pub item: ItemRef,
    /// The currency of the open version.
    pub currency: CurrencyCode,
    /// The open version's price.
    pub price: Decimal,
}

/// An item whose open price is older than a staleness cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalePrice {
    /// The item carrying the stale price.
    pub item: ItemRef,
    /// The currency of the open version.
    pub currency: CurrencyCode,
    /// The open version's price.
    pub price: Decimal,
    /// When the open version took effect.
    #[serde(with = "time::serde::rfc3339")]
    pub valid_from: OffsetDateTime,
    /// Age of the open version in whole days.
    pub age_days: i64,
}

/// A single item's failure during a bulk reprice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepriceFailure {
    /// The item whose reprice failed.
    pub item: ItemRef,
    /// Why it failed.
    pub reason: LedgerFailure,
}

/// Result of a bulk reprice. Partial failure is reported, not fatal: a
/// bulk operation over hundreds of items is not rolled back by one bad
/// row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepriceOutcome {
    /// Number of items whose price chain gained a new open version.
    pub updated: usize,
    /// Items that could not be repriced.
    pub failures: Vec<RepriceFailure>,
}

/// Aggregate counts of version-open events over a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeStats {
    /// Total number of price changes in the period.
    pub total: u64,
    /// Changes grouped by the recorded reason.
    pub by_reason: Map<String, u64>,
    /// Changes grouped by civil day.
    pub by_day: Map<Date, u64>,
}
