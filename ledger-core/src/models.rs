mod budget;
mod currency;
mod datetime;
mod failure;
mod margin;
pub mod money;
mod payment;
mod price;
mod reconciliation;

pub use budget::{BudgetLine, BudgetSnapshot, BudgetStatus};
pub use currency::{
    BulkRateOutcome, Conversion, Currency, CurrencyCode, ExchangeRate, QuoteKind, RateEntry,
    SkippedRate,
};
pub use datetime::{DateTimeRangeQuery, DateTimeRangeResponse};
pub use failure::LedgerFailure;
pub use margin::{MarginBreakdown, MarginPolicy, agency_profit, validate_global_margin};
pub use payment::{
    AdminDraw, ClientCollection, NewCollection, NewDraw, PaymentMethod, ProviderPayment,
};
pub use price::{
    ItemKind, ItemRef, PriceChangeStats, PriceVersion, PricedItem, RepriceFailure, RepriceOutcome,
    StalePrice,
};
pub use reconciliation::{
    BudgetFinancialSummary, Capability, CapabilitySet, InvoiceStatus, MonthlyKpis, PaymentTotals,
    PeriodCollections, ProviderDue,
};

macro_rules! uuid_wrapper {
    ($struct: ident, $doc: literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Hash,
            PartialEq,
            Eq,
            Clone,
            Copy,
            serde::Serialize,
            serde::Deserialize,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $struct(pub uuid::Uuid);

        impl $struct {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl From<uuid::Uuid> for $struct {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for uuid::Uuid {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $struct {
            type Err = <uuid::Uuid as std::str::FromStr>::Err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_wrapper!(BudgetId, "Unique identifier for a client budget");
uuid_wrapper!(ItemId, "Unique identifier for a catalog item (product or service)");
uuid_wrapper!(ProviderId, "Unique identifier for an external provider");
uuid_wrapper!(ActorId, "Unique identifier for a back-office actor");
uuid_wrapper!(PriceVersionId, "Unique identifier for a price history version");
uuid_wrapper!(InvoiceId, "Unique identifier for an issued invoice");
uuid_wrapper!(LedgerEntryId, "Unique identifier for an append-only ledger entry");

/// A hashmap with deterministic ordering, used for grouped report output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Map<K: std::hash::Hash + Eq, V>(
    pub indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>,
);

impl<K: std::hash::Hash + Eq, V> Default for Map<K, V> {
    fn default() -> Self {
        Self(indexmap::IndexMap::default())
    }
}

impl<K: std::hash::Hash + Eq, V> std::ops::Deref for Map<K, V> {
    type Target = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: std::hash::Hash + Eq, V> std::ops::DerefMut for Map<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K: std::hash::Hash + Eq, V> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: std::hash::Hash + Eq, V> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(indexmap::IndexMap::from_iter(iter))
    }
}
