use super::{ActorId, BudgetId, CurrencyCode, LedgerEntryId, LedgerFailure, ProviderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// How a payment moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer.
    Transfer,
    /// Credit or debit card.
    Card,
    /// Paper check.
    Check,
    /// Anything else; the memo should say what.
    Other,
}

impl PaymentMethod {
    /// Stable string form used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "card" => Ok(PaymentMethod::Card),
            "check" => Ok(PaymentMethod::Check),
            "other" => Ok(PaymentMethod::Other),
            other => Err(LedgerFailure::invalid(format!(
                "unknown payment method {other:?}"
            ))),
        }
    }
}

/// A payment made to a provider against a budget. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPayment {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// The budget the payment settles against.
    pub budget: BudgetId,
    /// The provider that was paid.
    pub provider: ProviderId,
    /// Amount paid, in `currency`.
    pub amount: Decimal,
    /// Currency of the payment.
    pub currency: CurrencyCode,
    /// Civil date of the payment.
    pub paid_on: Date,
    /// How the payment moved.
    pub method: PaymentMethod,
    /// Free-form note.
    pub memo: Option<String>,
}

/// An internal disbursement of agency profit to an administrative actor,
/// bounded by profit realized and not yet drawn. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDraw {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// The budget whose profit is being drawn.
    pub budget: BudgetId,
    /// The administrative actor receiving the draw.
    pub admin: ActorId,
    /// Amount drawn, in `currency`.
    pub amount: Decimal,
    /// Currency of the draw.
    pub currency: CurrencyCode,
    /// Civil date of the draw.
    pub paid_on: Date,
    /// How the disbursement moved.
    pub method: PaymentMethod,
    /// Free-form note.
    pub memo: Option<String>,
}

/// Money collected from the client against a budget, tracked separately
/// from invoicing because a client may pay before or without a formal
/// invoice. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCollection {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// The budget the collection applies to.
    pub budget: BudgetId,
    /// Amount collected, in `currency`.
    pub amount: Decimal,
    /// Currency of the collection.
    pub currency: CurrencyCode,
    /// Civil date of the collection.
    pub paid_on: Date,
    /// How the payment arrived.
    pub method: PaymentMethod,
    /// Free-form note.
    pub memo: Option<String>,
}

/// Input for recording an admin draw. Every mutable attribute is
/// enumerated here and validated once; there is no partial-object merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDraw {
    /// The budget whose profit is being drawn.
    pub budget: BudgetId,
    /// The administrative actor receiving the draw; must hold the admin
    /// capability.
    pub admin: ActorId,
    /// Amount to draw; must be positive and within the available profit.
    pub amount: Decimal,
    /// Currency; defaults to the budget's own currency when absent.
    pub currency: Option<CurrencyCode>,
    /// Civil date of the draw.
    pub paid_on: Date,
    /// How the disbursement moved.
    pub method: PaymentMethod,
    /// Free-form note.
    pub memo: Option<String>,
}

/// Input for recording a client collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollection {
    /// The budget the collection applies to.
    pub budget: BudgetId,
    /// Amount collected; must be positive.
    pub amount: Decimal,
    /// Currency; defaults to the budget's own currency when absent.
    pub currency: Option<CurrencyCode>,
    /// Civil date of the collection.
    pub paid_on: Date,
    /// How the payment arrived.
    pub method: PaymentMethod,
    /// Free-form note.
    pub memo: Option<String>,
}
