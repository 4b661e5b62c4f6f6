use super::{BudgetId, CurrencyCode, ItemRef, LedgerFailure, ProviderId, money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle status of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Being drafted, not yet presented.
    Draft,
    /// Presented to the client.
    Sent,
    /// Accepted by the client.
    Approved,
    /// Declined by the client.
    Rejected,
    /// Work delivered and closed out.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl BudgetStatus {
    /// Stable string form used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetStatus::Draft => "draft",
            BudgetStatus::Sent => "sent",
            BudgetStatus::Approved => "approved",
            BudgetStatus::Rejected => "rejected",
            BudgetStatus::Completed => "completed",
            BudgetStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BudgetStatus {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BudgetStatus::Draft),
            "sent" => Ok(BudgetStatus::Sent),
            "approved" => Ok(BudgetStatus::Approved),
            "rejected" => Ok(BudgetStatus::Rejected),
            "completed" => Ok(BudgetStatus::Completed),
            "cancelled" => Ok(BudgetStatus::Cancelled),
            other => Err(LedgerFailure::invalid(format!(
                "unknown budget status {other:?}"
            ))),
        }
    }
}

/// One line of a budget: a quantity of a catalog item at a unit price.
///
/// `margin_pct`, `provider` and `provider_cost` come from the referenced
/// item at snapshot time; the margin calculator and provider-dues
/// reconciliation read them from here rather than re-fetching the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// The product or service being quoted.
    pub item: ItemRef,
    /// Human-readable line description.
    pub description: String,
    /// Units quoted (fractional quantities allowed for services).
    pub quantity: Decimal,
    /// Client-facing price per unit.
    pub unit_price: Decimal,
    /// The item's margin percentage, used by the per-item margin policy.
    pub margin_pct: Decimal,
    /// Provider supplying this line, if any.
    pub provider: Option<ProviderId>,
    /// What the provider charges the agency per unit.
    pub provider_cost: Decimal,
}

impl BudgetLine {
    /// Client-facing total for the line: `unit_price × quantity`.
    pub fn line_total(&self) -> Decimal {
        money::round(self.unit_price * self.quantity)
    }

    /// What the agency owes the provider for the line.
    pub fn provider_total(&self) -> Decimal {
        money::round(self.provider_cost * self.quantity)
    }
}

/// A read-only snapshot of a budget, as the ledger engine consumes it.
///
/// Budgets are owned by the surrounding back office; the engine only reads
/// them to compute margins and reconcile payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// The budget's identifier.
    pub id: BudgetId,
    /// The budget's own currency; every sum in a summary is scoped to it.
    pub currency: CurrencyCode,
    /// Sum of line totals before tax.
    pub subtotal: Decimal,
    /// Tax charged on top of the subtotal.
    pub tax_amount: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Selects the global margin policy over the per-item one.
    pub use_global_margin: bool,
    /// Global margin percentage, when the global policy is in use.
    pub global_margin_pct: Option<Decimal>,
    /// Fixed profit override; wins over the percentage when both are set.
    pub global_fixed_profit: Option<Decimal>,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The quoted line items.
    pub lines: Vec<BudgetLine>,
}

impl BudgetSnapshot {
    /// Total of all lines: `Σ unit_price × quantity`, rounded.
    pub fn price_total(&self) -> Decimal {
        money::sum(self.lines.iter().map(|line| Some(line.line_total())))
    }
}
