use super::{
    BudgetId, BudgetSnapshot, CurrencyCode, LedgerFailure, Map, MarginPolicy, ProviderId,
    agency_profit, money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Capabilities an actor can hold. Only one matters to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Authorizes recording admin draws.
    Admin,
}

/// The set of capabilities granted to an actor, as reported by the
/// identity collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    /// Grant a capability, returning the extended set.
    pub fn grant(mut self, capability: Capability) -> Self {
        if !self.0.contains(&capability) {
            self.0.push(capability);
        }
        self
    }

    /// Whether the set includes the given capability.
    pub fn has(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }
}

/// Lifecycle status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued and awaiting payment.
    Issued,
    /// Paid in full.
    Paid,
    /// Cancelled after issuance; excluded from receivables.
    Voided,
}

impl InvoiceStatus {
    /// Stable string form used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Voided => "voided",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = LedgerFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(InvoiceStatus::Issued),
            "paid" => Ok(InvoiceStatus::Paid),
            "voided" => Ok(InvoiceStatus::Voided),
            other => Err(LedgerFailure::invalid(format!(
                "unknown invoice status {other:?}"
            ))),
        }
    }
}

/// Raw per-budget payment sums, all scoped to the budget's currency.
/// Empty ledgers yield zeroes, never a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTotals {
    /// Σ provider payments recorded against the budget.
    pub providers: Decimal,
    /// Σ admin draws recorded against the budget.
    pub admins: Decimal,
    /// Σ direct client collections recorded against the budget.
    pub collections: Decimal,
}

/// The reconciled money flow of one budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetFinancialSummary {
    /// The budget summarized.
    pub budget: BudgetId,
    /// The budget's currency; every figure below is scoped to it.
    pub currency: CurrencyCode,
    /// `Σ unit_price × quantity` over the budget's lines.
    pub price_total: Decimal,
    /// Agency profit per the margin calculator.
    pub agency_profit: Decimal,
    /// Which margin policy produced the profit figure.
    pub margin_policy: MarginPolicy,
    /// Σ provider payments recorded against the budget.
    pub paid_to_providers: Decimal,
    /// Σ admin draws recorded against the budget.
    pub paid_to_admins: Decimal,
    /// `max(0, agency_profit − paid_to_admins)`: the solvency bound on
    /// further draws.
    pub available_for_admin_draw: Decimal,
}

impl BudgetFinancialSummary {
    /// Reconcile a budget snapshot against its recorded payment sums.
    ///
    /// This is the single place the summary math lives: the provided
    /// `budget_summary` port method and the backend's in-transaction draw
    /// limit check both go through here.
    pub fn compute(snapshot: &BudgetSnapshot, totals: &PaymentTotals) -> Self {
        let breakdown = agency_profit(snapshot);
        let available = std::cmp::max(Decimal::ZERO, breakdown.profit - totals.admins);
        Self {
            budget: snapshot.id,
            currency: snapshot.currency.clone(),
            price_total: snapshot.price_total(),
            agency_profit: breakdown.profit,
            margin_policy: breakdown.policy,
            paid_to_providers: money::round(totals.providers),
            paid_to_admins: money::round(totals.admins),
            available_for_admin_draw: money::round(available),
        }
    }
}

/// What one provider is owed on a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDue {
    /// The provider in question.
    pub provider: ProviderId,
    /// Σ provider_cost × quantity over the budget lines they supply.
    pub total_cost: Decimal,
    /// Σ payments already recorded to them against this budget.
    pub total_paid: Decimal,
    /// `max(0, total_cost − total_paid)`.
    pub pending: Decimal,
}

impl ProviderDue {
    /// Group a budget's lines by provider and net out recorded payments.
    ///
    /// Lines without a provider carry no external cost and are ignored.
    /// Overpayment clamps `pending` at zero rather than going negative.
    pub fn reconcile(snapshot: &BudgetSnapshot, paid: &[(ProviderId, Decimal)]) -> Vec<Self> {
        let mut costs: Map<ProviderId, Decimal> = Map::default();
        for line in &snapshot.lines {
            if let Some(provider) = line.provider {
                *costs.entry(provider).or_insert(Decimal::ZERO) += line.provider_total();
            }
        }
        let mut payments: Map<ProviderId, Decimal> = Map::default();
        for (provider, amount) in paid {
            *payments.entry(*provider).or_insert(Decimal::ZERO) += *amount;
        }

        costs
            .into_iter()
            .map(|(provider, total_cost)| {
                let total_paid = payments.get(&provider).copied().unwrap_or(Decimal::ZERO);
                let total_cost = money::round(total_cost);
                let total_paid = money::round(total_paid);
                Self {
                    provider,
                    total_cost,
                    total_paid,
                    pending: std::cmp::max(Decimal::ZERO, total_cost - total_paid),
                }
            })
            .collect()
    }
}

/// Period-level profit and draw KPIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyKpis {
    /// Σ agency profit over budgets created in the period.
    pub profit_total: Decimal,
    /// The same profit, grouped by budget currency.
    pub profit_by_currency: Map<CurrencyCode, Decimal>,
    /// Σ admin draws against those budgets.
    pub draws_total: Decimal,
    /// Σ admin draws against those budgets for the requested admin.
    pub draws_for_admin: Decimal,
    /// `max(0, profit_total − draws_total)`.
    pub available_for_draw: Decimal,
}

/// Collections versus invoicing over a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCollections {
    /// Σ totals of all invoices dated in the period.
    pub invoiced: Decimal,
    /// Σ totals of invoices with status paid.
    pub collected: Decimal,
    /// Σ totals of invoices issued and not yet paid (voided excluded).
    pub receivable: Decimal,
    /// Σ direct client collections recorded outside the invoicing flow.
    pub direct_collections: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_set_grant_and_check() {
        let set = CapabilitySet::default();
        assert!(!set.has(Capability::Admin));
        let set = set.grant(Capability::Admin).grant(Capability::Admin);
        assert!(set.has(Capability::Admin));
    }
}
