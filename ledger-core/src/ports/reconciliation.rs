use crate::models::{
    AdminDraw, BudgetFinancialSummary, BudgetId, BudgetSnapshot, ClientCollection, LedgerFailure,
    MonthlyKpis, NewCollection, NewDraw, PaymentTotals, ProviderDue, ProviderId,
};
use rust_decimal::Decimal;
use time::Date;

/// Repository interface for per-budget financial reconciliation.
///
/// Budgets, invoices and providers are owned by the surrounding back
/// office; this port reads them and appends to the payment ledgers. Any
/// lookup of a required parent entity that is absent is a hard failure;
/// it never silently substitutes a default. Aggregations over empty sets
/// return zeroed structures instead.
pub trait ReconciliationRepository: super::IdentityRepository {
    /// The full budget snapshot with its lines, or `None`.
    fn budget_snapshot(
        &self,
        budget: BudgetId,
    ) -> impl Future<Output = Result<Option<BudgetSnapshot>, Self::Error>> + Send;

    /// Σ provider payments, admin draws and client collections recorded
    /// against the budget. Zeroes when nothing is recorded.
    fn payment_totals(
        &self,
        budget: BudgetId,
    ) -> impl Future<Output = Result<PaymentTotals, Self::Error>> + Send;

    /// Σ payments per provider recorded against the budget.
    fn provider_payment_totals(
        &self,
        budget: BudgetId,
    ) -> impl Future<Output = Result<Vec<(ProviderId, Decimal)>, Self::Error>> + Send;

    /// Append an admin draw, guarded by capability and solvency checks.
    ///
    /// Fails with `Forbidden` when the target actor lacks the admin
    /// capability, `NotFound` for an unknown actor or budget, and
    /// `LimitExceeded` when the amount is greater than the budget's
    /// `available_for_admin_draw`. The limit check and the insert are one
    /// store transaction: two concurrent draws cannot both pass the check
    /// against a stale availability snapshot. On failure the draw ledger
    /// is untouched.
    fn record_admin_draw(
        &self,
        draw: NewDraw,
    ) -> impl Future<Output = Result<Result<AdminDraw, LedgerFailure>, Self::Error>> + Send;

    /// Append a client collection. Fails with `NotFound` for an unknown
    /// budget; the currency defaults to the budget's own.
    fn record_client_collection(
        &self,
        collection: NewCollection,
    ) -> impl Future<Output = Result<Result<ClientCollection, LedgerFailure>, Self::Error>> + Send;

    /// Profit and draw KPIs over budgets created in `[from, to]`.
    fn monthly_kpis(
        &self,
        from: Date,
        to: Date,
        admin: Option<crate::models::ActorId>,
    ) -> impl Future<Output = Result<MonthlyKpis, Self::Error>> + Send;

    /// Invoiced vs. collected vs. receivable over invoices dated in
    /// `[from, to]`, plus direct collections recorded outside invoicing.
    fn period_collections(
        &self,
        from: Date,
        to: Date,
    ) -> impl Future<Output = Result<crate::models::PeriodCollections, Self::Error>> + Send;

    /// The reconciled money flow of one budget: price total, agency
    /// profit, provider payments, admin draws, and the profit still
    /// available for draws. `NotFound` when the budget does not exist.
    fn budget_summary(
        &self,
        budget: BudgetId,
    ) -> impl Future<Output = Result<Result<BudgetFinancialSummary, LedgerFailure>, Self::Error>> + Send
    {
        async move {
            let Some(snapshot) = self.budget_snapshot(budget).await? else {
                return Ok(Err(LedgerFailure::not_found(format!("budget {budget}"))));
            };
            let totals = self.payment_totals(budget).await?;
            Ok(Ok(BudgetFinancialSummary::compute(&snapshot, &totals)))
        }
    }

    /// Per-provider dues on a budget: cost of the lines they supply minus
    /// payments already recorded. `NotFound` when the budget does not
    /// exist; a budget with no provider lines yields an empty list.
    fn provider_dues(
        &self,
        budget: BudgetId,
    ) -> impl Future<Output = Result<Result<Vec<ProviderDue>, LedgerFailure>, Self::Error>> + Send
    {
        async move {
            let Some(snapshot) = self.budget_snapshot(budget).await? else {
                return Ok(Err(LedgerFailure::not_found(format!("budget {budget}"))));
            };
            let paid = self.provider_payment_totals(budget).await?;
            Ok(Ok(ProviderDue::reconcile(&snapshot, &paid)))
        }
    }
}
