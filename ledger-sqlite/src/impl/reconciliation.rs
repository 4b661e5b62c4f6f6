use crate::{
    Db, StoreError,
    types::{self, BudgetLineRow, BudgetRow},
};
use ledger_core::{
    models::{
        ActorId, AdminDraw, BudgetFinancialSummary, BudgetId, BudgetSnapshot, ClientCollection,
        InvoiceStatus, LedgerEntryId, LedgerFailure, Map, MonthlyKpis, NewCollection, NewDraw,
        PaymentTotals, PeriodCollections, ProviderId, agency_profit, money,
    },
    ports::ReconciliationRepository,
};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use time::Date;

/// Load a budget with its lines over one connection, so the transactional
/// draw path sees the same rows it is about to check against.
async fn fetch_snapshot(
    conn: &mut SqliteConnection,
    budget: BudgetId,
) -> Result<Option<BudgetSnapshot>, StoreError> {
    let Some(row) = sqlx::query_as::<_, BudgetRow>(
        "select id, currency_code, subtotal, tax_amount, total, status, use_global_margin, \
                global_margin_pct, global_fixed_profit, created_at \
         from budget where id = ?",
    )
    .bind(budget.to_string())
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };
    let lines = sqlx::query_as::<_, BudgetLineRow>(
        "select bi.item_id, i.kind as item_kind, bi.description, bi.quantity, bi.unit_price, \
                i.margin_pct, i.provider_id, i.provider_cost \
         from budget_item bi join item i on i.id = bi.item_id \
         where bi.budget_id = ? \
         order by bi.rowid",
    )
    .bind(budget.to_string())
    .fetch_all(&mut *conn)
    .await?;
    row.into_snapshot(lines).map(Some)
}

async fn sum_amounts(
    conn: &mut SqliteConnection,
    sql: &str,
    budget: BudgetId,
) -> Result<Decimal, StoreError> {
    let amounts = sqlx::query_scalar::<_, String>(sql)
        .bind(budget.to_string())
        .fetch_all(conn)
        .await?;
    let mut total = Decimal::ZERO;
    for amount in amounts {
        total += types::parse_amount(&amount)?;
    }
    Ok(total)
}

// Amounts are decimal text, so the sums run in the domain layer rather
// than as SQL aggregates.
async fn fetch_payment_totals(
    conn: &mut SqliteConnection,
    budget: BudgetId,
) -> Result<PaymentTotals, StoreError> {
    Ok(PaymentTotals {
        providers: sum_amounts(
            &mut *conn,
            "select amount from provider_payment where budget_id = ?",
            budget,
        )
        .await?,
        admins: sum_amounts(
            &mut *conn,
            "select amount from admin_draw where budget_id = ?",
            budget,
        )
        .await?,
        collections: sum_amounts(
            &mut *conn,
            "select amount from client_collection where budget_id = ?",
            budget,
        )
        .await?,
    })
}

impl ReconciliationRepository for Db {
    async fn budget_snapshot(
        &self,
        budget: BudgetId,
    ) -> Result<Option<BudgetSnapshot>, StoreError> {
        let mut conn = self.reader.acquire().await?;
        fetch_snapshot(&mut conn, budget).await
    }

    async fn payment_totals(&self, budget: BudgetId) -> Result<PaymentTotals, StoreError> {
        let mut conn = self.reader.acquire().await?;
        fetch_payment_totals(&mut conn, budget).await
    }

    async fn provider_payment_totals(
        &self,
        budget: BudgetId,
    ) -> Result<Vec<(ProviderId, Decimal)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "select provider_id, amount from provider_payment where budget_id = ? \
             order by paid_on, rowid",
        )
        .bind(budget.to_string())
        .fetch_all(&self.reader)
        .await?;

        let mut totals: Map<ProviderId, Decimal> = Map::default();
        for (provider, amount) in rows {
            let provider: ProviderId = types::parse_id(&provider)?;
            *totals.entry(provider).or_insert(Decimal::ZERO) += types::parse_amount(&amount)?;
        }
        Ok(totals.into_iter().collect())
    }

    async fn record_admin_draw(
        &self,
        draw: NewDraw,
    ) -> Result<Result<AdminDraw, LedgerFailure>, StoreError> {
        if draw.amount <= Decimal::ZERO {
            return Ok(Err(LedgerFailure::invalid(format!(
                "draw amount must be positive, got {}",
                draw.amount
            ))));
        }
        let amount = money::round(draw.amount);

        // The limit check and the insert share one transaction on the
        // single writer connection; concurrent draws serialize here.
        let mut tx = self.writer.begin().await?;

        let actor = sqlx::query_scalar::<_, i64>("select is_admin from actor where id = ?")
            .bind(draw.admin.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(is_admin) = actor else {
            return Ok(Err(LedgerFailure::not_found(format!(
                "actor {}",
                draw.admin
            ))));
        };
        if is_admin == 0 {
            return Ok(Err(LedgerFailure::Forbidden(format!(
                "actor {} lacks the admin capability",
                draw.admin
            ))));
        }

        let Some(snapshot) = fetch_snapshot(&mut tx, draw.budget).await? else {
            return Ok(Err(LedgerFailure::not_found(format!(
                "budget {}",
                draw.budget
            ))));
        };
        let totals = fetch_payment_totals(&mut tx, draw.budget).await?;
        let summary = BudgetFinancialSummary::compute(&snapshot, &totals);
        if amount > summary.available_for_admin_draw {
            return Ok(Err(LedgerFailure::LimitExceeded {
                requested: amount,
                available: summary.available_for_admin_draw,
            }));
        }

        let entry = AdminDraw {
            id: LedgerEntryId::generate(),
            budget: draw.budget,
            admin: draw.admin,
            amount,
            currency: draw.currency.unwrap_or_else(|| snapshot.currency.clone()),
            paid_on: draw.paid_on,
            method: draw.method,
            memo: draw.memo,
        };
        sqlx::query(
            "insert into admin_draw \
                 (id, budget_id, admin_id, amount, currency_code, paid_on, method, memo) \
             values (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(entry.budget.to_string())
        .bind(entry.admin.to_string())
        .bind(entry.amount.to_string())
        .bind(entry.currency.as_str())
        .bind(types::fmt_day(entry.paid_on))
        .bind(entry.method.as_str())
        .bind(entry.memo.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(budget = %entry.budget, admin = %entry.admin, amount = %entry.amount, "admin draw recorded");
        Ok(Ok(entry))
    }

    async fn record_client_collection(
        &self,
        collection: NewCollection,
    ) -> Result<Result<ClientCollection, LedgerFailure>, StoreError> {
        if collection.amount <= Decimal::ZERO {
            return Ok(Err(LedgerFailure::invalid(format!(
                "collection amount must be positive, got {}",
                collection.amount
            ))));
        }
        let amount = money::round(collection.amount);

        let mut tx = self.writer.begin().await?;

        let budget_currency =
            sqlx::query_scalar::<_, String>("select currency_code from budget where id = ?")
                .bind(collection.budget.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(budget_currency) = budget_currency else {
            return Ok(Err(LedgerFailure::not_found(format!(
                "budget {}",
                collection.budget
            ))));
        };

        let entry = ClientCollection {
            id: LedgerEntryId::generate(),
            budget: collection.budget,
            amount,
            currency: match collection.currency {
                Some(currency) => currency,
                None => types::parse_code(&budget_currency)?,
            },
            paid_on: collection.paid_on,
            method: collection.method,
            memo: collection.memo,
        };
        sqlx::query(
            "insert into client_collection \
                 (id, budget_id, amount, currency_code, paid_on, method, memo) \
             values (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(entry.budget.to_string())
        .bind(entry.amount.to_string())
        .bind(entry.currency.as_str())
        .bind(types::fmt_day(entry.paid_on))
        .bind(entry.method.as_str())
        .bind(entry.memo.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(budget = %entry.budget, amount = %entry.amount, "client collection recorded");
        Ok(Ok(entry))
    }

    async fn monthly_kpis(
        &self,
        from: Date,
        to: Date,
        admin: Option<ActorId>,
    ) -> Result<MonthlyKpis, StoreError> {
        let mut conn = self.reader.acquire().await?;
        let budget_ids = sqlx::query_scalar::<_, String>(
            "select id from budget where substr(created_at, 1, 10) between ? and ? \
             order by created_at",
        )
        .bind(types::fmt_day(from))
        .bind(types::fmt_day(to))
        .fetch_all(&mut *conn)
        .await?;

        let admin = admin.map(|a| a.to_string());
        let mut kpis = MonthlyKpis::default();
        for id in budget_ids {
            let budget: BudgetId = types::parse_id(&id)?;
            let Some(snapshot) = fetch_snapshot(&mut conn, budget).await? else {
                continue;
            };
            let breakdown = agency_profit(&snapshot);
            kpis.profit_total += breakdown.profit;
            *kpis
                .profit_by_currency
                .entry(snapshot.currency.clone())
                .or_insert(Decimal::ZERO) += breakdown.profit;

            let draws = sqlx::query_as::<_, (String, String)>(
                "select admin_id, amount from admin_draw where budget_id = ?",
            )
            .bind(&id)
            .fetch_all(&mut *conn)
            .await?;
            for (admin_id, amount) in draws {
                let amount = types::parse_amount(&amount)?;
                kpis.draws_total += amount;
                if admin.as_deref() == Some(admin_id.as_str()) {
                    kpis.draws_for_admin += amount;
                }
            }
        }

        kpis.profit_total = money::round(kpis.profit_total);
        for profit in kpis.profit_by_currency.values_mut() {
            *profit = money::round(*profit);
        }
        kpis.draws_total = money::round(kpis.draws_total);
        kpis.draws_for_admin = money::round(kpis.draws_for_admin);
        kpis.available_for_draw = std::cmp::max(Decimal::ZERO, kpis.profit_total - kpis.draws_total);
        Ok(kpis)
    }

    async fn period_collections(
        &self,
        from: Date,
        to: Date,
    ) -> Result<PeriodCollections, StoreError> {
        let lo = types::fmt_day(from);
        let hi = types::fmt_day(to);
        let invoices = sqlx::query_as::<_, (String, String)>(
            "select status, total from invoice where issued_on between ? and ?",
        )
        .bind(&lo)
        .bind(&hi)
        .fetch_all(&self.reader)
        .await?;

        let mut report = PeriodCollections::default();
        for (status, total) in invoices {
            let status: InvoiceStatus = types::parse_keyword(&status)?;
            let total = types::parse_amount(&total)?;
            report.invoiced += total;
            match status {
                InvoiceStatus::Paid => report.collected += total,
                InvoiceStatus::Issued => report.receivable += total,
                InvoiceStatus::Voided => {}
            }
        }

        let direct = sqlx::query_scalar::<_, String>(
            "select amount from client_collection where paid_on between ? and ?",
        )
        .bind(&lo)
        .bind(&hi)
        .fetch_all(&self.reader)
        .await?;
        for amount in direct {
            report.direct_collections += types::parse_amount(&amount)?;
        }

        report.invoiced = money::round(report.invoiced);
        report.collected = money::round(report.collected);
        report.receivable = money::round(report.receivable);
        report.direct_collections = money::round(report.direct_collections);
        Ok(report)
    }
}
