mod common;

use common::{
    BudgetSeed, add_budget_line, dec, open_db, seed_actor, seed_budget, seed_currency,
    seed_invoice, seed_item_full, seed_provider, seed_provider_payment,
};
use ledger_core::{
    models::{
        BudgetId, Capability, CurrencyCode, ItemKind, LedgerFailure, MarginPolicy, NewCollection,
        NewDraw, PaymentMethod,
    },
    ports::{IdentityRepository, ReconciliationRepository},
};
use ledger_sqlite::Db;
use time::macros::date;

fn draw(budget: BudgetId, admin: ledger_core::models::ActorId, amount: &str) -> NewDraw {
    NewDraw {
        budget,
        admin,
        amount: dec(amount),
        currency: None,
        paid_on: date!(2026 - 08 - 20),
        method: PaymentMethod::Transfer,
        memo: None,
    }
}

/// A budget of one 1000 USD line under a 20% global margin: profit 200.
async fn profitable_budget(db: &Db) -> BudgetId {
    let budget = seed_budget(
        db,
        BudgetSeed {
            subtotal: "1000",
            use_global_margin: true,
            global_margin_pct: Some("20"),
            ..BudgetSeed::default()
        },
    )
    .await;
    let item = seed_item_full(db, ItemKind::Service, "full day tour", "0", None, "0").await;
    add_budget_line(db, budget, item, "1", "1000").await;
    budget
}

#[tokio::test]
async fn summary_reconciles_profit_against_payments() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let budget = profitable_budget(&db).await;
    let provider = seed_provider(&db, "bus company").await;
    seed_provider_payment(&db, budget, provider, "300", "USD", "2026-08-10").await;

    let summary = db.budget_summary(budget).await?.expect("summary");
    assert_eq!(summary.currency, CurrencyCode::new("USD").unwrap());
    assert_eq!(summary.price_total, dec("1000.00"));
    assert_eq!(summary.agency_profit, dec("200.00"));
    assert_eq!(summary.margin_policy, MarginPolicy::GlobalPercentage);
    assert_eq!(summary.paid_to_providers, dec("300.00"));
    assert_eq!(summary.paid_to_admins, dec("0.00"));
    assert_eq!(summary.available_for_admin_draw, dec("200.00"));
    Ok(())
}

#[tokio::test]
async fn summary_of_missing_budget_is_not_found() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    let missing = db.budget_summary(BudgetId::generate()).await?;
    assert!(matches!(missing, Err(LedgerFailure::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn draw_decreases_availability_by_its_amount() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let budget = profitable_budget(&db).await;
    let admin = seed_actor(&db, "marta", true).await;

    let before = db.budget_summary(budget).await?.expect("summary");
    let entry = db
        .record_admin_draw(draw(budget, admin, "150"))
        .await?
        .expect("draw recorded");
    assert_eq!(entry.amount, dec("150.00"));
    assert_eq!(
        entry.currency,
        CurrencyCode::new("USD").unwrap(),
        "currency defaults to the budget's"
    );

    let after = db.budget_summary(budget).await?.expect("summary");
    assert_eq!(
        before.available_for_admin_draw - after.available_for_admin_draw,
        dec("150.00")
    );
    Ok(())
}

#[tokio::test]
async fn overdraw_fails_and_leaves_the_ledger_untouched() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let budget = profitable_budget(&db).await;
    let admin = seed_actor(&db, "marta", true).await;

    let refused = db.record_admin_draw(draw(budget, admin, "300")).await?;
    assert_eq!(
        refused,
        Err(LedgerFailure::LimitExceeded {
            requested: dec("300.00"),
            available: dec("200.00"),
        })
    );
    assert_eq!(common::count_rows(&db, "admin_draw").await, 0);

    // A draw up to the exact limit still passes.
    db.record_admin_draw(draw(budget, admin, "200"))
        .await?
        .expect("draw at the limit");
    let drained = db.record_admin_draw(draw(budget, admin, "0.01")).await?;
    assert!(matches!(drained, Err(LedgerFailure::LimitExceeded { .. })));
    Ok(())
}

#[tokio::test]
async fn draws_require_the_admin_capability() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let budget = profitable_budget(&db).await;
    let clerk = seed_actor(&db, "tomas", false).await;

    let refused = db.record_admin_draw(draw(budget, clerk, "50")).await?;
    assert!(matches!(refused, Err(LedgerFailure::Forbidden(_))));

    let ghost = ledger_core::models::ActorId::generate();
    let missing = db.record_admin_draw(draw(budget, ghost, "50")).await?;
    assert!(matches!(missing, Err(LedgerFailure::NotFound(_))));

    let invalid = db.record_admin_draw(draw(budget, clerk, "-5")).await?;
    assert!(matches!(invalid, Err(LedgerFailure::InvalidArgument(_))));
    assert_eq!(common::count_rows(&db, "admin_draw").await, 0);
    Ok(())
}

#[tokio::test]
async fn capabilities_reflect_the_actor_table() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    let admin = seed_actor(&db, "marta", true).await;
    let clerk = seed_actor(&db, "tomas", false).await;

    let admin_caps = db.capabilities(admin).await?.expect("known actor");
    assert!(admin_caps.has(Capability::Admin));
    let clerk_caps = db.capabilities(clerk).await?.expect("known actor");
    assert!(!clerk_caps.has(Capability::Admin));
    assert!(
        db.capabilities(ledger_core::models::ActorId::generate())
            .await?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn provider_dues_net_costs_against_payments() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let bus = seed_provider(&db, "bus company").await;
    let hotel = seed_provider(&db, "hotel").await;

    let budget = seed_budget(&db, BudgetSeed::default()).await;
    let transfer =
        seed_item_full(&db, ItemKind::Service, "transfer", "0", Some(bus), "80").await;
    let night = seed_item_full(&db, ItemKind::Service, "night", "0", Some(hotel), "120").await;
    let fee = seed_item_full(&db, ItemKind::Service, "booking fee", "0", None, "0").await;
    add_budget_line(&db, budget, transfer, "2", "100").await;
    add_budget_line(&db, budget, night, "3", "150").await;
    add_budget_line(&db, budget, fee, "1", "50").await;

    seed_provider_payment(&db, budget, bus, "100", "USD", "2026-08-10").await;
    seed_provider_payment(&db, budget, hotel, "500", "USD", "2026-08-11").await;

    let mut dues = db.provider_dues(budget).await?.expect("dues");
    dues.sort_by_key(|due| due.provider);
    let bus_due = dues.iter().find(|d| d.provider == bus).expect("bus due");
    assert_eq!(bus_due.total_cost, dec("160.00"));
    assert_eq!(bus_due.total_paid, dec("100.00"));
    assert_eq!(bus_due.pending, dec("60.00"));

    let hotel_due = dues.iter().find(|d| d.provider == hotel).expect("hotel due");
    assert_eq!(hotel_due.total_cost, dec("360.00"));
    assert_eq!(hotel_due.total_paid, dec("500.00"));
    assert_eq!(hotel_due.pending, dec("0.00"), "overpayment clamps at zero");

    assert_eq!(dues.len(), 2, "provider-less lines carry no dues");
    Ok(())
}

#[tokio::test]
async fn monthly_kpis_aggregate_over_the_creation_period() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    seed_currency(&db, "ARS", "$").await;
    let marta = seed_actor(&db, "marta", true).await;
    let diego = seed_actor(&db, "diego", true).await;

    // 20% of 1000 USD.
    let usd_budget = profitable_budget(&db).await;
    // Fixed 500 ARS.
    let ars_budget = seed_budget(
        &db,
        BudgetSeed {
            currency: "ARS",
            subtotal: "4000",
            use_global_margin: true,
            global_fixed_profit: Some("500"),
            created_on: "2026-08-15",
            ..BudgetSeed::default()
        },
    )
    .await;
    // Created outside the queried period.
    seed_budget(
        &db,
        BudgetSeed {
            subtotal: "9999",
            use_global_margin: true,
            global_margin_pct: Some("50"),
            created_on: "2026-07-10",
            ..BudgetSeed::default()
        },
    )
    .await;

    db.record_admin_draw(draw(usd_budget, marta, "100"))
        .await?
        .expect("draw");
    db.record_admin_draw(draw(ars_budget, diego, "50"))
        .await?
        .expect("draw");

    let kpis = db
        .monthly_kpis(date!(2026 - 08 - 01), date!(2026 - 08 - 31), Some(marta))
        .await?;
    assert_eq!(kpis.profit_total, dec("700.00"));
    assert_eq!(
        kpis.profit_by_currency.get(&CurrencyCode::new("USD").unwrap()),
        Some(&dec("200.00"))
    );
    assert_eq!(
        kpis.profit_by_currency.get(&CurrencyCode::new("ARS").unwrap()),
        Some(&dec("500.00"))
    );
    assert_eq!(kpis.draws_total, dec("150.00"));
    assert_eq!(kpis.draws_for_admin, dec("100.00"));
    assert_eq!(kpis.available_for_draw, dec("550.00"));
    Ok(())
}

#[tokio::test]
async fn period_collections_split_invoiced_collected_receivable() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "USD", "$").await;
    let budget = seed_budget(&db, BudgetSeed::default()).await;

    seed_invoice(&db, Some(budget), "2000", "USD", "paid", "2026-08-05").await;
    seed_invoice(&db, Some(budget), "1000", "USD", "issued", "2026-08-12").await;
    seed_invoice(&db, Some(budget), "500", "USD", "voided", "2026-08-15").await;
    // Outside the period.
    seed_invoice(&db, None, "800", "USD", "paid", "2026-07-20").await;

    db.record_client_collection(NewCollection {
        budget,
        amount: dec("250"),
        currency: None,
        paid_on: date!(2026 - 08 - 18),
        method: PaymentMethod::Cash,
        memo: Some("advance".into()),
    })
    .await?
    .expect("collection");

    let report = db
        .period_collections(date!(2026 - 08 - 01), date!(2026 - 08 - 31))
        .await?;
    assert_eq!(report.invoiced, dec("3500.00"));
    assert_eq!(report.collected, dec("2000.00"));
    assert_eq!(report.receivable, dec("1000.00"), "voided invoices never count");
    assert_eq!(report.direct_collections, dec("250.00"));
    Ok(())
}

#[tokio::test]
async fn collections_validate_and_default_their_currency() -> anyhow::Result<()> {
    let (db, _dir) = open_db().await;
    seed_currency(&db, "ARS", "$").await;
    let budget = seed_budget(
        &db,
        BudgetSeed {
            currency: "ARS",
            ..BudgetSeed::default()
        },
    )
    .await;

    let entry = db
        .record_client_collection(NewCollection {
            budget,
            amount: dec("100"),
            currency: None,
            paid_on: date!(2026 - 08 - 18),
            method: PaymentMethod::Transfer,
            memo: None,
        })
        .await?
        .expect("collection");
    assert_eq!(entry.currency, CurrencyCode::new("ARS").unwrap());

    let missing = db
        .record_client_collection(NewCollection {
            budget: BudgetId::generate(),
            amount: dec("100"),
            currency: None,
            paid_on: date!(2026 - 08 - 18),
            method: PaymentMethod::Transfer,
            memo: None,
        })
        .await?;
    assert!(matches!(missing, Err(LedgerFailure::NotFound(_))));

    let invalid = db
        .record_client_collection(NewCollection {
            budget,
            amount: dec("0"),
            currency: None,
            paid_on: date!(2026 - 08 - 18),
            method: PaymentMethod::Transfer,
            memo: None,
        })
        .await?;
    assert!(matches!(invalid, Err(LedgerFailure::InvalidArgument(_))));
    Ok(())
}
