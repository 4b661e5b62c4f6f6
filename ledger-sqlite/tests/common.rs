#![allow(dead_code)]

use ledger_core::models::{ActorId, BudgetId, InvoiceId, ItemId, ItemKind, ItemRef, ProviderId};
use ledger_sqlite::{Db, config::SqliteConfig};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Open a fresh database backed by a temp file.
///
/// A file, not `:memory:`: the reader and writer pools would each get
/// their own private in-memory database.
pub async fn open_db() -> (Db, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = SqliteConfig {
        database_path: Some(dir.path().join("ledger.db")),
        create_if_missing: true,
    };
    let db = Db::open(&config).await.expect("open database");
    (db, dir)
}

pub fn dec(text: &str) -> Decimal {
    text.parse().expect("decimal literal")
}

pub async fn seed_currency(db: &Db, code: &str, symbol: &str) {
    sqlx::query("insert into currency (code, symbol, active) values (?, ?, 1)")
        .bind(code)
        .bind(symbol)
        .execute(&db.writer)
        .await
        .expect("seed currency");
}

pub async fn seed_actor(db: &Db, name: &str, is_admin: bool) -> ActorId {
    let id = ActorId::generate();
    sqlx::query("insert into actor (id, name, is_admin) values (?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(is_admin)
        .execute(&db.writer)
        .await
        .expect("seed actor");
    id
}

pub async fn seed_provider(db: &Db, name: &str) -> ProviderId {
    let id = ProviderId::generate();
    sqlx::query("insert into provider (id, name, active) values (?, ?, 1)")
        .bind(id.to_string())
        .bind(name)
        .execute(&db.writer)
        .await
        .expect("seed provider");
    id
}

pub async fn seed_item(db: &Db, kind: ItemKind, name: &str) -> ItemRef {
    seed_item_full(db, kind, name, "0", None, "0").await
}

pub async fn seed_item_full(
    db: &Db,
    kind: ItemKind,
    name: &str,
    margin_pct: &str,
    provider: Option<ProviderId>,
    provider_cost: &str,
) -> ItemRef {
    let id = ItemId::generate();
    sqlx::query(
        "insert into item (id, kind, name, margin_pct, provider_id, provider_cost) \
         values (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(kind.as_str())
    .bind(name)
    .bind(margin_pct)
    .bind(provider.map(|p| p.to_string()))
    .bind(provider_cost)
    .execute(&db.writer)
    .await
    .expect("seed item");
    ItemRef { kind, id }
}

pub struct BudgetSeed {
    pub currency: &'static str,
    pub subtotal: &'static str,
    pub use_global_margin: bool,
    pub global_margin_pct: Option<&'static str>,
    pub global_fixed_profit: Option<&'static str>,
    pub created_on: &'static str,
}

impl Default for BudgetSeed {
    fn default() -> Self {
        Self {
            currency: "USD",
            subtotal: "0",
            use_global_margin: false,
            global_margin_pct: None,
            global_fixed_profit: None,
            created_on: "2026-08-01",
        }
    }
}

pub async fn seed_budget(db: &Db, seed: BudgetSeed) -> BudgetId {
    let id = BudgetId::generate();
    sqlx::query(
        "insert into budget \
             (id, currency_code, subtotal, tax_amount, total, status, use_global_margin, \
              global_margin_pct, global_fixed_profit, created_at) \
         values (?, ?, ?, '0', ?, 'approved', ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(seed.currency)
    .bind(seed.subtotal)
    .bind(seed.subtotal)
    .bind(seed.use_global_margin)
    .bind(seed.global_margin_pct)
    .bind(seed.global_fixed_profit)
    .bind(format!("{} 09:00:00.000000", seed.created_on))
    .execute(&db.writer)
    .await
    .expect("seed budget");
    id
}

pub async fn add_budget_line(
    db: &Db,
    budget: BudgetId,
    item: ItemRef,
    quantity: &str,
    unit_price: &str,
) {
    sqlx::query(
        "insert into budget_item (id, budget_id, item_id, description, quantity, unit_price) \
         values (?, ?, ?, '', ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(budget.to_string())
    .bind(item.id.to_string())
    .bind(quantity)
    .bind(unit_price)
    .execute(&db.writer)
    .await
    .expect("seed budget line");
}

pub async fn seed_invoice(
    db: &Db,
    budget: Option<BudgetId>,
    total: &str,
    currency: &str,
    status: &str,
    issued_on: &str,
) {
    sqlx::query(
        "insert into invoice (id, budget_id, total, currency_code, status, issued_on) \
         values (?, ?, ?, ?, ?, ?)",
    )
    .bind(InvoiceId::generate().to_string())
    .bind(budget.map(|b| b.to_string()))
    .bind(total)
    .bind(currency)
    .bind(status)
    .bind(issued_on)
    .execute(&db.writer)
    .await
    .expect("seed invoice");
}

pub async fn seed_provider_payment(
    db: &Db,
    budget: BudgetId,
    provider: ProviderId,
    amount: &str,
    currency: &str,
    paid_on: &str,
) {
    sqlx::query(
        "insert into provider_payment \
             (id, budget_id, provider_id, amount, currency_code, paid_on, method, memo) \
         values (?, ?, ?, ?, ?, ?, 'transfer', null)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(budget.to_string())
    .bind(provider.to_string())
    .bind(amount)
    .bind(currency)
    .bind(paid_on)
    .execute(&db.writer)
    .await
    .expect("seed provider payment");
}

pub async fn count_rows(db: &Db, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("select count(*) from {table}"))
        .fetch_one(&db.reader)
        .await
        .expect("count rows")
}
