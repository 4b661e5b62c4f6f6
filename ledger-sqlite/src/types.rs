//! Row types and text codecs for the SQLite backend.
//!
//! Everything monetary is stored as a decimal string, timestamps as
//! fixed-width UTC text (lexicographic order == chronological order),
//! civil dates as `YYYY-MM-DD`, and ids as uuid text. The row structs
//! here decode those columns back into `ledger-core` models; a value
//! that fails to decode surfaces as [`StoreError::Decode`], never a
//! silent default.

use crate::StoreError;
use ledger_core::models::{
    BudgetLine, BudgetSnapshot, Currency, CurrencyCode, ExchangeRate, ItemKind, ItemRef,
    PriceVersion, PricedItem,
};
use rust_decimal::Decimal;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

const TS_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub(crate) fn fmt_ts(ts: OffsetDateTime) -> String {
    let utc = ts.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
        .format(&TS_FORMAT)
        .expect("fixed-width timestamp format")
}

pub(crate) fn parse_ts(text: &str) -> Result<OffsetDateTime, StoreError> {
    PrimitiveDateTime::parse(text, &TS_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| StoreError::decode(format!("timestamp {text:?}: {e}")))
}

pub(crate) fn fmt_day(day: Date) -> String {
    day.format(&DAY_FORMAT).expect("civil date format")
}

pub(crate) fn parse_day(text: &str) -> Result<Date, StoreError> {
    Date::parse(text, &DAY_FORMAT).map_err(|e| StoreError::decode(format!("day {text:?}: {e}")))
}

pub(crate) fn parse_amount(text: &str) -> Result<Decimal, StoreError> {
    text.parse()
        .map_err(|e| StoreError::decode(format!("amount {text:?}: {e}")))
}

pub(crate) fn parse_id<T: From<uuid::Uuid>>(text: &str) -> Result<T, StoreError> {
    uuid::Uuid::parse_str(text)
        .map(T::from)
        .map_err(|e| StoreError::decode(format!("id {text:?}: {e}")))
}

pub(crate) fn parse_keyword<T>(text: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse()
        .map_err(|e| StoreError::decode(format!("keyword {text:?}: {e}")))
}

pub(crate) fn parse_code(text: &str) -> Result<CurrencyCode, StoreError> {
    CurrencyCode::new(text).map_err(StoreError::decode)
}

#[derive(sqlx::FromRow)]
pub(crate) struct CurrencyRow {
    pub code: String,
    pub symbol: String,
    pub active: i64,
}

impl TryFrom<CurrencyRow> for Currency {
    type Error = StoreError;

    fn try_from(row: CurrencyRow) -> Result<Self, Self::Error> {
        Ok(Currency {
            code: parse_code(&row.code)?,
            symbol: row.symbol,
            active: row.active != 0,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RateRow {
    pub from_code: String,
    pub to_code: String,
    pub kind: String,
    pub day: String,
    pub value: String,
    pub source: Option<String>,
}

impl TryFrom<RateRow> for ExchangeRate {
    type Error = StoreError;

    fn try_from(row: RateRow) -> Result<Self, Self::Error> {
        Ok(ExchangeRate {
            from: parse_code(&row.from_code)?,
            to: parse_code(&row.to_code)?,
            kind: parse_keyword(&row.kind)?,
            day: parse_day(&row.day)?,
            value: parse_amount(&row.value)?,
            source: row.source,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PriceVersionRow {
    pub id: String,
    pub item_id: String,
    pub item_kind: String,
    pub currency_code: String,
    pub price: String,
    pub valid_from: String,
    pub valid_until: Option<String>,
    pub reason: String,
    pub editor_id: String,
    pub active: i64,
}

impl TryFrom<PriceVersionRow> for PriceVersion {
    type Error = StoreError;

    fn try_from(row: PriceVersionRow) -> Result<Self, Self::Error> {
        Ok(PriceVersion {
            id: parse_id(&row.id)?,
            item: ItemRef {
                kind: parse_keyword::<ItemKind>(&row.item_kind)?,
                id: parse_id(&row.item_id)?,
            },
            currency: parse_code(&row.currency_code)?,
            price: parse_amount(&row.price)?,
            valid_from: parse_ts(&row.valid_from)?,
            valid_until: row.valid_until.as_deref().map(parse_ts).transpose()?,
            reason: row.reason,
            editor: parse_id(&row.editor_id)?,
            active: row.active != 0,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PricedItemRow {
    pub item_id: String,
    pub item_kind: String,
    pub currency_code: String,
    pub price: String,
}

impl TryFrom<PricedItemRow> for PricedItem {
    type Error = StoreError;

    fn try_from(row: PricedItemRow) -> Result<Self, Self::Error> {
        Ok(PricedItem {
            item: ItemRef {
                kind: parse_keyword::<ItemKind>(&row.item_kind)?,
                id: parse_id(&row.item_id)?,
            },
            currency: parse_code(&row.currency_code)?,
            price: parse_amount(&row.price)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BudgetRow {
    pub id: String,
    pub currency_code: String,
    pub subtotal: String,
    pub tax_amount: String,
    pub total: String,
    pub status: String,
    pub use_global_margin: i64,
    pub global_margin_pct: Option<String>,
    pub global_fixed_profit: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BudgetLineRow {
    pub item_id: String,
    pub item_kind: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub margin_pct: String,
    pub provider_id: Option<String>,
    pub provider_cost: String,
}

impl TryFrom<BudgetLineRow> for BudgetLine {
    type Error = StoreError;

    fn try_from(row: BudgetLineRow) -> Result<Self, Self::Error> {
        Ok(BudgetLine {
            item: ItemRef {
                kind: parse_keyword::<ItemKind>(&row.item_kind)?,
                id: parse_id(&row.item_id)?,
            },
            description: row.description,
            quantity: parse_amount(&row.quantity)?,
            unit_price: parse_amount(&row.unit_price)?,
            margin_pct: parse_amount(&row.margin_pct)?,
            provider: row.provider_id.as_deref().map(parse_id).transpose()?,
            provider_cost: parse_amount(&row.provider_cost)?,
        })
    }
}

impl BudgetRow {
    pub fn into_snapshot(self, lines: Vec<BudgetLineRow>) -> Result<BudgetSnapshot, StoreError> {
        Ok(BudgetSnapshot {
            id: parse_id(&self.id)?,
            currency: parse_code(&self.currency_code)?,
            subtotal: parse_amount(&self.subtotal)?,
            tax_amount: parse_amount(&self.tax_amount)?,
            total: parse_amount(&self.total)?,
            status: parse_keyword(&self.status)?,
            use_global_margin: self.use_global_margin != 0,
            global_margin_pct: self.global_margin_pct.as_deref().map(parse_amount).transpose()?,
            global_fixed_profit: self
                .global_fixed_profit
                .as_deref()
                .map(parse_amount)
                .transpose()?,
            created_at: parse_ts(&self.created_at)?,
            lines: lines
                .into_iter()
                .map(BudgetLine::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
