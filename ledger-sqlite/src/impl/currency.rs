use crate::{
    Db, StoreError,
    types::{self, CurrencyRow, RateRow},
};
use ledger_core::{
    models::{Currency, CurrencyCode, ExchangeRate, LedgerFailure, QuoteKind},
    ports::CurrencyRepository,
};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

impl CurrencyRepository for Db {
    async fn currency_by_code(&self, code: CurrencyCode) -> Result<Option<Currency>, StoreError> {
        sqlx::query_as::<_, CurrencyRow>(
            "select code, symbol, active from currency where code = ?",
        )
        .bind(code.as_str())
        .fetch_optional(&self.reader)
        .await?
        .map(Currency::try_from)
        .transpose()
    }

    async fn upsert_rate(
        &self,
        rate: ExchangeRate,
    ) -> Result<Result<ExchangeRate, LedgerFailure>, StoreError> {
        if rate.value <= Decimal::ZERO {
            return Ok(Err(LedgerFailure::invalid(format!(
                "rate value must be positive, got {}",
                rate.value
            ))));
        }
        if rate.from == rate.to {
            return Ok(Err(LedgerFailure::invalid(format!(
                "rate pair must differ, got {} -> {}",
                rate.from, rate.to
            ))));
        }
        for code in [&rate.from, &rate.to] {
            if self.currency_by_code(code.clone()).await?.is_none() {
                return Ok(Err(LedgerFailure::not_found(format!("currency {code}"))));
            }
        }

        // The (from, to, kind, day) tuple is the rate's identity; a second
        // quote for the same tuple replaces the value instead of stacking.
        sqlx::query(
            "insert into exchange_rate (id, from_code, to_code, kind, day, value, source) \
             values (?, ?, ?, ?, ?, ?, ?) \
             on conflict (from_code, to_code, kind, day) \
             do update set value = excluded.value, source = excluded.source",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(rate.from.as_str())
        .bind(rate.to.as_str())
        .bind(rate.kind.as_str())
        .bind(types::fmt_day(rate.day))
        .bind(rate.value.to_string())
        .bind(rate.source.as_deref())
        .execute(&self.writer)
        .await?;

        tracing::debug!(from = %rate.from, to = %rate.to, kind = %rate.kind, value = %rate.value, "rate upserted");
        Ok(Ok(rate))
    }

    async fn rate_as_of(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        day: Option<Date>,
        kind: QuoteKind,
    ) -> Result<Option<ExchangeRate>, StoreError> {
        let row = match day {
            // Exact-date lookup: an absent day is a miss, never a fallback.
            Some(day) => {
                sqlx::query_as::<_, RateRow>(
                    "select from_code, to_code, kind, day, value, source \
                     from exchange_rate \
                     where from_code = ? and to_code = ? and kind = ? and day = ?",
                )
                .bind(from.as_str())
                .bind(to.as_str())
                .bind(kind.as_str())
                .bind(types::fmt_day(day))
                .fetch_optional(&self.reader)
                .await?
            }
            None => {
                let today = types::fmt_day(OffsetDateTime::now_utc().date());
                sqlx::query_as::<_, RateRow>(
                    "select from_code, to_code, kind, day, value, source \
                     from exchange_rate \
                     where from_code = ? and to_code = ? and kind = ? and day <= ? \
                     order by day desc \
                     limit 1",
                )
                .bind(from.as_str())
                .bind(to.as_str())
                .bind(kind.as_str())
                .bind(today)
                .fetch_optional(&self.reader)
                .await?
            }
        };
        row.map(ExchangeRate::try_from).transpose()
    }
}
