use crate::{
    Db, StoreError,
    types::{self, PriceVersionRow, PricedItemRow},
};
use ledger_core::{
    models::{
        ActorId, CurrencyCode, DateTimeRangeQuery, DateTimeRangeResponse, ItemKind, ItemRef,
        LedgerFailure, PriceChangeStats, PriceVersion, PriceVersionId, PricedItem, StalePrice,
        money,
    },
    ports::PriceHistoryRepository,
};
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

// price_version rows always travel with the owning item's kind.
const VERSION_SELECT: &str = "select pv.id, pv.item_id, i.kind as item_kind, pv.currency_code, \
                              pv.price, pv.valid_from, pv.valid_until, pv.reason, pv.editor_id, \
                              pv.active \
                              from price_version pv join item i on i.id = pv.item_id";

impl PriceHistoryRepository for Db {
    async fn current_price(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
    ) -> Result<Option<PriceVersion>, StoreError> {
        sqlx::query_as::<_, PriceVersionRow>(&format!(
            "{VERSION_SELECT} \
             where pv.item_id = ? and i.kind = ? and pv.currency_code = ? \
               and pv.valid_until is null"
        ))
        .bind(item.id.to_string())
        .bind(item.kind.as_str())
        .bind(currency.as_str())
        .fetch_optional(&self.reader)
        .await?
        .map(PriceVersion::try_from)
        .transpose()
    }

    async fn set_price(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
        price: Decimal,
        reason: String,
        editor: ActorId,
        as_of: OffsetDateTime,
    ) -> Result<Result<PriceVersion, LedgerFailure>, StoreError> {
        if price < Decimal::ZERO {
            return Ok(Err(LedgerFailure::invalid(format!(
                "price must be non-negative, got {price}"
            ))));
        }
        let price = money::round(price);

        // Close-then-open-then-mirror as one transaction; dropping the
        // transaction on any early return rolls everything back.
        let mut tx = self.writer.begin().await?;

        let item_known =
            sqlx::query_scalar::<_, i64>("select count(*) from item where id = ? and kind = ?")
                .bind(item.id.to_string())
                .bind(item.kind.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if item_known == 0 {
            return Ok(Err(LedgerFailure::not_found(format!("{item}"))));
        }
        let currency_known =
            sqlx::query_scalar::<_, i64>("select count(*) from currency where code = ?")
                .bind(currency.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if currency_known == 0 {
            return Ok(Err(LedgerFailure::not_found(format!("currency {currency}"))));
        }

        let stamp = types::fmt_ts(as_of);
        let open_from = sqlx::query_scalar::<_, String>(
            "select valid_from from price_version \
             where item_id = ? and currency_code = ? and valid_until is null",
        )
        .bind(item.id.to_string())
        .bind(currency.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        // Timestamps are fixed-width UTC text, so string order is time
        // order. Closing the open version before it began would commit an
        // inverted, overlapping chain.
        if let Some(open_from) = open_from
            && stamp < open_from
        {
            return Ok(Err(LedgerFailure::invalid(format!(
                "as_of {stamp} predates the open version at {open_from}"
            ))));
        }

        sqlx::query(
            "update price_version set valid_until = ?, active = 0 \
             where item_id = ? and currency_code = ? and valid_until is null",
        )
        .bind(&stamp)
        .bind(item.id.to_string())
        .bind(currency.as_str())
        .execute(&mut *tx)
        .await?;

        let version = PriceVersion {
            id: PriceVersionId::generate(),
            item,
            currency: currency.clone(),
            price,
            valid_from: as_of,
            valid_until: None,
            reason,
            editor,
            active: true,
        };
        let inserted = sqlx::query(
            "insert into price_version \
                 (id, item_id, currency_code, price, valid_from, reason, editor_id, active) \
             values (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(version.id.to_string())
        .bind(version.item.id.to_string())
        .bind(version.currency.as_str())
        .bind(version.price.to_string())
        .bind(&stamp)
        .bind(&version.reason)
        .bind(version.editor.to_string())
        .execute(&mut *tx)
        .await;
        if let Err(error) = inserted {
            // The partial unique index guards the one-open-version
            // invariant; tripping it means another open version survived.
            if let sqlx::Error::Database(db) = &error
                && db.kind() == sqlx::error::ErrorKind::UniqueViolation
            {
                return Ok(Err(LedgerFailure::Conflict(format!(
                    "open price version already exists for {} in {currency}",
                    version.item
                ))));
            }
            return Err(error.into());
        }

        sqlx::query("update item set current_price = ?, currency_code = ? where id = ?")
            .bind(version.price.to_string())
            .bind(version.currency.as_str())
            .bind(version.item.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(item = %version.item, price = %version.price, reason = %version.reason, "price version opened");
        Ok(Ok(version))
    }

    async fn price_history(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
        query: DateTimeRangeQuery,
        limit: usize,
    ) -> Result<DateTimeRangeResponse<PriceVersion>, StoreError> {
        let before = query.before.map(types::fmt_ts);
        let after = query.after.map(types::fmt_ts);
        let rows = sqlx::query_as::<_, PriceVersionRow>(&format!(
            "{VERSION_SELECT} \
             where pv.item_id = ? and i.kind = ? and pv.currency_code = ? \
               and (? is null or pv.valid_from < ?) \
               and (? is null or pv.valid_from >= ?) \
             order by pv.valid_from desc, pv.rowid desc \
             limit ?"
        ))
        .bind(item.id.to_string())
        .bind(item.kind.as_str())
        .bind(currency.as_str())
        .bind(before.as_deref())
        .bind(before.as_deref())
        .bind(after.as_deref())
        .bind(after.as_deref())
        .bind((limit + 1) as i64)
        .fetch_all(&self.reader)
        .await?;

        let mut results = rows
            .into_iter()
            .map(PriceVersion::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let more = if results.len() > limit {
            // Cut the page at a valid_from boundary: versions recorded at
            // the same instant must not straddle the cursor, or the
            // exclusive `before` bound would skip the stragglers on the
            // next page.
            let boundary = results[limit].valid_from;
            results.retain(|version| version.valid_from != boundary);
            if results.is_empty() {
                // Every fetched row shares one instant; return the whole
                // group even though it exceeds the limit.
                let rows = sqlx::query_as::<_, PriceVersionRow>(&format!(
                    "{VERSION_SELECT} \
                     where pv.item_id = ? and i.kind = ? and pv.currency_code = ? \
                       and pv.valid_from = ? \
                     order by pv.rowid desc"
                ))
                .bind(item.id.to_string())
                .bind(item.kind.as_str())
                .bind(currency.as_str())
                .bind(types::fmt_ts(boundary))
                .fetch_all(&self.reader)
                .await?;
                results = rows
                    .into_iter()
                    .map(PriceVersion::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
            }
            results.last().map(|last| DateTimeRangeQuery {
                before: Some(last.valid_from),
                after: query.after,
            })
        } else {
            None
        };
        Ok(DateTimeRangeResponse { results, more })
    }

    async fn priced_items(
        &self,
        kind: ItemKind,
        currency: CurrencyCode,
    ) -> Result<Vec<PricedItem>, StoreError> {
        sqlx::query_as::<_, PricedItemRow>(
            "select pv.item_id, i.kind as item_kind, pv.currency_code, pv.price \
             from price_version pv join item i on i.id = pv.item_id \
             where i.kind = ? and pv.currency_code = ? and pv.valid_until is null \
             order by pv.valid_from",
        )
        .bind(kind.as_str())
        .bind(currency.as_str())
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(PricedItem::try_from)
        .collect()
    }

    async fn stale_prices(
        &self,
        max_age_days: i64,
        currency: Option<CurrencyCode>,
        as_of: OffsetDateTime,
    ) -> Result<Vec<StalePrice>, StoreError> {
        let cutoff = types::fmt_ts(as_of - Duration::days(max_age_days));
        let currency = currency.map(|c| c.as_str().to_owned());
        let rows = sqlx::query_as::<_, PriceVersionRow>(&format!(
            "{VERSION_SELECT} \
             where pv.valid_until is null and pv.valid_from < ? \
               and (? is null or pv.currency_code = ?) \
             order by pv.valid_from"
        ))
        .bind(&cutoff)
        .bind(currency.as_deref())
        .bind(currency.as_deref())
        .fetch_all(&self.reader)
        .await?;

        rows.into_iter()
            .map(|row| {
                let version = PriceVersion::try_from(row)?;
                Ok(StalePrice {
                    age_days: (as_of - version.valid_from).whole_days(),
                    item: version.item,
                    currency: version.currency,
                    price: version.price,
                    valid_from: version.valid_from,
                })
            })
            .collect()
    }

    async fn price_change_stats(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
        currency: Option<CurrencyCode>,
    ) -> Result<PriceChangeStats, StoreError> {
        let currency = currency.map(|c| c.as_str().to_owned());
        let rows = sqlx::query_as::<_, (String, String)>(
            "select reason, substr(valid_from, 1, 10) from price_version \
             where valid_from >= ? and valid_from <= ? \
               and (? is null or currency_code = ?) \
             order by valid_from",
        )
        .bind(types::fmt_ts(from))
        .bind(types::fmt_ts(to))
        .bind(currency.as_deref())
        .bind(currency.as_deref())
        .fetch_all(&self.reader)
        .await?;

        let mut stats = PriceChangeStats::default();
        for (reason, day) in rows {
            let day = types::parse_day(&day)?;
            stats.total += 1;
            *stats.by_reason.entry(reason).or_insert(0) += 1;
            *stats.by_day.entry(day).or_insert(0) += 1;
        }
        Ok(stats)
    }
}
