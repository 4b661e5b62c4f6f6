use crate::models::{
    BulkRateOutcome, Conversion, Currency, CurrencyCode, ExchangeRate, LedgerFailure, QuoteKind,
    RateEntry, SkippedRate, money,
};
use rust_decimal::Decimal;
use time::Date;
use tracing::warn;

/// Repository interface for the currency ledger: the currency catalog and
/// date-keyed exchange-rate records.
///
/// Rates are keyed by (from, to, kind, day) with upsert semantics; the day
/// is always a civil date, so two quotes on the same day for the same pair
/// and kind update each other rather than duplicating.
pub trait CurrencyRepository: super::Repository {
    /// Point lookup of a currency by its 3-letter code.
    fn currency_by_code(
        &self,
        code: CurrencyCode,
    ) -> impl Future<Output = Result<Option<Currency>, Self::Error>> + Send;

    /// Insert or update the rate identified by (from, to, kind, day).
    ///
    /// Idempotent: a second call with the same identity and value is a
    /// no-op side-effect-wise. Fails with `InvalidArgument` for a
    /// non-positive value or a self-pair, and `NotFound` for an unknown
    /// currency.
    fn upsert_rate(
        &self,
        rate: ExchangeRate,
    ) -> impl Future<Output = Result<Result<ExchangeRate, LedgerFailure>, Self::Error>> + Send;

    /// Look up a rate for the pair and kind.
    ///
    /// With a day given, this is an exact-match lookup: an absent day
    /// yields `None`, never a silent fallback to a neighboring day.
    /// Without one, the most recent rate dated on or before today wins.
    fn rate_as_of(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        day: Option<Date>,
        kind: QuoteKind,
    ) -> impl Future<Output = Result<Option<ExchangeRate>, Self::Error>> + Send;

    /// Convert an amount between currencies.
    ///
    /// Identity conversions (same code on both sides) skip the rate lookup
    /// entirely. Otherwise the rate is resolved via [`rate_as_of`] and a
    /// missing rate is a `NotFound` failure.
    ///
    /// [`rate_as_of`]: CurrencyRepository::rate_as_of
    fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        day: Option<Date>,
        kind: QuoteKind,
    ) -> impl Future<Output = Result<Result<Conversion, LedgerFailure>, Self::Error>> + Send {
        async move {
            if from == to {
                return Ok(Ok(Conversion::identity(amount)));
            }
            let Some(rate) = self.rate_as_of(from.clone(), to.clone(), day, kind).await? else {
                return Ok(Err(LedgerFailure::not_found(format!(
                    "{kind} rate {from} -> {to}"
                ))));
            };
            Ok(Ok(Conversion {
                amount: money::round(amount * rate.value),
                rate: rate.value,
                day: Some(rate.day),
                source: rate.source.unwrap_or_else(|| "manual".into()),
            }))
        }
    }

    /// Apply a batch of rate quotes for one day and kind.
    ///
    /// Entries referencing unknown currency codes are skipped (logged and
    /// reported in the outcome), not fatal: a bulk refresh favors partial
    /// progress over all-or-nothing. Each applied entry is its own upsert;
    /// nothing here takes a global lock.
    fn bulk_upsert_rates(
        &self,
        entries: Vec<RateEntry>,
        day: Date,
        kind: QuoteKind,
    ) -> impl Future<Output = Result<BulkRateOutcome, Self::Error>> + Send {
        async move {
            let mut outcome = BulkRateOutcome::default();
            for entry in entries {
                let from_known = self.currency_by_code(entry.from.clone()).await?.is_some();
                let to_known = self.currency_by_code(entry.to.clone()).await?.is_some();
                if !from_known || !to_known {
                    warn!(from = %entry.from, to = %entry.to, "skipping rate for unknown currency");
                    outcome.skipped.push(SkippedRate {
                        from: entry.from,
                        to: entry.to,
                        reason: LedgerFailure::not_found("currency"),
                    });
                    continue;
                }
                let rate = ExchangeRate {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                    kind,
                    day,
                    value: entry.value,
                    source: entry.source,
                };
                match self.upsert_rate(rate).await? {
                    Ok(_) => outcome.applied += 1,
                    Err(reason) => {
                        warn!(from = %entry.from, to = %entry.to, %reason, "skipping unusable rate entry");
                        outcome.skipped.push(SkippedRate {
                            from: entry.from,
                            to: entry.to,
                            reason,
                        });
                    }
                }
            }
            Ok(outcome)
        }
    }
}
