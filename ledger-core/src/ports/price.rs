use crate::models::{
    ActorId, CurrencyCode, DateTimeRangeQuery, DateTimeRangeResponse, ItemKind, ItemRef,
    LedgerFailure, PriceChangeStats, PriceVersion, PricedItem, RepriceFailure, RepriceOutcome,
    StalePrice, money,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::warn;

/// Repository interface for the temporal price history of catalog items.
///
/// Per (item, currency) pair the store holds a chain of versions ordered
/// by `valid_from`, of which at most one is open (`valid_until` null).
/// The versioner, not the caller, owns the close-then-open step:
/// [`set_price`] must run it as a single store transaction so readers
/// never observe two open versions or a catalog item out of sync with its
/// history.
///
/// [`set_price`]: PriceHistoryRepository::set_price
pub trait PriceHistoryRepository: super::Repository {
    /// The version currently in force for the pair, if any.
    fn current_price(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
    ) -> impl Future<Output = Result<Option<PriceVersion>, Self::Error>> + Send;

    /// Record a price change as one atomic transaction: close the open
    /// version (if any) at `as_of`, insert a new open version, and mirror
    /// the price onto the item's denormalized current-price column.
    ///
    /// Fails with `NotFound` for an unknown item and `InvalidArgument`
    /// for a negative price or an `as_of` earlier than the open version's
    /// `valid_from` (closing it there would invert the chain). On failure
    /// nothing is applied.
    fn set_price(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
        price: Decimal,
        reason: String,
        editor: ActorId,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<PriceVersion, LedgerFailure>, Self::Error>> + Send;

    /// The version chain for a pair, newest first, paginated.
    ///
    /// Versions sharing a `valid_from` are always returned on the same
    /// page, so a page may exceed `limit` when an instant holds more
    /// versions than fit.
    fn price_history(
        &self,
        item: ItemRef,
        currency: CurrencyCode,
        query: DateTimeRangeQuery,
        limit: usize,
    ) -> impl Future<Output = Result<DateTimeRangeResponse<PriceVersion>, Self::Error>> + Send;

    /// Items of a kind holding an open version in the currency; the input
    /// set for [`bulk_reprice`].
    ///
    /// [`bulk_reprice`]: PriceHistoryRepository::bulk_reprice
    fn priced_items(
        &self,
        kind: ItemKind,
        currency: CurrencyCode,
    ) -> impl Future<Output = Result<Vec<PricedItem>, Self::Error>> + Send;

    /// Open versions older than `max_age_days` as of `as_of`, with their
    /// age. Read-only.
    fn stale_prices(
        &self,
        max_age_days: i64,
        currency: Option<CurrencyCode>,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<StalePrice>, Self::Error>> + Send;

    /// Counts of version-open events in `[from, to]`, grouped by reason
    /// and by day. Read-only.
    fn price_change_stats(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
        currency: Option<CurrencyCode>,
    ) -> impl Future<Output = Result<PriceChangeStats, Self::Error>> + Send;

    /// Apply a percentage change to every priced item of a kind.
    ///
    /// Each item gets `round(old × (1 + pct/100))` through its own
    /// [`set_price`] transaction, applied sequentially; one item's failure
    /// neither rolls back nor blocks its siblings. Failures are collected
    /// in the outcome.
    ///
    /// [`set_price`]: PriceHistoryRepository::set_price
    fn bulk_reprice(
        &self,
        kind: ItemKind,
        currency: CurrencyCode,
        pct_change: Decimal,
        reason: String,
        editor: ActorId,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<RepriceOutcome, Self::Error>> + Send {
        async move {
            let mut outcome = RepriceOutcome::default();
            let factor = Decimal::ONE + pct_change / Decimal::ONE_HUNDRED;
            for priced in self.priced_items(kind, currency.clone()).await? {
                let new_price = money::round(priced.price * factor);
                let applied = self
                    .set_price(
                        priced.item,
                        currency.clone(),
                        new_price,
                        reason.clone(),
                        editor,
                        as_of,
                    )
                    .await?;
                match applied {
                    Ok(_) => outcome.updated += 1,
                    Err(failure) => {
                        warn!(item = %priced.item, %failure, "reprice failed for item");
                        outcome.failures.push(RepriceFailure {
                            item: priced.item,
                            reason: failure,
                        });
                    }
                }
            }
            Ok(outcome)
        }
    }
}
