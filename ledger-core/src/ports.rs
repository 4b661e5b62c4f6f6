mod currency;
mod identity;
mod price;
mod reconciliation;

pub use currency::CurrencyRepository;
pub use identity::IdentityRepository;
pub use price::PriceHistoryRepository;
pub use reconciliation::ReconciliationRepository;

/// Base contract shared by every repository port.
///
/// `Error` is the backend's own infrastructure failure (connection loss,
/// corrupt row, ...). Domain failures travel separately as
/// [`crate::models::LedgerFailure`] in the inner result of each operation.
pub trait Repository: Send + Sync {
    /// The backend's infrastructure error type.
    type Error: std::error::Error + Send + Sync + 'static;
}

// The "marker" trait that is used everywhere and implies implementation of all the above
pub trait LedgerRepository:
    CurrencyRepository + PriceHistoryRepository + ReconciliationRepository
{
}
