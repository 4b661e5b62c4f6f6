use rust_decimal::Decimal;

/// Caller-visible domain failures.
///
/// Ports return these as the inner layer of a nested result:
/// `Result<Result<T, LedgerFailure>, Self::Error>`. The outer layer is the
/// backend's own infrastructure error (connection loss, corrupt row); the
/// inner layer is a failure of the request itself and is meaningful to the
/// caller regardless of backend.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, thiserror::Error)]
pub enum LedgerFailure {
    /// Malformed numeric input, out-of-range percentage, or an otherwise
    /// unusable argument. These are programmer or input errors.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required parent entity (budget, item, currency, actor, or a rate
    /// for an exact date) is absent. Never silently substituted.
    #[error("{0} not found")]
    NotFound(String),

    /// The acting party lacks the capability this operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An admin draw would exceed the profit available on the budget.
    #[error("limit exceeded: requested {requested}, available {available}")]
    LimitExceeded {
        /// The amount the caller attempted to draw.
        requested: Decimal,
        /// The profit still available for draws on the budget.
        available: Decimal,
    },

    /// A concurrent writer violated a uniqueness guarantee (e.g. two open
    /// price versions). Surfaced only when the store's locking detects it.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl LedgerFailure {
    /// Shorthand for [`LedgerFailure::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for [`LedgerFailure::NotFound`].
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }
}
