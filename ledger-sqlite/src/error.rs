/// Infrastructure errors surfaced by the SQLite backend.
///
/// Domain failures (`LedgerFailure`) never travel through this type; they
/// are the inner result of each port operation. This type covers the
/// store itself misbehaving: connection loss, failed migrations, or a row
/// whose stored text cannot be decoded back into a domain value.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An error reported by sqlx.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),
}

impl StoreError {
    pub(crate) fn decode(context: impl std::fmt::Display) -> Self {
        Self::Decode(context.to_string())
    }
}
