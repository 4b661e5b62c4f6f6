use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A query type for dealing with datetime ranges
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct DateTimeRangeQuery {
    /// Exclusive upper bound on `valid_from`.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub before: Option<OffsetDateTime>,
    /// Inclusive lower bound on `valid_from`.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub after: Option<OffsetDateTime>,
}

/// The paginated response to a datetime query
#[derive(Serialize, Deserialize, Debug)]
pub struct DateTimeRangeResponse<T> {
    /// The page of results, newest first.
    pub results: Vec<T>,
    /// When more results exist, the query that fetches the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more: Option<DateTimeRangeQuery>,
}
