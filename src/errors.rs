/// Errors surfaced by the fluent query layer.
///
/// Almost every variant originates in the template that executed the query;
/// the builders pass them through untouched. The only errors raised locally
/// are the cardinality checks of `one()` / `one_value()` and
/// `BlockingNotSupported` from the blocking bridge.
///
/// Example:
/// ```
/// use fluent_query_rust_lib::QueryError;
///
/// fn example() -> Result<(), QueryError> {
///     Err(QueryError::NoMatchingDocument)
/// }
///
/// match example() {
///     Ok(_) => println!("Operation succeeded"),
///     Err(e) => eprintln!("Operation failed: {:?}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("No document matches the query")]
    NoMatchingDocument,
    #[error("Query returned more than one document where exactly one was expected")]
    NonUniqueResult,
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Blocking execution is not supported on a current-thread runtime")]
    BlockingNotSupported,
    #[error("{0}")]
    DatabaseError(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("{0}")]
    SerializationError(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("{0}")]
    UnexpectedError(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl QueryError {
    pub fn invalid_query(details: impl Into<String>) -> Self {
        Self::InvalidQuery(details.into())
    }

    pub fn database_error<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::DatabaseError(e.into())
    }

    pub fn serialization_error<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::SerializationError(e.into())
    }

    pub fn unexpected<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::UnexpectedError(e.into())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization_error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_source_message_through() {
        let err = QueryError::database_error("connection reset");
        assert_eq!(err.to_string(), "connection reset");

        let err = QueryError::invalid_query("empty field path");
        assert_eq!(err.to_string(), "Invalid query: empty field path");
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QueryError = parse.into();
        assert!(matches!(err, QueryError::SerializationError(_)));
    }
}
