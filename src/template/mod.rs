use crate::query::BoundQuery;
use crate::{Entity, QueryError};
use futures::stream::Stream;
use std::fmt::Debug;
use std::pin::Pin;

mod result;
pub use result::*;

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongodb;

pub type DocumentStream<T> = Pin<Box<dyn Stream<Item = Result<T, QueryError>> + Send>>;
pub type RemoveStream = DocumentStream<RemoveResult>;

/// Executes bound queries against a document store and maps the results.
///
/// Implementations own execution, consistency handling and mapping. The
/// fluent builders never inspect results beyond counting them.
#[async_trait::async_trait]
pub trait ReactiveTemplate: Clone + Debug + Send + Sync + 'static {
    const TYPE: &'static str;

    fn name(&self) -> &'static str {
        Self::TYPE
    }

    async fn find_by_query<T: Entity>(
        &self,
        query: &BoundQuery,
    ) -> Result<DocumentStream<T>, QueryError>;

    /// Number of matching documents, ignoring sort, skip, limit and projection.
    async fn count_by_query<T: Entity>(&self, query: &BoundQuery) -> Result<u64, QueryError>;

    async fn remove_by_query<T: Entity>(&self, query: &BoundQuery)
    -> Result<RemoveStream, QueryError>;
}
