use crate::bridge::{BlockingBridge, BlockingStream};
use crate::query::{BoundQuery, Query};
use crate::template::{DocumentStream, ReactiveTemplate};
use crate::{Entity, QueryError, ScanConsistency};
use futures::{TryStreamExt, stream};
use std::marker::PhantomData;
use tracing::debug;

/// Asynchronous find-by-query builder.
///
/// Narrowing calls (`matching`, `consistent_with`, `in_collection`) return a
/// new builder and leave the receiver usable, in any order. Terminal calls
/// hand the bound query to the template.
#[derive(Debug, Clone)]
pub struct ReactiveFindByQuery<T, R> {
    _phantom: PhantomData<T>,
    template: R,
    query: BoundQuery,
}

impl<T, R> ReactiveFindByQuery<T, R>
where
    T: Entity,
    R: ReactiveTemplate,
{
    #[must_use]
    pub fn new(template: R, query: BoundQuery) -> Self {
        Self {
            _phantom: PhantomData,
            template,
            query,
        }
    }

    pub fn bound_query(&self) -> &BoundQuery {
        &self.query
    }

    fn rebound(&self, query: BoundQuery) -> Self {
        Self::new(self.template.clone(), query)
    }

    #[must_use]
    pub fn matching(&self, query: Query) -> Self {
        self.rebound(self.query.matching(query))
    }

    #[must_use]
    pub fn consistent_with(&self, scan_consistency: ScanConsistency) -> Self {
        self.rebound(self.query.consistent_with(scan_consistency))
    }

    #[must_use]
    pub fn in_collection(&self, collection: impl Into<String>) -> Self {
        self.rebound(self.query.in_collection(collection))
    }

    /// Cold stream of every match: nothing executes until it is polled.
    pub fn all(&self) -> DocumentStream<T> {
        let template = self.template.clone();
        let query = self.query.clone();
        Box::pin(
            stream::once(async move {
                debug!(
                    template = template.name(),
                    entity = T::TYPE,
                    collection = %query.collection(),
                    scan_consistency = %query.scan_consistency(),
                    query = %query.query(),
                    "Executing find by query"
                );
                template.find_by_query::<T>(&query).await
            })
            .try_flatten(),
        )
    }

    /// The single match; fails when nothing or more than one document matches.
    pub async fn one(&self) -> Result<T, QueryError> {
        let mut results = self.all();
        let Some(found) = results.try_next().await? else {
            return Err(QueryError::NoMatchingDocument);
        };
        if results.try_next().await?.is_some() {
            return Err(QueryError::NonUniqueResult);
        }
        Ok(found)
    }

    pub async fn first(&self) -> Result<Option<T>, QueryError> {
        self.all().try_next().await
    }

    pub async fn count(&self) -> Result<u64, QueryError> {
        debug!(
            template = self.template.name(),
            entity = T::TYPE,
            collection = %self.query.collection(),
            query = %self.query.query(),
            "Executing count by query"
        );
        self.template.count_by_query::<T>(&self.query).await
    }

    pub async fn exists(&self) -> Result<bool, QueryError> {
        Ok(self.count().await? > 0)
    }
}

/// Blocking find-by-query builder layered over [`ReactiveFindByQuery`].
#[derive(Debug, Clone)]
pub struct ExecutableFindByQuery<T, R> {
    reactive: ReactiveFindByQuery<T, R>,
    bridge: BlockingBridge,
}

impl<T, R> ExecutableFindByQuery<T, R>
where
    T: Entity,
    R: ReactiveTemplate,
{
    #[must_use]
    pub fn new(reactive: ReactiveFindByQuery<T, R>, bridge: BlockingBridge) -> Self {
        Self { reactive, bridge }
    }

    pub fn bound_query(&self) -> &BoundQuery {
        self.reactive.bound_query()
    }

    pub fn reactive(&self) -> &ReactiveFindByQuery<T, R> {
        &self.reactive
    }

    #[must_use]
    pub fn matching(&self, query: Query) -> Self {
        Self::new(self.reactive.matching(query), self.bridge.clone())
    }

    #[must_use]
    pub fn consistent_with(&self, scan_consistency: ScanConsistency) -> Self {
        Self::new(self.reactive.consistent_with(scan_consistency), self.bridge.clone())
    }

    #[must_use]
    pub fn in_collection(&self, collection: impl Into<String>) -> Self {
        Self::new(self.reactive.in_collection(collection), self.bridge.clone())
    }

    pub fn one_value(&self) -> Result<T, QueryError> {
        self.bridge.block_on(self.reactive.one())
    }

    pub fn first_value(&self) -> Result<Option<T>, QueryError> {
        self.bridge.block_on(self.reactive.first())
    }

    pub fn all(&self) -> Result<Vec<T>, QueryError> {
        self.bridge.block_on(self.reactive.all().try_collect())
    }

    pub fn stream(&self) -> BlockingStream<T> {
        self.bridge.stream(self.reactive.all())
    }

    pub fn count(&self) -> Result<u64, QueryError> {
        self.bridge.block_on(self.reactive.count())
    }

    pub fn exists(&self) -> Result<bool, QueryError> {
        Ok(self.count()? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Criteria;
    use crate::template::memory::InMemoryTemplate;
    use crate::testing::{Book, seed_books};

    async fn seeded() -> ReactiveFindByQuery<Book, InMemoryTemplate> {
        let template = InMemoryTemplate::new();
        seed_books(&template, "_default._default").await;
        ReactiveFindByQuery::new(template, BoundQuery::default())
    }

    fn genre(genre: &str) -> Query {
        Query::new().with_criteria(Criteria::field("genre").eq(genre))
    }

    #[tokio::test]
    async fn test_all_is_cold() {
        let template = InMemoryTemplate::new();
        let finder = ReactiveFindByQuery::<Book, _>::new(template.clone(), BoundQuery::default());
        let pending = finder.all();
        // Documents written before the first poll are visible.
        seed_books(&template, "_default._default").await;
        let books: Vec<Book> = pending.try_collect().await.unwrap();
        assert_eq!(books.len(), 4);
    }

    #[tokio::test]
    async fn test_one_cardinality() {
        let finder = seeded().await;

        let dune = finder
            .matching(Query::new().with_criteria(Criteria::field("title").eq("Dune")))
            .one()
            .await
            .unwrap();
        assert_eq!(dune.id, "b2");

        let none = finder.matching(genre("poetry")).one().await.unwrap_err();
        assert!(matches!(none, QueryError::NoMatchingDocument));

        let many = finder.matching(genre("sf")).one().await.unwrap_err();
        assert!(matches!(many, QueryError::NonUniqueResult));
    }

    #[tokio::test]
    async fn test_first_and_exists() {
        let finder = seeded().await;
        let first = finder.matching(genre("classic")).first().await.unwrap();
        assert_eq!(first.map(|b| b.id), Some("b3".to_string()));
        assert_eq!(finder.matching(genre("poetry")).first().await.unwrap(), None);

        assert!(finder.matching(genre("sf")).exists().await.unwrap());
        assert!(!finder.matching(genre("poetry")).exists().await.unwrap());
        assert_eq!(finder.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_template_errors_surface_in_stream() {
        let finder = seeded().await;
        let mut results = finder
            .matching(Query::new().with_criteria(Criteria::field("").eq(1)))
            .all();
        let err = results.try_next().await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery(_)));
    }
}
