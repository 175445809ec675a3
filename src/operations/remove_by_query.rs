use crate::bridge::BlockingBridge;
use crate::query::{BoundQuery, Query};
use crate::template::{ReactiveTemplate, RemoveResult, RemoveStream};
use crate::{Entity, QueryError, ScanConsistency};
use futures::{TryStreamExt, stream};
use std::marker::PhantomData;
use tracing::info;

/// Asynchronous remove-by-query builder, same chain shape as the finder.
#[derive(Debug, Clone)]
pub struct ReactiveRemoveByQuery<T, R> {
    _phantom: PhantomData<T>,
    template: R,
    query: BoundQuery,
}

impl<T, R> ReactiveRemoveByQuery<T, R>
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

    /// Cold stream with one result per removed document.
    pub fn all(&self) -> RemoveStream {
        let template = self.template.clone();
        let query = self.query.clone();
        Box::pin(
            stream::once(async move {
                info!(
                    template = template.name(),
                    entity = T::TYPE,
                    collection = %query.collection(),
                    scan_consistency = %query.scan_consistency(),
                    query = %query.query(),
                    "Executing remove by query"
                );
                template.remove_by_query::<T>(&query).await
            })
            .try_flatten(),
        )
    }
}

/// Blocking remove-by-query builder layered over [`ReactiveRemoveByQuery`].
#[derive(Debug, Clone)]
pub struct ExecutableRemoveByQuery<T, R> {
    reactive: ReactiveRemoveByQuery<T, R>,
    bridge: BlockingBridge,
}

impl<T, R> ExecutableRemoveByQuery<T, R>
where
    T: Entity,
    R: ReactiveTemplate,
{
    #[must_use]
    pub fn new(reactive: ReactiveRemoveByQuery<T, R>, bridge: BlockingBridge) -> Self {
        Self { reactive, bridge }
    }

    pub fn bound_query(&self) -> &BoundQuery {
        self.reactive.bound_query()
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

    pub fn all(&self) -> Result<Vec<RemoveResult>, QueryError> {
        self.bridge.block_on(self.reactive.all().try_collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Criteria;
    use crate::template::memory::InMemoryTemplate;
    use crate::testing::{Author, Book, seed_books};

    #[tokio::test]
    async fn test_remove_only_matching_type() {
        let template = InMemoryTemplate::new();
        seed_books(&template, "_default._default").await;

        let removed: Vec<RemoveResult> =
            ReactiveRemoveByQuery::<Book, _>::new(template.clone(), BoundQuery::default())
                .all()
                .try_collect()
                .await
                .unwrap();
        assert_eq!(removed.len(), 4);
        assert_eq!(template.len("_default._default").await, 1);
        assert!(
            template
                .get::<Author>("_default._default", "a1")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_nothing_runs_until_polled() {
        let template = InMemoryTemplate::new();
        seed_books(&template, "_default._default").await;

        let remover = ReactiveRemoveByQuery::<Book, _>::new(template.clone(), BoundQuery::default())
            .matching(Query::new().with_criteria(Criteria::field("genre").eq("sf")));
        drop(remover.all());
        assert_eq!(template.len("_default._default").await, 5);

        let removed: Vec<RemoveResult> = remover.all().try_collect().await.unwrap();
        let ids: Vec<_> = removed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }
}
