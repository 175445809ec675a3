use crate::bridge::BlockingBridge;
use crate::operations::{
    ExecutableFindByQuery, ExecutableRemoveByQuery, ReactiveFindByQuery, ReactiveRemoveByQuery,
};
use crate::query::BoundQuery;
use crate::template::ReactiveTemplate;
use crate::{Entity, QueryConfig};

/// Entry point of the asynchronous fluent API.
///
/// ```
/// use fluent_query_rust_lib::operations::ReactiveOperations;
/// use fluent_query_rust_lib::template::memory::InMemoryTemplate;
/// use fluent_query_rust_lib::{Entity, ScanConsistency};
///
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
/// struct Airline {
///     id: String,
/// }
///
/// impl Entity for Airline {
///     const TYPE: &'static str = "airline";
///
///     fn id(&self) -> String {
///         self.id.clone()
///     }
/// }
///
/// let operations = ReactiveOperations::new(InMemoryTemplate::new());
/// let finder = operations
///     .find_by_query::<Airline>()
///     .consistent_with(ScanConsistency::RequestPlus)
///     .in_collection("inventory.airline");
/// assert_eq!(finder.bound_query().collection(), "inventory.airline");
/// ```
#[derive(Debug, Clone)]
pub struct ReactiveOperations<R> {
    template: R,
    config: QueryConfig,
}

impl<R> ReactiveOperations<R>
where
    R: ReactiveTemplate,
{
    #[must_use]
    pub fn new(template: R) -> Self {
        Self {
            template,
            config: QueryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(self, config: QueryConfig) -> Self {
        Self { config, ..self }
    }

    pub fn template(&self) -> &R {
        &self.template
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn find_by_query<T: Entity>(&self) -> ReactiveFindByQuery<T, R> {
        ReactiveFindByQuery::new(self.template.clone(), BoundQuery::from_config(&self.config))
    }

    pub fn remove_by_query<T: Entity>(&self) -> ReactiveRemoveByQuery<T, R> {
        ReactiveRemoveByQuery::new(self.template.clone(), BoundQuery::from_config(&self.config))
    }

    #[must_use]
    pub fn blocking(&self, bridge: BlockingBridge) -> ExecutableOperations<R> {
        ExecutableOperations::new(self.clone(), bridge)
    }
}

/// Entry point of the blocking fluent API.
#[derive(Debug, Clone)]
pub struct ExecutableOperations<R> {
    reactive: ReactiveOperations<R>,
    bridge: BlockingBridge,
}

impl<R> ExecutableOperations<R>
where
    R: ReactiveTemplate,
{
    #[must_use]
    pub fn new(reactive: ReactiveOperations<R>, bridge: BlockingBridge) -> Self {
        Self { reactive, bridge }
    }

    pub fn reactive(&self) -> &ReactiveOperations<R> {
        &self.reactive
    }

    pub fn bridge(&self) -> &BlockingBridge {
        &self.bridge
    }

    pub fn find_by_query<T: Entity>(&self) -> ExecutableFindByQuery<T, R> {
        ExecutableFindByQuery::new(self.reactive.find_by_query(), self.bridge.clone())
    }

    pub fn remove_by_query<T: Entity>(&self) -> ExecutableRemoveByQuery<T, R> {
        ExecutableRemoveByQuery::new(self.reactive.remove_by_query(), self.bridge.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanConsistency;
    use crate::query::Query;
    use crate::template::memory::InMemoryTemplate;
    use crate::testing::Book;

    #[test]
    fn test_fresh_builders_use_configured_defaults() {
        let config = QueryConfig::default()
            .with_default_collection("library.books")
            .with_default_scan_consistency(ScanConsistency::RequestPlus);
        let operations = ReactiveOperations::new(InMemoryTemplate::new()).with_config(config);

        let finder = operations.find_by_query::<Book>();
        assert_eq!(finder.bound_query().query(), &Query::new());
        assert_eq!(finder.bound_query().collection(), "library.books");
        assert_eq!(
            finder.bound_query().scan_consistency(),
            ScanConsistency::RequestPlus
        );
        assert_eq!(
            operations.remove_by_query::<Book>().bound_query(),
            finder.bound_query()
        );
    }
}
