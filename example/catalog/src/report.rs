use crate::product::Product;
use fluent_query_rust_lib::bridge::BlockingBridge;
use fluent_query_rust_lib::operations::ReactiveOperations;
use fluent_query_rust_lib::query::{Criteria, Query, Sorter};
use fluent_query_rust_lib::template::ReactiveTemplate;
use fluent_query_rust_lib::{QueryError, ScanConsistency};
use futures::TryStreamExt;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub category: Option<String>,
    pub max_price_cents: Option<u64>,
    pub limit: Option<u64>,
    pub purge: bool,
}

impl ReportOptions {
    fn query(&self) -> Query {
        let mut query = Query::new().with_sort(Sorter::asc("price_cents"));
        if let Some(category) = &self.category {
            query = query.with_criteria(Criteria::field("category").eq(category.as_str()));
        }
        if let Some(max) = self.max_price_cents {
            query = query.with_criteria(Criteria::field("price_cents").lte(max));
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        query
    }
}

/// Counts gathered by one report run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub matched: u64,
    pub returned: usize,
    pub has_premium: bool,
    pub removed: usize,
}

pub async fn run<R: ReactiveTemplate>(
    operations: &ReactiveOperations<R>,
    options: &ReportOptions,
) -> Result<ReportSummary, QueryError> {
    let finder = operations
        .find_by_query::<Product>()
        .matching(options.query())
        .consistent_with(ScanConsistency::RequestPlus);

    let products: Vec<Product> = finder.all().try_collect().await?;
    for product in &products {
        info!(id = %product.id, name = %product.name, price_cents = product.price_cents, "Product");
    }
    let matched = finder.count().await?;
    info!(
        template = operations.template().name(),
        matched,
        returned = products.len(),
        "Catalog query done"
    );

    let premium = Query::new().with_criteria(Criteria::field("price_cents").gt(10_000));
    let cheapest = finder
        .matching(Query::new().with_sort(Sorter::asc("price_cents")))
        .first()
        .await?;
    info!(cheapest = ?cheapest.map(|p| p.name), "Cheapest product");

    // The blocking flavour shares the template; it runs on this multi-thread runtime.
    let blocking = operations.blocking(BlockingBridge::current()?);
    let has_premium = blocking
        .find_by_query::<Product>()
        .matching(premium)
        .exists()?;
    info!(has_premium, "Blocking exists check");

    let mut removed = 0;
    if options.purge {
        removed = blocking
            .remove_by_query::<Product>()
            .matching(options.query())
            .consistent_with(ScanConsistency::RequestPlus)
            .all()?
            .len();
        info!(removed, "Matching products removed");
    }
    Ok(ReportSummary {
        matched,
        returned: products.len(),
        has_premium,
        removed,
    })
}
