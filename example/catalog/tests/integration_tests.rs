use catalog::product::{Product, catalog};
use catalog::report::{self, ReportOptions};
use fluent_query_rust_lib::operations::ReactiveOperations;
use fluent_query_rust_lib::template::memory::InMemoryTemplate;
use fluent_query_rust_lib::QueryConfig;

const COLLECTION: &str = "shop.products";

async fn seeded() -> ReactiveOperations<InMemoryTemplate> {
    let template = InMemoryTemplate::new();
    for product in catalog() {
        template.upsert(COLLECTION, &product).await.unwrap();
    }
    ReactiveOperations::new(template)
        .with_config(QueryConfig::default().with_default_collection(COLLECTION))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn report_without_purge_keeps_catalog() {
    let operations = seeded().await;
    let options = ReportOptions {
        category: Some("office".to_string()),
        ..Default::default()
    };

    // No subscriber is installed here, so log events are disabled.
    let summary = report::run(&operations, &options).await.unwrap();
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.returned, 3);
    assert!(summary.has_premium);
    assert_eq!(summary.removed, 0);
    assert_eq!(operations.template().len(COLLECTION).await, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn purge_removes_only_the_reported_products() {
    let operations = seeded().await;
    let options = ReportOptions {
        category: Some("kitchen".to_string()),
        max_price_cents: Some(4_000),
        purge: true,
        ..Default::default()
    };

    let summary = report::run(&operations, &options).await.unwrap();
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.removed, 2);
    let template = operations.template();
    assert_eq!(template.len(COLLECTION).await, 4);
    assert!(template.get::<Product>(COLLECTION, "p-001").await.unwrap().is_none());
    assert!(template.get::<Product>(COLLECTION, "p-006").await.unwrap().is_some());
}
