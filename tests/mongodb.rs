#![cfg(feature = "mongodb")]

mod models;

use fluent_query_rust_lib::operations::ReactiveOperations;
use fluent_query_rust_lib::query::{Criteria, Query, Sorter};
use fluent_query_rust_lib::template::mongodb::MongoDbTemplate;
use fluent_query_rust_lib::{QueryError, ScanConsistency};
use futures::TryStreamExt;
use models::{AIRLINES, Airline, airlines};

async fn setup_mongo() -> Option<MongoDbTemplate> {
    // Only run MongoDB-backed tests if MONGO_TEST_URI is provided.
    let uri = std::env::var("MONGO_TEST_URI").ok()?;
    let client = mongodb::Client::with_uri_str(&uri).await.ok()?;
    let database = client.database("fluent_query_tests");
    database
        .collection::<bson::Document>(AIRLINES)
        .drop()
        .await
        .ok()?;
    let template = MongoDbTemplate::new(database);
    for airline in airlines() {
        template.upsert(AIRLINES, &airline).await.ok()?;
    }
    Some(template)
}

#[tokio::test]
async fn find_count_and_remove_against_mongodb() {
    let Some(template) = setup_mongo().await else {
        return;
    };
    let operations = ReactiveOperations::new(template);
    let finder = operations
        .find_by_query::<Airline>()
        .in_collection(AIRLINES)
        .consistent_with(ScanConsistency::RequestPlus);

    let us = Query::new()
        .with_criteria(Criteria::field("country").eq("United States"))
        .with_sort(Sorter::asc("name"));
    let found: Vec<Airline> = finder.matching(us.clone()).all().try_collect().await.unwrap();
    let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["40-Mile Air", "Texas Wings", "United Airlines"]);

    assert_eq!(finder.count().await.unwrap(), 5);
    assert!(matches!(
        finder.matching(us.clone()).one().await,
        Err(QueryError::NonUniqueResult)
    ));

    let removed: Vec<_> = operations
        .remove_by_query::<Airline>()
        .in_collection(AIRLINES)
        .matching(us)
        .all()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(finder.count().await.unwrap(), 2);
}
