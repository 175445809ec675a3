use crate::query::{BoundQuery, Criteria, Query, SortDirection};
use crate::template::{DocumentStream, ReactiveTemplate, RemoveResult, RemoveStream};
use crate::{Entity, QueryError, ScanConsistency};
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::options::{CollectionOptions, ReadConcern};
use mongodb::{Collection, Database};
use serde_json::Value;
use tracing::{debug, error};

pub const DEFAULT_TYPE_KEY: &str = "_class";

fn map_mongo_error(e: mongodb::error::Error) -> QueryError {
    QueryError::database_error(e)
}

fn map_bson_error(e: bson::ser::Error) -> QueryError {
    QueryError::serialization_error(e)
}

fn to_bson_value(value: &Value) -> Result<Bson, QueryError> {
    bson::to_bson(value).map_err(map_bson_error)
}

fn to_bson_array(values: &[Value]) -> Result<Bson, QueryError> {
    values
        .iter()
        .map(to_bson_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Bson::Array)
}

/// Translates a `LIKE` pattern into an anchored regular expression.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }
    regex.push('$');
    regex
}

/// Builds the MongoDB filter equivalent of `criteria`. Negative operators
/// (`Ne`, `NotIn`) also require the field to exist, matching the in-memory
/// semantics where a missing field never satisfies a comparison.
pub fn to_filter(criteria: &Criteria) -> Result<Document, QueryError> {
    let filter = match criteria {
        Criteria::Eq { field, value } => doc! { field.as_str(): to_bson_value(value)? },
        Criteria::Ne { field, value } => {
            doc! { field.as_str(): { "$ne": to_bson_value(value)?, "$exists": true } }
        }
        Criteria::Gt { field, value } => doc! { field.as_str(): { "$gt": to_bson_value(value)? } },
        Criteria::Gte { field, value } => doc! { field.as_str(): { "$gte": to_bson_value(value)? } },
        Criteria::Lt { field, value } => doc! { field.as_str(): { "$lt": to_bson_value(value)? } },
        Criteria::Lte { field, value } => doc! { field.as_str(): { "$lte": to_bson_value(value)? } },
        Criteria::In { field, values } => doc! { field.as_str(): { "$in": to_bson_array(values)? } },
        Criteria::NotIn { field, values } => {
            doc! { field.as_str(): { "$nin": to_bson_array(values)?, "$exists": true } }
        }
        Criteria::Like { field, pattern } => {
            doc! { field.as_str(): { "$regex": like_to_regex(pattern), "$options": "s" } }
        }
        Criteria::Exists { field } => doc! { field.as_str(): { "$exists": true } },
        Criteria::IsNull { field } => doc! { field.as_str(): { "$type": "null" } },
        Criteria::And { criteria } if criteria.is_empty() => doc! {},
        // Every document has an `_id`, so this matches nothing.
        Criteria::Or { criteria } if criteria.is_empty() => doc! { "_id": { "$exists": false } },
        Criteria::And { criteria } => {
            let filters = criteria.iter().map(to_filter).collect::<Result<Vec<_>, _>>()?;
            doc! { "$and": filters }
        }
        Criteria::Or { criteria } => {
            let filters = criteria.iter().map(to_filter).collect::<Result<Vec<_>, _>>()?;
            doc! { "$or": filters }
        }
        Criteria::Not { criteria } => doc! { "$nor": [to_filter(criteria)?] },
    };
    Ok(filter)
}

fn to_sort(query: &Query) -> Option<Document> {
    if query.sort().is_empty() {
        return None;
    }
    let mut sort = Document::new();
    for sorter in query.sort() {
        let direction = match sorter.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        sort.insert(sorter.field.as_str(), direction);
    }
    Some(sort)
}

fn to_projection(query: &Query) -> Option<Document> {
    query.projection().map(|fields| {
        fields
            .iter()
            .map(|field| (field.clone(), Bson::Int32(1)))
            .collect::<Document>()
    })
}

/// MongoDB reads a negative limit as a single-batch request, so oversized
/// limits saturate instead of wrapping.
fn to_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// A template executing bound queries against a MongoDB database.
///
/// The collection name of the bound query is used verbatim as the MongoDB
/// collection. Scan consistency maps onto the read concern: `NotBounded`
/// reads with `local`, `RequestPlus` with `majority`.
#[derive(Debug, Clone)]
pub struct MongoDbTemplate {
    database: Database,
    type_key: String,
}

impl MongoDbTemplate {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            type_key: DEFAULT_TYPE_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn with_type_key(self, type_key: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            ..self
        }
    }

    fn collection<T: Send + Sync>(&self, query: &BoundQuery) -> Collection<T> {
        let read_concern = match query.scan_consistency() {
            ScanConsistency::NotBounded => ReadConcern::local(),
            ScanConsistency::RequestPlus => ReadConcern::majority(),
        };
        self.database.collection_with_options(
            query.collection(),
            CollectionOptions::builder().read_concern(read_concern).build(),
        )
    }

    fn filter<T: Entity>(&self, query: &Query) -> Result<Document, QueryError> {
        let discriminator = doc! { self.type_key.as_str(): T::TYPE };
        match query.criteria() {
            Some(criteria) => Ok(doc! { "$and": [discriminator, to_filter(criteria)?] }),
            None => Ok(discriminator),
        }
    }

    /// Inserts or replaces `entity`, keyed by its id and tagged with its type.
    pub async fn upsert<T: Entity>(&self, collection: &str, entity: &T) -> Result<(), QueryError> {
        let mut document = bson::to_document(entity).map_err(map_bson_error)?;
        document.insert("_id", entity.id());
        document.insert(self.type_key.as_str(), T::TYPE);
        self.database
            .collection::<Document>(collection)
            .replace_one(doc! { "_id": entity.id() }, document)
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReactiveTemplate for MongoDbTemplate {
    const TYPE: &'static str = "mongodb";

    async fn find_by_query<T: Entity>(
        &self,
        query: &BoundQuery,
    ) -> Result<DocumentStream<T>, QueryError> {
        query.query().validate()?;
        let filter = self.filter::<T>(query.query())?;
        debug!(collection = %query.collection(), filter = %filter, "Executing MongoDB find");
        let collection = self.collection::<T>(query);
        let mut find = collection.find(filter);
        if let Some(sort) = to_sort(query.query()) {
            find = find.sort(sort);
        }
        if let Some(projection) = to_projection(query.query()) {
            find = find.projection(projection);
        }
        if let Some(skip) = query.query().skip() {
            find = find.skip(skip);
        }
        if let Some(limit) = query.query().limit() {
            find = find.limit(to_limit(limit));
        }
        let cursor = find.await.map_err(|e| {
            error!(error = %e, "MongoDB find failed");
            map_mongo_error(e)
        })?;
        Ok(Box::pin(cursor.map_err(map_mongo_error)))
    }

    async fn count_by_query<T: Entity>(&self, query: &BoundQuery) -> Result<u64, QueryError> {
        query.query().validate()?;
        let filter = self.filter::<T>(query.query())?;
        debug!(collection = %query.collection(), filter = %filter, "Executing MongoDB count");
        self.collection::<Document>(query)
            .count_documents(filter)
            .await
            .map_err(map_mongo_error)
    }

    async fn remove_by_query<T: Entity>(
        &self,
        query: &BoundQuery,
    ) -> Result<RemoveStream, QueryError> {
        query.query().validate()?;
        let filter = self.filter::<T>(query.query())?;
        debug!(collection = %query.collection(), filter = %filter, "Executing MongoDB remove");
        let collection = self.collection::<Document>(query);
        let mut find = collection.find(filter).projection(doc! { "_id": 1 });
        if let Some(sort) = to_sort(query.query()) {
            find = find.sort(sort);
        }
        if let Some(skip) = query.query().skip() {
            find = find.skip(skip);
        }
        if let Some(limit) = query.query().limit() {
            find = find.limit(to_limit(limit));
        }
        let matched: Vec<Document> = find
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;

        let mut results = Vec::with_capacity(matched.len());
        for document in matched {
            let Some(id) = document.get("_id").cloned() else {
                continue;
            };
            let deleted = collection
                .delete_one(doc! { "_id": id.clone() })
                .await
                .map_err(map_mongo_error)?;
            if deleted.deleted_count == 1 {
                results.push(Ok(RemoveResult {
                    id: id_to_string(&id),
                    cas: 0,
                    mutation_token: None,
                }));
            }
        }
        debug!(removed = results.len(), "MongoDB remove executed");
        Ok(Box::pin(futures::stream::iter(results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Sorter;

    #[test]
    fn test_limit_saturates() {
        assert_eq!(to_limit(25), 25);
        assert_eq!(to_limit(i64::MAX as u64), i64::MAX);
        assert_eq!(to_limit(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_comparison_filters() {
        let filter = to_filter(&Criteria::field("age").gte(18)).unwrap();
        assert_eq!(filter, doc! { "age": { "$gte": 18_i64 } });

        let filter = to_filter(&Criteria::field("name").ne("bob")).unwrap();
        assert_eq!(filter, doc! { "name": { "$ne": "bob", "$exists": true } });
    }

    #[test]
    fn test_logical_filters() {
        let criteria = Criteria::field("a")
            .eq(1)
            .or(Criteria::field("b").exists())
            .and(!Criteria::field("c").is_null());
        let filter = to_filter(&criteria).unwrap();
        assert_eq!(
            filter,
            doc! { "$and": [
                { "$or": [ { "a": 1_i64 }, { "b": { "$exists": true } } ] },
                { "$nor": [ { "c": { "$type": "null" } } ] },
            ] }
        );
    }

    #[test]
    fn test_like_is_anchored_and_escaped() {
        assert_eq!(like_to_regex("a.b%"), "^a\\.b.*$");
        assert_eq!(like_to_regex("_x"), "^.x$");
    }

    #[test]
    fn test_sort_and_projection() {
        let query = Query::new()
            .with_sort(Sorter::desc("pages"))
            .with_sort(Sorter::asc("title"))
            .with_projection(["title"]);
        assert_eq!(to_sort(&query), Some(doc! { "pages": -1, "title": 1 }));
        assert_eq!(to_projection(&query), Some(doc! { "title": 1 }));
        assert_eq!(to_sort(&Query::new()), None);
    }
}
