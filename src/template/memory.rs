use crate::query::value::{collate, lookup};
use crate::query::{BoundQuery, Query, SortDirection};
use crate::template::{DocumentStream, MutationToken, ReactiveTemplate, RemoveResult, RemoveStream};
use crate::{Entity, QueryError, ScanConsistency};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const PARTITIONS: u32 = 1024;

/// When the secondary index catches up with key-value writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexingMode {
    /// Every write is indexed before it returns.
    #[default]
    Immediate,
    /// Writes are indexed on `refresh_index()` or by a `RequestPlus` query;
    /// `NotBounded` queries may observe stale results in between.
    Deferred,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    type_name: String,
    content: Value,
    cas: u64,
}

type Keyspace = HashMap<String, BTreeMap<String, StoredDocument>>;

#[derive(Debug, Default)]
struct MemoryState {
    documents: Keyspace,
    index: Keyspace,
    sequence: u64,
}

/// A template backed by process memory, useful for tests and demos.
///
/// Documents are kept per collection and ordered by id, which is also the
/// result order of unsorted queries.
#[derive(Debug, Clone)]
pub struct InMemoryTemplate {
    bucket_name: String,
    indexing: IndexingMode,
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryTemplate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bucket_name: "default".to_string(),
            indexing: IndexingMode::default(),
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    #[must_use]
    pub fn with_bucket_name(self, bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_indexing(self, indexing: IndexingMode) -> Self {
        Self { indexing, ..self }
    }

    /// Inserts or replaces `entity` and returns its new CAS.
    pub async fn upsert<T: Entity>(&self, collection: &str, entity: &T) -> Result<u64, QueryError> {
        let content = serde_json::to_value(entity)?;
        let id = entity.id();
        let mut state = self.state.write().await;
        state.sequence += 1;
        let document = StoredDocument {
            type_name: T::TYPE.to_string(),
            content,
            cas: state.sequence,
        };
        if self.indexing == IndexingMode::Immediate {
            state
                .index
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), document.clone());
        }
        debug!(collection = %collection, id = %id, cas = document.cas, "Document upserted");
        let cas = document.cas;
        state
            .documents
            .entry(collection.to_string())
            .or_default()
            .insert(id, document);
        Ok(cas)
    }

    /// Key-value read, independent of the index state.
    pub async fn get<T: Entity>(&self, collection: &str, id: &str) -> Result<Option<T>, QueryError> {
        let state = self.state.read().await;
        state
            .documents
            .get(collection)
            .and_then(|documents| documents.get(id))
            .filter(|document| document.type_name == T::TYPE)
            .map(|document| serde_json::from_value(document.content.clone()).map_err(QueryError::from))
            .transpose()
    }

    /// Number of documents stored in `collection`, whatever their type.
    pub async fn len(&self, collection: &str) -> usize {
        let state = self.state.read().await;
        state.documents.get(collection).map_or(0, BTreeMap::len)
    }

    pub async fn refresh_index(&self) {
        let mut state = self.state.write().await;
        state.index = state.documents.clone();
        debug!(sequence = state.sequence, "Index refreshed");
    }

    async fn prepare(&self, query: &BoundQuery) -> Result<(), QueryError> {
        query.query().validate()?;
        if query.scan_consistency() == ScanConsistency::RequestPlus {
            self.refresh_index().await;
        }
        Ok(())
    }

    fn mutation_token(&self, id: &str, sequence_number: u64) -> MutationToken {
        let hash = id
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
        MutationToken {
            bucket_name: self.bucket_name.clone(),
            partition_id: (hash % PARTITIONS) as u16,
            partition_uuid: 0,
            sequence_number,
        }
    }
}

impl Default for InMemoryTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids and documents of `collection` matching `query`, sorted, then paged
/// when `paged` is set.
fn select<'a>(
    keyspace: &'a Keyspace,
    collection: &str,
    type_name: &str,
    query: &Query,
    paged: bool,
) -> Vec<(&'a String, &'a StoredDocument)> {
    let Some(documents) = keyspace.get(collection) else {
        return Vec::new();
    };
    let mut selected: Vec<_> = documents
        .iter()
        .filter(|(_, document)| document.type_name == type_name)
        .filter(|(_, document)| {
            query
                .criteria()
                .is_none_or(|criteria| criteria.matches(&document.content))
        })
        .collect();
    if !paged {
        return selected;
    }
    if !query.sort().is_empty() {
        selected.sort_by(|(_, left), (_, right)| {
            query
                .sort()
                .iter()
                .map(|sorter| {
                    let ordering = collate(
                        lookup(&left.content, &sorter.field),
                        lookup(&right.content, &sorter.field),
                    );
                    match sorter.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    let skip = query.skip().unwrap_or(0) as usize;
    let limit = query.limit().map_or(usize::MAX, |limit| limit as usize);
    selected.into_iter().skip(skip).take(limit).collect()
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn project(content: &Value, projection: Option<&[String]>) -> Value {
    match projection {
        None => content.clone(),
        Some(fields) => {
            let mut projected = Map::new();
            for field in fields {
                if let Some(value) = lookup(content, field) {
                    insert_path(&mut projected, field, value.clone());
                }
            }
            Value::Object(projected)
        }
    }
}

#[async_trait::async_trait]
impl ReactiveTemplate for InMemoryTemplate {
    const TYPE: &'static str = "in_memory";

    async fn find_by_query<T: Entity>(
        &self,
        query: &BoundQuery,
    ) -> Result<DocumentStream<T>, QueryError> {
        self.prepare(query).await?;
        let state = self.state.read().await;
        let items: Vec<Result<T, QueryError>> =
            select(&state.index, query.collection(), T::TYPE, query.query(), true)
                .into_iter()
                .map(|(_, document)| {
                    serde_json::from_value(project(&document.content, query.query().projection()))
                        .map_err(QueryError::from)
                })
                .collect();
        debug!(
            collection = %query.collection(),
            result_count = items.len(),
            "In-memory find executed"
        );
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn count_by_query<T: Entity>(&self, query: &BoundQuery) -> Result<u64, QueryError> {
        self.prepare(query).await?;
        let state = self.state.read().await;
        let count = select(&state.index, query.collection(), T::TYPE, query.query(), false).len();
        debug!(collection = %query.collection(), count, "In-memory count executed");
        Ok(count as u64)
    }

    async fn remove_by_query<T: Entity>(
        &self,
        query: &BoundQuery,
    ) -> Result<RemoveStream, QueryError> {
        self.prepare(query).await?;
        let mut state = self.state.write().await;
        let ids: Vec<String> =
            select(&state.index, query.collection(), T::TYPE, query.query(), true)
                .into_iter()
                .map(|(id, _)| id.clone())
                .collect();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let removed = state
                .documents
                .get_mut(query.collection())
                .and_then(|documents| documents.remove(&id));
            // Stale index entries may point at documents already gone.
            if removed.is_none() {
                continue;
            }
            if self.indexing == IndexingMode::Immediate
                && let Some(index) = state.index.get_mut(query.collection())
            {
                index.remove(&id);
            }
            state.sequence += 1;
            let sequence = state.sequence;
            results.push(Ok(RemoveResult {
                mutation_token: Some(self.mutation_token(&id, sequence)),
                id,
                cas: sequence,
            }));
        }
        debug!(
            collection = %query.collection(),
            removed = results.len(),
            "In-memory remove executed"
        );
        Ok(Box::pin(futures::stream::iter(results)))
    }
}
