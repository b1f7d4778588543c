//! In-memory document store
//!
//! HashMap-backed implementation of `DocumentStore` for tests and local
//! development. Filtering, sorting and paging run over the stored documents in
//! process, so results match the SQLite store for the same pipeline.

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use store_traits::{
    compare_documents, DocumentChanges, DocumentId, DocumentStore, MemeDocument, NewDocument,
    Pipeline, Predicate, Result, Stage, StoreError,
};
use tracing::debug;

type Documents = HashMap<DocumentId, MemeDocument>;

/// In-memory document store backed by a HashMap.
///
/// Clone-friendly via Arc; clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Documents>> {
        self.documents
            .read()
            .map_err(|_| StoreError::Connection("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Documents>> {
        self.documents
            .write()
            .map_err(|_| StoreError::Connection("lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn count_matching(&self, predicate: &Predicate) -> Result<u64> {
        let count = self
            .read()?
            .values()
            .filter(|doc| predicate.matches(doc))
            .count();
        Ok(count as u64)
    }

    async fn fetch_page(&self, pipeline: &Pipeline) -> Result<Vec<MemeDocument>> {
        let mut documents: Vec<MemeDocument> = self.read()?.values().cloned().collect();

        for stage in pipeline.stages() {
            match stage {
                Stage::Match(predicate) => documents.retain(|doc| predicate.matches(doc)),
                Stage::Sort(keys) => documents.sort_by(|a, b| compare_documents(keys, a, b)),
                Stage::Skip(n) => {
                    let n = usize::try_from(*n).unwrap_or(usize::MAX).min(documents.len());
                    documents.drain(..n);
                }
                Stage::Limit(n) => {
                    documents.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
                }
            }
        }

        debug!(stages = ?pipeline.stage_names(), returned = documents.len(), "Executed in-memory pipeline");
        Ok(documents)
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<MemeDocument>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn insert(&self, document: NewDocument) -> Result<DocumentId> {
        let mut documents = self.write()?;

        let mut id = DocumentId::new();
        while documents.contains_key(&id) {
            id = DocumentId::new();
        }

        documents.insert(id, document.with_id(id));
        Ok(id)
    }

    async fn conditional_update(
        &self,
        id: DocumentId,
        expected_version: i64,
        changes: &DocumentChanges,
    ) -> Result<Option<MemeDocument>> {
        let mut documents = self.write()?;

        let Some(document) = documents.get_mut(&id) else {
            return Ok(None);
        };
        if document.version != expected_version {
            return Ok(None);
        }

        document.apply(changes);
        Ok(Some(document.clone()))
    }

    async fn delete(&self, id: DocumentId) -> Result<u64> {
        Ok(u64::from(self.write()?.remove(&id).is_some()))
    }

    async fn sample_one(&self) -> Result<Option<MemeDocument>> {
        Ok(self
            .read()?
            .values()
            .choose(&mut rand::thread_rng())
            .cloned())
    }
}
