//! Test doubles shared by unit tests.

use async_trait::async_trait;
use mockall::mock;
use store_traits::{
    DocumentChanges, DocumentId, DocumentStore, MemeDocument, NewDocument, Pipeline, Predicate,
    Result,
};

mock! {
    pub Store {}

    #[async_trait]
    impl DocumentStore for Store {
        async fn count_matching(&self, predicate: &Predicate) -> Result<u64>;
        async fn fetch_page(&self, pipeline: &Pipeline) -> Result<Vec<MemeDocument>>;
        async fn find_by_id(&self, id: DocumentId) -> Result<Option<MemeDocument>>;
        async fn insert(&self, document: NewDocument) -> Result<DocumentId>;
        async fn conditional_update(
            &self,
            id: DocumentId,
            expected_version: i64,
            changes: &DocumentChanges,
        ) -> Result<Option<MemeDocument>>;
        async fn delete(&self, id: DocumentId) -> Result<u64>;
        async fn sample_one(&self) -> Result<Option<MemeDocument>>;
    }
}
