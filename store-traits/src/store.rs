//! Document Store Abstraction
//!
//! A narrow trait over the operations the catalog needs from a document
//! store. Concrete adapters (in-memory, SQLite) live in `core-catalog`, so the
//! catalog logic can be exercised without a real store.
//!
//! ## Usage
//!
//! ```ignore
//! use store_traits::{DocumentStore, Predicate};
//!
//! let total = store.count_matching(&Predicate::all()).await?;
//! let sample = store.sample_one().await?;
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::document::{DocumentChanges, DocumentId, MemeDocument, NewDocument};
use crate::error::Result;
use crate::query::{Pipeline, Predicate};

// =============================================================================
// Configuration
// =============================================================================

/// Per-call time budgets for store round trips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Single-document reads and writes
    pub document: Duration,

    /// Counting, listing and sampling
    pub aggregate: Duration,
}

impl TimeoutPolicy {
    pub fn new(document: Duration, aggregate: Duration) -> Self {
        Self {
            document,
            aggregate,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            document: Duration::from_secs(3),
            aggregate: Duration::from_secs(6),
        }
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Document store operations used by the catalog
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; a single store is shared by every
/// request.
///
/// ## Atomicity
///
/// `conditional_update` must be a single atomic compare-and-swap on
/// `(id, version)`. No other operation needs to be atomic with any other;
/// in particular a count followed by a fetch may observe different states.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Count documents matching `predicate`.
    async fn count_matching(&self, predicate: &Predicate) -> Result<u64>;

    /// Execute `pipeline` and return the resulting documents in order.
    async fn fetch_page(&self, pipeline: &Pipeline) -> Result<Vec<MemeDocument>>;

    /// Fetch a single document by identifier.
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<MemeDocument>>;

    /// Insert a document and return the identifier the store assigned.
    async fn insert(&self, document: NewDocument) -> Result<DocumentId>;

    /// Write `changes` to the document matching `id` whose version equals
    /// `expected_version`.
    ///
    /// # Returns
    ///
    /// The document as stored after the write, or `None` when nothing matched
    async fn conditional_update(
        &self,
        id: DocumentId,
        expected_version: i64,
        changes: &DocumentChanges,
    ) -> Result<Option<MemeDocument>>;

    /// Remove the document matching `id`.
    ///
    /// # Returns
    ///
    /// Number of documents removed (0 or 1)
    async fn delete(&self, id: DocumentId) -> Result<u64>;

    /// Pick one document uniformly at random; `None` when the collection is
    /// empty.
    async fn sample_one(&self) -> Result<Option<MemeDocument>>;
}
