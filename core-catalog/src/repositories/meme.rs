//! Meme repository trait and implementation
//!
//! Writes are guarded by the record's `version`: an update is issued as a
//! single conditional write matching `(id, version)` and bumping the version by
//! one. A write that matches nothing surfaces as `CatalogError::EditConflict`.

use crate::error::{CatalogError, Result};
use crate::models::{Meme, MemePatch, NewMeme};
use crate::timeout::bounded;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use store_traits::{DocumentId, DocumentStore, NewDocument, TimeoutPolicy};
use tracing::{debug, instrument, warn};

/// Meme repository interface for data access operations
#[async_trait]
pub trait MemeRepository: Send + Sync {
    /// Insert a new meme
    ///
    /// Assigns `created = now` (millisecond precision) and `version = 1`; the
    /// store assigns the id.
    ///
    /// # Errors
    /// - `ValidationFailed` if any field is invalid (no store call is made)
    /// - `Store` if the write fails
    async fn create(&self, meme: &NewMeme) -> Result<Meme>;

    /// Fetch a meme by id
    ///
    /// # Errors
    /// `NotFound` if the id is malformed or no document has it.
    async fn get(&self, id: &str) -> Result<Meme>;

    /// Apply `patch` to the stored record
    ///
    /// Fetches the current record, merges the supplied fields and writes it
    /// back guarded by the fetched version (or by `patch.expected_version`
    /// when given).
    ///
    /// # Errors
    /// - `ValidationFailed` if a supplied field is invalid (no store call)
    /// - `NotFound` if the record does not exist
    /// - `EditConflict` if the version no longer matches
    async fn update(&self, id: &str, patch: &MemePatch) -> Result<Meme>;

    /// Write `meme` back if the stored version still equals `meme.version`
    ///
    /// Returns the record as stored, with its version incremented by one.
    /// `created` is never written; the stored value is returned.
    ///
    /// # Errors
    /// - `ValidationFailed` if the record is invalid (no store call)
    /// - `NotFound` if the id is malformed
    /// - `EditConflict` if no document matched `(id, version)`
    async fn save(&self, meme: &Meme) -> Result<Meme>;

    /// Delete a meme by id
    ///
    /// # Errors
    /// `NotFound` if the id is malformed or nothing was removed.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// `MemeRepository` over any [`DocumentStore`]
///
/// Every store call runs under the single-document time budget.
#[derive(Clone)]
pub struct StoreMemeRepository {
    store: Arc<dyn DocumentStore>,
    timeouts: TimeoutPolicy,
}

impl StoreMemeRepository {
    /// Create a new StoreMemeRepository
    pub fn new(store: Arc<dyn DocumentStore>, timeouts: TimeoutPolicy) -> Self {
        Self { store, timeouts }
    }
}

/// Malformed ids cannot name a stored document.
fn parse_id(id: &str) -> Result<DocumentId> {
    DocumentId::from_string(id).map_err(|_| {
        debug!(id, "Rejected malformed meme id");
        CatalogError::NotFound
    })
}

#[async_trait]
impl MemeRepository for StoreMemeRepository {
    #[instrument(skip_all, fields(artist = %meme.artist, title = %meme.title, b64_len = meme.b64.len()))]
    async fn create(&self, meme: &NewMeme) -> Result<Meme> {
        meme.validate()?;

        let document = NewDocument {
            created: Utc::now().trunc_subsecs(3),
            artist: meme.artist.clone(),
            title: meme.title.clone(),
            b64: meme.b64.clone(),
            version: 1,
        };

        let id = bounded(
            "insert",
            self.timeouts.document,
            self.store.insert(document.clone()),
        )
        .await?;

        debug!(%id, "Created meme");
        Ok(document.with_id(id).into())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Meme> {
        let id = parse_id(id)?;

        let document = bounded("find_by_id", self.timeouts.document, self.store.find_by_id(id))
            .await?
            .ok_or(CatalogError::NotFound)?;

        Ok(document.into())
    }

    #[instrument(skip(self, patch), fields(expected_version = ?patch.expected_version))]
    async fn update(&self, id: &str, patch: &MemePatch) -> Result<Meme> {
        patch.validate()?;

        let mut meme = self.get(id).await?;

        if let Some(expected) = patch.expected_version {
            if expected != meme.version {
                warn!(
                    expected,
                    stored = meme.version,
                    "Update refused: expected version is stale"
                );
                return Err(CatalogError::EditConflict);
            }
        }

        patch.merge_into(&mut meme);
        self.save(&meme).await
    }

    #[instrument(skip_all, fields(id = %meme.id, version = meme.version))]
    async fn save(&self, meme: &Meme) -> Result<Meme> {
        meme.validate()?;
        let id = parse_id(&meme.id)?;

        let Some(changes) = meme.next_changes() else {
            warn!("Version cannot be incremented; no stored document can match");
            return Err(CatalogError::EditConflict);
        };

        let stored = bounded(
            "conditional_update",
            self.timeouts.document,
            self.store.conditional_update(id, meme.version, &changes),
        )
        .await?;

        let Some(stored) = stored else {
            warn!("Conditional write matched no document");
            return Err(CatalogError::EditConflict);
        };

        debug!(new_version = stored.version, "Saved meme");
        Ok(stored.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;

        let removed = bounded("delete", self.timeouts.document, self.store.delete(id)).await?;
        if removed == 0 {
            return Err(CatalogError::NotFound);
        }

        debug!(removed, "Deleted meme");
        Ok(())
    }
}
